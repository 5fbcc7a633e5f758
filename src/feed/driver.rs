use std::{future::pending, time::Duration};

use anyhow::Result;
use chrono::{TimeDelta, Utc};
use log::{info, warn};
use tokio::{
    task::{JoinError, JoinSet},
    time::{Instant, Interval, MissedTickBehavior, interval_at},
};

use crate::{
    backend::{Backend, Subscription},
    feed::{InsertOutcome, LiveFeed, Resolution, Ticket},
    model::{Measurement, StationId},
};

/// How the feed stays current besides live inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefreshPolicy {
    pub poll_interval: Option<Duration>,
}

impl RefreshPolicy {
    pub fn push_only() -> Self {
        Self::default()
    }

    pub fn polling(every: Duration) -> Self {
        Self {
            poll_interval: Some(every),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedUpdate {
    History(Resolution),
    Insert(InsertOutcome),
    Refreshing,
    SubscriptionClosed,
}

type QueryResult = (Ticket, Result<Vec<Measurement>>);

enum Event {
    Query(Result<QueryResult, JoinError>),
    Insert(Option<Measurement>),
    Refresh,
}

/// Runs a [`LiveFeed`] against a backend: owns the single insert
/// subscription and the history queries in flight.
pub struct FeedDriver<B> {
    backend: B,
    policy: RefreshPolicy,
    feed: LiveFeed,
    subscription: Option<Subscription>,
    queries: JoinSet<QueryResult>,
    refresh: Option<Interval>,
}

impl<B> FeedDriver<B>
where
    B: Backend + Clone + 'static,
{
    pub fn new(backend: B, policy: RefreshPolicy) -> Self {
        Self {
            backend,
            policy,
            feed: LiveFeed::new(),
            subscription: None,
            queries: JoinSet::new(),
            refresh: None,
        }
    }

    pub fn feed(&self) -> &LiveFeed {
        &self.feed
    }

    /// Switches to `station_id` over `window`. The previous subscription is
    /// released before the new one is acquired; its history query is left to
    /// finish and is discarded.
    pub async fn select(&mut self, station_id: StationId, window: TimeDelta) -> Result<()> {
        self.detach()?;

        let ticket = self.feed.select(station_id.clone(), window, Utc::now())?;

        // Subscribe before querying so inserts racing the query are buffered.
        let subscription = match self.backend.subscribe_inserts(&station_id).await {
            Ok(subscription) => subscription,
            Err(err) => {
                self.detach()?;
                return Err(err.context(format!("failed to subscribe to inserts: {station_id}")));
            }
        };
        info!("subscribed to inserts: {station_id}");

        self.subscription = Some(subscription);
        self.spawn_query(ticket);
        self.refresh = self.policy.poll_interval.map(|every| {
            let mut interval = interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.detach()
    }

    /// Nothing selected and no query outstanding.
    pub fn is_idle(&self) -> bool {
        self.subscription.is_none() && self.queries.is_empty() && self.refresh.is_none()
    }

    /// Waits for the next change to the feed. `None` once the driver is idle.
    pub async fn next_update(&mut self) -> Option<FeedUpdate> {
        loop {
            if self.is_idle() {
                return None;
            }

            let event = tokio::select! {
                Some(joined) = self.queries.join_next(), if !self.queries.is_empty() => {
                    Event::Query(joined)
                }
                received = recv(&mut self.subscription), if self.subscription.is_some() => {
                    Event::Insert(received)
                }
                () = tick(&mut self.refresh), if self.refresh.is_some() => Event::Refresh,
            };

            match event {
                Event::Query(Ok((ticket, result))) => match self.feed.complete(&ticket, result) {
                    Ok(resolution) => return Some(FeedUpdate::History(resolution)),
                    Err(err) => warn!("failed to apply history: {err:#}"),
                },
                Event::Query(Err(err)) => warn!("history query task failed: {err}"),
                Event::Insert(Some(measurement)) => match self.feed.insert(measurement) {
                    Ok(outcome) => return Some(FeedUpdate::Insert(outcome)),
                    Err(err) => warn!("failed to apply insert: {err:#}"),
                },
                // The feed goes back to idle; the caller re-selects to recover.
                Event::Insert(None) => {
                    if let Some(subscription) = &self.subscription {
                        warn!("insert subscription closed: {}", subscription.station_id());
                    }
                    if let Err(err) = self.detach() {
                        warn!("failed to detach closed feed: {err:#}");
                    }
                    return Some(FeedUpdate::SubscriptionClosed);
                }
                Event::Refresh => {
                    if let Some(ticket) = self.feed.refresh(Utc::now()) {
                        self.spawn_query(ticket);
                        return Some(FeedUpdate::Refreshing);
                    }
                }
            }
        }
    }

    fn spawn_query(&mut self, ticket: Ticket) {
        let backend = self.backend.clone();
        self.queries.spawn(async move {
            let result = backend
                .query_measurements(&ticket.station_id, ticket.since)
                .await;
            (ticket, result)
        });
    }

    fn detach(&mut self) -> Result<()> {
        self.refresh = None;
        if !self.feed.state().is_attached() {
            return Ok(());
        }

        self.feed.tear_down()?;
        if let Some(subscription) = self.subscription.take() {
            subscription.release();
        }
        self.feed.released()
    }
}

async fn recv(subscription: &mut Option<Subscription>) -> Option<Measurement> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => pending().await,
    }
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}
