use std::collections::HashSet;

use anyhow::{Result, bail};
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, warn};

use crate::model::{Measurement, StationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Subscribing,
    Active,
    TearingDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEvent {
    Select,
    HistoryResolved,
    Insert,
    TearDown,
    Released,
}

impl FeedState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedState::Idle => "idle",
            FeedState::Subscribing => "subscribing",
            FeedState::Active => "active",
            FeedState::TearingDown => "tearing down",
        }
    }

    /// Transition table. A new selection is only accepted from `Idle`, so a
    /// previous subscription must be torn down and released first.
    pub fn next(self, event: FeedEvent) -> Result<FeedState> {
        use FeedEvent::*;
        use FeedState::*;

        let next = match (self, event) {
            (Idle, Select) => Subscribing,
            (Subscribing, Insert) => Subscribing,
            (Subscribing, HistoryResolved) => Active,
            (Active, Insert) => Active,
            (Active, HistoryResolved) => Active,
            (Subscribing | Active, TearDown) => TearingDown,
            (TearingDown, Released) => Idle,
            (state, event) => {
                bail!("invalid live feed transition: {event:?} while {}", state.as_str())
            }
        };

        Ok(next)
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, FeedState::Subscribing | FeedState::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub station_id: StationId,

    pub window: TimeDelta,
}

/// A bounded history query issued by the feed. Only the most recent ticket
/// is applied when it resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,

    pub station_id: StationId,

    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Appended,
    Buffered,
    Duplicate,
    Ignored,
}

/// Ordered measurements of the selected station over its lookback window,
/// fed by one history query and the live inserts that follow it.
#[derive(Debug)]
pub struct LiveFeed {
    state: FeedState,
    selection: Option<Selection>,
    generation: u64,
    in_flight: Option<u64>,
    series: Vec<Measurement>,
    // The series holds a single station, so capture time alone identifies a
    // measurement within it.
    seen: HashSet<DateTime<Utc>>,
    pending: Vec<Measurement>,
    load: LoadState,
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveFeed {
    pub fn new() -> Self {
        Self {
            state: FeedState::Idle,
            selection: None,
            generation: 0,
            in_flight: None,
            series: Vec::new(),
            seen: HashSet::new(),
            pending: Vec::new(),
            load: LoadState::Loading,
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn series(&self) -> &[Measurement] {
        &self.series
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Starts a new selection. Fails unless the feed is idle.
    pub fn select(
        &mut self,
        station_id: StationId,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Ticket> {
        self.state = self.state.next(FeedEvent::Select)?;
        self.clear();
        self.selection = Some(Selection {
            station_id: station_id.clone(),
            window,
        });

        Ok(self.issue(station_id, now - window))
    }

    /// Re-runs the history query of the current selection. Returns `None`
    /// unless the feed is active with no query outstanding.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> Option<Ticket> {
        if self.state != FeedState::Active || self.in_flight.is_some() {
            return None;
        }

        let selection = self.selection.clone()?;
        Some(self.issue(selection.station_id, now - selection.window))
    }

    pub fn tear_down(&mut self) -> Result<()> {
        self.state = self.state.next(FeedEvent::TearDown)?;
        self.in_flight = None;
        Ok(())
    }

    pub fn released(&mut self) -> Result<()> {
        self.state = self.state.next(FeedEvent::Released)?;
        self.selection = None;
        self.clear();
        Ok(())
    }

    /// Applies the result of a history query. Results of superseded tickets
    /// are discarded.
    pub fn complete(
        &mut self,
        ticket: &Ticket,
        result: Result<Vec<Measurement>>,
    ) -> Result<Resolution> {
        if self.in_flight != Some(ticket.generation) {
            debug!(
                "discarding stale history for {} (generation {})",
                ticket.station_id, ticket.generation
            );
            return Ok(Resolution::Stale);
        }

        self.state = self.state.next(FeedEvent::HistoryResolved)?;
        self.in_flight = None;

        let pending = std::mem::take(&mut self.pending);
        self.series.clear();
        self.seen.clear();

        match result {
            Ok(history) => {
                for m in history.into_iter().chain(pending) {
                    self.push(m);
                }
                self.load = LoadState::Ready;
                Ok(Resolution::Applied)
            }
            Err(err) => {
                warn!("failed to load history for {}: {err:#}", ticket.station_id);
                self.load = LoadState::Failed(format!("{err:#}"));
                Ok(Resolution::Failed)
            }
        }
    }

    /// Takes a live insert. Arrival order is kept; inserts seen before are
    /// dropped.
    pub fn insert(&mut self, measurement: Measurement) -> Result<InsertOutcome> {
        let selected = self
            .selection
            .as_ref()
            .is_some_and(|s| s.station_id == measurement.station_id);
        if !self.state.is_attached() || !selected {
            debug!(
                "ignoring insert for {} while {}",
                measurement.station_id,
                self.state.as_str()
            );
            return Ok(InsertOutcome::Ignored);
        }

        self.state = self.state.next(FeedEvent::Insert)?;

        if self.in_flight.is_some() {
            self.pending.push(measurement.clone());
            if self.state == FeedState::Subscribing {
                return Ok(InsertOutcome::Buffered);
            }
        }

        if self.push(measurement) {
            Ok(InsertOutcome::Appended)
        } else {
            Ok(InsertOutcome::Duplicate)
        }
    }

    fn issue(&mut self, station_id: StationId, since: DateTime<Utc>) -> Ticket {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.pending.clear();
        if self.state == FeedState::Subscribing {
            self.load = LoadState::Loading;
        }

        Ticket {
            generation: self.generation,
            station_id,
            since,
        }
    }

    fn push(&mut self, measurement: Measurement) -> bool {
        if !self.seen.insert(measurement.created_at) {
            return false;
        }

        self.series.push(measurement);
        true
    }

    fn clear(&mut self) {
        self.in_flight = None;
        self.series.clear();
        self.seen.clear();
        self.pending.clear();
        self.load = LoadState::Loading;
    }
}
