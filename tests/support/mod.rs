#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use agro_stations::{
    backend::{Backend, Subscription},
    model::{Measurement, SensorsConfig, Station, StationId},
};
use anyhow::{Result, bail};
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{mpsc, oneshot};

#[derive(Default)]
struct State {
    stations: Vec<Station>,
    measurements: Vec<Measurement>,
    subscribers: Vec<(StationId, mpsc::UnboundedSender<Measurement>)>,
    gates: HashMap<StationId, oneshot::Receiver<()>>,
    failing_queries: Vec<StationId>,
    fail_subscriptions: bool,
    fail_updates: bool,
}

/// In-memory backend. History queries for a station can be held back with
/// [`FakeBackend::hold_queries`] to reorder them against live inserts.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    pub fn new(stations: Vec<Station>) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().stations = stations;
        backend
    }

    pub fn seed(&self, measurements: impl IntoIterator<Item = Measurement>) {
        self.state.lock().unwrap().measurements.extend(measurements);
    }

    /// Blocks the next history query for `station_id` until the returned
    /// sender fires.
    pub fn hold_queries(&self, station_id: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .unwrap()
            .gates
            .insert(StationId::from(station_id), rx);
        tx
    }

    pub fn fail_queries(&self, station_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_queries
            .push(StationId::from(station_id));
    }

    pub fn fail_subscriptions(&self, fail: bool) {
        self.state.lock().unwrap().fail_subscriptions = fail;
    }

    pub fn fail_updates(&self) {
        self.state.lock().unwrap().fail_updates = true;
    }

    /// Stores `measurement` and notifies live subscribers of its station.
    pub fn publish(&self, measurement: Measurement) {
        let mut state = self.state.lock().unwrap();
        state.measurements.push(measurement.clone());
        state
            .subscribers
            .retain(|(station_id, tx)| {
                *station_id != measurement.station_id || tx.send(measurement.clone()).is_ok()
            });
    }

    /// Drops the live senders of `station_id`, as a lost database
    /// connection would.
    pub fn close_subscriptions(&self, station_id: &str) {
        let station_id = StationId::from(station_id);
        self.state
            .lock()
            .unwrap()
            .subscribers
            .retain(|(id, _)| *id != station_id);
    }

    pub fn active_subscriptions(&self, station_id: &str) -> usize {
        let station_id = StationId::from(station_id);
        self.state
            .lock()
            .unwrap()
            .subscribers
            .iter()
            .filter(|(id, tx)| *id == station_id && !tx.is_closed())
            .count()
    }

    pub fn stored_config(&self, station_id: &str) -> Option<SensorsConfig> {
        let station_id = StationId::from(station_id);
        self.state
            .lock()
            .unwrap()
            .stations
            .iter()
            .find(|s| s.id == station_id)
            .map(|s| s.sensors_config.clone())
    }
}

impl Backend for FakeBackend {
    async fn list_stations(&self) -> Result<Vec<Station>> {
        Ok(self.state.lock().unwrap().stations.clone())
    }

    async fn query_measurements(
        &self,
        station_id: &StationId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Measurement>> {
        let gate = self.state.lock().unwrap().gates.remove(station_id);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let state = self.state.lock().unwrap();
        if state.failing_queries.contains(station_id) {
            bail!("query timed out: {station_id}");
        }

        let mut measurements: Vec<Measurement> = state
            .measurements
            .iter()
            .filter(|m| m.station_id == *station_id && m.created_at >= since)
            .cloned()
            .collect();
        measurements.sort_by_key(|m| m.created_at);

        Ok(measurements)
    }

    async fn subscribe_inserts(&self, station_id: &StationId) -> Result<Subscription> {
        let mut state = self.state.lock().unwrap();
        if state.fail_subscriptions {
            bail!("connection refused");
        }

        let (tx, rx) = mpsc::unbounded_channel();
        state.subscribers.push((station_id.clone(), tx));

        Ok(Subscription::new(station_id.clone(), rx, None))
    }

    async fn update_station_config(
        &self,
        station_id: &StationId,
        config: &SensorsConfig,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_updates {
            bail!("permission denied");
        }

        let Some(station) = state.stations.iter_mut().find(|s| s.id == *station_id) else {
            bail!("station not found: {station_id}");
        };
        station.sensors_config = config.clone();

        Ok(())
    }
}

pub fn station(id: &str) -> Station {
    Station {
        id: StationId::from(id),
        name: format!("Station {id}"),
        sensors_config: SensorsConfig::new(),
    }
}

/// A reading of `station_id` taken `minutes_ago` before now.
pub fn reading(station_id: &str, minutes_ago: i64, temperature: f64) -> Measurement {
    Measurement {
        station_id: StationId::from(station_id),
        created_at: Utc::now() - TimeDelta::minutes(minutes_ago),
        temperature,
        humidity: 75.0,
        battery_voltage: Some(3.9),
        signal_strength: Some(18),
    }
}
