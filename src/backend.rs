use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::info;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::model::{Measurement, SensorsConfig, Station, StationId};

/// Hosted data store holding stations and their measurements.
pub trait Backend: Send + Sync {
    fn list_stations(&self) -> impl Future<Output = Result<Vec<Station>>> + Send;

    /// Measurements of `station_id` captured at or after `since`, oldest first.
    fn query_measurements(
        &self,
        station_id: &StationId,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Measurement>>> + Send;

    /// Delivers every measurement inserted for `station_id` from now on.
    fn subscribe_inserts(
        &self,
        station_id: &StationId,
    ) -> impl Future<Output = Result<Subscription>> + Send;

    fn update_station_config(
        &self,
        station_id: &StationId,
        config: &SensorsConfig,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Live-insert feed for one station. Dropping it releases it too.
#[derive(Debug)]
pub struct Subscription {
    station_id: StationId,
    receiver: mpsc::UnboundedReceiver<Measurement>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(
        station_id: StationId,
        receiver: mpsc::UnboundedReceiver<Measurement>,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            station_id,
            receiver,
            task,
        }
    }

    pub fn station_id(&self) -> &StationId {
        &self.station_id
    }

    /// `None` once the backend stops delivering.
    pub async fn recv(&mut self) -> Option<Measurement> {
        self.receiver.recv().await
    }

    pub fn release(mut self) {
        self.shutdown();
        info!("released insert subscription: {}", self.station_id);
    }

    fn shutdown(&mut self) {
        self.receiver.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.shutdown();
    }
}
