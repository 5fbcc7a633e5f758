use std::pin::pin;

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use sqlx::{
    FromRow, PgPool,
    postgres::{PgListener, PgPoolOptions},
    types::Json,
};
use tokio::sync::mpsc;
use tokio_stream::StreamExt as _;
use uuid::Uuid;

use crate::{
    auth::{Authenticator, Credentials, User},
    backend::{Backend, Subscription},
    model::{Measurement, SensorsConfig, Station, StationId},
};

/// Channel the insert trigger in `migrations/0001_init.sql` notifies on.
pub const MEASUREMENT_INSERTED_CHANNEL: &str = "measurement_inserted";

const MAX_CONNECTIONS: u32 = 5;

pub async fn new_pool(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .context("failed to connect to database")
}

#[derive(Debug, FromRow)]
struct StationRow {
    id: String,
    name: String,
    sensors_config: Option<Json<SensorsConfig>>,
}

impl From<StationRow> for Station {
    fn from(row: StationRow) -> Self {
        Station {
            id: StationId::from(row.id),
            name: row.name,
            sensors_config: row.sensors_config.map(|c| c.0).unwrap_or_default(),
        }
    }
}

/// A `measurements` row, as selected or as sent by the insert trigger.
#[derive(Debug, FromRow, Deserialize)]
struct MeasurementRow {
    station_id: String,
    created_at: DateTime<Utc>,
    temperature: f64,
    humidity: f64,
    battery_voltage: Option<f64>,
    signal_strength: Option<i16>,
}

impl From<MeasurementRow> for Measurement {
    fn from(row: MeasurementRow) -> Self {
        Measurement {
            station_id: StationId::from(row.station_id),
            created_at: row.created_at,
            temperature: row.temperature,
            humidity: row.humidity,
            battery_voltage: row.battery_voltage,
            signal_strength: row.signal_strength.and_then(|v| u8::try_from(v).ok()),
        }
    }
}

#[derive(Debug, FromRow)]
struct CredentialsRow {
    id: Uuid,
    email: String,
    password_hash: String,
}

#[derive(Debug, Clone)]
pub struct PgBackend {
    pool: PgPool,
}

impl PgBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        Ok(Self::new(new_pool(database_url).await?))
    }
}

impl Backend for PgBackend {
    async fn list_stations(&self) -> Result<Vec<Station>> {
        let rows: Vec<StationRow> =
            sqlx::query_as("SELECT id, name, sensors_config FROM stations ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .context("failed to fetch stations")?;

        Ok(rows.into_iter().map(Station::from).collect())
    }

    async fn query_measurements(
        &self,
        station_id: &StationId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Measurement>> {
        let rows: Vec<MeasurementRow> = sqlx::query_as(
            r#"
            SELECT station_id, created_at, temperature, humidity, battery_voltage, signal_strength
            FROM measurements
            WHERE station_id = $1 AND created_at >= $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(station_id.as_str())
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to fetch measurements: {station_id}"))?;

        Ok(rows.into_iter().map(Measurement::from).collect())
    }

    async fn subscribe_inserts(&self, station_id: &StationId) -> Result<Subscription> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .context("failed to connect notification listener")?;
        listener
            .listen(MEASUREMENT_INSERTED_CHANNEL)
            .await
            .with_context(|| format!("failed to listen on {MEASUREMENT_INSERTED_CHANNEL}"))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let wanted = station_id.clone();

        let task = tokio::spawn(async move {
            let mut notifications = pin!(listener.into_stream());

            while let Some(notification) = notifications.next().await {
                let notification = match notification {
                    Ok(n) => n,
                    Err(err) => {
                        warn!("notification listener failed: {wanted}: {err:#}");
                        break;
                    }
                };

                let row: MeasurementRow = match serde_json::from_str(notification.payload()) {
                    Ok(row) => row,
                    Err(err) => {
                        warn!(
                            "failed to decode insert notification: {}: {err}",
                            notification.payload()
                        );
                        continue;
                    }
                };

                let measurement = Measurement::from(row);
                if measurement.station_id != wanted {
                    continue;
                }

                debug!("insert: {} at {}", measurement.station_id, measurement.created_at);
                if tx.send(measurement).is_err() {
                    break;
                }
            }
        });

        Ok(Subscription::new(station_id.clone(), rx, Some(task)))
    }

    async fn update_station_config(
        &self,
        station_id: &StationId,
        config: &SensorsConfig,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE stations SET sensors_config = $1 WHERE id = $2")
            .bind(Json(config))
            .bind(station_id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to update sensors config: {station_id}"))?;

        if result.rows_affected() == 0 {
            bail!("station not found: {station_id}");
        }

        Ok(())
    }
}

impl Authenticator for PgBackend {
    async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>> {
        let row: Option<CredentialsRow> =
            sqlx::query_as("SELECT id, email, password_hash FROM app_users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .context("failed to fetch user credentials")?;

        Ok(row.map(|row| Credentials {
            user: User {
                id: row.id,
                email: row.email,
            },
            password_hash: row.password_hash,
        }))
    }
}
