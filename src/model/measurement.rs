use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::StationId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub station_id: StationId,

    pub created_at: DateTime<Utc>,

    pub temperature: f64,

    pub humidity: f64,

    pub battery_voltage: Option<f64>,

    /// CSQ, 0-31. `None` and `Some(0)` both mean no signal.
    pub signal_strength: Option<u8>,
}
