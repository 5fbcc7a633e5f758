use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const TEMPERATURE_SENSOR_KEY: &str = "temp_air";
pub const HUMIDITY_SENSOR_KEY: &str = "humidity";

const DEFAULT_TEMPERATURE_SENSOR_NAME: &str = "Air temperature";
const DEFAULT_HUMIDITY_SENSOR_NAME: &str = "Relative humidity";
const NEW_SENSOR_NAME: &str = "New sensor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorCalibration {
    pub name: String,

    #[serde(default)]
    pub offset: f64,
}

/// Per-sensor calibration keyed by caller-defined sensor keys, in the order
/// they were entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorsConfig(IndexMap<String, SensorCalibration>);

impl SensorsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// The sensor set offered for editing when a station has no config yet.
    pub fn defaults() -> Self {
        let mut config = Self::new();
        config.insert(TEMPERATURE_SENSOR_KEY, DEFAULT_TEMPERATURE_SENSOR_NAME, 0.0);
        config.insert(HUMIDITY_SENSOR_KEY, DEFAULT_HUMIDITY_SENSOR_NAME, 0.0);
        config
    }

    pub fn or_defaults(self) -> Self {
        if self.is_empty() {
            Self::defaults()
        } else {
            self
        }
    }

    pub fn get(&self, key: &str) -> Option<&SensorCalibration> {
        self.0.get(key)
    }

    /// Offset for `key`; a missing sensor means no correction.
    pub fn offset(&self, key: &str) -> f64 {
        self.get(key).map_or(0.0, |s| s.offset)
    }

    pub fn insert(&mut self, key: impl Into<String>, name: impl Into<String>, offset: f64) {
        self.0.insert(
            key.into(),
            SensorCalibration {
                name: name.into(),
                offset,
            },
        );
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SensorCalibration)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Appends a blank sensor keyed by the creation time and returns its key.
    pub fn add_sensor(&mut self, now: DateTime<Utc>) -> String {
        let mut millis = now.timestamp_millis();
        while self.0.contains_key(&sensor_key(millis)) {
            millis += 1;
        }

        let key = sensor_key(millis);
        self.insert(key.clone(), NEW_SENSOR_NAME, 0.0);
        key
    }

    pub fn remove_sensor(&mut self, key: &str) -> Result<SensorCalibration> {
        self.0
            .shift_remove(key)
            .ok_or_else(|| anyhow!("unknown sensor: {key}"))
    }

    pub fn rename_sensor(&mut self, key: &str, name: impl Into<String>) -> Result<()> {
        self.sensor_mut(key)?.name = name.into();
        Ok(())
    }

    pub fn set_offset(&mut self, key: &str, offset: f64) -> Result<()> {
        self.sensor_mut(key)?.offset = offset;
        Ok(())
    }

    fn sensor_mut(&mut self, key: &str) -> Result<&mut SensorCalibration> {
        self.0
            .get_mut(key)
            .ok_or_else(|| anyhow!("unknown sensor: {key}"))
    }
}

fn sensor_key(millis: i64) -> String {
    format!("sensor_{millis}")
}
