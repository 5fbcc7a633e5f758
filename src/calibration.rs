use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{
    HUMIDITY_SENSOR_KEY, Measurement, SensorsConfig, StationId, TEMPERATURE_SENSOR_KEY,
};

const HUMIDITY_MIN_PERCENT: f64 = 0.0;
const HUMIDITY_MAX_PERCENT: f64 = 100.0;

/// A measurement with the station's offsets applied. The raw readings are
/// kept next to the corrected ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibratedMeasurement {
    pub station_id: StationId,

    pub created_at: DateTime<Utc>,

    pub temperature: f64,

    pub humidity: f64,

    pub raw_temperature: f64,

    pub raw_humidity: f64,

    pub battery_voltage: Option<f64>,

    pub signal_strength: Option<u8>,
}

/// Offsets resolved once per station config.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Calibration {
    pub temperature_offset: f64,

    pub humidity_offset: f64,
}

impl Calibration {
    pub fn from_config(config: &SensorsConfig) -> Self {
        Self {
            temperature_offset: config.offset(TEMPERATURE_SENSOR_KEY),
            humidity_offset: config.offset(HUMIDITY_SENSOR_KEY),
        }
    }

    pub fn apply(&self, measurement: &Measurement) -> CalibratedMeasurement {
        CalibratedMeasurement {
            station_id: measurement.station_id.clone(),
            created_at: measurement.created_at,
            temperature: measurement.temperature + self.temperature_offset,
            humidity: (measurement.humidity + self.humidity_offset)
                .clamp(HUMIDITY_MIN_PERCENT, HUMIDITY_MAX_PERCENT),
            raw_temperature: measurement.temperature,
            raw_humidity: measurement.humidity,
            battery_voltage: measurement.battery_voltage,
            signal_strength: measurement.signal_strength,
        }
    }
}

pub fn calibrate(measurement: &Measurement, config: &SensorsConfig) -> CalibratedMeasurement {
    Calibration::from_config(config).apply(measurement)
}

pub fn calibrate_series(
    measurements: &[Measurement],
    config: &SensorsConfig,
) -> Vec<CalibratedMeasurement> {
    let calibration = Calibration::from_config(config);
    measurements.iter().map(|m| calibration.apply(m)).collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn measurement(temperature: f64, humidity: f64) -> Measurement {
        Measurement {
            station_id: StationId::from("orchard-1"),
            created_at: Utc.with_ymd_and_hms(2026, 4, 20, 5, 30, 0).unwrap(),
            temperature,
            humidity,
            battery_voltage: Some(3.9),
            signal_strength: Some(18),
        }
    }

    fn config(temperature_offset: f64, humidity_offset: f64) -> SensorsConfig {
        let mut config = SensorsConfig::new();
        config.insert(TEMPERATURE_SENSOR_KEY, "Air", temperature_offset);
        config.insert(HUMIDITY_SENSOR_KEY, "RH", humidity_offset);
        config
    }

    #[test]
    fn empty_config_is_identity() {
        let m = measurement(12.3, 55.0);
        let c = calibrate(&m, &SensorsConfig::new());

        assert_eq!(c.temperature, m.temperature);
        assert_eq!(c.humidity, m.humidity);
        assert_eq!(c.raw_temperature, m.temperature);
        assert_eq!(c.raw_humidity, m.humidity);
    }

    #[test]
    fn offsets_are_added() {
        let c = calibrate(&measurement(10.0, 50.0), &config(-1.5, 4.0));

        assert_eq!(c.temperature, 8.5);
        assert_eq!(c.humidity, 54.0);
        assert_eq!(c.raw_temperature, 10.0);
        assert_eq!(c.raw_humidity, 50.0);
    }

    #[test]
    fn temperature_is_not_clamped() {
        let c = calibrate(&measurement(-30.0, 50.0), &config(-25.0, 0.0));
        assert_eq!(c.temperature, -55.0);
    }

    #[test]
    fn humidity_is_clamped_both_ways() {
        let cases = [
            (98.0, 5.0),
            (2.0, -10.0),
            (50.0, 1000.0),
            (50.0, -1000.0),
            (120.0, 0.0),
        ];
        for (raw, offset) in cases {
            let c = calibrate(&measurement(0.0, raw), &config(0.0, offset));
            assert!(
                (0.0..=100.0).contains(&c.humidity),
                "{raw} + {offset} -> {}",
                c.humidity
            );
            assert_eq!(c.raw_humidity, raw);
        }
    }

    #[test]
    fn unrelated_sensors_do_not_apply() {
        let mut other = SensorsConfig::new();
        other.insert("soil", "Soil", 7.0);

        let c = calibrate(&measurement(10.0, 50.0), &other);
        assert_eq!(c.temperature, 10.0);
        assert_eq!(c.humidity, 50.0);
    }

    #[test]
    fn diagnostics_pass_through() {
        let m = measurement(10.0, 50.0);
        let c = calibrate(&m, &config(1.0, 1.0));

        assert_eq!(c.station_id, m.station_id);
        assert_eq!(c.created_at, m.created_at);
        assert_eq!(c.battery_voltage, m.battery_voltage);
        assert_eq!(c.signal_strength, m.signal_strength);
    }
}
