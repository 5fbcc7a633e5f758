use chrono::{DateTime, Utc};

use crate::{
    calibration::{CalibratedMeasurement, Calibration, calibrate_series},
    feed::LoadState,
    model::{Measurement, Station, StationId},
    series::{Series, SeriesSummary, aggregate},
    status::DerivedStatus,
};

pub const PLACEHOLDER: &str = "--";

/// Everything the dashboard shows for one station at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct StationOverview {
    pub station_id: StationId,

    pub station_name: String,

    pub calibration: Calibration,

    pub series: Series,

    pub status: DerivedStatus,

    pub load: LoadState,

    /// The offline banner is only worth showing once there is data to be
    /// stale; an empty station is already obvious.
    pub show_offline_banner: bool,
}

impl StationOverview {
    pub fn build(
        station: &Station,
        measurements: &[Measurement],
        load: &LoadState,
        now: DateTime<Utc>,
    ) -> Self {
        let series = aggregate(calibrate_series(measurements, &station.sensors_config));
        let status = DerivedStatus::derive(series.latest(), now);

        Self {
            station_id: station.id.clone(),
            station_name: station.name.clone(),
            calibration: Calibration::from_config(&station.sensors_config),
            show_offline_banner: status.offline && !series.is_empty(),
            series,
            status,
            load: load.clone(),
        }
    }

    pub fn latest(&self) -> Option<&CalibratedMeasurement> {
        self.series.latest()
    }

    pub fn summary(&self) -> SeriesSummary {
        self.series.summary()
    }
}

pub fn format_temperature(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{v:.1}°C"))
}

pub fn format_humidity(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{v:.0}%"))
}

pub fn format_voltage(value: Option<f64>) -> String {
    value
        .filter(|v| *v != 0.0)
        .map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{v:.2} V"))
}

pub fn format_percentage(value: Option<u8>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{v}%"))
}

pub fn format_csq(value: Option<u8>) -> String {
    match value {
        Some(v) => format!("CSQ: {v}/31"),
        None => format!("CSQ: {PLACEHOLDER}/31"),
    }
}

/// `None` when no correction is applied, so no badge is shown.
pub fn format_offset(offset: f64, unit: &str) -> Option<String> {
    if offset == 0.0 {
        return None;
    }

    Some(if offset > 0.0 {
        format!("+{offset}{unit}")
    } else {
        format!("{offset}{unit}")
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::model::{HUMIDITY_SENSOR_KEY, SensorsConfig, TEMPERATURE_SENSOR_KEY};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 20, 6, 0, 0).unwrap()
    }

    fn station() -> Station {
        let mut sensors_config = SensorsConfig::new();
        sensors_config.insert(TEMPERATURE_SENSOR_KEY, "Air", -0.5);
        sensors_config.insert(HUMIDITY_SENSOR_KEY, "RH", 3.0);

        Station {
            id: StationId::from("orchard-1"),
            name: "North orchard".to_string(),
            sensors_config,
        }
    }

    fn measurement(minutes_ago: i64, temperature: f64, humidity: f64) -> Measurement {
        Measurement {
            station_id: StationId::from("orchard-1"),
            created_at: now() - TimeDelta::minutes(minutes_ago),
            temperature,
            humidity,
            battery_voltage: Some(3.7),
            signal_strength: Some(9),
        }
    }

    #[test]
    fn empty_station_shows_placeholders_without_banner() {
        let overview = StationOverview::build(&station(), &[], &LoadState::Ready, now());

        assert!(overview.status.offline);
        assert!(!overview.show_offline_banner);
        assert_eq!(overview.latest(), None);
        assert_eq!(overview.summary().min_temperature, None);
        assert_eq!(format_temperature(overview.summary().min_temperature), PLACEHOLDER);
    }

    #[test]
    fn stale_station_shows_banner() {
        let measurements = [measurement(45, 8.0, 70.0)];
        let overview = StationOverview::build(&station(), &measurements, &LoadState::Ready, now());

        assert!(overview.show_offline_banner);
    }

    #[test]
    fn builds_from_calibrated_series() {
        let measurements = [
            measurement(20, 3.5, 80.0),
            measurement(10, 2.0, 84.0),
            measurement(0, 2.9, 90.0),
        ];
        let overview = StationOverview::build(&station(), &measurements, &LoadState::Ready, now());

        let latest = overview.latest().unwrap();
        assert_eq!(latest.temperature, 2.4);
        assert_eq!(latest.raw_temperature, 2.9);
        assert_eq!(latest.humidity, 93.0);

        assert!(overview.status.frost_warning);
        assert!(!overview.status.fungal_risk);
        assert!(!overview.show_offline_banner);
        assert_eq!(overview.summary().min_temperature, Some(1.5));
        assert_eq!(overview.summary().max_temperature, Some(3.0));
        assert_eq!(overview.status.battery_percentage, Some(50));
    }

    #[test]
    fn formats_readings() {
        assert_eq!(format_temperature(Some(2.449)), "2.4°C");
        assert_eq!(format_humidity(Some(84.6)), "85%");
        assert_eq!(format_voltage(Some(3.7)), "3.70 V");
        assert_eq!(format_voltage(None), PLACEHOLDER);
        assert_eq!(format_percentage(Some(50)), "50%");
        assert_eq!(format_csq(Some(14)), "CSQ: 14/31");
        assert_eq!(format_csq(None), "CSQ: --/31");
    }

    #[test]
    fn formats_offsets_with_sign() {
        assert_eq!(format_offset(0.0, "°C"), None);
        assert_eq!(format_offset(0.5, "°C").as_deref(), Some("+0.5°C"));
        assert_eq!(format_offset(-1.2, "%").as_deref(), Some("-1.2%"));
    }
}
