use std::io::Write;

use agro_stations::series::Series;
use anyhow::{Context as _, Result};
use chrono_tz::Tz;
use csv::Writer;
use serde::Serialize;

const CAPTURED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize)]
struct ExportRecord {
    captured_at: String,
    temperature: f64,
    humidity: f64,
    raw_temperature: f64,
    raw_humidity: f64,
    battery_voltage: Option<f64>,
    signal_strength: Option<u8>,
}

/// Writes one row per calibrated measurement and returns the row count.
pub fn write_series<W: Write>(writer: W, series: &Series, timezone: Tz) -> Result<usize> {
    let mut writer = Writer::from_writer(writer);

    for m in series.points() {
        writer
            .serialize(ExportRecord {
                captured_at: m
                    .created_at
                    .with_timezone(&timezone)
                    .format(CAPTURED_AT_FORMAT)
                    .to_string(),
                temperature: m.temperature,
                humidity: m.humidity,
                raw_temperature: m.raw_temperature,
                raw_humidity: m.raw_humidity,
                battery_voltage: m.battery_voltage,
                signal_strength: m.signal_strength,
            })
            .with_context(|| format!("failed to write record: {}", m.created_at))?;
    }

    writer.flush().context("failed to flush CSV output")?;

    Ok(series.len())
}

#[cfg(test)]
mod tests {
    use agro_stations::{
        calibration::calibrate_series,
        model::{HUMIDITY_SENSOR_KEY, Measurement, SensorsConfig, StationId},
        series::aggregate,
    };
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn writes_header_and_calibrated_rows() {
        let mut config = SensorsConfig::new();
        config.insert(HUMIDITY_SENSOR_KEY, "RH", 5.0);

        let measurements = [Measurement {
            station_id: StationId::from("orchard-1"),
            created_at: Utc.with_ymd_and_hms(2026, 1, 10, 23, 15, 0).unwrap(),
            temperature: -3.5,
            humidity: 97.0,
            battery_voltage: None,
            signal_strength: Some(22),
        }];
        let series = aggregate(calibrate_series(&measurements, &config));

        let mut out = Vec::new();
        let rows = write_series(&mut out, &series, chrono_tz::Europe::Warsaw).unwrap();

        assert_eq!(rows, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "captured_at,temperature,humidity,raw_temperature,raw_humidity,\
             battery_voltage,signal_strength\n\
             2026-01-11 00:15:00,-3.5,100.0,-3.5,97.0,,22\n"
        );
    }

    #[test]
    fn empty_series_writes_nothing() {
        let mut out = Vec::new();
        let rows = write_series(&mut out, &aggregate(Vec::new()), chrono_tz::UTC).unwrap();

        assert_eq!(rows, 0);
        assert!(out.is_empty());
    }
}
