use std::fmt::{self, Write as _};

use agro_stations::{
    feed::LoadState,
    model::TimeRange,
    overview::{
        PLACEHOLDER, StationOverview, format_csq, format_humidity, format_offset,
        format_percentage, format_temperature, format_voltage,
    },
    status::OFFLINE_AFTER_MINUTES,
};
use chrono_tz::Tz;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn render(
    overview: &StationOverview,
    range: TimeRange,
    timezone: Tz,
) -> Result<String, fmt::Error> {
    let mut out = String::new();
    let latest = overview.latest();
    let summary = overview.summary();
    let status = &overview.status;

    let updated_at = latest.map_or_else(
        || PLACEHOLDER.to_string(),
        |m| m.created_at.with_timezone(&timezone).format(TIMESTAMP_FORMAT).to_string(),
    );

    writeln!(
        out,
        "== {} ({}) | range {} | updated {}",
        overview.station_name,
        overview.station_id,
        range.as_str(),
        updated_at
    )?;

    match &overview.load {
        LoadState::Loading => {
            writeln!(out, "loading measurements...")?;
        }
        LoadState::Failed(reason) => {
            writeln!(out, "!! history unavailable: {reason}")?;
        }
        LoadState::Ready if overview.series.is_empty() => {
            writeln!(out, "no measurements in the last {}", range.as_str())?;
        }
        LoadState::Ready => {}
    }

    if overview.show_offline_banner {
        writeln!(
            out,
            "!! station offline: last measurement is older than {OFFLINE_AFTER_MINUTES} minutes"
        )?;
    }

    writeln!(
        out,
        "temperature  {:>8}  min {} max {}  {}{}",
        format_temperature(latest.map(|m| m.temperature)),
        format_temperature(summary.min_temperature),
        format_temperature(summary.max_temperature),
        if status.frost_warning {
            "frost risk!"
        } else {
            "conditions optimal"
        },
        badge(
            overview.calibration.temperature_offset,
            "°C",
            format_temperature(latest.map(|m| m.raw_temperature))
        ),
    )?;

    writeln!(
        out,
        "humidity     {:>8}  {}{}",
        format_humidity(latest.map(|m| m.humidity)),
        if status.fungal_risk {
            "high fungal infection risk!"
        } else {
            "no threats"
        },
        badge(
            overview.calibration.humidity_offset,
            "%",
            format_humidity(latest.map(|m| m.raw_humidity))
        ),
    )?;

    writeln!(
        out,
        "battery      {:>8}  {} ({})",
        format_percentage(status.battery_percentage),
        format_voltage(latest.and_then(|m| m.battery_voltage)),
        status.battery_status.as_str(),
    )?;

    writeln!(
        out,
        "signal       {:>8}  {}",
        status.signal.as_str(),
        format_csq(latest.and_then(|m| m.signal_strength)),
    )?;

    writeln!(out, "chart points {:>8}", overview.series.len())?;

    Ok(out)
}

fn badge(offset: f64, unit: &str, raw: String) -> String {
    match format_offset(offset, unit) {
        Some(offset) => format!("  [correction {offset}, raw {raw}]"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use agro_stations::model::{
        Measurement, SensorsConfig, Station, StationId, TEMPERATURE_SENSOR_KEY,
    };
    use chrono::{TimeDelta, TimeZone, Utc};

    use super::*;

    fn station() -> Station {
        let mut sensors_config = SensorsConfig::new();
        sensors_config.insert(TEMPERATURE_SENSOR_KEY, "Air", 0.5);

        Station {
            id: StationId::from("orchard-1"),
            name: "North orchard".to_string(),
            sensors_config,
        }
    }

    #[test]
    fn renders_placeholders_while_loading() {
        let now = Utc.with_ymd_and_hms(2026, 4, 20, 6, 0, 0).unwrap();
        let overview = StationOverview::build(&station(), &[], &LoadState::Loading, now);

        let text = render(&overview, TimeRange::Hours24, chrono_tz::UTC).unwrap();

        assert!(text.contains("loading measurements..."));
        assert!(text.contains("updated --"));
        assert!(!text.contains("station offline"));
    }

    #[test]
    fn renders_offline_station_with_correction() {
        let now = Utc.with_ymd_and_hms(2026, 4, 20, 6, 0, 0).unwrap();
        let measurements = [Measurement {
            station_id: StationId::from("orchard-1"),
            created_at: now - TimeDelta::hours(2),
            temperature: 1.5,
            humidity: 88.0,
            battery_voltage: Some(3.4),
            signal_strength: Some(0),
        }];
        let overview =
            StationOverview::build(&station(), &measurements, &LoadState::Ready, now);

        let text = render(&overview, TimeRange::Hours12, chrono_tz::Europe::Warsaw).unwrap();

        assert!(text.contains("updated 2026-04-20 06:00:00"));
        assert!(text.contains("station offline"));
        assert!(text.contains("frost risk!"));
        assert!(text.contains("[correction +0.5°C, raw 1.5°C]"));
        assert!(text.contains("(warning)"));
        assert!(text.contains("no signal"));
    }
}
