use chrono::{DateTime, TimeDelta, Utc};

use crate::calibration::CalibratedMeasurement;

pub const OFFLINE_AFTER_MINUTES: i64 = 30;

pub const FROST_MAX_CELSIUS: f64 = 2.5;

pub const FUNGAL_MIN_HUMIDITY_PERCENT: f64 = 85.0;
pub const FUNGAL_MIN_CELSIUS: f64 = 10.0;

// Single 18650 cell.
pub const BATTERY_EMPTY_VOLTS: f64 = 3.2;
pub const BATTERY_FULL_VOLTS: f64 = 4.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryStatus {
    Good,
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl BatteryStatus {
    pub fn from_voltage(voltage: Option<f64>) -> Self {
        let Some(v) = present_voltage(voltage) else {
            return BatteryStatus::Unknown;
        };

        if v > 3.8 {
            BatteryStatus::Good
        } else if v > 3.5 {
            BatteryStatus::Ok
        } else if v > 3.3 {
            BatteryStatus::Warning
        } else {
            BatteryStatus::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatteryStatus::Good => "good",
            BatteryStatus::Ok => "ok",
            BatteryStatus::Warning => "warning",
            BatteryStatus::Critical => "critical",
            BatteryStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalQuality {
    NoSignal,
    Excellent,
    Good,
    Weak,
}

impl SignalQuality {
    pub fn from_csq(csq: Option<u8>) -> Self {
        match csq {
            None | Some(0) => SignalQuality::NoSignal,
            Some(v) if v >= 20 => SignalQuality::Excellent,
            Some(v) if v >= 12 => SignalQuality::Good,
            Some(_) => SignalQuality::Weak,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalQuality::NoSignal => "no signal",
            SignalQuality::Excellent => "excellent",
            SignalQuality::Good => "good",
            SignalQuality::Weak => "weak",
        }
    }
}

/// Status flags and diagnostics for the latest reading of a station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedStatus {
    pub offline: bool,

    pub frost_warning: bool,

    pub fungal_risk: bool,

    pub battery_percentage: Option<u8>,

    pub battery_status: BatteryStatus,

    pub signal: SignalQuality,
}

impl DerivedStatus {
    pub fn derive(latest: Option<&CalibratedMeasurement>, now: DateTime<Utc>) -> Self {
        let voltage = latest.and_then(|m| m.battery_voltage);

        Self {
            offline: is_offline(latest, now),
            frost_warning: is_frost_warning(latest),
            fungal_risk: is_fungal_risk(latest),
            battery_percentage: battery_percentage(voltage),
            battery_status: BatteryStatus::from_voltage(voltage),
            signal: SignalQuality::from_csq(latest.and_then(|m| m.signal_strength)),
        }
    }
}

pub fn is_offline(latest: Option<&CalibratedMeasurement>, now: DateTime<Utc>) -> bool {
    match latest {
        Some(m) => now - m.created_at > TimeDelta::minutes(OFFLINE_AFTER_MINUTES),
        None => true,
    }
}

pub fn is_frost_warning(latest: Option<&CalibratedMeasurement>) -> bool {
    latest.is_some_and(|m| m.temperature <= FROST_MAX_CELSIUS)
}

pub fn is_fungal_risk(latest: Option<&CalibratedMeasurement>) -> bool {
    latest.is_some_and(|m| {
        m.humidity >= FUNGAL_MIN_HUMIDITY_PERCENT && m.temperature >= FUNGAL_MIN_CELSIUS
    })
}

pub fn battery_percentage(voltage: Option<f64>) -> Option<u8> {
    let v = present_voltage(voltage)?;
    let percentage =
        (v - BATTERY_EMPTY_VOLTS) / (BATTERY_FULL_VOLTS - BATTERY_EMPTY_VOLTS) * 100.0;

    Some(percentage.round().clamp(0.0, 100.0) as u8)
}

// A 0 V reading comes from a station without a battery gauge.
fn present_voltage(voltage: Option<f64>) -> Option<f64> {
    voltage.filter(|v| *v != 0.0)
}
