use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::calibration::CalibratedMeasurement;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeriesSummary {
    pub min_temperature: Option<f64>,

    pub max_temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub created_at: DateTime<Utc>,

    pub temperature: f64,

    pub humidity: f64,
}

/// Calibrated readings in capture order plus their temperature range.
///
/// Input must already be sorted by `created_at` ascending; nothing here
/// re-sorts it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    points: Vec<CalibratedMeasurement>,

    summary: SeriesSummary,
}

impl Series {
    pub fn points(&self) -> &[CalibratedMeasurement] {
        &self.points
    }

    pub fn summary(&self) -> SeriesSummary {
        self.summary
    }

    pub fn latest(&self) -> Option<&CalibratedMeasurement> {
        self.points.last()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn chart_points(&self) -> impl Iterator<Item = ChartPoint> + '_ {
        self.points.iter().map(|p| ChartPoint {
            created_at: p.created_at,
            temperature: p.temperature,
            humidity: p.humidity,
        })
    }

    pub fn into_points(self) -> Vec<CalibratedMeasurement> {
        self.points
    }
}

pub fn aggregate(points: Vec<CalibratedMeasurement>) -> Series {
    let temperatures = points.iter().map(|p| p.temperature);
    let summary = SeriesSummary {
        min_temperature: temperatures.clone().reduce(f64::min),
        max_temperature: temperatures.reduce(f64::max),
    };

    Series { points, summary }
}
