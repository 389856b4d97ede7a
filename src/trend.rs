use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::DecodedReport;

/// Minimal change, in the field's own unit, still treated as flat.
const TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tendency {
    Improving,
    Worsening,
    Steady,
}

impl Tendency {
    /// Higher is better for both visibility and ceiling.
    pub fn classify(delta: f64) -> Self {
        if delta > TOLERANCE {
            Self::Improving
        } else if delta < -TOLERANCE {
            Self::Worsening
        } else {
            Self::Steady
        }
    }
}

impl fmt::Display for Tendency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Improving => "improving",
            Self::Worsening => "worsening",
            Self::Steady => "steady",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Change<T> {
    pub from: T,
    pub to: T,
    pub tendency: Tendency,
}

impl<T: Copy + Into<f64>> Change<T> {
    fn between(from: T, to: T) -> Self {
        Self {
            from,
            to,
            tendency: Tendency::classify(to.into() - from.into()),
        }
    }
}

/// Wind direction change. A bearing shift is neither good nor bad, so there
/// is no tendency, only the raw difference (not wrapped around north).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectionShift {
    pub from: u16,
    pub to: u16,
    pub delta_deg: i32,
}

impl DirectionShift {
    fn between(from: u16, to: u16) -> Self {
        Self {
            from,
            to,
            delta_deg: i32::from(to) - i32::from(from),
        }
    }
}

/// Each field is only present when both the oldest and newest report carry it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendResult {
    pub visibility: Option<Change<f64>>,
    pub ceiling: Option<Change<u32>>,
    pub wind_direction: Option<DirectionShift>,
}

/// Compare the oldest and the newest of `reports`.
///
/// `reports` must be ordered oldest first. Reports in between are not looked
/// at. Returns `None` for fewer than two reports.
pub fn analyze(reports: &[DecodedReport]) -> Option<TrendResult> {
    let (first, last) = match reports {
        [first, .., last] => (first, last),
        _ => {
            debug!(reports = reports.len(), "not enough reports for a trend");
            return None;
        }
    };

    Some(TrendResult {
        visibility: first
            .visibility_sm
            .zip(last.visibility_sm)
            .map(|(from, to)| Change::between(from, to)),
        ceiling: first
            .ceiling
            .zip(last.ceiling)
            .map(|(from, to)| Change::between(from.height_ft, to.height_ft)),
        wind_direction: first
            .wind_direction()
            .zip(last.wind_direction())
            .map(|(from, to)| DirectionShift::between(from, to)),
    })
}
