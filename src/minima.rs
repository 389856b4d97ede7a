use std::fmt;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{DecodedReport, RunwayHeading};

/// Go/no-go thresholds, owned by the caller.
///
/// Every field is optional in a TOML file, missing ones fall back to
/// 1000 ft, 3 SM and 15 kt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Minima {
    pub min_ceiling_ft: f64,
    pub min_visibility_sm: f64,
    pub max_crosswind_kt: f64,
}

impl Default for Minima {
    fn default() -> Self {
        Self {
            min_ceiling_ft: 1000.0,
            min_visibility_sm: 3.0,
            max_crosswind_kt: 15.0,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum MinimaError {
    #[error("Invalid {field}: {value}")]
    #[diagnostic(
        code(metar::minima::invalid),
        help("minima must be finite and non-negative")
    )]
    Invalid { field: &'static str, value: f64 },
    #[error("Bad minima file: {0}")]
    #[diagnostic(code(metar::minima::toml))]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alert {
    VisibilityBelowMinima,
    CeilingBelowMinima,
    CrosswindExceedsMinima,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VisibilityBelowMinima => "visibility below minima",
            Self::CeilingBelowMinima => "ceiling below minima",
            Self::CrosswindExceedsMinima => "crosswind exceeds minima",
        })
    }
}

impl Minima {
    pub fn new(
        min_ceiling_ft: f64,
        min_visibility_sm: f64,
        max_crosswind_kt: f64,
    ) -> Result<Self, MinimaError> {
        let minima = Self {
            min_ceiling_ft,
            min_visibility_sm,
            max_crosswind_kt,
        };
        minima.validate()?;
        Ok(minima)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, MinimaError> {
        let minima: Self = toml::from_str(s)?;
        minima.validate()?;
        Ok(minima)
    }

    fn validate(&self) -> Result<(), MinimaError> {
        for (field, value) in [
            ("min_ceiling_ft", self.min_ceiling_ft),
            ("min_visibility_sm", self.min_visibility_sm),
            ("max_crosswind_kt", self.max_crosswind_kt),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MinimaError::Invalid { field, value });
            }
        }
        Ok(())
    }

    /// Compare a report against these minima.
    ///
    /// Each check is independent. A field the report does not carry, or a
    /// crosswind that cannot be computed, yields no alert: it is not assessed,
    /// which is not the same as passing.
    pub fn evaluate(&self, report: &DecodedReport, runway: Option<RunwayHeading>) -> Vec<Alert> {
        let mut alerts = Vec::new();

        match report.visibility_sm {
            Some(visibility) if visibility < self.min_visibility_sm => {
                alerts.push(Alert::VisibilityBelowMinima)
            }
            Some(_) => (),
            None => debug!(station = %report.station, "visibility not assessed"),
        }

        match report.ceiling {
            Some(ceiling) if f64::from(ceiling.height_ft) < self.min_ceiling_ft => {
                alerts.push(Alert::CeilingBelowMinima)
            }
            Some(_) => (),
            None => debug!(station = %report.station, "ceiling not assessed"),
        }

        match report.wind_components(runway) {
            Some(components) if components.crosswind_kt.abs() > self.max_crosswind_kt => {
                alerts.push(Alert::CrosswindExceedsMinima)
            }
            Some(_) => (),
            None => debug!(station = %report.station, "crosswind not assessed"),
        }

        alerts
    }
}
