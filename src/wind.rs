use std::{fmt, num::ParseIntError, str::FromStr};

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindDirection {
    /// `VRB` in the wind group.
    Variable,
    /// Taken verbatim from the report, no range check.
    Degrees(u16),
}

impl WindDirection {
    pub fn bearing(self) -> Option<u16> {
        match self {
            Self::Variable => None,
            Self::Degrees(degrees) => Some(degrees),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindObservation {
    pub direction: WindDirection,
    pub speed_kt: u16,
    pub gust_kt: Option<u16>,
}

impl WindObservation {
    /// A reported calm wind, as opposed to a report without any wind group.
    pub fn is_calm(&self) -> bool {
        self.speed_kt == 0 && self.gust_kt.is_none()
    }

    /// Headwind and crosswind relative to a runway.
    ///
    /// Returns `None` when the wind is variable since there is no bearing to
    /// project. The angle between wind and runway is folded into `[0°, 180°]`,
    /// so the crosswind carries no side-of-centerline information.
    pub fn components(&self, runway: RunwayHeading) -> Option<WindComponents> {
        let direction = self.direction.bearing()?;
        let mut delta = (f64::from(direction) - f64::from(runway.degrees())).abs() % 360.0;
        if delta > 180.0 {
            delta = 360.0 - delta;
        }
        let speed = f64::from(self.speed_kt);
        let delta = delta.to_radians();

        Some(WindComponents {
            headwind_kt: speed * delta.cos(),
            crosswind_kt: speed * delta.sin(),
        })
    }
}

impl fmt::Display for WindObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            WindDirection::Variable => write!(f, "VRB {}kt", self.speed_kt)?,
            WindDirection::Degrees(degrees) => write!(f, "{degrees}@{}kt", self.speed_kt)?,
        }
        if let Some(gust) = self.gust_kt {
            write!(f, " G{gust}")?;
        }
        Ok(())
    }
}

/// Recomputed for every (wind, runway) pair, never stored on a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindComponents {
    pub headwind_kt: f64,
    pub crosswind_kt: f64,
}

/// Magnetic heading of a runway centerline.
///
/// Both 0 and 360 mean due north. "No runway given" is expressed by the
/// caller with `Option<RunwayHeading>`, never by a magic heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunwayHeading(u16);

#[derive(Debug, Error, Diagnostic)]
pub enum HeadingError {
    #[error("Runway heading is not a number: {0}")]
    #[diagnostic(code(metar::heading::not_a_number))]
    NotANumber(#[from] ParseIntError),
    #[error("Runway heading out of range: {0}")]
    #[diagnostic(
        code(metar::heading::out_of_range),
        help("headings go from 0 to 360 degrees")
    )]
    OutOfRange(u16),
}

impl RunwayHeading {
    pub fn new(degrees: u16) -> Result<Self, HeadingError> {
        if degrees > 360 {
            return Err(HeadingError::OutOfRange(degrees));
        }
        Ok(Self(degrees))
    }

    pub fn degrees(self) -> u16 {
        self.0
    }

    pub fn is_due_north(self) -> bool {
        self.0 == 0 || self.0 == 360
    }
}

impl FromStr for RunwayHeading {
    type Err = HeadingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim().parse()?)
    }
}
