use serde::Serialize;
use tracing::{debug, info};

use crate::{
    analyze, decode, Alert, DecodedReport, Minima, RunwayHeading, TrendResult, WindComponents,
};

/// A batch of reports for one look at the weather, oldest first, plus an
/// optional forecast that is carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Briefing {
    reports: Vec<DecodedReport>,
    forecast: Option<String>,
}

/// Derived values for one report of a briefing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment<'a> {
    pub report: &'a DecodedReport,
    pub components: Option<WindComponents>,
    pub alerts: Vec<Alert>,
}

impl Briefing {
    /// Decode every line. Lines must already be ordered oldest first and free
    /// of duplicates.
    pub fn new<I, S>(raws: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let reports: Vec<_> = raws.into_iter().map(|raw| decode(raw.as_ref())).collect();
        info!(reports = reports.len(), "decoded briefing");
        Self {
            reports,
            forecast: None,
        }
    }

    pub fn with_forecast(mut self, forecast: impl Into<String>) -> Self {
        let forecast = forecast.into();
        if forecast.trim().is_empty() {
            debug!("ignoring empty forecast");
        } else {
            self.forecast = Some(forecast);
        }
        self
    }

    pub fn reports(&self) -> &[DecodedReport] {
        &self.reports
    }

    pub fn latest(&self) -> Option<&DecodedReport> {
        self.reports.last()
    }

    pub fn forecast(&self) -> Option<&str> {
        self.forecast.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn assess(&self, minima: &Minima, runway: Option<RunwayHeading>) -> Vec<Assessment<'_>> {
        self.reports
            .iter()
            .map(|report| Assessment {
                report,
                components: report.wind_components(runway),
                alerts: minima.evaluate(report, runway),
            })
            .collect()
    }

    pub fn trend(&self) -> Option<TrendResult> {
        analyze(&self.reports)
    }
}
