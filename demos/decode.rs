//! Decode the METAR lines given on the command line, oldest first.
//!
//! ```text
//! cargo run --example decode -- "KJFK 121851Z 20020KT 1 1/2SM -RA BR OVC008"
//! RUNWAY=220 MINIMA=minima.toml cargo run --example decode -- "..." "..."
//! ```

use metar::{Briefing, Minima, RunwayHeading};
use miette::{Context, IntoDiagnostic};
use tracing_subscriber::EnvFilter;

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let runway = match std::env::var("RUNWAY") {
        Ok(runway) => Some(runway.parse::<RunwayHeading>()?),
        Err(_) => None,
    };
    let minima = match std::env::var("MINIMA") {
        Ok(path) => {
            let file = std::fs::read_to_string(&path)
                .into_diagnostic()
                .wrap_err_with(|| format!("reading {path}"))?;
            Minima::from_toml_str(&file)?
        }
        Err(_) => Minima::default(),
    };

    let mut briefing = Briefing::new(std::env::args().skip(1));
    if let Ok(forecast) = std::env::var("TAF") {
        briefing = briefing.with_forecast(forecast);
    }
    if briefing.is_empty() {
        miette::bail!("no METAR given");
    }

    for (i, assessment) in briefing.assess(&minima, runway).iter().enumerate() {
        let report = assessment.report;
        println!("=== METAR {} ===\n{}", i + 1, report.raw);
        println!(
            "Station: {} @ {}",
            report.station,
            report.timestamp.as_deref().unwrap_or("N/A")
        );

        match (report.wind, assessment.components) {
            (Some(wind), Some(components)) => println!(
                "- Wind: {wind} | headwind {:.1} kt, crosswind {:.1} kt",
                components.headwind_kt,
                components.crosswind_kt.abs()
            ),
            (Some(wind), None) => println!("- Wind: {wind}"),
            (None, _) => println!("- Wind: N/A"),
        }
        match report.visibility_sm {
            Some(visibility) => println!("- Visibility: {visibility:.1} SM"),
            None => println!("- Visibility: N/A"),
        }
        match report.ceiling {
            Some(ceiling) => println!("- Ceiling: {} ft {}", ceiling.height_ft, ceiling.layer),
            None => println!("- Ceiling: none reported"),
        }
        if report.phenomena.is_empty() {
            println!("- Weather: none significant");
        } else {
            let names: Vec<_> = report.phenomena.iter().map(|p| p.name()).collect();
            println!("- Weather: {}", names.join(", "));
        }
        for alert in &assessment.alerts {
            println!("! {alert}");
        }
        println!();
    }

    if let Some(forecast) = briefing.forecast() {
        println!("=== TAF (raw) ===\n{forecast}\n");
    }

    if let Some(trend) = briefing.trend() {
        println!("=== Trend (oldest -> latest) ===");
        if let Some(visibility) = trend.visibility {
            println!(
                "- Visibility: {} ({:.1} -> {:.1} SM)",
                visibility.tendency, visibility.from, visibility.to
            );
        }
        if let Some(ceiling) = trend.ceiling {
            println!(
                "- Ceiling: {} ({} -> {} ft)",
                ceiling.tendency, ceiling.from, ceiling.to
            );
        }
        if let Some(shift) = trend.wind_direction {
            println!(
                "- Wind: {} -> {} deg (shift {} deg)",
                shift.from, shift.to, shift.delta_deg
            );
        }
    }

    Ok(())
}
