//! Plot the lowest visibility of each day from a file of METAR lines.
//!
//! ```text
//! cargo run --example plot-visibility -- 2024 3 KJFK-2024-03.txt
//! ```

use std::collections::BTreeMap;

use metar::decode;
use miette::IntoDiagnostic;
use plotters::prelude::*;
use time::{Date, Month};

fn main() -> miette::Result<()> {
    let mut args = std::env::args().skip(1);
    let year: i32 = args
        .next()
        .ok_or_else(|| miette::miette!("Missing year"))?
        .parse()
        .into_diagnostic()?;
    let month: u8 = args
        .next()
        .ok_or_else(|| miette::miette!("Missing month"))?
        .parse()
        .into_diagnostic()?;
    let input = args.next().ok_or_else(|| miette::miette!("Missing filename"))?;
    let output = format!("{input}.png");

    let month = Date::from_calendar_date(year, Month::try_from(month).into_diagnostic()?, 1)
        .into_diagnostic()?;
    let input = std::fs::read_to_string(input).into_diagnostic()?;

    let mut lowest: BTreeMap<Date, f64> = BTreeMap::new();
    for report in input.lines().map(decode) {
        let (Some(observed), Some(visibility)) = (report.observation_time(), report.visibility_sm)
        else {
            continue;
        };
        let date = match observed.on(month) {
            Ok(at) => at.date(),
            Err(e) => {
                eprintln!("Skipping {}: {e}", report.raw);
                continue;
            }
        };
        lowest
            .entry(date)
            .and_modify(|low| *low = low.min(visibility))
            .or_insert(visibility);
    }

    let to_chrono = |date: Date| {
        chrono::NaiveDate::from_ymd_opt(date.year(), date.month() as u32, u32::from(date.day()))
            .ok_or_else(|| miette::miette!("Bad date {date}"))
    };
    let (Some((&first, _)), Some((&last, _))) = (lowest.first_key_value(), lowest.last_key_value())
    else {
        miette::bail!("No dated visibility in the file");
    };
    let top = lowest.values().copied().fold(0.0, f64::max);

    let root = BitMapBackend::new(&output, (1920, 1080)).into_drawing_area();
    root.fill(&WHITE).into_diagnostic()?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Visibility from {first} to {last}"),
            ("sans-serif", 100).into_font(),
        )
        .margin(5)
        .x_label_area_size(80)
        .y_label_area_size(80)
        .build_cartesian_2d(to_chrono(first)?..to_chrono(last)?, 0.0..top + 1.0)
        .into_diagnostic()?;

    chart.configure_mesh().draw().into_diagnostic()?;

    let points = lowest
        .iter()
        .map(|(&date, &visibility)| -> miette::Result<_> {
            Ok((to_chrono(date)?, visibility))
        })
        .collect::<miette::Result<Vec<_>>>()?;
    chart
        .draw_series(LineSeries::new(points, BLUE))
        .into_diagnostic()?
        .label("Lowest visibility (SM)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .into_diagnostic()?;

    root.present().into_diagnostic()?;
    println!("Wrote {output}");

    Ok(())
}
