//! Collect the last METARs of a station from the NOAA hourly cycle files and
//! print them oldest first, ready to be fed to the `decode` example.
//!
//! ```text
//! cargo run --example retrieve-history -- KJFK 6
//! ```

use miette::IntoDiagnostic;
use time::OffsetDateTime;

const BASE_URL: &str = "https://tgftp.nws.noaa.gov/data/observations/metar/cycles";
const MAX_HOURS: i64 = 48;

fn main() -> miette::Result<()> {
    let mut args = std::env::args().skip(1);
    let station = args
        .next()
        .ok_or_else(|| miette::miette!("Missing station"))?
        .to_ascii_uppercase();
    let wanted: usize = match args.next() {
        Some(count) => count.parse().into_diagnostic()?,
        None => 6,
    };

    let prefix = format!("{station} ");
    let now = OffsetDateTime::now_utc();
    let mut collected: Vec<String> = Vec::new();

    for back in 0..MAX_HOURS {
        if collected.len() >= wanted {
            break;
        }
        let hour = (now - time::Duration::hours(back)).hour();
        let url = format!("{BASE_URL}/{hour:02}Z.TXT");
        let cycle = match ureq::get(&url).call() {
            Ok(response) => response.into_string().into_diagnostic()?,
            Err(e) => {
                eprintln!("Could not fetch cycle {hour:02}Z with url: `{url}`. {e}");
                continue;
            }
        };

        for line in cycle.lines().map(str::trim) {
            if collected.len() >= wanted {
                break;
            }
            if line.starts_with(&prefix) && !collected.iter().any(|known| known == line) {
                collected.push(line.to_string());
            }
        }
    }

    if collected.is_empty() {
        miette::bail!("No METAR found for {station}");
    }

    // cycles were walked newest first
    for line in collected.iter().rev() {
        println!("{line}");
    }

    Ok(())
}
