//! Decoder for routine aviation weather reports (METAR).
//!
//! Only the groups needed for a go/no-go look are decoded: wind, visibility,
//! ceiling and significant weather. Everything else on the line is ignored.
//! Decoding never fails, a group that cannot be read is simply absent from the
//! resulting [`DecodedReport`].
//!
//! ```
//! use metar::{decode, Minima, RunwayHeading};
//!
//! let report = decode("KJFK 121851Z 20020KT 1 1/2SM -RA BR OVC008");
//! assert_eq!(report.visibility_sm, Some(1.5));
//!
//! let runway = RunwayHeading::new(220).ok();
//! let alerts = Minima::default().evaluate(&report, runway);
//! assert_eq!(alerts.len(), 2);
//! ```

use std::{convert::Infallible, fmt, str::FromStr};

use logos::Logos;
use serde::Serialize;
use time::{Date, PrimitiveDateTime};
use tracing::{debug, trace, warn};

mod briefing;
mod minima;
mod trend;
mod wind;

pub use briefing::{Assessment, Briefing};
pub use minima::{Alert, Minima, MinimaError};
pub use trend::{analyze, Change, DirectionShift, Tendency, TrendResult};
pub use wind::{HeadingError, RunwayHeading, WindComponents, WindDirection, WindObservation};

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
enum Group {
    #[regex("([0-9]{3}|VRB)[0-9]{2,3}(G[0-9]{2,3})?KT")]
    Wind,
    #[regex("(OVC|BKN)[0-9]{3}")]
    Layer,
    #[regex("VV[0-9]{3}")]
    VerticalVisibility,
}

/// Visibility value in front of the `SM` unit.
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
enum Distance {
    #[regex("[0-9]+")]
    Whole,
    #[regex("[0-9]+/[0-9]+")]
    Fraction,
}

/// Lex the start of a token. The second value is the length of the lexeme.
fn lex<'a, T>(token: &'a str) -> Option<(T, usize)>
where
    T: Logos<'a, Source = str, Extras = (), Error = ()>,
{
    let mut lexer = T::lexer(token);
    let group = lexer.next()?.ok()?;
    Some((group, lexer.span().end))
}

/// Split a raw line on ASCII whitespace and uppercase every token.
pub fn tokenize(raw: &str) -> Vec<String> {
    raw.split_ascii_whitespace()
        .map(|token| token.to_ascii_uppercase())
        .collect()
}

/// First wind group of the report. Any later one (wind shear) is ignored.
fn decode_wind(tokens: &[String]) -> Option<WindObservation> {
    tokens.iter().find_map(|token| match lex::<Group>(token) {
        Some((Group::Wind, len)) if len == token.len() => parse_wind_group(token),
        _ => None,
    })
}

fn parse_wind_group(group: &str) -> Option<WindObservation> {
    let body = group.strip_suffix("KT")?;
    let (direction, rest) = body.split_at(3);
    let direction = match direction {
        "VRB" => WindDirection::Variable,
        degrees => WindDirection::Degrees(degrees.parse().ok()?),
    };
    let (speed, gust) = match rest.split_once('G') {
        Some((speed, gust)) => (speed, Some(gust.parse().ok()?)),
        None => (rest, None),
    };
    let wind = WindObservation {
        direction,
        speed_kt: speed.parse().ok()?,
        gust_kt: gust,
    };

    if wind.gust_kt.is_some_and(|gust| gust < wind.speed_kt) {
        warn!(group, "gust lower than the mean wind speed");
    }
    Some(wind)
}

enum Prefix {
    Whole(f64),
    Fraction(f64),
}

fn parse_distance(s: &str) -> Option<Prefix> {
    match lex::<Distance>(s)? {
        (_, len) if len != s.len() => None,
        (Distance::Whole, _) => s.parse().ok().map(Prefix::Whole),
        (Distance::Fraction, _) => {
            let (numerator, denominator) = s.split_once('/')?;
            let numerator: f64 = numerator.parse().ok()?;
            let denominator: f64 = denominator.parse().ok()?;
            if denominator == 0.0 {
                return None;
            }
            Some(Prefix::Fraction(numerator / denominator))
        }
    }
}

/// Handles `10SM`, `1/2SM` and the two token `1 1/2SM`.
fn decode_visibility(tokens: &[String]) -> Option<f64> {
    tokens.iter().enumerate().find_map(|(i, token)| {
        let (value, _) = token.split_once("SM")?;
        let total = match parse_distance(value) {
            Some(Prefix::Whole(whole)) => whole,
            Some(Prefix::Fraction(fraction)) => {
                let whole = i
                    .checked_sub(1)
                    .and_then(|previous| parse_distance(&tokens[previous]));
                match whole {
                    Some(Prefix::Whole(whole)) => whole + fraction,
                    _ => fraction,
                }
            }
            None => 0.0,
        };
        (total > 0.0).then_some(total)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayerCode {
    #[serde(rename = "OVC")]
    Overcast,
    #[serde(rename = "BKN")]
    Broken,
    #[serde(rename = "VV")]
    VerticalVisibility,
}

impl LayerCode {
    pub fn code(self) -> &'static str {
        match self {
            Self::Overcast => "OVC",
            Self::Broken => "BKN",
            Self::VerticalVisibility => "VV",
        }
    }
}

impl fmt::Display for LayerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ceiling {
    pub height_ft: u32,
    pub layer: LayerCode,
}

/// Lowest broken, overcast or vertical visibility layer.
///
/// `None` means no such layer was reported, which the decoder does not
/// distinguish from an unlimited ceiling.
fn decode_ceiling(tokens: &[String]) -> Option<Ceiling> {
    tokens
        .iter()
        .filter_map(|token| {
            let (group, len) = lex::<Group>(token)?;
            let layer = match group {
                Group::Layer if token.starts_with("OVC") => LayerCode::Overcast,
                Group::Layer => LayerCode::Broken,
                Group::VerticalVisibility => LayerCode::VerticalVisibility,
                Group::Wind => return None,
            };
            let hundreds: u32 = token[len - 3..len].parse().ok()?;
            Some(Ceiling {
                height_ft: hundreds * 100,
                layer,
            })
        })
        // `min_by_key` keeps the first of equal layers
        .min_by_key(|ceiling| ceiling.height_ft)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phenomenon {
    Thunderstorm,
    Rain,
    Drizzle,
    Snow,
    #[serde(rename = "snow grains")]
    SnowGrains,
    #[serde(rename = "ice pellets")]
    IcePellets,
    Fog,
    Mist,
    Haze,
    Smoke,
    Showers,
}

const PHENOMENA: &[(&[u8; 2], Phenomenon)] = &[
    (b"TS", Phenomenon::Thunderstorm),
    (b"RA", Phenomenon::Rain),
    (b"DZ", Phenomenon::Drizzle),
    (b"SN", Phenomenon::Snow),
    (b"SG", Phenomenon::SnowGrains),
    (b"PL", Phenomenon::IcePellets),
    (b"FG", Phenomenon::Fog),
    (b"BR", Phenomenon::Mist),
    (b"HZ", Phenomenon::Haze),
    (b"FU", Phenomenon::Smoke),
    (b"SH", Phenomenon::Showers),
];

impl Phenomenon {
    pub fn from_code(code: &str) -> Option<Self> {
        PHENOMENA
            .iter()
            .find(|(known, _)| known.as_slice() == code.as_bytes())
            .map(|&(_, phenomenon)| phenomenon)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Thunderstorm => "thunderstorm",
            Self::Rain => "rain",
            Self::Drizzle => "drizzle",
            Self::Snow => "snow",
            Self::SnowGrains => "snow grains",
            Self::IcePellets => "ice pellets",
            Self::Fog => "fog",
            Self::Mist => "mist",
            Self::Haze => "haze",
            Self::Smoke => "smoke",
            Self::Showers => "showers",
        }
    }
}

impl fmt::Display for Phenomenon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every known two letter code found anywhere inside a token.
///
/// Substring matching means `+TSRA` yields thunderstorm and rain, but also
/// that a token which merely contains a code (a station identifier for
/// instance) yields that phenomenon.
fn decode_phenomena(tokens: &[String]) -> Vec<Phenomenon> {
    let mut found: Vec<Phenomenon> = Vec::new();
    for token in tokens {
        for pair in token.as_bytes().windows(2) {
            let Some(&(_, phenomenon)) = PHENOMENA.iter().find(|(code, _)| code.as_slice() == pair)
            else {
                continue;
            };
            if !found.contains(&phenomenon) {
                found.push(phenomenon);
            }
        }
    }
    found
}

/// Day of month and UTC time of a `DDHHMMZ` timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ObservationTime {
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl ObservationTime {
    pub fn parse(timestamp: &str) -> Option<Self> {
        let digits = timestamp.strip_suffix('Z')?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            day: digits[0..2].parse().ok()?,
            hour: digits[2..4].parse().ok()?,
            minute: digits[4..6].parse().ok()?,
        })
    }

    /// Anchor the observation to the month (and year) of `month`.
    pub fn on(self, month: Date) -> Result<PrimitiveDateTime, time::error::ComponentRange> {
        month
            .replace_day(self.day)?
            .with_hms(self.hour, self.minute, 0)
    }
}

/// One decoded report line. Built once, never modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedReport {
    /// The line as decoded, uppercased and with whitespace normalised.
    pub raw: String,
    pub station: String,
    pub timestamp: Option<String>,
    /// `None` when the report has no wind group, a calm wind is `Some`.
    pub wind: Option<WindObservation>,
    pub visibility_sm: Option<f64>,
    pub ceiling: Option<Ceiling>,
    pub phenomena: Vec<Phenomenon>,
}

/// Decode a raw report line. Anything unreadable is left absent.
pub fn decode(raw: &str) -> DecodedReport {
    let tokens = tokenize(raw);
    let station = tokens.first().cloned().unwrap_or_default();
    let timestamp = tokens
        .get(1)
        .filter(|token| token.len() >= 5 && token.ends_with('Z'))
        .cloned();

    let report = DecodedReport {
        raw: tokens.join(" "),
        wind: decode_wind(&tokens),
        visibility_sm: decode_visibility(&tokens),
        ceiling: decode_ceiling(&tokens),
        phenomena: decode_phenomena(&tokens),
        station,
        timestamp,
    };

    trace!(
        station = %report.station,
        wind = ?report.wind,
        visibility_sm = ?report.visibility_sm,
        ceiling = ?report.ceiling,
        phenomena = ?report.phenomena,
        "decoded report"
    );
    if report.wind.is_none() {
        debug!(station = %report.station, "no wind group");
    }
    if report.visibility_sm.is_none() {
        debug!(station = %report.station, "no visibility group");
    }

    report
}

impl FromStr for DecodedReport {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(decode(s))
    }
}

impl DecodedReport {
    pub fn observation_time(&self) -> Option<ObservationTime> {
        self.timestamp.as_deref().and_then(ObservationTime::parse)
    }

    pub fn wind_direction(&self) -> Option<u16> {
        self.wind.and_then(|wind| wind.direction.bearing())
    }

    /// `None` without a runway, without a wind group, or with a variable wind.
    pub fn wind_components(&self, runway: Option<RunwayHeading>) -> Option<WindComponents> {
        self.wind?.components(runway?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        tokenize(s)
    }

    #[test]
    fn tokenizer_uppercases_and_splits() {
        assert_eq!(
            tokenize("  kjfk\t121851z  22010kt\n"),
            ["KJFK", "121851Z", "22010KT"]
        );
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn wind_groups() {
        let wind = decode_wind(&tokens("24012G18KT")).unwrap();
        assert_eq!(wind.direction, WindDirection::Degrees(240));
        assert_eq!(wind.speed_kt, 12);
        assert_eq!(wind.gust_kt, Some(18));

        let wind = decode_wind(&tokens("VRB05KT")).unwrap();
        assert_eq!(wind.direction, WindDirection::Variable);
        assert_eq!(wind.speed_kt, 5);
        assert_eq!(wind.gust_kt, None);

        let wind = decode_wind(&tokens("270105G130KT")).unwrap();
        assert_eq!(wind.speed_kt, 105);
        assert_eq!(wind.gust_kt, Some(130));
    }

    #[test]
    fn wind_round_trips_direction_and_speed() {
        for direction in (0..=360).step_by(10) {
            for speed in [0, 7, 35, 99] {
                let group = format!("{direction:03}{speed:02}KT");
                let wind = decode_wind(&tokens(&group)).unwrap();
                assert_eq!(
                    format!(
                        "{:03}{:02}KT",
                        wind.direction.bearing().unwrap(),
                        wind.speed_kt
                    ),
                    group
                );
            }
        }
    }

    #[test]
    fn calm_is_not_unknown() {
        let calm = decode_wind(&tokens("00000KT")).unwrap();
        assert!(calm.is_calm());
        assert_eq!(calm.direction, WindDirection::Degrees(0));
        assert_eq!(decode_wind(&tokens("KJFK 10SM")), None);
    }

    #[test]
    fn only_the_first_wind_group_counts() {
        let wind = decode_wind(&tokens("22010KT WS020/27045KT 31025KT")).unwrap();
        assert_eq!(wind.direction, WindDirection::Degrees(220));
    }

    #[test]
    fn partial_wind_groups_are_ignored() {
        assert_eq!(decode_wind(&tokens("2201KT 22010KTS 22010MPS 22010")), None);
        assert_eq!(decode_wind(&tokens("22010G5KT")), None);
    }

    #[test]
    fn unchecked_direction_is_kept() {
        let wind = decode_wind(&tokens("99910KT")).unwrap();
        assert_eq!(wind.direction, WindDirection::Degrees(999));
    }

    #[test]
    fn visibility_forms() {
        assert_eq!(decode_visibility(&tokens("1/2SM")), Some(0.5));
        assert_eq!(decode_visibility(&tokens("1 1/2SM")), Some(1.5));
        assert_eq!(decode_visibility(&tokens("10SM")), Some(10.0));
        assert_eq!(decode_visibility(&tokens("22010KT 3/4SM")), Some(0.75));
    }

    #[test]
    fn visibility_never_zero() {
        assert_eq!(decode_visibility(&tokens("0SM")), None);
        assert_eq!(decode_visibility(&tokens("1/0SM")), None);
        assert_eq!(decode_visibility(&tokens("M1/4SM")), None);
        assert_eq!(decode_visibility(&tokens("KJFK 22010KT")), None);
    }

    #[test]
    fn whole_number_only_joins_a_fraction() {
        assert_eq!(decode_visibility(&tokens("2 10SM")), Some(10.0));
    }

    #[test]
    fn first_positive_visibility_wins() {
        assert_eq!(decode_visibility(&tokens("0SM 5SM 2SM")), Some(5.0));
    }

    #[test]
    fn lowest_ceiling_layer() {
        let ceiling = decode_ceiling(&tokens("OVC008 BKN015")).unwrap();
        assert_eq!(ceiling.height_ft, 800);
        assert_eq!(ceiling.layer, LayerCode::Overcast);

        let ceiling = decode_ceiling(&tokens("BKN015 OVC030 VV004")).unwrap();
        assert_eq!(ceiling.height_ft, 400);
        assert_eq!(ceiling.layer, LayerCode::VerticalVisibility);

        let ceiling = decode_ceiling(&tokens("FEW005 BKN020CB OVC020")).unwrap();
        assert_eq!(ceiling.height_ft, 2000);
        assert_eq!(ceiling.layer, LayerCode::Broken);
    }

    #[test]
    fn few_and_scattered_are_not_ceilings() {
        assert_eq!(decode_ceiling(&tokens("FEW005 SCT010 SKC CLR OVC01")), None);
    }

    #[test]
    fn phenomena_in_first_seen_order() {
        assert_eq!(
            decode_phenomena(&tokens("+TSRA BR")),
            [Phenomenon::Thunderstorm, Phenomenon::Rain, Phenomenon::Mist]
        );
        assert_eq!(
            decode_phenomena(&tokens("-SHRA RA SHSN")),
            [Phenomenon::Showers, Phenomenon::Rain, Phenomenon::Snow]
        );
        assert!(decode_phenomena(&tokens("10SM FEW250")).is_empty());
    }

    #[test]
    fn phenomena_match_inside_any_token() {
        assert_eq!(decode_phenomena(&tokens("KFSH")), [Phenomenon::Showers]);
    }

    #[test]
    fn phenomenon_codes() {
        assert_eq!(Phenomenon::from_code("PL"), Some(Phenomenon::IcePellets));
        assert_eq!(Phenomenon::from_code("XX"), None);
        assert_eq!(Phenomenon::SnowGrains.to_string(), "snow grains");
    }

    #[test]
    fn station_and_timestamp() {
        let report = decode("kjfk 121851z 22010kt");
        assert_eq!(report.station, "KJFK");
        assert_eq!(report.timestamp.as_deref(), Some("121851Z"));
        assert_eq!(report.raw, "KJFK 121851Z 22010KT");

        let report = decode("KJFK 22010KT");
        assert_eq!(report.timestamp, None);
        let report = decode("KJFK 1Z 22010KT");
        assert_eq!(report.timestamp, None);
    }

    #[test]
    fn empty_line_decodes_to_nothing() {
        let report: DecodedReport = "".parse().unwrap();
        assert_eq!(report.station, "");
        assert_eq!(report.timestamp, None);
        assert_eq!(report.wind, None);
        assert_eq!(report.visibility_sm, None);
        assert_eq!(report.ceiling, None);
        assert!(report.phenomena.is_empty());
    }

    #[test]
    fn observation_time() {
        let report = decode("KJFK 121851Z 22010KT");
        let observed = report.observation_time().unwrap();
        assert_eq!(
            observed,
            ObservationTime {
                day: 12,
                hour: 18,
                minute: 51
            }
        );

        let month = Date::from_calendar_date(2024, time::Month::March, 1).unwrap();
        let at = observed.on(month).unwrap();
        assert_eq!(at.day(), 12);
        assert_eq!(at.hour(), 18);
        assert_eq!(at.minute(), 51);

        let february = Date::from_calendar_date(2023, time::Month::February, 1).unwrap();
        let late = ObservationTime::parse("300000Z").unwrap();
        assert!(late.on(february).is_err());

        assert_eq!(ObservationTime::parse("1218Z"), None);
        assert_eq!(ObservationTime::parse("12A851Z"), None);
    }

    #[test]
    fn components_need_wind_and_runway() {
        let report = decode("KJFK 121851Z 20020KT");
        assert_eq!(report.wind_components(None), None);
        let runway = RunwayHeading::new(220).ok();
        assert!(report.wind_components(runway).is_some());
        assert_eq!(decode("KJFK 121851Z").wind_components(runway), None);
    }
}
