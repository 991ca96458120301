//! Conversion of raw provider results into [`ChoiceRecord`]s.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use super::provider::{RawPage, RawPlace};
use crate::{ChoiceRecord, Restaurant, WeatherSnapshot};

const LOCATION: &str = "Location";

/// Reasons a raw result cannot be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The result carried no `Location` entry.
    #[error("result has no Location")]
    MissingLocation,
    /// The `Location` entry was not of the form `"lat: <f>, lng: <f>"`.
    #[error("malformed Location {value:?}")]
    MalformedLocation { value: String },
    /// A field was present with the wrong JSON type.
    #[error("field {field} should be {expected}")]
    UnexpectedShape {
        field: &'static str,
        expected: &'static str,
    },
}

/// Parse a `"lat: <f>, lng: <f>"` location string into `(lat, lng)`.
///
/// Whitespace around labels and numbers is ignored.
///
/// # Examples
///
/// ```
/// use foodscout_core::search::parse_location;
///
/// assert_eq!(parse_location("lat: 25.05, lng: 121.53")?, (25.05, 121.53));
/// assert!(parse_location("25.05,121.53").is_err());
/// # Ok::<(), foodscout_core::search::ParseError>(())
/// ```
pub fn parse_location(value: &str) -> Result<(f64, f64), ParseError> {
    let malformed = || ParseError::MalformedLocation {
        value: value.to_owned(),
    };
    let (lat_part, lng_part) = value.split_once(',').ok_or_else(malformed)?;
    let lat = labelled_number(lat_part, "lat").ok_or_else(malformed)?;
    let lng = labelled_number(lng_part, "lng").ok_or_else(malformed)?;
    Ok((lat, lng))
}

fn labelled_number(part: &str, label: &str) -> Option<f64> {
    let (name, number) = part.split_once(':')?;
    if name.trim() != label {
        return None;
    }
    number.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Build one record from a raw result at position `rank` within its page.
///
/// `Location` is required. The other fields fall back to their defaults when
/// absent or `null`, but a present value of the wrong type is rejected.
pub fn choice_from_raw(
    raw: &RawPlace,
    rank: u32,
    time: DateTime<Utc>,
    weather: Option<&WeatherSnapshot>,
) -> Result<ChoiceRecord, ParseError> {
    let location = match raw.get(LOCATION) {
        None | Some(Value::Null) => return Err(ParseError::MissingLocation),
        Some(Value::String(location)) => location,
        Some(_) => {
            return Err(ParseError::UnexpectedShape {
                field: LOCATION,
                expected: "a string",
            });
        }
    };
    let (lat, lng) = parse_location(location)?;

    Ok(ChoiceRecord {
        lat,
        lng,
        time,
        restaurant: Restaurant {
            name: string_field(raw, "name")?,
            place_id: string_field(raw, "place_id")?,
            vicinity: string_field(raw, "vicinity")?,
            rank,
            rating: number_field(raw, "rating")?,
            open_now: bool_field(raw, "open_now")?,
        },
        weather: weather.cloned(),
    })
}

/// Transform every result of every page, stamping each with `time` and
/// `weather`.
///
/// Ranks restart at zero on each page and follow the provider's order. The
/// first unparseable result fails the whole batch.
pub fn choices_from_pages(
    pages: &[RawPage],
    time: DateTime<Utc>,
    weather: Option<&WeatherSnapshot>,
) -> Result<Vec<ChoiceRecord>, ParseError> {
    pages
        .iter()
        .flat_map(|page| page.results.iter().enumerate())
        .map(|(rank, raw)| {
            let rank = u32::try_from(rank).unwrap_or(u32::MAX);
            choice_from_raw(raw, rank, time, weather)
        })
        .collect()
}

fn string_field(raw: &RawPlace, field: &'static str) -> Result<String, ParseError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(ParseError::UnexpectedShape {
            field,
            expected: "a string",
        }),
    }
}

fn number_field(raw: &RawPlace, field: &'static str) -> Result<f64, ParseError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(0.0),
        Some(value) => value.as_f64().ok_or(ParseError::UnexpectedShape {
            field,
            expected: "a number",
        }),
    }
}

fn bool_field(raw: &RawPlace, field: &'static str) -> Result<bool, ParseError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(value)) => Ok(*value),
        Some(_) => Err(ParseError::UnexpectedShape {
            field,
            expected: "a boolean",
        }),
    }
}
