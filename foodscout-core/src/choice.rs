use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A restaurant selected from a remote search page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub name: String,
    pub place_id: String,
    pub vicinity: String,
    /// Position within the provider page the result arrived on.
    ///
    /// This is the provider's ordering, not an ordering by [`Self::rating`].
    pub rank: u32,
    pub rating: f64,
    pub open_now: bool,
}

/// Weather observed at the search point when a record was ingested.
///
/// The default value is a valid placeholder for records ingested without a
/// weather source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Short human-readable description, e.g. "partly cloudy".
    pub summary: String,
    pub max_temp_c: i32,
    pub min_temp_c: i32,
    /// Probability of precipitation in percent.
    pub precipitation_chance: u8,
}

/// A persisted search result.
///
/// Records are immutable once written and are owned by the
/// [`ChoiceStore`](crate::ChoiceStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    pub lat: f64,
    pub lng: f64,
    /// Ingestion time.
    pub time: DateTime<Utc>,
    pub restaurant: Restaurant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherSnapshot>,
}
