//! Nearby Search response types.
//!
//! Only the fields the search pipeline consumes are modelled; everything else
//! in the payload is ignored.
//!
//! See: <https://developers.google.com/maps/documentation/places/web-service/search-nearby>

use foodscout_core::{ProviderError, RawPage, RawPlace};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const STATUS_OK: &str = "OK";
const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// One Nearby Search response page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearbySearchResponse {
    /// Service status.
    ///
    /// `"OK"` and `"ZERO_RESULTS"` are successes; anything else, such as
    /// `"OVER_QUERY_LIMIT"`, `"REQUEST_DENIED"` or `"INVALID_REQUEST"`, is a
    /// failure.
    pub status: String,
    /// Human-readable detail accompanying a failure status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    /// Token for the following page, usable after a short delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// One place in a Nearby Search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceResult {
    pub geometry: Geometry,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vicinity: String,
    #[serde(default)]
    pub place_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub open_now: Option<bool>,
}

impl NearbySearchResponse {
    /// Whether the service reported success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK || self.status == STATUS_ZERO_RESULTS
    }

    /// Convert the response into a core page, or the service failure it
    /// reports.
    ///
    /// An empty continuation token is treated as absent.
    pub fn into_page(self) -> Result<RawPage, ProviderError> {
        if !self.is_ok() {
            return Err(ProviderError::ServiceStatus {
                status: self.status,
                message: self.error_message.unwrap_or_default(),
            });
        }
        Ok(RawPage {
            results: self.results.into_iter().map(PlaceResult::into_raw).collect(),
            next_page_token: self.next_page_token.filter(|token| !token.is_empty()),
        })
    }
}

impl PlaceResult {
    /// Flatten the result into the key/value shape the core parses.
    ///
    /// Missing ratings and opening hours become `null`.
    #[must_use]
    pub fn into_raw(self) -> RawPlace {
        let LatLng { lat, lng } = self.geometry.location;
        let mut raw = RawPlace::new();
        raw.insert(
            "Location".to_owned(),
            Value::String(format!("lat: {lat:.6}, lng: {lng:.6}")),
        );
        raw.insert("name".to_owned(), Value::String(self.name));
        raw.insert("vicinity".to_owned(), Value::String(self.vicinity));
        raw.insert("place_id".to_owned(), Value::String(self.place_id));
        raw.insert("rating".to_owned(), self.rating.map_or(Value::Null, Value::from));
        raw.insert(
            "open_now".to_owned(),
            self.opening_hours
                .and_then(|hours| hours.open_now)
                .map_or(Value::Null, Value::Bool),
        );
        raw
    }
}
