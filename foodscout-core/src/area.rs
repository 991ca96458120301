use serde::{Deserialize, Serialize};

use crate::{GeoBounds, validate_region};

/// A region already covered by a remote search.
///
/// Areas are append-only: they are written once after a successful fetch and
/// never updated. Two areas with identical fields are distinct records.
///
/// # Examples
/// ```
/// use foodscout_core::DiscoveredArea;
///
/// let area = DiscoveredArea::new(25.05, 121.53, 200.0);
/// assert!(area.covers(25.05, 121.53, 150.0));
/// assert!(area.covers(25.05, 121.53, 200.0));
/// assert!(!area.covers(25.05, 121.53, 500.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredArea {
    pub lat: f64,
    pub lng: f64,
    /// Search radius in meters.
    pub radius: f64,
}

impl DiscoveredArea {
    #[must_use]
    pub const fn new(lat: f64, lng: f64, radius: f64) -> Self {
        Self { lat, lng, radius }
    }

    /// Geodesic box spanned by this area.
    #[must_use]
    pub fn bounds(&self) -> GeoBounds {
        GeoBounds::around(self.lat, self.lng, self.radius)
    }

    /// Whether the query box for `(lat, lng, size)` lies fully inside this area.
    ///
    /// An area or query whose box would wrap the antimeridian or a pole never
    /// matches.
    #[must_use]
    pub fn covers(&self, lat: f64, lng: f64, size: f64) -> bool {
        if validate_region(self.lat, self.lng, self.radius).is_err()
            || validate_region(lat, lng, size).is_err()
        {
            return false;
        }
        self.bounds()
            .contains_bounds(&GeoBounds::around(lat, lng, size))
    }
}
