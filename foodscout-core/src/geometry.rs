//! Geodesic bounding boxes used by the discovery cache.
//!
//! A [`GeoBounds`] is an axis-aligned latitude/longitude rectangle. Boxes built
//! with [`GeoBounds::around`] project a radius in meters along the WGS84
//! geodesic, so the extents reflect real ground distance rather than naive
//! degree offsets.

use geo::{Coord, Destination, Geodesic, Point, Rect};
use thiserror::Error;

const BEARING_NORTH: f64 = 0.0;
const BEARING_EAST: f64 = 90.0;
const BEARING_SOUTH: f64 = 180.0;
const BEARING_WEST: f64 = 270.0;

/// Axis-aligned rectangle in WGS84 degrees (`x = longitude`, `y = latitude`).
///
/// Regions crossing the antimeridian or a pole are not modelled;
/// [`validate_region`] rejects them.
///
/// # Examples
///
/// ```
/// use foodscout_core::GeoBounds;
///
/// let wide = GeoBounds::around(25.05, 121.53, 200.0);
/// let narrow = GeoBounds::around(25.05, 121.53, 150.0);
/// assert!(wide.contains_bounds(&narrow));
/// assert!(!narrow.contains_bounds(&wide));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    rect: Rect<f64>,
}

impl GeoBounds {
    /// Build a rectangle from two opposite corners given as `(lat, lng)`.
    ///
    /// Corners are normalised so the order does not matter.
    #[must_use]
    pub fn from_corners(first: (f64, f64), second: (f64, f64)) -> Self {
        let (lat_a, lng_a) = first;
        let (lat_b, lng_b) = second;
        Self {
            rect: Rect::new(Coord { x: lng_a, y: lat_a }, Coord { x: lng_b, y: lat_b }),
        }
    }

    /// The whole latitude/longitude domain.
    #[must_use]
    pub fn world() -> Self {
        Self::from_corners((-90.0, -180.0), (90.0, 180.0))
    }

    /// Project `radius` meters north, east, south and west of `(lat, lng)`.
    ///
    /// The returned box spans the four great-circle destinations. Only
    /// regions accepted by [`validate_region`] yield a box containing its
    /// centre.
    #[must_use]
    pub fn around(lat: f64, lng: f64, radius: f64) -> Self {
        let [north, east, south, west] = project(lat, lng, radius);
        Self {
            rect: Rect::new(
                Coord {
                    x: west.x(),
                    y: south.y(),
                },
                Coord {
                    x: east.x(),
                    y: north.y(),
                },
            ),
        }
    }

    /// Southern latitude bound.
    #[must_use]
    pub fn south(&self) -> f64 {
        self.rect.min().y
    }

    /// Northern latitude bound.
    #[must_use]
    pub fn north(&self) -> f64 {
        self.rect.max().y
    }

    /// Western longitude bound.
    #[must_use]
    pub fn west(&self) -> f64 {
        self.rect.min().x
    }

    /// Eastern longitude bound.
    #[must_use]
    pub fn east(&self) -> f64 {
        self.rect.max().x
    }

    /// Whether `(lat, lng)` lies inside the box. Boundary points count as inside.
    #[must_use]
    pub fn contains_point(&self, lat: f64, lng: f64) -> bool {
        (self.south()..=self.north()).contains(&lat) && (self.west()..=self.east()).contains(&lng)
    }

    /// Whether `other` lies entirely inside this box.
    ///
    /// The comparison is inclusive, so identical boxes contain each other.
    #[must_use]
    pub fn contains_bounds(&self, other: &Self) -> bool {
        other.south() >= self.south()
            && other.north() <= self.north()
            && other.west() >= self.west()
            && other.east() <= self.east()
    }
}

/// Reasons a search region is rejected before any work happens.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RegionError {
    /// Latitude was outside `[-90, 90]` or not finite.
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    /// Longitude was outside `[-180, 180]` or not finite.
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    /// Radius was zero, negative or not finite.
    #[error("radius {0} must be a positive number of meters")]
    Radius(f64),
    /// The region would wrap across the antimeridian or over a pole.
    #[error("a {radius} m region around ({lat}, {lng}) crosses the antimeridian or a pole")]
    Extent { lat: f64, lng: f64, radius: f64 },
}

/// Destinations `radius` meters north, east, south and west of the centre.
fn project(lat: f64, lng: f64, radius: f64) -> [Point<f64>; 4] {
    let origin = Point::new(lng, lat);
    [BEARING_NORTH, BEARING_EAST, BEARING_SOUTH, BEARING_WEST]
        .map(|bearing| Geodesic.destination(origin, bearing, radius))
}

/// Check that a centre point and radius describe a usable search region.
pub fn validate_region(lat: f64, lng: f64, radius: f64) -> Result<(), RegionError> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(RegionError::Latitude(lat));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(RegionError::Longitude(lng));
    }
    if !radius.is_finite() || radius <= 0.0 {
        return Err(RegionError::Radius(radius));
    }
    // Wrapped destinations land on the wrong side of the centre; crossing a
    // pole also moves the north or south point to the opposite meridian.
    let [north, east, south, west] = project(lat, lng, radius);
    let on_meridian = |point: Point<f64>| (point.x() - lng).abs() < 90.0;
    if !(north.y() > lat
        && south.y() < lat
        && east.x() > lng
        && west.x() < lng
        && on_meridian(north)
        && on_meridian(south))
    {
        return Err(RegionError::Extent { lat, lng, radius });
    }
    Ok(())
}
