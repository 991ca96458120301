use log::debug;

use super::{Collection, Document, Session, StoreConnection, StoreError};
use crate::{DiscoveredArea, GeoBounds};

/// Append-only index of regions already covered by a remote search.
///
/// A query region is discovered when its geodesic box lies entirely inside the
/// box of at least one recorded area. Areas are never merged, deduplicated or
/// removed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaDiscoveryIndex {
    _private: (),
}

impl AreaDiscoveryIndex {
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Whether the box of `size` meters around `(lat, lng)` is fully covered
    /// by a recorded area.
    ///
    /// Every stored area is loaded and tested in turn. Containment is
    /// inclusive: a query whose box equals a recorded area's box is
    /// discovered.
    pub fn is_discovered<C: StoreConnection>(
        &self,
        session: &mut Session<C>,
        lat: f64,
        lng: f64,
        size: f64,
    ) -> Result<bool, StoreError> {
        let areas = self.load(session, &GeoBounds::world())?;
        let hit = areas.iter().find(|area| area.covers(lat, lng, size));
        match hit {
            Some(area) => debug!(
                "({lat}, {lng}, {size}) covered by area ({}, {}, {})",
                area.lat, area.lng, area.radius
            ),
            None => debug!(
                "({lat}, {lng}, {size}) not covered by any of {} areas",
                areas.len()
            ),
        }
        Ok(hit.is_some())
    }

    /// Append a new discovered area. Identical areas may be recorded twice.
    pub fn record_discovered<C: StoreConnection>(
        &self,
        session: &mut Session<C>,
        lat: f64,
        lng: f64,
        radius: f64,
    ) -> Result<(), StoreError> {
        let area = DiscoveredArea::new(lat, lng, radius);
        let document = Document::encode(lat, lng, &area).map_err(|source| StoreError::Encode {
            collection: Collection::DiscoveredAreas,
            source,
        })?;
        session
            .connection
            .insert_one(Collection::DiscoveredAreas, document)?;
        debug!("recorded discovered area ({lat}, {lng}, {radius})");
        Ok(())
    }

    /// Recorded areas whose centres fall inside `bounds`.
    ///
    /// This is a coarse listing for inspection. It says nothing about whether
    /// a region is covered; use [`Self::is_discovered`] for that.
    pub fn areas_near<C: StoreConnection>(
        &self,
        session: &mut Session<C>,
        bounds: &GeoBounds,
    ) -> Result<Vec<DiscoveredArea>, StoreError> {
        self.load(session, bounds)
    }

    fn load<C: StoreConnection>(
        &self,
        session: &mut Session<C>,
        bounds: &GeoBounds,
    ) -> Result<Vec<DiscoveredArea>, StoreError> {
        session
            .connection
            .find_in_range(Collection::DiscoveredAreas, bounds)?
            .iter()
            .map(|document| {
                document.decode().map_err(|source| StoreError::Decode {
                    collection: Collection::DiscoveredAreas,
                    source,
                })
            })
            .collect()
    }
}
