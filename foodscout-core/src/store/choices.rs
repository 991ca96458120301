use log::debug;

use super::{Collection, Document, Session, StoreConnection, StoreError};
use crate::{ChoiceRecord, GeoBounds};

/// Persistent collection of ingested [`ChoiceRecord`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceStore {
    _private: (),
}

impl ChoiceStore {
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Append one record, indexed by its own coordinates.
    pub fn insert<C: StoreConnection>(
        &self,
        session: &mut Session<C>,
        record: &ChoiceRecord,
    ) -> Result<(), StoreError> {
        let document =
            Document::encode(record.lat, record.lng, record).map_err(|source| {
                StoreError::Encode {
                    collection: Collection::Choices,
                    source,
                }
            })?;
        session.connection.insert_one(Collection::Choices, document)
    }

    /// Every record whose coordinates fall inside the box of `size` meters
    /// around `(lat, lng)`.
    ///
    /// Results are unordered and unbounded.
    pub fn find_by_location<C: StoreConnection>(
        &self,
        session: &mut Session<C>,
        lat: f64,
        lng: f64,
        size: f64,
    ) -> Result<Vec<ChoiceRecord>, StoreError> {
        let bounds = GeoBounds::around(lat, lng, size);
        let records = session
            .connection
            .find_in_range(Collection::Choices, &bounds)?
            .iter()
            .map(|document| {
                document.decode().map_err(|source| StoreError::Decode {
                    collection: Collection::Choices,
                    source,
                })
            })
            .collect::<Result<Vec<ChoiceRecord>, _>>()?;
        debug!(
            "found {} stored choices around ({lat}, {lng}, {size})",
            records.len()
        );
        Ok(records)
    }
}
