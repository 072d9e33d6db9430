//! Hall lookup against the document store.
//!
//! The whole collection is read and matched client side: exact
//! case-insensitive name first, then substring, first match wins.
//! Stores list halls ordered by name, so ties resolve alphabetically.

use hallnav_protocol::HallRecord;
use hallnav_store::{HallStore, StoreError};
use std::sync::Arc;
use tracing::debug;

/// Match a recognized identifier against hall names.
pub fn match_hall<'a>(records: &'a [HallRecord], hall_id: &str) -> Option<&'a HallRecord> {
    let needle = hall_id.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    records
        .iter()
        .find(|r| r.name.to_lowercase() == needle)
        .or_else(|| records.iter().find(|r| r.name.to_lowercase().contains(&needle)))
}

#[derive(Clone, Default)]
pub struct HallDirectory {
    store: Option<Arc<dyn HallStore>>,
}

impl HallDirectory {
    pub fn new(store: Option<Arc<dyn HallStore>>) -> Self {
        Self { store }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Find the record for a recognized hall.
    ///
    /// No store call is made for a blank identifier or a missing store.
    pub async fn lookup(&self, hall_id: Option<&str>) -> Result<Option<HallRecord>, StoreError> {
        let Some(store) = &self.store else {
            debug!("No hall store configured; skipping lookup");
            return Ok(None);
        };
        let Some(hall_id) = hall_id.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(None);
        };

        let records = store.list().await?;
        let found = match_hall(&records, hall_id).cloned();
        debug!(
            "Lookup '{}' over {} halls: {}",
            hall_id,
            records.len(),
            found.as_ref().map(|r| r.name.as_str()).unwrap_or("no match")
        );
        Ok(found)
    }
}
