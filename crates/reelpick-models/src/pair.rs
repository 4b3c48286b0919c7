use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{CatalogEntry, WatchlistEntry};

/// Identity between one catalog entry and one watchlist row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ReconciledPair {
    pub catalog_id: String,
    pub watchlist_row: u32,
    pub watchlist_title: String,
    pub added_date: Option<NaiveDate>,
}

impl ReconciledPair {
    pub fn link(catalog: &CatalogEntry, watchlist: &WatchlistEntry) -> Self {
        Self {
            catalog_id: catalog.external_id.clone(),
            watchlist_row: watchlist.row,
            watchlist_title: watchlist.title.clone(),
            added_date: watchlist.date_added,
        }
    }
}
