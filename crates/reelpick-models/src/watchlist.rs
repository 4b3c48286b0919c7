use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the exported watchlist CSV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    /// 1-based position among the data rows of the source file.
    /// Used as the watchlist reference of a pair, so literal duplicate rows stay distinct.
    pub row: u32,
    pub title: String,
    pub date_added: Option<NaiveDate>,
    /// 0 when the source row had no year
    pub release_year: u32,
}

impl WatchlistEntry {
    pub fn has_known_year(&self) -> bool {
        self.release_year != 0
    }
}
