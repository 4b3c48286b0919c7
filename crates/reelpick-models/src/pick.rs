use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::CatalogEntry;

/// Which set of movies a random pick is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pool {
    /// Every movie in the catalog
    Catalog,
    /// Only movies paired with a watchlist row
    Watchlist,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pool::Catalog => write!(f, "catalog"),
            Pool::Watchlist => write!(f, "watchlist"),
        }
    }
}

/// A picked movie, fully resolved against the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedItem {
    pub id: String,
    pub title: String,
    pub release_year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_rating: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_date: Option<NaiveDate>,
    /// Base64 in JSON, raw bytes in memory
    #[serde(default, with = "base64_bytes")]
    pub poster_image: Option<Vec<u8>>,
}

impl ResolvedItem {
    pub fn from_entry(entry: CatalogEntry, added_date: Option<NaiveDate>) -> Self {
        Self {
            id: entry.external_id,
            title: entry.title,
            release_year: entry.release_year,
            community_rating: entry.community_rating,
            added_date,
            poster_image: entry.poster_image,
        }
    }
}

mod base64_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
