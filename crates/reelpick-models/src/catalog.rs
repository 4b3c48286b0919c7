use serde::{Deserialize, Serialize};

/// One movie known to the media server.
///
/// `external_id` is the media server's item id and is unique within a catalog
/// snapshot. `release_year` is 0 when the server does not know the year.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub external_id: String,
    pub title: String,
    pub release_year: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_rating: Option<f32>,
    /// Poster bytes, filled in by a later pass than the listing itself
    #[serde(skip)]
    pub poster_image: Option<Vec<u8>>,
}

impl CatalogEntry {
    pub fn new(external_id: impl Into<String>, title: impl Into<String>, release_year: u32) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            release_year,
            community_rating: None,
            poster_image: None,
        }
    }

    pub fn with_rating(mut self, rating: f32) -> Self {
        self.community_rating = Some(rating);
        self
    }

    pub fn with_poster(mut self, bytes: Vec<u8>) -> Self {
        self.poster_image = Some(bytes);
        self
    }

    /// Placeholder records carry no title and must never take part in matching
    pub fn is_placeholder(&self) -> bool {
        self.title.trim().is_empty()
    }

    pub fn has_known_year(&self) -> bool {
        self.release_year != 0
    }
}
