pub mod error;
pub mod jellyfin;
pub mod letterboxd;
pub mod traits;

pub use error::{HttpStatusError, SourceError, SourceErrorKind};
pub use jellyfin::{JellyfinClient, JellyfinCredentials};
pub use letterboxd::{LetterboxdWatchlist, ParsedWatchlist, SkippedRow};
pub use traits::{CatalogSource, WatchlistSource};
