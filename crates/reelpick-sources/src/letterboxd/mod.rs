pub mod parser;
pub mod source;

pub use parser::{parse_watchlist, parse_watchlist_csv, ParsedWatchlist, SkippedRow};
pub use source::LetterboxdWatchlist;
