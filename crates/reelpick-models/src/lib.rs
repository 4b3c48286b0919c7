pub mod catalog;
pub mod pair;
pub mod pick;
pub mod watchlist;

pub use catalog::CatalogEntry;
pub use pair::ReconciledPair;
pub use pick::{Pool, ResolvedItem};
pub use watchlist::WatchlistEntry;
