use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use reelpick_models::WatchlistEntry;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const DATE_COLUMN: &str = "Date";
const NAME_COLUMN: &str = "Name";
const YEAR_COLUMN: &str = "Year";

/// A data row that could not be turned into a watchlist entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line in the source file
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ParsedWatchlist {
    pub entries: Vec<WatchlistEntry>,
    pub skipped: Vec<SkippedRow>,
}

/// Parse a Letterboxd watchlist export (`Date,Name,Year,Letterboxd URI`)
pub fn parse_watchlist_csv<P: AsRef<Path>>(path: P) -> Result<ParsedWatchlist> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open watchlist CSV {}", path.display()))?;
    parse_watchlist(file)
}

pub fn parse_watchlist<R: Read>(input: R) -> Result<ParsedWatchlist> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers().context("Failed to read CSV header")?.clone();
    let header_map: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();

    let available_columns: Vec<&str> = headers.iter().collect();
    debug!("Available CSV columns: {:?}", available_columns);

    let column = |name: &str| {
        header_map
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("Missing required column: {}. Available columns: {:?}", name, available_columns))
    };
    let name_idx = column(NAME_COLUMN)?;
    let year_idx = column(YEAR_COLUMN)?;
    let date_idx = header_map.get(DATE_COLUMN).copied();

    let mut parsed = ParsedWatchlist::default();
    let mut row: u32 = 0;

    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        row += 1;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        match parse_row(&record, row, name_idx, year_idx, date_idx) {
            Ok(entry) => parsed.entries.push(entry),
            Err(reason) => {
                debug!(line, reason = %reason, "Skipping watchlist row");
                parsed.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    if !parsed.skipped.is_empty() {
        warn!(
            "Skipped {} malformed watchlist rows (first at line {})",
            parsed.skipped.len(),
            parsed.skipped[0].line
        );
    }
    debug!("Parsed {} watchlist entries", parsed.entries.len());
    Ok(parsed)
}

fn parse_row(
    record: &StringRecord,
    row: u32,
    name_idx: usize,
    year_idx: usize,
    date_idx: Option<usize>,
) -> std::result::Result<WatchlistEntry, String> {
    let title = record.get(name_idx).unwrap_or("");
    if title.is_empty() {
        return Err("empty title".to_string());
    }

    let year_str = record.get(year_idx).unwrap_or("");
    let release_year = if year_str.is_empty() {
        0
    } else {
        year_str
            .parse::<u32>()
            .map_err(|_| format!("invalid year '{}'", year_str))?
    };

    let date_added = match date_idx.and_then(|i| record.get(i)).filter(|d| !d.is_empty()) {
        Some(date_str) => Some(
            NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
                .map_err(|_| format!("invalid date '{}'", date_str))?,
        ),
        None => None,
    };

    Ok(WatchlistEntry {
        row,
        title: title.to_string(),
        date_added,
        release_year,
    })
}

#[cfg(test)]
mod tests;
