use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn create_watchlist_csv(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", body).unwrap();
    file
}

#[test]
fn test_parse_watchlist_csv() {
    let file = create_watchlist_csv(
        "
    Date,Name,Year,Letterboxd URI
    2020-04-26,Lady Bird,2017,https://boxd.it/dGNE
    2020-04-26,Columbus,2017,https://boxd.it/eCuA
    2020-04-26,Let the Corpses Tan,2017,https://boxd.it/eWSs
",
    );

    let parsed = parse_watchlist_csv(file.path()).unwrap();
    assert!(parsed.skipped.is_empty());
    assert_eq!(parsed.entries.len(), 3);

    let first = &parsed.entries[0];
    assert_eq!(first.row, 1);
    assert_eq!(first.title, "Lady Bird");
    assert_eq!(first.release_year, 2017);
    assert_eq!(first.date_added, NaiveDate::from_ymd_opt(2020, 4, 26));
    assert_eq!(parsed.entries[2].title, "Let the Corpses Tan");
    assert_eq!(parsed.entries[2].row, 3);
}

#[test]
fn test_empty_year_and_date() {
    let csv = "Date,Name,Year,Letterboxd URI\n,Stalker,,https://boxd.it/x\n";
    let parsed = parse_watchlist(csv.as_bytes()).unwrap();

    assert_eq!(parsed.entries.len(), 1);
    assert_eq!(parsed.entries[0].release_year, 0);
    assert!(parsed.entries[0].date_added.is_none());
}

#[test]
fn test_malformed_rows_are_skipped_not_defaulted() {
    let csv = "\
Date,Name,Year,Letterboxd URI
2021-01-01,Good Time,2017,https://boxd.it/a
2021-01-01,,2017,https://boxd.it/b
2021-01-01,Heat,nineteen,https://boxd.it/c
01/02/2021,Ran,1985,https://boxd.it/d
2021-01-02,Paterson,2016,https://boxd.it/e
";
    let parsed = parse_watchlist(csv.as_bytes()).unwrap();

    let titles: Vec<&str> = parsed.entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Good Time", "Paterson"]);
    // Row numbers count every data row, skipped or not
    assert_eq!(parsed.entries[1].row, 5);

    assert_eq!(parsed.skipped.len(), 3);
    assert_eq!(parsed.skipped[0], SkippedRow { line: 3, reason: "empty title".to_string() });
    assert!(parsed.skipped[1].reason.contains("invalid year"));
    assert!(parsed.skipped[2].reason.contains("invalid date"));
}

#[test]
fn test_columns_found_by_name() {
    let csv = "Letterboxd URI, Year ,Name\nhttps://boxd.it/a,1979,Alien\n";
    let parsed = parse_watchlist(csv.as_bytes()).unwrap();

    assert_eq!(parsed.entries.len(), 1);
    assert_eq!(parsed.entries[0].title, "Alien");
    assert_eq!(parsed.entries[0].release_year, 1979);
    assert!(parsed.entries[0].date_added.is_none());
}

#[test]
fn test_missing_required_column() {
    let csv = "Date,Title,Year\n2020-01-01,Alien,1979\n";
    let err = parse_watchlist(csv.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("Missing required column: Name"));
}

#[test]
fn test_duplicate_rows_stay_distinct() {
    let csv = "Date,Name,Year\n2020-01-01,Alien,1979\n2020-01-01,Alien,1979\n";
    let parsed = parse_watchlist(csv.as_bytes()).unwrap();

    assert_eq!(parsed.entries.len(), 2);
    assert_ne!(parsed.entries[0].row, parsed.entries[1].row);
}

#[test]
fn test_missing_file() {
    assert!(parse_watchlist_csv("/nonexistent/watchlist.csv").is_err());
}
