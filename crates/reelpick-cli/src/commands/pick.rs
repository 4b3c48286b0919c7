use super::AppContext;
use crate::output::{Output, OutputFormat};
use color_eyre::eyre::Context;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use reelpick_models::{Pool, ResolvedItem};

pub async fn run_pick(count: Option<usize>, watchlist: bool, output: &Output) -> Result<()> {
    let ctx = AppContext::open().await?;
    let pool = if watchlist { Pool::Watchlist } else { Pool::Catalog };
    let count = count.unwrap_or(ctx.config.server.default_pick_count);

    let items = ctx
        .selector()
        .pick(pool, count)
        .await
        .wrap_err_with(|| format!("Could not pick {} movies from the {} pool", count, pool))?;
    ctx.store.close().await;

    match output.format() {
        OutputFormat::Human => {
            if !output.is_quiet() {
                println!("{}", picks_table(&items, pool));
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&serde_json::to_value(&items).wrap_err("Failed to serialize picks")?);
        }
    }
    Ok(())
}

fn picks_table(items: &[ResolvedItem], pool: Pool) -> Table {
    let mut table = Table::new();
    let mut header = vec![
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Year").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Rating").add_attribute(comfy_table::Attribute::Bold),
    ];
    if pool == Pool::Watchlist {
        header.push(Cell::new("Added").add_attribute(comfy_table::Attribute::Bold));
    }
    header.push(Cell::new("Poster").add_attribute(comfy_table::Attribute::Bold));
    table.set_header(header);

    for item in items {
        let mut row = vec![
            Cell::new(&item.title),
            Cell::new(display_year(item.release_year)),
            Cell::new(item.community_rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "-".to_string())),
        ];
        if pool == Pool::Watchlist {
            row.push(Cell::new(
                item.added_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            ));
        }
        row.push(Cell::new(if item.poster_image.is_some() { "✓" } else { "✗" }));
        table.add_row(row);
    }

    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

/// Year 0 means the server had no year for the movie
fn display_year(year: u32) -> String {
    if year == 0 {
        "-".to_string()
    } else {
        year.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelpick_models::CatalogEntry;

    #[test]
    fn test_display_year() {
        assert_eq!(display_year(0), "-");
        assert_eq!(display_year(1979), "1979");
    }

    #[test]
    fn test_watchlist_table_has_added_column() {
        let item = ResolvedItem::from_entry(CatalogEntry::new("m1", "Stalker", 1979), None);

        let catalog = picks_table(std::slice::from_ref(&item), Pool::Catalog).to_string();
        let watchlist = picks_table(&[item], Pool::Watchlist).to_string();

        assert!(catalog.contains("Stalker"));
        assert!(!catalog.contains("Added"));
        assert!(watchlist.contains("Added"));
    }
}
