use super::sync_ui::SyncUI;
use super::{AppContext, StartupCancel};
use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use reelpick_core::{CatalogSync, ReconcileReport, Reconciler, SyncOptions, SyncReport};
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Failed posters listed by name before the rest are summarized
const MAX_LISTED_FAILURES: usize = 10;

pub async fn run_sync(no_images: bool, skip_reconcile: bool, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");
    let ctx = AppContext::open().await?;
    let startup = StartupCancel::start(ctx.startup_timeout());

    let fetch_images = ctx.config.sync.fetch_images && !no_images;
    let sync_report = sync_catalog(&ctx, fetch_images, startup.token(), output).await?;
    report_sync(&sync_report, output);

    let reconcile_report = if skip_reconcile {
        output.info("Skipping watchlist reconciliation");
        None
    } else {
        let report = reconcile_watchlist(&ctx, startup.token()).await?;
        report_reconcile(&report, output);
        Some(report)
    };

    if !output.is_human() {
        output.json(&json!({
            "type": "sync_result",
            "movies": sync_report.fetched,
            "posters": sync_report.images_fetched,
            "poster_failures": sync_report.image_failures.len(),
            "pairs": reconcile_report.as_ref().map(|r| r.pairs),
            "duration_ms": sync_report.duration.as_millis() as u64,
        }));
    }

    ctx.store.close().await;
    Ok(())
}

pub async fn sync_catalog(
    ctx: &AppContext,
    fetch_images: bool,
    cancel: &CancellationToken,
    output: &Output,
) -> Result<SyncReport> {
    let source = ctx.catalog_source()?;
    let options = SyncOptions {
        library_name: ctx.config.jellyfin.library_name.clone(),
        fetch_images,
        image_concurrency: ctx.config.sync.image_concurrency,
    };

    let ui = SyncUI::new(output.is_human() && !output.is_quiet());
    ui.set_message(format!(
        "Syncing '{}' from {}",
        options.library_name, ctx.config.jellyfin.server_url
    ));

    let result = CatalogSync::new(source, ctx.store.clone(), options)
        .with_progress(ui.callback())
        .run(cancel)
        .await;
    ui.finish();

    result.wrap_err("Catalog sync failed")
}

pub async fn reconcile_watchlist(ctx: &AppContext, cancel: &CancellationToken) -> Result<ReconcileReport> {
    let watchlist = ctx.watchlist_source();
    tracing::debug!(path = %watchlist.path().display(), "Reconciling watchlist");
    let reconciler = Reconciler::new(ctx.store.clone(), watchlist, ctx.store.clone());
    reconciler.run(cancel).await.wrap_err("Watchlist reconciliation failed")
}

pub fn report_sync(report: &SyncReport, output: &Output) {
    output.success(format!(
        "Synced {} movies ({} posters) in {:.1}s",
        report.fetched,
        report.images_fetched,
        report.duration.as_secs_f64()
    ));

    if report.image_failures.is_empty() {
        return;
    }
    output.warn(format!("{} posters could not be downloaded", report.image_failures.len()));
    for failure in report.image_failures.iter().take(MAX_LISTED_FAILURES) {
        output.println(format!("  {}: {}", failure.external_id, failure.message));
    }
    if report.image_failures.len() > MAX_LISTED_FAILURES {
        output.println(format!("  ... and {} more", report.image_failures.len() - MAX_LISTED_FAILURES));
    }
}

pub fn report_reconcile(report: &ReconcileReport, output: &Output) {
    output.success(format!(
        "Matched {} watchlist pairs ({} watchlist rows against {} movies)",
        report.pairs, report.watchlist_entries, report.catalog_entries
    ));
}
