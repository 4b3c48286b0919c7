use super::sync::{reconcile_watchlist, report_reconcile, report_sync, sync_catalog};
use super::{AppContext, StartupCancel};
use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use reelpick_server::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub async fn run_serve(
    bind_override: Option<String>,
    skip_sync: bool,
    skip_reconcile: bool,
    output: &Output,
) -> Result<()> {
    let ctx = AppContext::open().await?;

    // Any startup failure is fatal; the server never starts on a half-built database
    {
        let startup = StartupCancel::start(ctx.startup_timeout());

        if ctx.config.sync.sync_on_startup && !skip_sync {
            let report = sync_catalog(&ctx, ctx.config.sync.fetch_images, startup.token(), output).await?;
            report_sync(&report, output);
        } else {
            info!("Skipping startup catalog sync");
        }

        if ctx.config.sync.reconcile_on_startup && !skip_reconcile {
            let report = reconcile_watchlist(&ctx, startup.token()).await?;
            report_reconcile(&report, output);
        } else {
            info!("Skipping startup watchlist reconciliation");
        }
    }

    let bind = bind_override.unwrap_or_else(|| ctx.config.server.bind.clone());
    let listener = TcpListener::bind(&bind)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", bind))?;
    output.success(format!("Serving random picks on http://{}", bind));

    let state = AppState::new(
        Arc::new(ctx.selector()),
        ctx.config.server.default_pick_count,
        ctx.config.server.max_pick_count,
    );
    reelpick_server::serve(listener, state, shutdown_signal())
        .await
        .wrap_err("HTTP server failed")?;

    ctx.store.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Could not listen for Ctrl-C, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
