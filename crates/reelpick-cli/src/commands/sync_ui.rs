use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use reelpick_core::{ProgressCallback, SyncProgress};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

/// Spinner for the sync steps plus a bar for the poster downloads.
///
/// Outside a terminal the bars stay hidden and progress goes to the log instead.
pub struct SyncUI {
    spinner: ProgressBar,
    posters: ProgressBar,
    interactive: bool,
}

impl SyncUI {
    /// `visible` is false for JSON or quiet output
    pub fn new(visible: bool) -> Self {
        let interactive = visible && is_interactive();
        let multi = MultiProgress::new();

        let spinner = multi.add(ProgressBar::new_spinner());
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        let posters = multi.add(ProgressBar::new(0));
        posters.set_style(
            ProgressStyle::default_bar()
                .template("  [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} posters")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );

        if interactive {
            spinner.enable_steady_tick(Duration::from_millis(100));
        } else {
            spinner.set_draw_target(indicatif::ProgressDrawTarget::hidden());
            posters.set_draw_target(indicatif::ProgressDrawTarget::hidden());
            tracing::debug!(mode = "non_interactive", "Progress bars disabled");
        }

        Self {
            spinner,
            posters,
            interactive,
        }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        let msg = msg.into();
        if self.interactive {
            self.spinner.set_message(msg);
        } else {
            tracing::info!(operation = "progress", message = %msg, "Progress update");
        }
    }

    /// Callback handed to `CatalogSync`; only touches the bars
    pub fn callback(&self) -> ProgressCallback {
        let spinner = self.spinner.clone();
        let posters = self.posters.clone();
        Arc::new(move |event: SyncProgress| match event {
            SyncProgress::Authenticated => spinner.set_message("Authenticated, listing library..."),
            SyncProgress::Listed { total } => {
                spinner.set_message(format!("Found {} movies", total));
                posters.set_length(total as u64);
            }
            SyncProgress::PosterFetched { done, .. } => posters.set_position(done as u64),
            SyncProgress::Stored { entries } => spinner.set_message(format!("Stored {} movies", entries)),
        })
    }

    pub fn finish(&self) {
        self.posters.finish_and_clear();
        self.spinner.finish_and_clear();
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
