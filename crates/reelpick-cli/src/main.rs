use clap::{ArgAction, Parser, Subcommand};
use commands::{clear, config, pick, serve, sync};
use reelpick_config::PathManager;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "reelpick")]
#[command(about = "reelpick - random movie picks from your Jellyfin library and Letterboxd watchlist")]
#[command(version)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the catalog, reconcile the watchlist, then serve the HTTP API
    #[command(long_about = "Run the startup passes (catalog sync from Jellyfin, then watchlist reconciliation) and serve the random pick API. A failed startup pass aborts the server. Stop with Ctrl-C.")]
    Serve {
        /// Address to listen on (overrides server.bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Skip the startup catalog sync
        #[arg(long, action = ArgAction::SetTrue)]
        skip_sync: bool,

        /// Skip the startup watchlist reconciliation
        #[arg(long, action = ArgAction::SetTrue)]
        skip_reconcile: bool,

        /// Write logs to a daily-rotated file instead of stderr
        #[arg(long, action = ArgAction::SetTrue)]
        log_to_file: bool,
    },
    /// One-shot catalog sync and watchlist reconciliation
    Sync {
        /// Do not download poster images
        #[arg(long, action = ArgAction::SetTrue)]
        no_images: bool,

        /// Only sync the catalog
        #[arg(long, action = ArgAction::SetTrue)]
        skip_reconcile: bool,
    },
    /// Print random picks from the local database
    Pick {
        /// Number of movies to pick (defaults to server.default_pick_count)
        #[arg(short, long)]
        count: Option<usize>,

        /// Pick from the watchlist pairs instead of the whole catalog
        #[arg(long, action = ArgAction::SetTrue)]
        watchlist: bool,
    },
    /// Manage configuration and credentials
    #[command(long_about = "Manage the config file and the Jellyfin credentials. Running without a subcommand shows the current configuration.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
    /// Clear persisted data
    Clear {
        /// Clear the reconciled watchlist pairs
        #[arg(long, action = ArgAction::SetTrue)]
        pairs: bool,

        /// Clear the catalog (and with it every pair)
        #[arg(long, action = ArgAction::SetTrue)]
        catalog: bool,

        /// Clear the database and the stored credentials
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["pairs", "catalog"])]
        all: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show credentials unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a new config file
    Init {
        /// Jellyfin server URL (if not provided, will prompt)
        #[arg(long)]
        host: Option<String>,

        /// Overwrite an existing config file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Configure Jellyfin credentials
    #[command(long_about = "Store the Jellyfin username and password in the credentials file. The password is always prompted for and verified against the server before saving.")]
    Jellyfin {
        /// Jellyfin username (if not provided, will prompt)
        #[arg(long)]
        username: Option<String>,

        /// Jellyfin server URL (updates the config file)
        #[arg(long)]
        host: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Serve { log_to_file: true, .. } => Some(PathManager::default().server_log_file()),
        _ => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Serve {
            bind,
            skip_sync,
            skip_reconcile,
            log_to_file: _,
        } => serve::run_serve(bind, skip_sync, skip_reconcile, &output).await,
        Commands::Sync {
            no_images,
            skip_reconcile,
        } => sync::run_sync(no_images, skip_reconcile, &output).await,
        Commands::Pick { count, watchlist } => pick::run_pick(count, watchlist, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output).await
        }
        Commands::Clear { pairs, catalog, all } => clear::run_clear(pairs, catalog, all, &output).await,
    }
}
