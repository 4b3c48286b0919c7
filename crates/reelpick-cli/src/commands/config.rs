use super::prompts;
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use reelpick_config::{Config, CredentialStore, PathManager};
use reelpick_sources::{CatalogSource, JellyfinClient, JellyfinCredentials};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, output),
        ConfigCommands::Init { host, force } => init_config(host, force, output),
        ConfigCommands::Jellyfin { username, host } => configure_jellyfin(username, host, output).await,
    }
}

fn load_credentials(path_manager: &PathManager) -> Result<CredentialStore> {
    let credentials_file = path_manager.credentials_file();
    let mut cred_store = CredentialStore::new(credentials_file.clone());
    cred_store
        .load()
        .map_err(|e| eyre!("Failed to load credentials from {}: {}", credentials_file.display(), e))?;
    Ok(cred_store)
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Create one with 'reelpick config init'.");
        return Ok(());
    }

    let config = Config::load_from_file(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    let cred_store = load_credentials(&path_manager)?;

    let secret = |value: Option<String>| match value {
        Some(v) if full => v,
        Some(v) => mask_string(&v),
        None => "<not set>".to_string(),
    };
    let username = secret(cred_store.get_jellyfin_username());
    let password = secret(cred_store.get_jellyfin_password());
    let watchlist_csv = config.watchlist_csv_path(&path_manager);
    let database = config.database_path(&path_manager);

    if !output.is_human() {
        output.json(&json!({
            "config_file": config_file,
            "jellyfin": {
                "server_url": config.jellyfin.server_url,
                "library_name": config.jellyfin.library_name,
                "device_id": config.jellyfin.device_id,
                "username": username,
                "password": password,
            },
            "watchlist_csv": watchlist_csv,
            "database": database,
            "server": {
                "bind": config.server.bind,
                "default_pick_count": config.server.default_pick_count,
                "max_pick_count": config.server.max_pick_count,
            },
            "sync": {
                "sync_on_startup": config.sync.sync_on_startup,
                "reconcile_on_startup": config.sync.reconcile_on_startup,
                "fetch_images": config.sync.fetch_images,
                "image_concurrency": config.sync.image_concurrency,
            },
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    println!();
    println!("{}", "Configuration".bright_cyan().bold());
    println!("{}", config_file.display().bright_black());
    println!();

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
    ]);
    let rows: Vec<(&str, String)> = vec![
        ("Jellyfin server", config.jellyfin.server_url.clone()),
        ("Library", config.jellyfin.library_name.clone()),
        ("Device id", config.jellyfin.device_id.clone()),
        ("Username", username),
        ("Password", password),
        ("Watchlist CSV", watchlist_csv.display().to_string()),
        ("Database", database.display().to_string()),
        ("Bind address", config.server.bind.clone()),
        (
            "Pick count",
            format!(
                "{} (max {})",
                config.server.default_pick_count, config.server.max_pick_count
            ),
        ),
        ("Sync on startup", yes_no(config.sync.sync_on_startup)),
        ("Reconcile on startup", yes_no(config.sync.reconcile_on_startup)),
        (
            "Posters",
            if config.sync.fetch_images {
                format!("{} at a time", config.sync.image_concurrency)
            } else {
                "disabled".to_string()
            },
        ),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    println!("{}", table);

    Ok(())
}

fn init_config(host_arg: Option<String>, force: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_file = path_manager.config_file();

    if config_file.exists() && !force {
        return Err(eyre!(
            "Configuration already exists at {}. Use --force to overwrite it",
            config_file.display()
        ));
    }
    path_manager
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;

    print_section_header("reelpick setup", output);
    let host = match host_arg {
        Some(host) => host,
        None => prompts::prompt_required("Jellyfin server URL (e.g. http://jellyfin:8096)", None)?,
    };

    let mut config = Config::new(host.trim().to_string());
    config.jellyfin.library_name = prompts::prompt_required("Movie library name", Some(&config.jellyfin.library_name))?;

    let default_csv = path_manager.default_watchlist_csv();
    let csv = prompts::prompt_string(
        "Letterboxd watchlist CSV",
        Some(&default_csv.display().to_string()),
    )?;
    if !csv.is_empty() && PathBuf::from(&csv) != default_csv {
        config.watchlist.csv_path = Some(PathBuf::from(csv));
    }

    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration: {}", e))?;
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    output.success(format!("Configuration saved to {}", config_file.display()));
    output.info("Next: store your Jellyfin login with 'reelpick config jellyfin'.");
    Ok(())
}

async fn configure_jellyfin(username_arg: Option<String>, host_arg: Option<String>, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    path_manager
        .ensure_directories()
        .map_err(|e| eyre!("Failed to create configuration directories: {}", e))?;

    let config_file = path_manager.config_file();
    let mut config = if config_file.exists() {
        Config::load_from_file(&config_file)
            .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?
    } else {
        let host = match &host_arg {
            Some(host) => host.clone(),
            None => prompts::prompt_required("Jellyfin server URL", None)?,
        };
        output.info("Configuration file not found. Creating default configuration...");
        Config::new(host)
    };
    if let Some(host) = host_arg {
        config.jellyfin.server_url = host;
    }

    let mut cred_store = load_credentials(&path_manager)?;

    print_section_header("Jellyfin login", output);
    let username = match username_arg {
        Some(username) => username,
        None => {
            let existing = cred_store.get_jellyfin_username();
            prompts::prompt_required("Jellyfin username", existing.as_deref())?
        }
    };
    let password = loop {
        let password = prompts::prompt_password("Jellyfin password")?;
        if !password.is_empty() {
            break password;
        }
        output.error("Password cannot be empty");
    };

    let credentials = JellyfinCredentials {
        username: username.clone(),
        password: password.clone(),
        device_token: cred_store.get_jellyfin_device_token(),
    };
    if !verify_login(&config, credentials, output).await?
        && !prompts::prompt_yes_no("Save these credentials anyway?", false)?
    {
        return Err(eyre!("Jellyfin login failed, nothing saved"));
    }

    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to save config to {}: {}", config_file.display(), e))?;

    cred_store.set_jellyfin_username(username);
    cred_store.set_jellyfin_password(password);
    cred_store.save().map_err(|e| {
        eyre!(
            "Failed to save credentials to {}: {}",
            path_manager.credentials_file().display(),
            e
        )
    })?;

    output.success("Jellyfin configuration saved!");
    output.println(format!("  Server: {}", config.jellyfin.server_url));
    Ok(())
}

/// Try the login once; false when the server refused it
async fn verify_login(config: &Config, credentials: JellyfinCredentials, output: &Output) -> Result<bool> {
    let client = JellyfinClient::new(&config.jellyfin, credentials)
        .map_err(|e| eyre!("Failed to create Jellyfin client: {:#}", e))?;

    let spinner = indicatif::ProgressBar::new_spinner();
    if output.is_human() && !output.is_quiet() {
        spinner.set_style(
            indicatif::ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
        );
        spinner.set_message(format!("Logging in to {}...", config.jellyfin.server_url));
        spinner.enable_steady_tick(Duration::from_millis(100));
    } else {
        spinner.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let result = client.authenticate().await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            output.success("Logged in to Jellyfin");
            Ok(true)
        }
        Err(e) => {
            output.warn(format!("Login failed: {}", e));
            Ok(false)
        }
    }
}

fn mask_string(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

fn yes_no(value: bool) -> String {
    if value {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn print_section_header(title: &str, output: &Output) {
    output.println("");
    output.println(format!("{}", title.bold().bright_cyan()));
    output.println(format!("{}", "─".repeat(title.chars().count()).bright_cyan()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string(""), "");
        assert_eq!(mask_string("abc"), "***");
        assert_eq!(mask_string("elliott"), "el***tt");
        // Multi-byte characters are never split
        assert_eq!(mask_string("ééééé"), "éé***éé");
    }
}
