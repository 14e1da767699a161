use anyhow::{Context, Result};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

use folio::app::App;
use folio::config::Config;
use folio::opds::CatalogStore;
use folio::routing::Route;
use folio::ui;

/// Get the config directory path (~/.config/folio/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("folio");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(name = "folio", about = "Terminal OPDS catalog browser")]
struct Args {
    /// Catalog page file or directory of pages (OPDS 2.0 JSON).
    /// Use "-" to read a single page from stdin.
    catalog: Option<PathBuf>,

    /// Config file (default: ~/.config/folio/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured locale for this run
    #[arg(long, value_name = "TAG")]
    locale: Option<String>,

    /// Print the effective shortcut table and exit
    #[arg(long)]
    dump_shortcuts: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the TUI
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => {
            let config_dir = get_config_dir()?;
            if !config_dir.exists() {
                std::fs::create_dir_all(&config_dir)
                    .context("Failed to create config directory")?;
            }
            config_dir.join("config.toml")
        }
    };

    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(locale) = &args.locale {
        config.locale = locale.clone();
    }

    if args.dump_shortcuts {
        let (map, warnings) = config.shortcut_map();
        for warning in &warnings {
            eprintln!("warning: {}", warning);
        }
        for (_, keys, description) in map.all_bindings() {
            println!("{:<28} {}", keys, description);
        }
        return Ok(());
    }

    let mut store = CatalogStore::new();
    match &args.catalog {
        Some(path) if path.as_os_str() == "-" => {
            let mut json = String::new();
            std::io::stdin()
                .read_to_string(&mut json)
                .context("Failed to read catalog from stdin")?;
            store
                .load_json(&json)
                .context("Failed to parse catalog from stdin")?;
        }
        Some(path) => {
            store
                .load_path(path)
                .with_context(|| format!("Failed to load catalog from {}", path.display()))?;
        }
        None => {
            eprintln!("Error: no catalog given.");
            eprintln!();
            eprintln!("Pass a catalog page file or a directory of pages:");
            eprintln!("  folio ./catalog-pages/");
            eprintln!("  curl -s https://example.com/opds | folio -");
            std::process::exit(1);
        }
    }
    if store.is_empty() {
        anyhow::bail!("No catalog pages could be loaded");
    }

    let (mut app, channels) = App::new(&config, store).context("Failed to create application")?;

    // The configured catalog_url picks the start page when it is among the
    // loaded pages.
    if let Some(raw) = &config.catalog_url {
        match url::Url::parse(raw) {
            Ok(url) if app.store.get(&url).is_some() => app.navigate(Route::catalog(url)),
            Ok(_) => {
                tracing::warn!(url = %raw, "Configured catalog_url is not among the loaded pages")
            }
            Err(error) => tracing::warn!(url = %raw, %error, "Configured catalog_url is not a URL"),
        }
    }

    ui::run(&mut app, channels, config_path).await?;
    Ok(())
}
