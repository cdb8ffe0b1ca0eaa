use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use std::fs::{self, File};
use std::sync::Arc;
use tagwatch::adapters::credentials::resolve_token;
use tagwatch::adapters::github::GithubApi;
use tagwatch::adapters::persistence::FileConfigStore;
use tagwatch::cli::{CliArgs, Commands};
use tagwatch::runtime::TagwatchApp;
use tagwatch_core::app::{Dashboard, Registry};
use tagwatch_core::ports::{Clock, ConfigStore, RemoteApi, SystemClock};
use tagwatch_core::StatusResolver;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let store = match &args.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new()?,
    };

    if let Some(Commands::Init { force }) = args.command {
        return init_config(&store, force);
    }

    init_logging();
    info!("tagwatch {} starting", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn ConfigStore> = Arc::new(store);
    let registry = match Registry::load(store) {
        Ok(registry) => registry,
        Err(e) => {
            error!("Could not load configuration: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    info!("Tracking {} repositories", registry.len());

    let token = resolve_token();
    // The blocking HTTP client has to be built and dropped outside the
    // async runtime, so this handle outlives it.
    let github = Arc::new(GithubApi::new(&registry.config().remote, token.as_deref())?);
    let authenticated = github.is_authenticated();

    let api: Arc<dyn RemoteApi> = github.clone();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let resolver = Arc::new(StatusResolver::new(api, clock.clone()));
    let app = TagwatchApp::new(Dashboard::new(registry), resolver, clock, authenticated);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let result = runtime.block_on(app.run());

    // Resolutions still in flight are abandoned
    runtime.shutdown_background();

    if let Err(e) = result {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    info!("tagwatch shut down cleanly");
    Ok(())
}

fn init_config(store: &FileConfigStore, force: bool) -> Result<()> {
    if store.write_example(force)? {
        println!("Wrote sample config to {}", store.path().display());
        println!("Edit it to list your repositories, then run `tagwatch`.");
    } else {
        println!(
            "{} already exists; use `tagwatch init --force` to overwrite it.",
            store.path().display()
        );
    }
    Ok(())
}

/// Log to a file: the terminal belongs to the dashboard. Logging stays off
/// when no log file can be opened.
fn init_logging() {
    let filter = std::env::var("TAGWATCH_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());

    let Some(dirs) = ProjectDirs::from("", "", "tagwatch") else {
        return;
    };
    let log_dir = dirs.state_dir().unwrap_or_else(|| dirs.cache_dir());
    if fs::create_dir_all(log_dir).is_err() {
        return;
    }
    let Ok(file) = File::create(log_dir.join("tagwatch.log")) else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
}
