//! Navigation router CLI.
//!
//! # Commands
//!
//! ```text
//! compile <pattern>        regex source and keys of a path pattern
//! resolve <url>            RouteInfo of a URL, as JSON
//! build                    URL for a route request
//! reverse <route>          path of a named route
//! navigate <url>...        drive the controller over an in-memory history
//! watch                    reload routes on config changes until Ctrl-C
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::sync::broadcast;
use url::Url;

use navigation_router::config::{load_config, watcher::ConfigWatcher, RouterConfig};
use navigation_router::navigation::{
    Collaborators, FileSpecLoader, HeadlessHost, MemoryHistory, NavigationController, NavigationOutcome,
    PassThroughValidator,
};
use navigation_router::observability::logging::init_logging;
use navigation_router::pattern::path_to_regex;
use navigation_router::routing::{
    NavigationOptions, QueryParameters, RouteInfo, RouteParameters, RouteRequest, RouteTable, UrlBuilder,
};

#[derive(Parser)]
#[command(name = "navigation-router")]
#[command(about = "Compile path patterns, resolve URLs and drive navigations", long_about = None)]
struct Cli {
    /// Router configuration file (TOML).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the regex and keys of a path pattern
    Compile {
        pattern: String,
        #[arg(long)]
        sensitive: bool,
        #[arg(long)]
        strict: bool,
        /// Allow prefix matches
        #[arg(long)]
        no_end: bool,
    },
    /// Resolve a URL against the configured routes
    Resolve { url: String },
    /// Build a URL from a route request
    Build {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        query: Option<String>,
        /// Query parameter as key=value, repeatable
        #[arg(short, long = "param")]
        params: Vec<String>,
        /// Current location, for defaults and merging
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        merge: bool,
    },
    /// Build the path of a named route
    Reverse {
        route: String,
        /// Route parameter as key=value, repeatable
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    /// Start the router and open each URL in turn
    Navigate {
        urls: Vec<String>,
        /// Initial location (defaults to settings.app_base_url)
        #[arg(long)]
        start: Option<String>,
    },
    /// Watch the configuration file and hot-reload routes
    Watch,
}

fn split_pair(pair: &str) -> Result<(String, String), Box<dyn std::error::Error>> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", pair))?;
    Ok((key.to_string(), value.to_string()))
}

fn print_json(value: &serde_json::Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };
    init_logging(&config.observability)?;

    tracing::debug!(routes = config.routes.len(), "Configuration loaded");

    let base_url = Url::parse(&config.settings.app_base_url)?;

    match cli.command {
        Commands::Compile {
            pattern,
            sensitive,
            strict,
            no_end,
        } => {
            let mut options = config.patterns.clone();
            options.sensitive |= sensitive;
            options.strict |= strict;
            options.end &= !no_end;
            let matcher = path_to_regex(pattern.as_str(), &options)?;
            print_json(&json!({ "regex": matcher.as_str(), "keys": matcher.keys() }))?;
        }
        Commands::Resolve { url } => {
            let table = RouteTable::from_config(&config.routes, &config.patterns)?;
            let info = table.resolve_str(&url, &base_url)?;
            print_json(&serde_json::to_value(&info)?)?;
        }
        Commands::Build {
            url,
            path,
            query,
            params,
            from,
            merge,
        } => {
            let table = RouteTable::from_config(&config.routes, &config.patterns)?;
            let current = match from {
                Some(from) => table.resolve_str(&from, &base_url)?,
                None => RouteInfo::default(),
            };
            let query_parameters = if params.is_empty() {
                None
            } else {
                let mut map = QueryParameters::new();
                for pair in &params {
                    let (key, value) = split_pair(pair)?;
                    map.insert(key, value.into());
                }
                Some(map)
            };
            let request = RouteRequest {
                url,
                path,
                query,
                query_parameters,
                display_url: None,
            };
            let options = NavigationOptions {
                merge_parameters: merge,
                ..NavigationOptions::default()
            };
            println!("{}", UrlBuilder::build(&request, &current, &options));
        }
        Commands::Reverse { route, params } => {
            let table = RouteTable::from_config(&config.routes, &config.patterns)?;
            let mut values = RouteParameters::new();
            for pair in &params {
                let (key, value) = split_pair(pair)?;
                values.insert(key, value);
            }
            println!("{}", table.reverse(&route, &values)?);
        }
        Commands::Navigate { urls, start } => {
            let start = start.unwrap_or_else(|| base_url.to_string());
            let history = Arc::new(MemoryHistory::new(&start)?);
            let controller = NavigationController::new(
                &config,
                Collaborators {
                    history: history.clone(),
                    validator: Arc::new(PassThroughValidator),
                    specs: Arc::new(FileSpecLoader),
                    host: Arc::new(HeadlessHost),
                },
            )?;

            let mut outcome = controller.start(NavigationOptions::default()).await?;
            for url in urls {
                if let NavigationOutcome::Jumped(_) = outcome {
                    break;
                }
                outcome = controller
                    .open_route(Some(RouteRequest::url(url)), NavigationOptions::default())
                    .await?;
            }

            let jumped = match &outcome {
                NavigationOutcome::Jumped(url) => Some(url.clone()),
                _ => None,
            };
            print_json(&json!({
                "state": controller.state().to_string(),
                "route": &*controller.current_route(),
                "spec": controller.active_spec().map(|spec| spec.name.clone()),
                "jumped_to": jumped,
                "history": history.urls(),
            }))?;
        }
        Commands::Watch => {
            let path = cli.config.ok_or("watch requires --config")?;
            let history = Arc::new(MemoryHistory::new(base_url.as_str())?);
            let controller = Arc::new(NavigationController::new(
                &config,
                Collaborators {
                    history,
                    validator: Arc::new(PassThroughValidator),
                    specs: Arc::new(FileSpecLoader),
                    host: Arc::new(HeadlessHost),
                },
            )?);
            controller.start(NavigationOptions::default()).await?;

            let (shutdown_tx, _) = broadcast::channel(1);
            let listener = controller.spawn(shutdown_tx.subscribe());

            let (watcher, mut updates) = ConfigWatcher::new(&path);
            let _watcher = watcher.run()?;

            loop {
                tokio::select! {
                    Some(new_config) = updates.recv() => {
                        match controller.reload_routes(&new_config) {
                            Ok(()) => tracing::info!(routes = new_config.routes.len(), "Routes reloaded"),
                            Err(e) => tracing::error!(error = %e, "Failed to apply reloaded routes"),
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received Ctrl-C, shutting down");
                        break;
                    }
                }
            }

            let _ = shutdown_tx.send(());
            listener.await?;
            tracing::info!("Shutdown complete");
        }
    }

    Ok(())
}
