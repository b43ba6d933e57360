use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mapsearch::highlight::HighlightEngine;
use mapsearch::host::{HostState, OnScreenSnapshot, RecordingHost};
use mapsearch::lookup::{LookupAdapter, OfflineLookup};
use mapsearch::output;
use mapsearch::resolver::Resolver;
use mapsearch::utils::{self, AppConfig};
use serde::Serialize;
use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "mapsearch")]
#[command(about = "Resolve pasted map links, coordinates and object ids into editor actions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the app data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve pasted text against a host
    Resolve {
        /// Texts to resolve, one paste each (reads stdin lines when omitted)
        texts: Vec<String>,

        /// JSON host state (loaded objects, region, snapshot)
        #[arg(long)]
        host: Option<PathBuf>,

        /// Do not contact any external service
        #[arg(long)]
        offline: bool,

        /// Print one JSON report per input
        #[arg(long)]
        json: bool,
    },
    /// Run the live highlight over an on-screen snapshot
    Highlight {
        /// Successive search-box values, as typed
        #[arg(required_unless_present = "stdin")]
        queries: Vec<String>,

        /// JSON snapshot of the segments and venues on screen
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Read search-box values from stdin, one per line
        #[arg(long)]
        stdin: bool,

        /// Click a count badge after the last value
        #[arg(long, value_enum)]
        click: Option<CountBadge>,

        /// Print one JSON report per value
        #[arg(long)]
        json: bool,
    },
    /// List recognized formats in dispatch order
    Formats,
    /// Show the effective configuration
    Config {
        /// Write the current settings to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CountBadge {
    Roads,
    Places,
}

#[derive(Serialize)]
struct ResolveReport<'a> {
    input: &'a str,
    outcome: &'a mapsearch::resolver::ResolveOutcome,
    effects: &'a [mapsearch::host::Effect],
}

#[derive(Serialize)]
struct HighlightReport<'a> {
    input: &'a str,
    phase: mapsearch::highlight::Phase,
    state: &'a mapsearch::highlight::HighlightState,
    effects: &'a [mapsearch::host::Effect],
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => utils::get_config_path()?,
    };
    let config = AppConfig::load_from(&config_path)?;
    let color = !cli.no_color;

    match cli.command {
        Commands::Resolve {
            texts,
            host,
            offline,
            json,
        } => {
            let inputs = if texts.is_empty() {
                read_stdin_lines()?
                    .into_iter()
                    .filter(|line| !line.trim().is_empty())
                    .collect()
            } else {
                texts
            };

            let state = match host {
                Some(path) => HostState::load(&path)?,
                None => HostState {
                    region: config.region.clone(),
                    ..Default::default()
                },
            };
            let mut host = RecordingHost::new(state);

            if offline {
                let resolver = Resolver::new(OfflineLookup, config.resolver_settings());
                resolve_all(&resolver, &mut host, &inputs, json, color)?;
            } else {
                run_online(&config, &mut host, &inputs, json, color)?;
            }
        }
        Commands::Highlight {
            queries,
            snapshot,
            stdin,
            click,
            json,
        } => {
            let inputs = if stdin { read_stdin_lines()? } else { queries };
            let snapshot = match snapshot {
                Some(path) => read_json::<OnScreenSnapshot>(&path)?,
                None => OnScreenSnapshot::default(),
            };
            run_highlight(snapshot, &inputs, click, json, color)?;
        }
        Commands::Formats => {
            let resolver = Resolver::new(OfflineLookup, config.resolver_settings());
            output::print_formats(resolver.registry().rules(), color)?;
        }
        Commands::Config { init } => {
            if init {
                if let Some(parent) = config_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                config.save_to(&config_path)?;
                tracing::info!(path = %config_path.display(), "config written");
            }
            output::print_config(&config_path, &config, color)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))
}

#[cfg(feature = "http")]
fn run_online(
    config: &AppConfig,
    host: &mut RecordingHost,
    inputs: &[String],
    json: bool,
    color: bool,
) -> Result<()> {
    let lookup = mapsearch::lookup::HttpLookup::from_config(config)
        .context("Failed to set up HTTP lookups")?;
    let resolver = Resolver::new(lookup, config.resolver_settings());
    resolve_all(&resolver, host, inputs, json, color)
}

#[cfg(not(feature = "http"))]
fn run_online(
    config: &AppConfig,
    host: &mut RecordingHost,
    inputs: &[String],
    json: bool,
    color: bool,
) -> Result<()> {
    tracing::warn!("built without the http feature, lookups are disabled");
    let resolver = Resolver::new(OfflineLookup, config.resolver_settings());
    resolve_all(&resolver, host, inputs, json, color)
}

fn resolve_all<L: LookupAdapter>(
    resolver: &Resolver<L>,
    host: &mut RecordingHost,
    inputs: &[String],
    json: bool,
    color: bool,
) -> Result<()> {
    for input in inputs {
        let outcome = resolver.resolve(host, input);
        let effects = host.take_effects();

        if json {
            output::print_json(&ResolveReport {
                input,
                outcome: &outcome,
                effects: &effects,
            })?;
        } else {
            output::print_outcome(input, &outcome, &effects, color)?;
        }
    }
    Ok(())
}

fn run_highlight(
    snapshot: OnScreenSnapshot,
    inputs: &[String],
    click: Option<CountBadge>,
    json: bool,
    color: bool,
) -> Result<()> {
    let mut host = RecordingHost::default();
    host.set_snapshot(snapshot);
    let mut engine = HighlightEngine::new();

    let report = |engine: &HighlightEngine, input: &str, effects: &[mapsearch::host::Effect]| {
        if json {
            output::print_json(&HighlightReport {
                input,
                phase: engine.phase(),
                state: engine.state(),
                effects,
            })
        } else {
            output::print_highlight(input, engine.phase(), engine.state(), effects, color)
        }
    };

    for input in inputs {
        engine.on_input(&mut host, input);
        let effects = host.take_effects();
        report(&engine, input, &effects)?;
    }

    if let Some(badge) = click {
        let (label, clicked) = match badge {
            CountBadge::Roads => ("click roads", engine.select_roads(&mut host)),
            CountBadge::Places => ("click places", engine.select_places(&mut host)),
        };
        if !clicked {
            tracing::info!("nothing to select");
        }
        let effects = host.take_effects();
        report(&engine, label, &effects)?;
    }

    Ok(())
}

fn read_stdin_lines() -> Result<Vec<String>> {
    io::stdin()
        .lock()
        .lines()
        .collect::<io::Result<Vec<_>>>()
        .context("Failed to read stdin")
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}
