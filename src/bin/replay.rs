use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tripmuse::services::PreferenceManager;
use tripmuse::{init_tracing, ActorId, BehaviorEvent, Config};

/// Replays recorded behavior events into a fresh store and prints what it learned.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// JSON array of behavior events.
    #[arg(short, long)]
    events: String,

    /// Only print insights for this actor.
    #[arg(short, long)]
    actor: Option<String>,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };

    let raw = std::fs::read_to_string(&args.events)
        .with_context(|| format!("reading events from {}", args.events))?;
    let mut events: Vec<BehaviorEvent> = serde_json::from_str(&raw).context("parsing behavior events")?;
    events.sort_by_key(|event| event.timestamp);

    let manager = PreferenceManager::new(config.learning);
    for event in events {
        manager.record_behavior(event);
    }
    info!("Replayed events for {} actors", manager.len());

    let mut actors: Vec<ActorId> = match args.actor {
        Some(actor) => vec![ActorId::new(actor)?],
        None => manager.snapshot().into_keys().collect(),
    };
    actors.sort();

    let insights: serde_json::Map<String, serde_json::Value> = actors
        .iter()
        .map(|actor| Ok((actor.to_string(), serde_json::to_value(manager.get_insights(actor))?)))
        .collect::<Result<_>>()?;

    println!("{}", serde_json::to_string_pretty(&insights)?);
    Ok(())
}
