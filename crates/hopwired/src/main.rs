use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hopwired::{Config, Node, Scenario};

#[derive(Parser, Debug)]
#[command(name = "hopwired")]
#[command(about = "Shortest-path forwarding controller", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "HOPWIRED_CONFIG")]
    config: Option<PathBuf>,

    /// Initialize a new configuration and exit
    #[arg(long)]
    init: bool,

    /// Scenario file to replay (overrides the configured one)
    #[arg(short, long, env = "HOPWIRED_SCENARIO")]
    scenario: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the final topology as JSON on exit
    #[arg(long)]
    dump_topology: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.init {
        let config = Config::create_default(args.config)?;
        println!("Configuration written to {}", config.config_path().display());
        return Ok(());
    }

    let config = Config::load(args.config)?;
    init_tracing(&config, args.debug);

    info!(config = %config.config_path().display(), "Configuration loaded");

    let scenario = match args.scenario.or_else(|| config.scenario.path.clone()) {
        Some(path) => Scenario::load(&path)?,
        None => {
            info!("No scenario configured, using the built-in tree network");
            Scenario::tree()
        }
    };

    let report = Node::new(config, scenario).run().await?;

    info!(
        events = report.events,
        messages = report.messages,
        hosts_learned = report.stats.hosts_learned,
        rules_installed = report.stats.rules_installed,
        "Run finished"
    );

    if args.dump_topology {
        println!("{}", serde_json::to_string_pretty(&report.topology)?);
    }

    Ok(())
}

fn init_tracing(config: &Config, debug: bool) {
    let level = if debug {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}
