//! Scrapoxy CLI - control a Scrapoxy commander from the command line.
//!
//! # Commands
//!
//! - `scrapoxy scaling` - Show the current scaling
//! - `scrapoxy scale --min 1 --required 3 --max 5` - Set the scaling
//! - `scrapoxy up` / `scrapoxy down` - Set required instances to max / min
//! - `scrapoxy config` - Show the commander configuration
//! - `scrapoxy update-config '<json>'` - Patch the commander configuration
//! - `scrapoxy instances` - List instances
//! - `scrapoxy stop <name>` - Stop an instance
//!
//! The commander URL and password come from `--api-url` / `--password` or
//! `SCRAPOXY_API_URL` / `SCRAPOXY_PASSWORD`.

use clap::{Parser, Subcommand};
use scrapoxy_client::{Scaling, ScrapoxyClient, Value};
use std::process::ExitCode;
use std::time::Duration;
use tokio::runtime::Handle;

mod error;

use error::{CliError, CliResult};

/// Scrapoxy CLI - commander scaling and instance control
#[derive(Debug, Parser)]
#[command(name = "scrapoxy")]
#[command(version)]
#[command(about = "Control a Scrapoxy commander: scaling, configuration and instances")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Commander API URL, e.g. http://localhost:8889/api/
    #[arg(long, env = "SCRAPOXY_API_URL")]
    api_url: String,

    /// Commander password
    #[arg(long, env = "SCRAPOXY_PASSWORD", hide_env_values = true)]
    password: String,

    /// Request timeout in seconds
    #[arg(long, env = "SCRAPOXY_TIMEOUT_SECS", default_value_t = 30)]
    timeout: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the current scaling
    Scaling,

    /// Set the scaling
    Scale {
        /// Minimum number of instances
        #[arg(long)]
        min: u32,
        /// Number of instances to keep running
        #[arg(long)]
        required: u32,
        /// Maximum number of instances
        #[arg(long)]
        max: u32,
    },

    /// Set required instances to the maximum
    Up,

    /// Set required instances to the minimum
    Down,

    /// Show the commander configuration
    Config,

    /// Patch the commander configuration with a JSON object
    UpdateConfig {
        /// JSON patch, e.g. '{"instance":{"scaling":{"max":10}}}'
        json: String,
    },

    /// List instances
    #[command(alias = "ls")]
    Instances,

    /// Stop an instance
    Stop {
        /// Instance name
        name: String,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(client: &ScrapoxyClient, command: Commands) -> CliResult<Value> {
    let value = match command {
        Commands::Scaling => client.get_scaling().await?,
        Commands::Scale { min, required, max } => {
            let scaling = Scaling::new(min, required, max);
            if !scaling.is_ordered() {
                tracing::warn!(min, required, max, "Scaling is not ordered min <= required <= max");
            }
            client.scale(scaling).await?
        }
        Commands::Up => client.up_scale().await?,
        Commands::Down => client.down_scale().await?,
        Commands::Config => client.get_config().await?,
        Commands::UpdateConfig { json } => {
            let patch: Value = serde_json::from_str(&json)?;
            if !patch.is_object() {
                return Err(CliError::InvalidArgument(
                    "configuration patch must be a JSON object".to_string(),
                ));
            }
            client.update_config(&patch).await?
        }
        Commands::Instances => client.get_instances().await?,
        Commands::Stop { name } => client.stop_instance(name).await?,
    };
    Ok(value)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let client = match ScrapoxyClient::builder(cli.api_url, cli.password)
        .timeout(Duration::from_secs(cli.timeout))
        .engine(Handle::current())
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli.command).await {
        Ok(value) => {
            match serde_json::to_string_pretty(&value) {
                Ok(text) => println!("{text}"),
                Err(_) => println!("{value}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
