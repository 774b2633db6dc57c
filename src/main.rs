use clap::{Parser, Subcommand, builder::styling};
use coingecko_pipeline::cli;
use coingecko_pipeline::etl::RetryPolicy;
use eyre::Result;
use std::time::Duration;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// CoinGecko market pipeline: --{coinpipe}-> fetches a market snapshot, stages it in GCS, and loads it into BigQuery
#[derive(Parser)]
#[command(name = "coinpipe", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source configuration from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full fetch → transform → load pipeline
    Run {
        /// Attempts per step, including the first
        #[arg(long, default_value_t = 2)]
        max_attempts: u32,

        /// Seconds to wait between attempts
        #[arg(long, default_value_t = 300)]
        backoff_secs: u64,
    },

    /// Fetch a market snapshot and stage it as raw JSON
    Fetch,

    /// Project the staged snapshot into the transformed CSV object
    Transform,

    /// Load the transformed object into the warehouse table
    Load,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::from_filename(&cli.env).ok();

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match cli.command {
        Commands::Run {
            max_attempts,
            backoff_secs,
        } => {
            let retry = RetryPolicy::new(max_attempts, Duration::from_secs(backoff_secs));
            cli::run_pipeline(retry).await?;
        }
        Commands::Fetch => cli::run_fetch().await?,
        Commands::Transform => cli::run_transform().await?,
        Commands::Load => cli::run_load().await?,
    }

    Ok(())
}
