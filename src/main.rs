//! url-collector main entry point
//!
//! Loads configuration from the environment (and `.env`), applies command-line
//! overrides and serves the HTTP API until interrupted.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use url_collector::{Config, ProviderKind, provider, run_with_shutdown};

/// url-collector: picture URLs for a date range
///
/// Every option can also be set through the environment (API_KEY,
/// CONCURRENT_REQUESTS, PORT, PROVIDER, ...); flags take precedence.
#[derive(Parser, Debug)]
#[command(name = "url-collector")]
#[command(version)]
#[command(about = "Collects one picture URL per day over a date range", long_about = None)]
struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Picture provider (overrides PROVIDER)
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,

    /// Maximum concurrent upstream requests (overrides CONCURRENT_REQUESTS)
    #[arg(short = 'c', long)]
    concurrent_requests: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the effective configuration (API key redacted) and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    if cli.check_config {
        println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    let provider = provider::build(&config.provider)?;

    match run_with_shutdown(config, provider).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            Err(e.into())
        }
    }
}

/// Environment first, then command-line overrides, then validation
fn load_config(cli: &Cli) -> url_collector::Result<Config> {
    let mut config = Config::from_env()?;

    if let Some(port) = cli.port {
        config.server.bind_address.set_port(port);
    }
    if let Some(kind) = cli.provider {
        config.provider.kind = kind;
    }
    if let Some(n) = cli.concurrent_requests {
        config.provider.concurrent_requests = n;
    }

    config.validate()?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber; `RUST_LOG` wins over the flags
fn setup_logging(verbose: u8, quiet: bool) {
    let fallback = if quiet {
        "error"
    } else {
        match verbose {
            0 => "url_collector=info,tower_http=info,warn",
            1 => "url_collector=debug,tower_http=debug,info",
            2 => "url_collector=trace,debug",
            _ => "trace",
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
