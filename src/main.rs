//! # open-sdk command-line tool
//!
//! Sends one encrypted, signed request to the open platform and prints the
//! result envelope as JSON.
//!
//! ## Usage
//!
//! ```bash
//! open-sdk --app-key KEY --app-secret SECRET \
//!     --url https://open.yljr.com/foo/bar/baz \
//!     --public-key RSA-PublicKey.pem \
//!     --data '{"param1": "value1"}' \
//!     --header x-request-id=42
//!
//! # With environment variables
//! export OPEN_SDK_APP_KEY=...
//! export OPEN_SDK_APP_SECRET=...
//! export OPEN_SDK_REQUEST_URL=https://open.yljr.com/foo/bar/baz
//! open-sdk --data '"plain string payload"'
//! ```
//!
//! ## Exit codes
//! - 0: the platform answered with the success status
//! - 1: configuration or argument error
//! - 2: any other status

use clap::Parser;
use open_sdk::{ClientConfig, OpenPlatformClient};
use std::process;
use tracing::{error, info};
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

#[derive(Debug, Parser)]
#[command(name = "open-sdk", version, about = "Send a request to the open platform")]
struct Cli {
    #[command(flatten)]
    config: ClientConfig,

    /// Request data as JSON
    #[arg(short = 'd', long = "data", value_name = "JSON", value_parser = parse_json)]
    data: Option<serde_json::Value>,

    /// Extra header, repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME=VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,
}

fn parse_json(raw: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli.config) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("open-sdk v{}", open_sdk::VERSION);
    display_startup_info(&cli.config);

    if let Err(e) = cli.config.validate() {
        error!("Configuration validation failed: {}", e);
        process::exit(1);
    }

    let mut client: OpenPlatformClient = OpenPlatformClient::from_config(&cli.config);
    client.set_header(cli.headers);
    if let Some(data) = cli.data {
        client.set_data(data);
    }

    let result = client.send().await;

    match serde_json::to_string_pretty(&result) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => {
            error!("Failed to render result: {}", e);
            println!("{result}");
        }
    }

    process::exit(if result.is_success() { 0 } else { 2 });
}

/// Setup structured logging based on configuration
///
/// Logs go to stderr so stdout carries only the result.
///
/// ## Log Format
/// - **Development**: Pretty-printed with colors
/// - **Production** (`ENVIRONMENT=production`): JSON
fn setup_logging(config: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let is_production = std::env::var("ENVIRONMENT")
        .map(|env| env.to_lowercase() == "production")
        .unwrap_or(false);

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level.inner()).into())
        .from_env()?
        .add_directive("hyper=warn".parse()?)
        .add_directive("hyper_util=warn".parse()?)
        .add_directive("reqwest=info".parse()?)
        .add_directive("rustls=warn".parse()?);

    if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false)
                    .with_span_list(true)
                    .with_target(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .init();
    }

    Ok(())
}

/// Log the effective configuration, without the secret
fn display_startup_info(config: &ClientConfig) {
    info!("Request URL: {}", config.request_url);
    info!("App Key: {}", config.app_key);
    info!("Public Key: {}", config.public_key_path.display());
    info!("Algorithm: {}", config.algorithm);
    info!("Timeout: {}ms", config.timeout_ms);
    info!(
        "Certificate verification: {}",
        if config.accept_invalid_certs {
            "disabled"
        } else {
            "enabled"
        }
    );
}
