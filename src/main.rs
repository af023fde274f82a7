mod api;
mod config;
mod error;
mod prompt;
mod runner;

use std::io;
use std::process::exit;

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use api::ApiClient;
use config::Config;
use error::GenError;

fn setup_logging() {
    // stdout carries the prompt and reply, so logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn execute(config: Config) -> Result<()> {
    let settings = config.settings();
    let connect = || -> error::Result<ApiClient> {
        ApiClient::new(&settings, config.credentials()?)
    };

    let mut stdout = io::stdout().lock();
    runner::run(connect, &settings, &mut stdout).await
}

#[tokio::main]
async fn main() {
    setup_logging();
    let config = Config::from_cli();

    if let Err(e) = execute(config).await {
        if let Some(gen_err) = e.downcast_ref::<GenError>() {
            if gen_err.is_transient() {
                warn!("the failure looks transient; running again may succeed");
            }
        }
        eprintln!("ERROR: {}", e);
        exit(1);
    }
}
