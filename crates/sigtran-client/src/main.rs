use std::future;
use std::process;

use clap::Parser;
use tracing::{error, info, Level};

use sigtran_client::cli::Args;
use sigtran_client::logging::{parse_log_level, setup_logging, LoggingConfig};
use sigtran_client::{idle, send_once, IdleExit};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = parse_log_level(&args.log_level)?;
    let mut logging = LoggingConfig::new(level, env!("CARGO_PKG_NAME"));
    if level == Level::DEBUG || level == Level::TRACE {
        logging = logging.with_file_info();
    }
    setup_logging(&logging)?;

    let config = args.load_config()?;
    let (mut session, mut events) = send_once(&config).await?;

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            future::pending::<()>().await;
        }
    };

    match idle(&mut session, &mut events, config.beat_log_interval(), interrupted).await {
        IdleExit::Interrupted => info!("Got interrupt, exiting..."),
        IdleExit::SessionEnded(Ok(())) => info!("Association closed, exiting..."),
        IdleExit::SessionEnded(Err(e)) => error!("Association failed: {}", e),
    }
    process::exit(1);
}
