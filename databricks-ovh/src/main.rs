use databricks_ovh::{DatabricksOvhProvider, REGISTRY_ADDRESS};
use std::str::FromStr;
use tfplug::{ServerConfig, TfplugError};
use tracing::Level;

/// `TF_LOG` when it names a level, otherwise INFO (DEBUG under `--debug`)
fn log_level(debug: bool) -> Level {
    std::env::var("TF_LOG")
        .ok()
        .and_then(|level| Level::from_str(&level).ok())
        .unwrap_or(if debug { Level::DEBUG } else { Level::INFO })
}

#[tokio::main]
async fn main() {
    let debug = std::env::args()
        .skip(1)
        .any(|arg| arg == "--debug" || arg == "-debug");

    // stdout carries the plugin handshake
    tracing_subscriber::fmt()
        .with_max_level(log_level(debug))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = ServerConfig::new(REGISTRY_ADDRESS).with_debug(debug);

    match tfplug::serve(DatabricksOvhProvider::new(), config).await {
        Ok(()) => {}
        Err(TfplugError::HandshakeError(message)) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("provider server failed: {}", e);
            std::process::exit(1);
        }
    }
}
