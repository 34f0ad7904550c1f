//! RAX Upload Server - Entry Point
//!
//! Serves a directory tree over HTTP for browsing, uploading and downloading,
//! confined to a single configured root.

use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use rax_upload_server::Server;
use rax_upload_server::config::{Cli, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // env_logger picks up RUST_LOG, defaulting to info
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match ServerConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Launching upload server...");

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.start().await {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
