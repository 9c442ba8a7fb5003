//! The mbdls binary: serves the language protocol over stdio.

use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use mbdls::config::EffectiveSettings;
use mbdls::server::Backend;

/// Language server for multibody-solver input files.
#[derive(Parser, Debug)]
#[command(name = "mbdls", version, about)]
struct Cli {
    /// Serve over stdio. This is the only transport; the flag is accepted
    /// because editor launchers commonly pass it.
    #[arg(long)]
    stdio: bool,
}

#[tokio::main]
async fn main() {
    let _cli = Cli::parse();

    // Stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Seed the global settings from the user config file; the initialize
    // handshake re-layers them once the workspace root is known.
    let settings = EffectiveSettings::load(None).unwrap_or_else(|err| {
        tracing::warn!("falling back to default settings: {err}");
        EffectiveSettings::default()
    });

    let (service, socket) = LspService::new(|client| Backend::new(client, settings));
    Server::new(tokio::io::stdin(), tokio::io::stdout(), socket)
        .serve(service)
        .await;
}
