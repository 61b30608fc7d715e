use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod aggregate;
mod app;
mod cli;
mod config;
mod dispatch;
mod error;
mod models;
mod probe;
mod render;
mod walker;

use app::App;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr so the table on stdout stays clean
    fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(EnvFilter::from_default_env().add_directive("fleetstat=info".parse()?))
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("starting run with {} seed path(s)", cli.paths.len());

    let app = App::new(&cli)?;
    if let Err(err) = app.run().await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }

    Ok(())
}
