use clap::Parser;

mod aggregator;
mod app;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod render;
mod social;

use app::App;
use cli::Cli;
use config::Config;
use error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Only show warnings and errors by default
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let app = App::new(config).await?;
    app.handle_command(cli.command).await
}
