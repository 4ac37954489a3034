mod app;
mod cli;
mod config;
mod digest;
mod email;
mod error;
mod form;
mod logger;
mod models;
mod news;
mod provider;
mod scheduler;
mod shell;
mod weather;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    app::run(cli).await
}
