#[macro_use]
extern crate prettytable;

use anyhow::Context;
use structopt::StructOpt;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod context;
mod forms;
mod interface;
mod model;
mod scoring;
mod server;
mod store;

use cli::{Command::*, CommandLineArgs};
use config::Config;
use context::AppContext;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(ctx: AppContext, bind: Option<std::net::SocketAddr>) -> anyhow::Result<()> {
    let addr = config::bind_address(bind)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}.", addr))?;
    info!(%addr, "tally listening");
    axum::serve(listener, server::build_router(ctx))
        .await
        .context("Server error.")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    // Get the command-line arguments.
    let CommandLineArgs { action, database } = CommandLineArgs::from_args();

    let config = Config::load(database)?;
    let ctx = config.database.connect()?;

    // Perform the action.
    match action {
        Serve { bind } => serve(ctx, bind).await,
        Add {
            title,
            due,
            priority,
        } => interface::add_task(&ctx, title, due, priority),
        List => interface::list(&ctx),
        Score => interface::score(&ctx),
        Edit {
            id,
            due,
            priority,
            progress,
        } => interface::edit_task(&ctx, id, due, priority, progress),
        Rm { id } => interface::remove_task(&ctx, id),
        Report => interface::report(&ctx),
        Log { memo } => interface::log_today(&ctx, memo),
        Init => {
            info!(backend = config.database.backend(), "database ready");
            Ok(())
        }
    }
}
