//! The Quizzard backend server.

use clap::Parser;
use std::{env, fs, io::Write, path::PathBuf, sync::Arc};

use crate::{
    args::{Args, Command},
    auth::Identity,
    config::Config,
    prelude::*,
    store::pg::PgStore,
};

mod api;
mod args;
mod auth;
mod config;
mod db;
mod http;
mod logger;
mod model;
mod prelude;
mod slug;
mod store;


#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        // Log error in case stdout is not connected and it is logged into a file.
        error!("{:?}", e);

        // Show a somewhat nice representation of the error
        eprintln!();
        bunt::eprintln!("{$red}▶▶▶ {$bold}Error:{/$}{/$} {[yellow+intense]}", e);
        eprintln!();
        if e.chain().len() > 1 {
            bunt::eprintln!("{$red+italic}Caused by:{/$}");
        }

        for (i, cause) in e.chain().skip(1).enumerate() {
            eprint!(" {: >1$}", "", i * 2);
            eprintln!("‣ {cause}");
        }

        std::process::exit(1);
    }
}

/// Main entry point.
async fn run() -> Result<()> {
    // If `RUST_BACKTRACE` wasn't already set, we default to `1`. Backtraces
    // are almost always useful for debugging and we don't expect panics to
    // occur regularly.
    if env::var("RUST_BACKTRACE") == Err(env::VarError::NotPresent) {
        env::set_var("RUST_BACKTRACE", "1");
    }

    let args = Args::parse();

    // Dispatch subcommand.
    match &args.cmd {
        Command::Serve { shared } => {
            let config = load_config_and_init_logger(shared)?;
            start_server(config).await?;
        }
        Command::Db { cmd, shared } => {
            let config = load_config_and_init_logger(shared)?;
            db::cmd::run(cmd, &config).await?;
        }
        Command::WriteConfig { target } => config::write_template(target.as_ref())?,
        Command::ExportApiSchema { target } => export_api_schema(target.as_ref())?,
    }

    Ok(())
}

async fn start_server(config: Config) -> Result<()> {
    info!("Starting Quizzard backend ...");
    trace!("Configuration: {:#?}", config);

    let pool = db::create_pool(&config.db).await
        .context("failed to create database connection pool (database not running?)")?;
    db::migrate(&mut *pool.get().await?).await
        .context("failed to check/run DB migrations")?;

    let store = Arc::new(PgStore::new(pool));
    let identity = Arc::new(Identity::new(&config.auth)
        .context("failed to initialize identity service")?);

    http::serve(&config, api::root_node(), store, identity).await
        .context("failed to start HTTP server")?;

    Ok(())
}

/// Exports the GraphQL API schema to the given file, or stdout.
fn export_api_schema(target: Option<&PathBuf>) -> Result<()> {
    let schema = api::root_node().as_sdl();
    match target {
        Some(path) => fs::write(path, schema)
            .context(format!("failed to write schema to '{}'", path.display()))?,
        None => std::io::stdout().write_all(schema.as_bytes())?,
    }

    Ok(())
}

fn load_config_and_init_logger(shared: &args::Shared) -> Result<Config> {
    // Load configuration.
    let (config, path) = match &shared.config {
        Some(path) => {
            let config = Config::load_from(path)
                .context(format!("failed to load config from '{}'", path.display()))?;
            (config, path.clone())
        }
        None => Config::from_default_locations()?,
    };

    // Initialize logger. Unfortunately, we can only do this here
    // after reading the config.
    logger::init(&config.log)?;
    info!("Loaded config from '{}'", path.display());

    Ok(config)
}
