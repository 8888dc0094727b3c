mod config;
mod http;
mod telemetry;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use api::{build_schema, AppSchema};
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use sales::repo::seed_default_statuses;
use sea_orm::{Database, DatabaseConnection};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    http::{build_router, AppState},
    telemetry::init_tracing,
};

#[derive(Parser, Debug)]
#[command(name = "sales-server", version, about = "Sales lead intake")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Insert the default pipeline statuses into an empty database.
    Seed,
    /// Print the GraphQL SDL.
    PrintSchema {
        #[arg(long, value_name = "FILE", help = "Write to a file instead of stdout")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Roll back the most recent migration.
    Down,
    /// Roll back everything, then apply all migrations again.
    Reset,
}

#[derive(Args, Debug)]
struct ServeCommand {
    /// Overrides `BIND`.
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing()?;
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, config).await,
        Command::Migrate(action) => migrate(action, &config).await,
        Command::Seed => run_seed(&config).await,
        Command::PrintSchema { output } => print_schema(output),
    }
}

async fn connect(config: &AppConfig) -> Result<DatabaseConnection> {
    Database::connect(&config.database_url)
        .await
        .context("failed to connect to the database")
}

async fn run_server(cmd: ServeCommand, config: AppConfig) -> Result<()> {
    let db = connect(&config).await?;
    ensure_migrations(&db, config.run_migrations).await?;
    let db = Arc::new(db);
    let AppSchema(schema) = build_schema(db.clone());
    let router = build_router(AppState { db, schema }, &config.cors_allowed_origins);
    http::serve(cmd.bind.unwrap_or(config.bind), router).await
}

async fn ensure_migrations(db: &DatabaseConnection, run_migrations: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(db).await?;
    if pending.is_empty() {
        return Ok(());
    }
    if !run_migrations {
        anyhow::bail!(
            "{} pending migration(s); run `server migrate up` or set RUN_MIGRATIONS=true",
            pending.len()
        );
    }
    Migrator::up(db, None).await?;
    info!(applied = pending.len(), "database migrations applied");
    Ok(())
}

async fn migrate(action: MigrateCommand, config: &AppConfig) -> Result<()> {
    let db = connect(config).await?;
    match action {
        MigrateCommand::Up => {
            Migrator::up(&db, None).await?;
            info!("database migrations applied");
        }
        MigrateCommand::Down => {
            Migrator::down(&db, Some(1)).await?;
            info!("most recent migration rolled back");
        }
        MigrateCommand::Reset => {
            warn!("dropping all sales tables");
            Migrator::reset(&db).await?;
            Migrator::up(&db, None).await?;
            info!("database reset");
        }
    }
    Ok(())
}

async fn run_seed(config: &AppConfig) -> Result<()> {
    let db = connect(config).await?;
    let inserted = seed_default_statuses(&db).await?;
    info!(inserted, "seed finished");
    Ok(())
}

fn print_schema(output: Option<PathBuf>) -> Result<()> {
    let sdl = api::sdl();
    match output {
        Some(path) => {
            std::fs::write(&path, sdl)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "schema written");
        }
        None => println!("{sdl}"),
    }
    Ok(())
}
