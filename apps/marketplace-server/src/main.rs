mod config;
mod logging;
mod server;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use donations::DonationsModule;
use donations::infra::storage::seed::seed_demo;
use mimalloc::MiMalloc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::config::{AppConfig, CliOverrides};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Marketplace Server - donations marketplace backend for NGOs, donors and vendors
#[derive(Parser)]
#[command(name = "marketplace-server")]
#[command(about = "Marketplace Server - donations marketplace backend for NGOs, donors and vendors")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory database and the test payment provider
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
    /// Apply database migrations and exit
    Migrate,
    /// Load the demo dataset
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config
        && !Path::new(path).is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // defaults -> YAML (if provided) -> env (MARKETPLACE__*) -> CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(CliOverrides {
        port: cli.port,
        verbose: cli.verbose,
        mock: cli.mock,
    });

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    logging::init_logging(&config.logging)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(&config).await,
        Commands::Check => check_config(&config),
        Commands::Migrate => migrate(&config).await,
        Commands::Seed => seed(&config).await,
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    config.validate()?;
    println!("Configuration is valid");
    Ok(())
}

async fn connect(config: &AppConfig) -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(config.database.url.as_str());
    opts.max_connections(config.database.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    if config.is_in_memory_db() {
        // The database lives as long as its single connection.
        opts.min_connections(1);
    }
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("failed to connect to database at {}", config.database.url))?;
    tracing::info!(in_memory = config.is_in_memory_db(), "database connected");
    Ok(db)
}

async fn migrate(config: &AppConfig) -> Result<()> {
    let db = connect(config).await?;
    DonationsModule::migrate(&db).await.context("migrations failed")?;
    println!("Migrations applied");
    Ok(())
}

async fn seed(config: &AppConfig) -> Result<()> {
    let db = connect(config).await?;
    DonationsModule::migrate(&db).await.context("migrations failed")?;
    let report = seed_demo(&db, &config.donations.external_base_url)
        .await
        .context("failed to seed demo data")?;

    println!("Seeded demo data");
    for user in &report.users {
        println!("  user    {:<24} {:<16} {}", user.email, user.role.as_str(), user.id);
    }
    for (slug, id) in &report.tenants {
        println!("  tenant  {slug:<24} {id}");
    }
    println!("  vendor  {}", report.vendor_id);
    println!("  cause   {}", report.cause_id);
    Ok(())
}

async fn run_server(config: &AppConfig) -> Result<()> {
    config.validate()?;
    tracing::info!("Marketplace Server starting");

    let db = connect(config).await?;
    DonationsModule::migrate(&db).await.context("migrations failed")?;

    let jwt = config.jwt_settings()?;
    let module = DonationsModule::from_config(db.clone(), &jwt, &config.payments, config.donations.clone())
        .context("failed to initialize donations module")?;

    let app = server::build_app(&module, db, &config.server);
    server::serve(app, &config.server).await
}
