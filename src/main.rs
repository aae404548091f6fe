use clap::Parser;
use migration::{Migrator, MigratorTrait};
use miette::{IntoDiagnostic, Result};
use propertypulse::{settings, storage, web};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "propertypulse",
    version,
    about = "Property listing service"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    // load settings
    let settings = settings::Settings::load(&cli.config)?;
    tracing::info!(
        server = ?settings.server,
        database = %settings.database.url,
        asset_folder = %settings.assets.folder,
        "Loaded configuration"
    );

    // init storage (database)
    let db = storage::init(&settings.database).await?;
    Migrator::up(&db, None).await.into_diagnostic()?;

    let expired = storage::cleanup_expired_sessions(&db).await?;
    if expired > 0 {
        tracing::info!("Removed {} expired sessions", expired);
    }

    // start web server
    web::serve(settings, db).await?;
    Ok(())
}
