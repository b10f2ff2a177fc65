use choco_storefront::{
    config::{catalog, database, settings::AppSettings},
    core::product::seed_catalog,
    errors::Result,
};
use dotenvy::dotenv;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Settings
    let settings = AppSettings::from_env()
        .inspect_err(|e| error!("Invalid application settings: {}", e))?;
    info!(
        "Session cookies live for {} days",
        settings.session_max_age_days
    );

    // 4. Database and schema
    let db = database::create_connection(&settings.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the catalog if a seed file is present
    if Path::new(&settings.catalog_path).exists() {
        let catalog = catalog::load_catalog(&settings.catalog_path)?;
        seed_catalog(&db, &catalog)
            .await
            .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
    } else {
        warn!(
            "Catalog file {} not found, skipping seeding",
            settings.catalog_path
        );
    }

    Ok(())
}
