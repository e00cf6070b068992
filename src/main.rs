use std::sync::Arc;

use salon_booking_api::business_rules::{BusinessRulesEngine, RulesConfig};
use salon_booking_api::config::AppConfig;
use salon_booking_api::{create_router, db, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Salon Booking API - Starting...");

    let config = AppConfig::from_env()?;
    let rules = RulesConfig::from_env()?;
    tracing::info!(
        "Rules loaded: {} min slots, UTC offset {}, loyalty every {} bookings",
        rules.slot_size_minutes,
        rules.business_offset,
        rules.loyalty_bookings_required
    );

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;

    // Run SQLx migrations on startup
    db::run_migrations(&pool).await?;

    let engine = Arc::new(BusinessRulesEngine::new(rules));
    let app = create_router(AppState::from_pool(pool, engine));

    // Start the Axum server
    let addr = config.bind_address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Salon Booking API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
