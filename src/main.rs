use anyhow::Result;
use axum::Router;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use pegaai_orderservice::{
    bootstrap::{self, bootstrap},
    config, db, routes, swagger,
};

/// Migrations embedded into the binary which helps with streamlining image building process
const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[tokio::main]
async fn main() -> Result<()> {
    bootstrap::init_tracing();
    bootstrap::init_env();

    let routes = routes::offers::routes_with_openapi()
        .merge(routes::consumers::orders::routes_with_openapi())
        .merge(routes::establishments::profile::routes_with_openapi())
        .merge(routes::establishments::offers::routes_with_openapi())
        .merge(routes::establishments::orders::routes_with_openapi())
        .merge(routes::establishments::pickups::routes_with_openapi());

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Pega Ai OrderService API")
        .version("1.0.0")
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi)?;

    let app = Router::new().merge(routes).merge(swagger_ui);

    tracing::info!("Running migrations...");
    let config = config::load()?;
    let migrations_count = db::run_migrations_blocking(MIGRATIONS, &config.database.url).await?;
    tracing::info!("Run {} new migrations successfully", migrations_count);

    tracing::info!("Bootstrapping...");
    bootstrap("OrderService", app).await?;
    Ok(())
}
