use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripplanner::config::{CatalogProvider, Config};
use tripplanner::graph::{FileGraphSource, GraphRegistry};
use tripplanner::services::{
    CatalogSource, HttpCatalog, JsonFileCatalog, NoWeather, OpenWeatherClient, Planner,
    WeatherSource,
};
use tripplanner::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripplanner=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| format!("Failed to load configuration: {}", e))?;

    tracing::info!("Starting trip planner API server");
    tracing::info!("Configuration loaded successfully");

    let catalog: Arc<dyn CatalogSource> = match (&config.catalog_provider, &config.catalog_api_base_url) {
        (CatalogProvider::Api, Some(base_url)) => {
            tracing::info!("Using catalog API at {}", base_url);
            Arc::new(HttpCatalog::with_token(
                base_url.clone(),
                config.catalog_api_token.clone(),
            ))
        }
        _ => {
            tracing::info!("Using JSON catalog files in {}", config.catalog_dir);
            Arc::new(JsonFileCatalog::new(&config.catalog_dir))
        }
    };

    let weather: Arc<dyn WeatherSource> = if let Some(ref api_key) = config.openweather_api_key {
        Arc::new(OpenWeatherClient::with_config(
            api_key.clone(),
            config.openweather_base_url.clone(),
        ))
    } else {
        tracing::info!("OPENWEATHER_API_KEY not configured. Plans will carry no forecast.");
        Arc::new(NoWeather)
    };

    tracing::info!("Road networks are read from {}", config.graph_dir);
    let graphs = GraphRegistry::new(Arc::new(FileGraphSource::new(&config.graph_dir)));

    // Create application state
    let state = Arc::new(AppState {
        planner: Planner::new(catalog, weather, graphs, config.planner.clone()),
    });

    let app = tripplanner::routes::create_app(state);

    // Start server
    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
