use std::sync::Arc;

use axum::Router;
use dotenvy::dotenv;
use log::info;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use inventoryserver::config::AppConfig;
use inventoryserver::llm::{CompletionProvider, GeminiClient};
use inventoryserver::shared::state::AppState;
use inventoryserver::shared::utils::create_conn;
use inventoryserver::{auth, catalog, chat, dashboard, file, inventory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .write_style(env_logger::WriteStyle::Always)
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_conn()?;
    let image_dir = file::init_image_dir(&config.storage.image_dir)?;

    let ai: Arc<dyn CompletionProvider> = Arc::new(GeminiClient::new(
        config.ai.api_key.clone(),
        Some(config.ai.base_url.clone()),
    ));

    let state = Arc::new(AppState {
        conn: pool,
        config: config.clone(),
        ai,
        chat_sessions: Arc::new(tokio::sync::Mutex::new(Default::default())),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(auth::configure_auth_routes())
        .merge(catalog::configure_catalog_routes())
        .merge(inventory::configure_inventory_routes())
        .merge(dashboard::configure_dashboard_routes())
        .merge(chat::configure_chat_routes())
        .nest_service("/product-images", ServeDir::new(&image_dir))
        .layer(cors)
        .with_state(state);

    info!(
        "Starting HTTP server on {}:{}",
        config.server.host, config.server.port
    );
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
