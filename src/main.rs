use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use promo_interactions::{
    config::{Config, StorageBackend},
    routes,
    services::{InteractionStore, MemoryInteractionStore, SurrealInteractionStore},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化日志
    let filter = tracing_subscriber::EnvFilter::new(&config.log_level);
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting promo interactions service...");

    // 初始化存储后端
    let store: Arc<dyn InteractionStore> = match config.storage_backend {
        StorageBackend::Memory => {
            info!("Using in-memory interaction store");
            Arc::new(MemoryInteractionStore::new())
        }
        StorageBackend::SurrealDb => match SurrealInteractionStore::connect(&config).await {
            Ok(store) => {
                info!("Database connection established successfully");
                Arc::new(store)
            }
            Err(e) => {
                error!("Failed to create database connection: {}", e);
                return Err(anyhow::anyhow!("Database initialization failed"));
            }
        },
    };

    // 创建应用状态
    let app_state = Arc::new(AppState::new(config.clone(), store));
    info!(
        "Interaction engine ready (tombstone policy: {:?}, production: {})",
        app_state.interaction_service.tombstone_policy(),
        app_state.is_production()
    );

    let app = routes::build_router(app_state);

    // 启动主服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
