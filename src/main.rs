use std::sync::Arc;

use concord::app::build_router;
use concord::auth::token::TokenService;
use concord::config::AppConfig;
use concord::db::category_repository::MongoCategoryRepository;
use concord::db::question_repository::MongoQuestionRepository;
use concord::db::user_repository::MongoUserRepository;
use concord::llm::client::MistralAgentClient;
use concord::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "concord=info,tower_http=info".into()),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(env = %config.app_env, "Starting Concord server...");

    // Connect to MongoDB
    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri).await?;
    let mongo_db = mongo_client.database(&config.mongo_database);

    let user_repo = MongoUserRepository::new(&mongo_db);
    user_repo.ensure_indexes().await?;
    tracing::info!(database = %config.mongo_database, "Connected to MongoDB");

    let llm = MistralAgentClient::new(
        config.mistral_api_url.as_str(),
        config.mistral_api_key.as_str(),
        config.mistral_agent_id.as_str(),
    )?;

    let state = AppState {
        user_repo: Arc::new(user_repo),
        question_repo: Arc::new(MongoQuestionRepository::new(&mongo_db)),
        category_repo: Arc::new(MongoCategoryRepository::new(&mongo_db)),
        llm: Arc::new(llm),
        tokens: TokenService::new(config.jwt_secret.as_str(), config.jwt_refresh_secret.as_str()),
        admin_secret: config.admin_secret.clone(),
        discord_secret: config.discord_secret.clone(),
        expose_error_details: config.is_development(),
    };

    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutting down");
}
