use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use lume_intimacy::config::{LoggingSettings, Settings, StoreBackend};
use lume_intimacy::core::IntimacyEngine;
use lume_intimacy::routes::{self, accounts::AppState};
use lume_intimacy::services::{
    AccountStore, AppwriteClient, AppwriteCollections, CacheManager, GlobalIndexRefresher,
    InMemoryAccountStore, PostgresClient,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, error};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

fn startup_error(context: &str, e: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, e);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, e))
}

fn init_tracing(logging: &LoggingSettings) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level)))
        .with_target(false)
        .with_level(true);

    if logging.is_pretty() {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

/// Build the configured account store backend
async fn build_store(settings: &Settings) -> std::io::Result<Arc<dyn AccountStore>> {
    match settings.store.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory account store, data is not persisted");
            Ok(Arc::new(InMemoryAccountStore::new()))
        }
        StoreBackend::Appwrite => {
            let appwrite = settings
                .appwrite
                .clone()
                .ok_or_else(|| startup_error("Configuration error", "missing [appwrite] section"))?;

            let client = AppwriteClient::new(
                appwrite.endpoint,
                appwrite.api_key,
                appwrite.project_id,
                appwrite.database_id,
                AppwriteCollections {
                    accounts: appwrite.accounts_collection,
                },
            )
            .map_err(|e| startup_error("Failed to create Appwrite client", e))?;

            info!("Appwrite account store initialized");
            Ok(Arc::new(client))
        }
        StoreBackend::Postgres => {
            let database = settings
                .database
                .clone()
                .ok_or_else(|| startup_error("Configuration error", "missing [database] section"))?;

            let client = PostgresClient::from_settings(
                &database.url,
                database.max_connections,
                database.min_connections,
                database.acquire_timeout_secs,
                database.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;

            info!(
                "PostgreSQL account store initialized (max: {} connections)",
                database.max_connections.unwrap_or(10)
            );
            Ok(Arc::new(client))
        }
    }
}

/// Build the snapshot cache, degrading to process-local when Redis is unreachable
async fn build_cache(settings: &Settings) -> Arc<CacheManager> {
    let ttl = settings.cache.ttl_secs.unwrap_or(300);
    let l1_size = settings.cache.l1_cache_size.unwrap_or(16);

    if let Some(redis_url) = &settings.cache.redis_url {
        match CacheManager::new(redis_url, l1_size, ttl).await {
            Ok(cache) => {
                info!("Cache manager initialized with Redis (L1: {} entries, TTL: {}s)", l1_size, ttl);
                return Arc::new(cache);
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using process-local cache", e);
            }
        }
    }

    info!("Cache manager initialized (L1 only: {} entries, TTL: {}s)", l1_size, ttl);
    Arc::new(CacheManager::local(l1_size, ttl))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    // Initialize logging from [logging], with LOG_LEVEL / LOG_FORMAT taking precedence
    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default()
        .overridden(std::env::var("LOG_LEVEL").ok(), std::env::var("LOG_FORMAT").ok());
    init_tracing(&logging);

    info!("Starting Lume Intimacy service...");

    let settings = settings.map_err(|e| startup_error("Failed to load configuration", e))?;

    info!("Configuration loaded successfully");

    let store = build_store(&settings).await?;
    let cache = build_cache(&settings).await;

    let engine_settings = settings.engine_settings();
    let engine = IntimacyEngine::new(store, engine_settings).with_snapshot_cache(cache);

    info!("Intimacy engine initialized with settings: {:?}", engine_settings);

    if let Some(secs) = settings.intimacy.refresh_interval_secs {
        GlobalIndexRefresher::new(engine.clone(), Duration::from_secs(secs.max(1))).spawn();
        info!("Global intimacy refresher running every {}s", secs);
    }

    let app_state = AppState { engine };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
