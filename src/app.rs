use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::auth::Authenticator;
use crate::config::{AppConfig, StoreBackend, StoreConfig};
use crate::handlers::{protected, public};
use crate::hierarchy::QrGenerator;
use crate::middleware::jwt_auth_middleware;
use crate::services::{HierarchyService, UserService};
use crate::store::{DocumentStore, MemoryStore, PgDocumentStore, StoreError};

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub hierarchy: Arc<HierarchyService>,
    pub users: Arc<UserService>,
    pub auth: Arc<Authenticator>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        let timeout = config.store.operation_timeout();
        let qr = QrGenerator::new(config.qr.min_dimension);

        Self {
            hierarchy: Arc::new(HierarchyService::new(store.clone(), qr, timeout)),
            users: Arc::new(UserService::new(store.clone(), timeout)),
            auth: Arc::new(Authenticator::from_config(&config.security)),
            store,
        }
    }
}

/// Open the configured document store
pub async fn build_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => {
            warn!("Using in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let store = PgDocumentStore::connect(config).await?;
            Ok(Arc::new(store))
        }
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let protected_routes = Router::new()
        .route("/api/clients", get(protected::clients::list).post(protected::clients::create))
        .route(
            "/api/clients/:client_id",
            get(protected::clients::get)
                .put(protected::clients::update)
                .delete(protected::clients::delete),
        )
        .route(
            "/api/clients/:client_id/locations/:location_id",
            delete(protected::clients::delete_location),
        )
        .route(
            "/api/clients/:client_id/locations/:location_id/zones/:zone_id",
            delete(protected::clients::delete_zone),
        )
        .route(
            "/api/clients/:client_id/locations/:location_id/zones/:zone_id/steps/:step_id",
            delete(protected::clients::delete_step),
        )
        .route("/api/users", get(protected::users::list).post(protected::users::create))
        .route(
            "/api/users/:user_id",
            get(protected::users::get).put(protected::users::update),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut app = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    info!("Router ready ({} CORS origins)", config.security.cors_origins.len());
    app.with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
