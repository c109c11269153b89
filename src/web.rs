use crate::{
    app::{App, RefreshRequest},
    auth,
    clients::Client,
    errors::AppError,
    parse_list,
    prospects::Prospect,
    scoring::Method,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;

const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_REFRESH_LIMIT: usize = 20;

#[derive(Clone)]
struct SharedState {
    app: Arc<App>,
}

async fn start_app(app: App, listen_addr: &str) {
    let shared_state = Arc::new(SharedState { app: Arc::new(app) });

    async fn shutdown_signal() {
        let ctrl_c = async {
            signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        let terminate = async {
            signal::unix::signal(signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    }

    let app = Router::new()
        .route("/clients", get(list_clients))
        .route("/clients/:client_id", get(client_profile))
        .route("/recommendations/:client_id", get(recommend_actions))
        .route("/alerts", get(alerts))
        .route("/stats/cartera", get(stats_cartera))
        .route("/stats/dashboard", get(stats_dashboard))
        .route("/prospects/search", get(search_prospects))
        .route("/prospects/refresh", post(refresh_prospects))
        .layer(CorsLayer::permissive())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state);

    let listener = tokio::net::TcpListener::bind(listen_addr).await.unwrap();
    log::info!("listening on {listen_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

pub fn start_daemon(app: App) {
    let listen_addr = app.config().listen_addr.clone();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async { start_app(app, &listen_addr).await });
}

// Make our own error that wraps `AppError`.
#[derive(Debug)]
struct HttpError(AppError);

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        match self.0 {
            AppError::Unauthorized => (
                axum::http::StatusCode::UNAUTHORIZED,
                json!({"error": self.0.to_string()}).to_string(),
            ),
            AppError::NotFound => (
                axum::http::StatusCode::NOT_FOUND,
                json!({"error": self.0.to_string()}).to_string(),
            ),
            _ => {
                log::error!("{self:?}");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": self.0.to_string()}).to_string(),
                )
            }
        }
        .into_response()
    }
}

// This enables using `?` on functions that return `Result<_, anyhow::Error>` to turn them into
// `Result<_, AppError>`. That way you don't need to do that manually.
impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Every endpoint carries the shared secret as a query parameter;
/// mismatch or absence rejects before any data access.
fn require_key(state: &SharedState, provided: Option<&str>) -> Result<(), HttpError> {
    if auth::validate_key(provided.unwrap_or_default(), &state.app.config().api_key) {
        Ok(())
    } else {
        Err(HttpError(AppError::Unauthorized))
    }
}

#[derive(Debug, Serialize)]
struct Items<T> {
    items: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyQuery {
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListClientsQuery {
    api_key: Option<String>,
    segment: Option<String>,
}

async fn list_clients(
    State(state): State<Arc<SharedState>>,
    Query(query): Query<ListClientsQuery>,
) -> Result<Json<Items<Client>>, HttpError> {
    require_key(&state, query.api_key.as_deref())?;

    let items = state.app.list_clients(query.segment.as_deref());
    Ok(Json(Items { items }))
}

async fn client_profile(
    State(state): State<Arc<SharedState>>,
    Path(client_id): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Result<impl IntoResponse, HttpError> {
    require_key(&state, query.api_key.as_deref())?;

    let view = state.app.client_profile(&client_id)?;
    Ok(Json(view))
}

async fn recommend_actions(
    State(state): State<Arc<SharedState>>,
    Path(client_id): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Result<impl IntoResponse, HttpError> {
    require_key(&state, query.api_key.as_deref())?;

    let items = state.app.recommend_actions(&client_id)?;
    Ok(Json(Items { items }))
}

async fn alerts(
    State(state): State<Arc<SharedState>>,
    Query(query): Query<KeyQuery>,
) -> Result<impl IntoResponse, HttpError> {
    require_key(&state, query.api_key.as_deref())?;

    let items = state.app.alerts().to_vec();
    Ok(Json(Items { items }))
}

async fn stats_cartera(
    State(state): State<Arc<SharedState>>,
    Query(query): Query<KeyQuery>,
) -> Result<impl IntoResponse, HttpError> {
    require_key(&state, query.api_key.as_deref())?;

    Ok(Json(state.app.stats_cartera()))
}

async fn stats_dashboard(
    State(state): State<Arc<SharedState>>,
    Query(query): Query<KeyQuery>,
) -> Result<impl IntoResponse, HttpError> {
    require_key(&state, query.api_key.as_deref())?;

    let app = state.app.clone();
    tokio::task::block_in_place(move || {
        let stats = app.stats_dashboard()?;
        Ok(Json(stats))
    })
}

#[derive(Debug, Default, Deserialize)]
struct SearchProspectsQuery {
    api_key: Option<String>,

    /// Accepted for API compatibility; scoring doesn't use it
    #[allow(dead_code)]
    q: Option<String>,

    region: Option<String>,
    limit: Option<usize>,
    method: Option<String>,
}

async fn search_prospects(
    State(state): State<Arc<SharedState>>,
    Query(query): Query<SearchProspectsQuery>,
) -> Result<Json<Items<Prospect>>, HttpError> {
    require_key(&state, query.api_key.as_deref())?;

    let app = state.app.clone();
    let region = query
        .region
        .unwrap_or_else(|| app.config().default_region.clone());
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    let method = query
        .method
        .as_deref()
        .map(Method::parse)
        .unwrap_or_else(|| app.config().scoring.method());

    tokio::task::block_in_place(move || {
        let items = app.search_prospects(&region, limit, method)?;
        Ok(Json(Items { items }))
    })
}

#[derive(Debug, Default, Deserialize)]
struct RefreshProspectsQuery {
    api_key: Option<String>,
    region: Option<String>,
    /// Comma-separated industry seeds
    industries: Option<String>,
    /// Comma-separated keyword seeds
    keywords: Option<String>,
    limit: Option<usize>,
    method: Option<String>,
}

async fn refresh_prospects(
    State(state): State<Arc<SharedState>>,
    Query(query): Query<RefreshProspectsQuery>,
) -> Result<Json<Items<Prospect>>, HttpError> {
    require_key(&state, query.api_key.as_deref())?;

    let app = state.app.clone();
    let request = RefreshRequest {
        region: query
            .region
            .unwrap_or_else(|| app.config().default_region.clone()),
        industries: query.industries.map(parse_list),
        keywords: query.keywords.map(parse_list),
        method: query
            .method
            .as_deref()
            .map(Method::parse)
            .unwrap_or_else(|| app.config().scoring.method()),
        limit: query.limit.unwrap_or(DEFAULT_REFRESH_LIMIT),
    };

    tokio::task::block_in_place(move || {
        let items = app.refresh_prospects(request)?;
        Ok(Json(Items { items }))
    })
}
