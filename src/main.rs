use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dex_router::orchestrator::{get_aggregator_quotes, load_snapshot, QuoteError, Snapshot};
use dex_router::types::{DexConfig, QuoteRequest, QuoteResponse};
use dex_router::utils;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Configuration plus the snapshot currently routed against
#[derive(Clone)]
struct DexState {
    config: Arc<DexConfig>,
    snapshot: Arc<RwLock<Arc<Snapshot>>>,
}

// Generate the OpenAPI schema
#[derive(OpenApi)]
#[openapi(
    paths(
        get_quotes,
        update_pool_data
    ),
    components(
        schemas(QuoteRequest, QuoteResponse)
    ),
    tags(
        (name = "quotes", description = "Trade quotes for a token pair")
    )
)]
struct ApiDoc;

struct ApiError(QuoteError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            QuoteError::Rejected(_) => StatusCode::BAD_REQUEST,
            QuoteError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

#[utoipa::path(
get,
path = "/quotes",
params(
    ("sellTokenAddress" = String, Query, description = "Address of token being sold"),
    ("buyTokenAddress" = String, Query, description = "Address of token being bought"),
    ("sellAmount" = Option<String>, Query, description = "Whole tokens being sold"),
    ("buyAmount" = Option<String>, Query, description = "Whole tokens being bought")
),
responses(
    (status = 200, description = "Trade Quote", body = QuoteResponse),
    (status = 400, description = "Request cannot be routed")
),
tag = "quotes"
)]
async fn get_quotes(
    State(state): State<DexState>,
    Query(params): Query<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    // Route on a snapshot handle so a reload never blocks a running quote
    let snapshot = state.snapshot.read().await.clone();
    get_aggregator_quotes(state.config.as_ref(), snapshot.as_ref(), params)
        .map(Json)
        .map_err(|e| {
            let classified = QuoteError::classify(&e);
            if let QuoteError::Internal(_) = classified {
                error!(error = %e, "quote failed");
            }
            ApiError(classified)
        })
}

#[utoipa::path(
    post,
    path = "/update_pool_data",
    responses(
        (status = 200, description = "Successfully reloaded pool data"),
        (status = 500, description = "Snapshot could not be read")
    ),
    tag = "update pool data"
)]
async fn update_pool_data(State(state): State<DexState>) -> Result<StatusCode, ApiError> {
    let snapshot = load_snapshot(state.config.as_ref()).map_err(|e| {
        error!(error = %format!("{e:#}"), "pool data reload failed");
        ApiError(QuoteError::Internal(format!("{e:#}")))
    })?;
    *state.snapshot.write().await = Arc::new(snapshot);
    Ok(StatusCode::OK)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    // Create API documentation
    let openapi = ApiDoc::openapi();
    let config_path = PathBuf::from("dex_config.toml");
    let config = DexConfig::load_from(config_path)?;
    let snapshot = load_snapshot(&config)?;
    let listen_addr = config.listen_addr.clone();

    let state = DexState {
        config: Arc::new(config),
        snapshot: Arc::new(RwLock::new(Arc::new(snapshot))),
    };
    // Build router with our endpoints and Swagger UI
    let app = Router::new()
        .route("/quotes", get(get_quotes))
        .route("/update_pool_data", post(update_pool_data))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!(addr = %listen_addr, "server running, Swagger UI at /swagger-ui/");
    axum::serve(listener, app).await?;
    Ok(())
}
