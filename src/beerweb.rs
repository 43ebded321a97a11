use crate::api_errors::AppError;
use crate::classifier::ModelArchitecture;
use crate::config_loader::ServerConfig;
use crate::errors::{BeerError, BeerResult};
use crate::predictor::BeerStylePredictor;
use crate::review::{PredictedReview, ReviewRecord};
use axum::{
    extract::Extension,
    http::{HeaderValue, Method},
    response::{Json, Redirect},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

pub const SERVICE_TITLE: &str = "Deep Beer: beer style prediction";
pub const HEALTH_MESSAGE: &str = "Enjoy responsibly!";

const DESCRIPTION: &str = "Neural network predicting a beer style from a brewery name and \
four review ratings (appearance, aroma, palate, taste). Predictions can be requested one \
at a time or as a list; each record is returned with a `beer_style` field appended.";

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    method: &'static str,
    path: &'static str,
    summary: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    title: &'static str,
    version: &'static str,
    description: &'static str,
    endpoints: Vec<EndpointInfo>,
}

fn endpoints() -> Vec<EndpointInfo> {
    vec![
        EndpointInfo { method: "GET", path: "/", summary: "Service metadata" },
        EndpointInfo { method: "GET", path: "/health/", summary: "Health check" },
        EndpointInfo { method: "GET", path: "/model/architecture/", summary: "Model structure" },
        EndpointInfo { method: "POST", path: "/beer/type/", summary: "Predict one review" },
        EndpointInfo { method: "POST", path: "/beers/type/", summary: "Predict a list of reviews" },
    ]
}

fn cors_layer(server: &ServerConfig) -> BeerResult<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if server.allowed_origins.iter().any(|o| o == "*") {
        return Ok(layer.allow_origin(Any));
    }
    let origins = server
        .allowed_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| BeerError::config(format!("invalid CORS origin '{o}': {e}")))
        })
        .collect::<BeerResult<Vec<_>>>()?;
    Ok(layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST]))
}

/// Build the prediction router around an already loaded predictor
pub fn build_beer_router(
    predictor: Arc<BeerStylePredictor>,
    server: &ServerConfig,
) -> BeerResult<Router> {
    let router = Router::new()
        .route("/", get(root))
        .route("/docs", get(redirect_to_root))
        .route("/health/", get(health_check))
        .route("/model/architecture/", get(model_architecture))
        .route("/beer/type/", post(predict_single))
        .route("/beers/type/", post(predict_multiple))
        .layer(Extension(predictor))
        .layer(cors_layer(server)?);

    Ok(router)
}

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        title: SERVICE_TITLE,
        version: env!("CARGO_PKG_VERSION"),
        description: DESCRIPTION,
        endpoints: endpoints(),
    })
}

async fn redirect_to_root() -> Redirect {
    Redirect::temporary("/")
}

async fn health_check() -> Json<&'static str> {
    Json(HEALTH_MESSAGE)
}

async fn model_architecture(
    Extension(predictor): Extension<Arc<BeerStylePredictor>>,
) -> Json<ModelArchitecture> {
    Json(predictor.architecture())
}

#[axum::debug_handler]
async fn predict_single(
    Extension(predictor): Extension<Arc<BeerStylePredictor>>,
    Json(review): Json<ReviewRecord>,
) -> Result<Json<PredictedReview>, AppError> {
    let predicted = predictor.predict(review).map_err(|e| {
        warn!("Prediction failed: {e}");
        AppError::from(e)
    })?;
    Ok(Json(predicted))
}

#[axum::debug_handler]
async fn predict_multiple(
    Extension(predictor): Extension<Arc<BeerStylePredictor>>,
    Json(reviews): Json<Vec<ReviewRecord>>,
) -> Result<Json<Vec<PredictedReview>>, AppError> {
    let request_id = Uuid::new_v4();
    info!(%request_id, records = reviews.len(), "Batch prediction");
    let predicted = predictor.predict_batch(reviews).map_err(|e| {
        warn!(%request_id, "Batch prediction aborted: {e}");
        AppError::from(e)
    })?;
    Ok(Json(predicted))
}

/// Bind and serve until the process is stopped.
pub async fn serve(
    predictor: Arc<BeerStylePredictor>,
    server: &ServerConfig,
) -> anyhow::Result<()> {
    let app = build_beer_router(predictor, server)?;
    let addr = format!("{}:{}", server.host, server.port);
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {addr}: {e}"))?;
    let listener = tokio::net::TcpListener::bind(socket_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}"))?;
    info!("HTTP server listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
