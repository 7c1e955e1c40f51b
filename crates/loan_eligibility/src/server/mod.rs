//! HTTP prediction service.
//!
//! The model artifact is loaded once at startup and shared read-only by all
//! requests. A missing or unreadable artifact leaves the service up, with
//! `/predict` answering 503 until it is restarted with a trained model.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use loan_structs::{ApplicantRecord, PredictionResult};
use ml_model::{ArtifactError, ModelArtifact, PredictError};
use serde::Serialize;
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

mod validation;

pub use validation::{ValidationError, parse_body, validate_record};

/// Reasons a `/predict` request fails.
#[derive(Debug, thiserror::Error)]
pub enum PredictRequestError {
    #[error("Model not loaded. Please train the model first.")]
    ModelUnavailable,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] PredictError),
}

impl PredictRequestError {
    /// HTTP status reported for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Shared, read-only server state.
#[derive(Debug, Default)]
pub struct AppState {
    artifact: Option<ModelArtifact>,
}

/// Body of a successful `/predict` response.
#[derive(Debug, Clone, Serialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub input_received: ApplicantRecord,
}

impl AppState {
    #[must_use]
    pub const fn new(artifact: Option<ModelArtifact>) -> Self {
        Self { artifact }
    }

    /// Loads the artifact from `dir`, keeping the state usable if that fails.
    #[must_use]
    pub fn load(dir: &Path) -> Self {
        match ModelArtifact::load(dir) {
            Ok(artifact) => Self::new(Some(artifact)),
            Err(ArtifactError::NotFound(path)) => {
                warn!(
                    path = %path.display(),
                    "Model artifact not found, run `train` first. Prediction requests will fail"
                );
                Self::new(None)
            }
            Err(e) => {
                error!(error = %e, dir = %dir.display(), "Failed to load model artifact");
                Self::new(None)
            }
        }
    }

    #[must_use]
    pub const fn model_loaded(&self) -> bool {
        self.artifact.is_some()
    }

    /// Validates a raw request body and classifies it.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, or an inference error.
    pub fn predict(&self, body: &[u8]) -> Result<PredictResponse, PredictRequestError> {
        let artifact = self
            .artifact
            .as_ref()
            .ok_or(PredictRequestError::ModelUnavailable)?;

        let fields = parse_body(body)?;
        let record = validate_record(&fields)?;
        let result = artifact.predict(&record)?;

        Ok(PredictResponse {
            result,
            input_received: record,
        })
    }
}

/// Builds the axum [`Router`] with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    with_middleware(
        Router::new()
            .route("/", get(index_handler))
            .route("/health", get(health_handler))
            .route("/predict", post(predict_handler)),
    )
    .with_state(state)
}

fn with_middleware<S: Clone + Send + Sync + 'static>(router: Router<S>) -> Router<S> {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct ApiError<'a> {
    error: &'a str,
}

/// Build a JSON error response.
fn api_error(status: StatusCode, message: &str) -> Response {
    (status, Json(ApiError { error: message })).into_response()
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_default();
    error!(%detail, "Request handler panicked");

    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

async fn index_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let status = if state.model_loaded() {
        "Model loaded"
    } else {
        "Model not loaded"
    };

    Json(json!({
        "message": "Loan Eligibility API",
        "status": status,
        "endpoints": {
            "/predict": "POST request with loan application data",
            "/health": "GET request to check API health",
        },
    }))
}

/// Health check handler returning a JSON status object.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "model_loaded": state.model_loaded(),
    }))
}

async fn predict_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    match state.predict(&body) {
        Ok(response) => {
            info!(
                loan_status = %response.result.loan_status,
                confidence = response.result.approval_confidence,
                "Prediction served"
            );
            Json(response).into_response()
        }
        Err(e) => {
            let status = e.status();
            if matches!(e, PredictRequestError::Inference(_)) {
                error!(error = %e, "Prediction failed");
            } else {
                debug!(error = %e, %status, "Prediction request rejected");
            }
            api_error(status, &e.to_string())
        }
    }
}

/// Binds `addr` and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: std::net::SocketAddr, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Loan eligibility server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use feature_extractor::LabelEncoders;
    use loan_structs::FEATURE_COUNT;
    use ml_model::{Classifier, LinearWeights, StandardScaler};
    use tower::ServiceExt;

    use super::*;

    fn artifact(classifier: fn(LinearWeights) -> Classifier) -> ModelArtifact {
        let mut weights = [0.0; FEATURE_COUNT];
        weights[4] = 2.0;
        ModelArtifact {
            classifier: classifier(LinearWeights { weights, bias: 0.0 }),
            scaler: StandardScaler {
                mean: [0.0, 0.0, 0.0, 0.0, 600.0, 0.0, 0.0],
                scale: [1.0, 1.0, 1.0, 1.0, 100.0, 1.0, 1.0],
            },
            encoders: LabelEncoders::new(),
        }
    }

    fn test_app(artifact: Option<ModelArtifact>) -> Router {
        build_router(Arc::new(AppState::new(artifact)))
    }

    fn applicant(cibil_score: i64) -> serde_json::Value {
        json!({
            "no_of_dependents": 2,
            "income_annum": 9_600_000,
            "loan_amount": 29_900_000,
            "loan_term": 12,
            "cibil_score": cibil_score,
            "residential_assets_value": 2_400_000,
            "commercial_assets_value": 17_600_000,
        })
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn post_predict(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app(Some(artifact(Classifier::Logistic)));
        let (status, json) = send(app, get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({"status": "healthy", "model_loaded": true}));

        let (_, json) = send(test_app(None), get_request("/health")).await;
        assert_eq!(json["model_loaded"], false);
    }

    #[tokio::test]
    async fn test_index_endpoint() {
        let (status, json) = send(test_app(None), get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Loan Eligibility API");
        assert_eq!(json["status"], "Model not loaded");
        assert!(json["endpoints"]["/predict"].is_string());
    }

    #[tokio::test]
    async fn test_predict_without_model() {
        let (status, json) = send(test_app(None), post_predict(applicant(750).to_string())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["error"], "Model not loaded. Please train the model first.");
    }

    #[tokio::test]
    async fn test_predict_without_model_ignores_body() {
        let (status, _) = send(test_app(None), post_predict("not json")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_predict_approved() {
        let app = test_app(Some(artifact(Classifier::Logistic)));
        let (status, json) = send(app, post_predict(applicant(778).to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["loan_status"], "Approved");
        let confidence = json["approval_confidence"].as_f64().unwrap();
        assert!((0.5..=1.0).contains(&confidence));
        assert_eq!(json["input_received"]["cibil_score"], 778);
        assert_eq!(json["input_received"]["loan_term"], 12);
    }

    #[tokio::test]
    async fn test_predict_rejected_without_probability() {
        let app = test_app(Some(artifact(Classifier::Linear)));
        let (status, json) = send(app, post_predict(applicant(417).to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["loan_status"], "Rejected");
        assert!(json.get("approval_confidence").is_none());
    }

    #[tokio::test]
    async fn test_predict_missing_field() {
        let mut body = applicant(700);
        body.as_object_mut().unwrap().remove("loan_term");

        let app = test_app(Some(artifact(Classifier::Logistic)));
        let (status, json) = send(app, post_predict(body.to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing required field: loan_term");
    }

    #[tokio::test]
    async fn test_predict_out_of_range() {
        let app = test_app(Some(artifact(Classifier::Logistic)));
        let (status, json) = send(app, post_predict(applicant(950).to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "CIBIL score must be between 300 and 900");
    }

    #[tokio::test]
    async fn test_predict_malformed_body() {
        for body in ["{broken", "[1, 2, 3]", ""] {
            let app = test_app(Some(artifact(Classifier::Logistic)));
            let (status, json) = send(app, post_predict(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn test_non_finite_model_output_is_internal_error() {
        let mut broken = artifact(Classifier::Logistic);
        broken.scaler.scale[4] = 0.0;
        broken.scaler.mean[4] = 778.0;

        let app = test_app(Some(broken));
        let (status, json) = send(app, post_predict(applicant(778).to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("non-finite"));
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_error() {
        async fn boom() -> &'static str {
            panic!("boom")
        }

        let app = with_middleware(Router::new().route("/boom", get(boom)));
        let (status, json) = send(app, get_request("/boom")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let req = Request::builder()
            .uri("/health")
            .header("origin", "http://example.com")
            .body(Body::empty())
            .unwrap();

        let response = test_app(None).oneshot(req).await.unwrap();
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            PredictRequestError::ModelUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            PredictRequestError::from(ValidationError::NotAnObject).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PredictRequestError::from(PredictError::NonFinite(f64::NAN)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_state_predict_error_kinds() {
        let body = applicant(700).to_string();
        assert!(matches!(
            AppState::new(None).predict(body.as_bytes()),
            Err(PredictRequestError::ModelUnavailable)
        ));

        let state = AppState::new(Some(artifact(Classifier::Logistic)));
        assert!(matches!(
            state.predict(b"{}"),
            Err(PredictRequestError::Invalid(ValidationError::MissingField("no_of_dependents")))
        ));
        let response = state.predict(body.as_bytes()).unwrap();
        assert_eq!(response.input_received.cibil_score, 700);
    }

    #[test]
    fn test_load_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!AppState::load(dir.path()).model_loaded());
    }
}
