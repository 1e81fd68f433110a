//! HTTP front end: the form page, prediction submits and report downloads

use crate::config::ServerConfig;
use crate::error::PredictError;
use crate::models::Predictor;
use crate::presentation::page::INCOMPLETE_INPUT_MESSAGE;
use crate::presentation::{render_page, PageState};
use crate::report::document::{PDF_CONTENT_TYPE, PDF_FILE_NAME};
use crate::report::tabular::{CSV_CONTENT_TYPE, CSV_FILE_NAME};
use crate::report::{export_csv, export_pdf, ResultRecord};
use crate::types::ProfileForm;
use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    predictor: Arc<Predictor>,
}

impl AppState {
    pub fn new(predictor: Predictor) -> Self {
        Self {
            predictor: Arc::new(predictor),
        }
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }
}

/// Handler failure
#[derive(Debug)]
pub enum AppError {
    /// Export requested for an incomplete profile
    IncompleteInput(String),
    /// Anything else; logged and reported as 500
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<PredictError> for AppError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::Validation(e) => Self::IncompleteInput(e.to_string()),
            PredictError::Inference(e) => Self::Internal(e.context("Prediction failed")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::IncompleteInput(detail) => (
                StatusCode::BAD_REQUEST,
                format!("{} ({})", INCOMPLETE_INPUT_MESSAGE, detail),
            )
                .into_response(),
            Self::Internal(err) => {
                error!(error = %format!("{:#}", err), "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .route("/export/csv", get(download_csv))
        .route("/export/pdf", get(download_pdf))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Result<Html<String>, AppError> {
    Ok(Html(render_page(&ProfileForm::default(), &PageState::Empty)?))
}

async fn predict(
    State(state): State<AppState>,
    Form(form): Form<ProfileForm>,
) -> Result<Html<String>, AppError> {
    let page_state = match state.predictor.predict(&form) {
        Ok(assessment) => PageState::PredictionRendered(Box::new(assessment)),
        Err(PredictError::Validation(e)) => PageState::ValidationFailed {
            missing: e.missing_fields().to_vec(),
        },
        Err(e) => return Err(e.into()),
    };

    Ok(Html(render_page(&form, &page_state)?))
}

/// Exports carry the profile in the query and are recomputed on request
fn export_record(state: &AppState, form: &ProfileForm) -> Result<ResultRecord, AppError> {
    let assessment = state.predictor.predict(form)?;
    Ok(ResultRecord::from_assessment(&assessment))
}

fn attachment(content_type: &str, file_name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

async fn download_csv(
    State(state): State<AppState>,
    Query(form): Query<ProfileForm>,
) -> Result<Response, AppError> {
    let record = export_record(&state, &form)?;
    let body = export_csv(&record)?;
    Ok(attachment(CSV_CONTENT_TYPE, CSV_FILE_NAME, body))
}

async fn download_pdf(
    State(state): State<AppState>,
    Query(form): Query<ProfileForm>,
) -> Result<Response, AppError> {
    let record = export_record(&state, &form)?;
    let body = export_pdf(&record)?;
    Ok(attachment(PDF_CONTENT_TYPE, PDF_FILE_NAME, body))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "model": state.predictor.model_name(),
        "features": state.predictor.encoder().schema().len(),
    }))
}

/// Bind the configured address and serve until Ctrl+C
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_extractor::FeatureEncoder;
    use crate::models::Classifier;
    use crate::types::{Gender, Geography, NumProducts, RiskTierThresholds, YesNo};

    /// Always answers churn with probability 0.75
    struct FixedClassifier;

    impl Classifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }

        fn n_features(&self) -> Option<usize> {
            Some(11)
        }

        fn predict(&self, _: &[f32]) -> anyhow::Result<i64> {
            Ok(1)
        }

        fn predict_proba(&self, _: &[f32]) -> anyhow::Result<[f64; 2]> {
            Ok([0.25, 0.75])
        }
    }

    /// Fails every inference call
    struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn name(&self) -> &str {
            "broken"
        }

        fn n_features(&self) -> Option<usize> {
            None
        }

        fn predict(&self, _: &[f32]) -> anyhow::Result<i64> {
            anyhow::bail!("session closed")
        }

        fn predict_proba(&self, _: &[f32]) -> anyhow::Result<[f64; 2]> {
            anyhow::bail!("session closed")
        }
    }

    fn state_with(classifier: Arc<dyn Classifier>) -> AppState {
        let predictor = Predictor::new(
            classifier,
            FeatureEncoder::default(),
            RiskTierThresholds::default(),
        )
        .unwrap();
        AppState::new(predictor)
    }

    fn complete_form() -> ProfileForm {
        ProfileForm {
            credit_score: Some(650),
            age: Some(40),
            tenure: Some(5),
            balance: Some(75000.0),
            num_of_products: Some(NumProducts::Two),
            has_credit_card: Some(YesNo::Yes),
            is_active_member: Some(YesNo::Yes),
            estimated_salary: Some(50000.0),
            geography: Some(Geography::Germany),
            gender: Some(Gender::Female),
        }
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn test_index_renders_empty_form() {
        let response = index().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("Predict Churn"));
        assert!(!html.contains("<svg"));
    }

    #[tokio::test]
    async fn test_predict_renders_result() {
        let state = state_with(Arc::new(FixedClassifier));
        let response = predict(State(state), Form(complete_form()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("Customer is likely to churn!"));
        assert!(html.contains("Very High Churn Risk!"));
        assert!(html.contains("/export/pdf?"));
    }

    #[tokio::test]
    async fn test_predict_incomplete_shows_message() {
        let state = state_with(Arc::new(FixedClassifier));
        let mut form = complete_form();
        form.gender = None;

        let response = predict(State(state), Form(form)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains(INCOMPLETE_INPUT_MESSAGE));
        assert!(html.contains("Missing: Gender"));
    }

    #[tokio::test]
    async fn test_predict_inference_failure_is_500() {
        let state = state_with(Arc::new(BrokenClassifier));
        let response = predict(State(state), Form(complete_form()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_csv_download() {
        let state = state_with(Arc::new(FixedClassifier));
        let response = download_csv(State(state), Query(complete_form()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], CSV_CONTENT_TYPE);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"customer_churn_prediction.csv\""
        );

        let text = body_text(response).await;
        assert!(text.lines().nth(1).unwrap().ends_with("0.75,0.25,Churn"));
    }

    #[tokio::test]
    async fn test_pdf_download() {
        let state = state_with(Arc::new(FixedClassifier));
        let response = download_pdf(State(state), Query(complete_form()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], PDF_CONTENT_TYPE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_download_incomplete_is_400() {
        let state = state_with(Arc::new(FixedClassifier));
        let response = download_csv(State(state), Query(ProfileForm::default()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains(INCOMPLETE_INPUT_MESSAGE));
    }

    #[tokio::test]
    async fn test_health() {
        let state = state_with(Arc::new(FixedClassifier));
        let Json(body) = health(State(state)).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "fixed");
        assert_eq!(body["features"], 11);
    }
}
