use actix_web::{web, HttpResponse};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::MODEL_NAME;
use crate::engine::{EngineError, InferenceEngine};
use crate::error::{AppError, AppResult};
use crate::models::{HealthResponse, SentimentRequest, SentimentResponse};

/// Longest input, in characters, forwarded to the engine. Extra text is dropped.
pub const MAX_INPUT_CHARS: usize = 1000;

const TEXT_REQUIRED: &str = "text is required";

/// Validates requests and maps engine results onto responses.
pub struct SentimentEndpoint {
    engine: Arc<dyn InferenceEngine>,
    model: String,
}

impl SentimentEndpoint {
    pub fn new(engine: Arc<dyn InferenceEngine>) -> Self {
        Self {
            engine,
            model: MODEL_NAME.to_string(),
        }
    }

    /// Classifies one request. Blocks for the duration of inference.
    pub fn handle(&self, request: SentimentRequest) -> AppResult<SentimentResponse> {
        let text = request.text.unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation(TEXT_REQUIRED.to_string()));
        }

        let input = truncate_chars(text, MAX_INPUT_CHARS);

        let classification = self
            .engine
            .classify(input)
            .and_then(|results| {
                results.into_iter().next().ok_or_else(|| {
                    EngineError::InvalidOutput("classifier returned no results".into())
                })
            })
            .map_err(|e| {
                tracing::error!(
                    request_id = %Uuid::new_v4(),
                    error = %e,
                    details = ?e,
                    input_bytes = input.len(),
                    "Model inference failed"
                );
                AppError::from(e)
            })?;

        Ok(SentimentResponse {
            label: classification.label().to_string(),
            score: classification.score(),
            model: self.model.clone(),
        })
    }
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub async fn sentiment(
    endpoint: web::Data<SentimentEndpoint>,
    payload: web::Json<SentimentRequest>,
) -> AppResult<HttpResponse> {
    let request = payload.into_inner();

    // inference is CPU bound, keep it off the worker's event loop
    let response = web::block(move || endpoint.handle(request))
        .await
        .map_err(|e| AppError::Inference(e.to_string()))??;

    Ok(HttpResponse::Ok().json(response))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy",
        model: MODEL_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Registers the service's routes. Bodies that don't parse as a request are rejected with 422.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Payload(err.to_string()).into()),
    )
    .service(web::resource("/sentiment").route(web::post().to(sentiment)))
    .service(web::resource("/health").route(web::get().to(health)));
}
