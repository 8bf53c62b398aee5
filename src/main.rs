mod config;
mod engine;
mod error;
mod handlers;
mod models;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, MODEL_NAME};
use crate::engine::OnnxSentimentEngine;
use crate::handlers::SentimentEndpoint;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentiment_service=info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    tracing::info!(
        model_dir = %config.model_dir.display(),
        "Loading model {} (this may take a while)...",
        MODEL_NAME
    );
    let started = Instant::now();
    let engine = OnnxSentimentEngine::load(&config.model_dir, config.max_sequence_length)
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to load model {}", MODEL_NAME);
            io::Error::new(io::ErrorKind::Other, e)
        })?;
    tracing::info!(
        labels = ?engine.labels(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Model loaded"
    );

    let endpoint = web::Data::new(SentimentEndpoint::new(Arc::new(engine)));

    tracing::info!("Server running at http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(endpoint.clone())
            .configure(handlers::routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
