//! HTTP routes.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docsan_core::{Assembler, AssemblerConfig, Document, MetaAllowList, generated_tag, sanitize_document};
use serde_json::json;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{Span, info};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::AppError;

/// State shared by every request. The assembler holds no per-document data.
#[derive(Clone)]
pub struct AppState {
    assembler: Arc<Assembler>,
    json_pretty: bool,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        let assembler = Assembler::new(AssemblerConfig {
            meta_names: MetaAllowList::new(config.meta_tags.iter().cloned()),
            generated: generated_tag(),
        });
        Self { assembler: Arc::new(assembler), json_pretty: config.json_pretty }
    }
}

pub fn router(config: &ServerConfig) -> Router {
    Router::new()
        .route("/document", post(document))
        .route("/sanitize", post(sanitize))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.timeout_secs),
        ))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %Uuid::new_v4(),
                method = %request.method(),
                uri = %request.uri()
            )
        }))
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(config))
}

/// Assembles the posted markup into a document record.
async fn document(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let assembler = Arc::clone(&state.assembler);
    let span = Span::current();
    let record = tokio::task::spawn_blocking(move || {
        span.in_scope(|| Document::parse_bytes(&body).map(|document| assembler.assemble(document)))
    })
    .await??;

    info!(doc_id = %record.doc_id, warnings = record.warnings.len(), "document assembled");
    let json = record.to_json(state.json_pretty)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], json).into_response())
}

/// Returns the posted document with scripts and stylesheets commented out.
async fn sanitize(body: Bytes) -> Result<Response, AppError> {
    let span = Span::current();
    let html = tokio::task::spawn_blocking(move || {
        span.in_scope(|| {
            let mut document = Document::parse_bytes(&body)?;
            sanitize_document(&mut document);
            Ok::<_, docsan_core::DocsanError>(document.to_html())
        })
    })
    .await??;

    Ok(([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
