//! HTTP handlers for the RUM server

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream};
use lab_analysis::AnalysisReport;
use std::convert::Infallible;
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::{AckResponse, AnalyzeQuery, RumDataQuery, RumSample};
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Store a field sample and push it to live subscribers
pub async fn ingest_rum(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RumSample>, JsonRejection>,
) -> Result<Json<AckResponse>, ApiError> {
    let Json(sample) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    sample.validate()?;

    state.store.append(&sample).await?;

    let delivered = state.feed.publish(sample);
    tracing::debug!(delivered, "Stored RUM sample");

    Ok(Json(AckResponse::ok()))
}

/// Stored samples, oldest first; an empty `?url=` means no filter
pub async fn rum_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RumDataQuery>,
) -> Result<Json<Vec<RumSample>>, ApiError> {
    let page_url = query.url.as_deref().filter(|url| !url.is_empty());
    let samples = state.store.query(page_url).await?;
    Ok(Json(samples))
}

/// Server-Sent Events feed of newly ingested samples
pub async fn rum_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let feed = state.feed.subscribe();

    let stream = stream::unfold(feed, |mut feed| async move {
        let sample = feed.next().await?;
        let event = match Event::default().json_data(&sample) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Failed to encode stream event: {}", e);
                Event::default().comment("encoding error")
            }
        };
        Some((Ok(event), feed))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Run a synthetic lab analysis for `?url=`
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<Json<AnalysisReport>, ApiError> {
    let url = query.url.unwrap_or_default();
    if url.trim().is_empty() {
        return Err(ApiError::Validation("URL is required".into()));
    }

    let report = state.analyzer.analyze(&url).await?;
    Ok(Json(report))
}
