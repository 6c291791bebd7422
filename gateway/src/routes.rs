use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use risk_engine::alternatives::AlternativesReport;
use risk_engine::collector::{EventSource, StaticSource};
use risk_engine::engine::{CountdownAlert, RefreshReport, SupplierBreakdown, UploadReport};
use risk_engine::export::to_geojson;
use risk_engine::filter::RawArticle;
use risk_engine::predictions::PredictionReport;
use risk_engine::recommendations::RecommendationReport;
use risk_engine::{EngineError, Event, Supplier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// Ingestion problems are the caller's; a missing supplier is a 404;
/// everything else is ours
fn api_error(e: EngineError) -> (StatusCode, String) {
    let status = match &e {
        EngineError::Validation { .. } | EngineError::DuplicateSupplier(_) | EngineError::Json(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::SupplierNotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            tracing::error!("Request failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

#[derive(Serialize)]
pub struct SuppliersResponse {
    pub suppliers: Vec<Supplier>,
    pub total: usize,
}

#[derive(Deserialize, Default)]
pub struct RefreshRequest {
    /// Articles pushed by the caller
    #[serde(default)]
    pub articles: Vec<RawArticle>,
    /// Also query GDELT for every supplier location
    #[serde(default)]
    pub gdelt: bool,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub run_id: Uuid,
    pub report: RefreshReport,
}

pub async fn list_suppliers(State(state): State<AppState>) -> ApiResult<SuppliersResponse> {
    let suppliers = state.engine.list_suppliers().await.map_err(api_error)?;
    Ok(Json(SuppliersResponse {
        total: suppliers.len(),
        suppliers,
    }))
}

/// Replace the supplier set. The body is the raw upload, validated as a whole.
pub async fn upload_suppliers(State(state): State<AppState>, body: String) -> ApiResult<UploadReport> {
    let report = state.engine.upload_json(&body).await.map_err(api_error)?;
    tracing::info!("Supplier upload accepted: {} suppliers", report.suppliers);
    Ok(Json(report))
}

pub async fn recompute_scores(State(state): State<AppState>) -> ApiResult<SuppliersResponse> {
    let suppliers = state.engine.recompute_all().await.map_err(api_error)?;
    Ok(Json(SuppliersResponse {
        total: suppliers.len(),
        suppliers,
    }))
}

pub async fn get_breakdown(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<SupplierBreakdown> {
    state.engine.breakdown(&name).await.map(Json).map_err(api_error)
}

pub async fn get_alternatives(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<AlternativesReport> {
    state.engine.alternatives_for(&name).await.map(Json).map_err(api_error)
}

pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<RecommendationReport> {
    state.engine.recommendations_for(&name).await.map(Json).map_err(api_error)
}

pub async fn get_predictions(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<PredictionReport> {
    state.engine.predictions_for(&name).await.map(Json).map_err(api_error)
}

pub async fn list_events(State(state): State<AppState>) -> ApiResult<Vec<Event>> {
    state.engine.events().await.map(Json).map_err(api_error)
}

pub async fn refresh_events(
    State(state): State<AppState>,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<RefreshResponse> {
    let Json(req) = body.unwrap_or_default();
    let run_id = Uuid::new_v4();
    let _guard = state.refresh_lock.lock().await;

    let mut sources: Vec<Arc<dyn EventSource>> = Vec::new();
    if !req.articles.is_empty() {
        sources.push(Arc::new(StaticSource::new(
            format!("request:{}", run_id),
            req.articles,
        )));
    }
    if req.gdelt {
        sources.extend(state.engine.default_sources().await.map_err(api_error)?);
    }

    tracing::info!(%run_id, sources = sources.len(), "Refreshing events");
    let report = state.engine.refresh_events(sources).await.map_err(api_error)?;

    Ok(Json(RefreshResponse { run_id, report }))
}

pub async fn list_countdowns(State(state): State<AppState>) -> ApiResult<Vec<CountdownAlert>> {
    state.engine.countdowns().await.map(Json).map_err(api_error)
}

/// Scored suppliers as a GeoJSON FeatureCollection
pub async fn supplier_map(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let suppliers = state.engine.list_suppliers().await.map_err(api_error)?;
    let collection = to_geojson(&suppliers);
    serde_json::to_value(collection)
        .map(Json)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
