use crate::infra::{deserialize_date, deserialize_optional_date, today_or_local, AppState};
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use team_probation::deltas::{point_deltas, team_stats, DeltaRange, DeltaReport, TeamStats};
use team_probation::error::AppError;
use team_probation::probation::{evaluate_team, TeamEvaluation};
use team_probation::snapshots::{SnapshotImporter, SnapshotSeries};

/// CSV body for one dated snapshot, posted inline instead of read from disk.
#[derive(Debug, Deserialize)]
pub(crate) struct InlineSnapshot {
    #[serde(deserialize_with = "deserialize_date")]
    pub(crate) date: NaiveDate,
    pub(crate) csv: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProbationReportRequest {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) snapshots: Option<Vec<InlineSnapshot>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeltaQuery {
    #[serde(rename = "type", default = "default_range")]
    pub(crate) kind: String,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) end: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

fn default_range() -> String {
    "last_day".to_string()
}

#[derive(Debug, Serialize)]
pub(crate) struct SnapshotDatesResponse {
    pub(crate) latest: Option<NaiveDate>,
    pub(crate) dates: Vec<NaiveDate>,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/probation/report", post(probation_report_endpoint))
        .route("/api/v1/points/delta", get(point_delta_endpoint))
        .route("/api/v1/points/stats", get(team_stats_endpoint))
        .route("/api/v1/snapshots/dates", get(snapshot_dates_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn inline_series(snapshots: Vec<InlineSnapshot>) -> Result<SnapshotSeries, AppError> {
    let mut series = SnapshotSeries::default();
    for InlineSnapshot { date, csv } in snapshots {
        series.insert(SnapshotImporter::from_reader(Cursor::new(csv.into_bytes()), date)?);
    }
    Ok(series)
}

/// Reads the data folder on the blocking pool so request workers never wait on disk.
async fn load_series(state: &AppState) -> Result<SnapshotSeries, AppError> {
    let directory = Arc::clone(&state.snapshots);
    let series = tokio::task::spawn_blocking(move || directory.load_series())
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))??;
    Ok(series)
}

pub(crate) async fn probation_report_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ProbationReportRequest>,
) -> Result<Json<TeamEvaluation>, AppError> {
    let series = match payload.snapshots {
        Some(snapshots) => inline_series(snapshots)?,
        None => load_series(&state).await?,
    };

    Ok(Json(evaluate_team(&series, today_or_local(payload.today))))
}

pub(crate) async fn point_delta_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<DeltaQuery>,
) -> Result<Json<DeltaReport>, AppError> {
    let range = DeltaRange::parse(&query.kind, query.start, query.end)?;
    let series = load_series(&state).await?;
    let report = point_deltas(&series, range, today_or_local(query.today))?;
    Ok(Json(report))
}

pub(crate) async fn team_stats_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<TeamStats>, AppError> {
    let series = load_series(&state).await?;
    Ok(Json(team_stats(&series)?))
}

pub(crate) async fn snapshot_dates_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<SnapshotDatesResponse>, AppError> {
    let series = load_series(&state).await?;
    let dates: Vec<NaiveDate> = series.dates().rev().collect();

    Ok(Json(SnapshotDatesResponse {
        latest: dates.first().copied(),
        dates,
    }))
}
