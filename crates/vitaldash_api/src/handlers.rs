//! Dashboard request handlers.
//!
//! All numeric query parameters are coerced, never rejected: a malformed
//! `limit` or `days` silently becomes the documented default so clients can
//! not trigger a 4xx with a bad number.

use axum::Json;
use axum::extract::{FromRequestParts, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vitaldash_engine::nutrition::{NutritionBucket, NutritionSummary};
use vitaldash_engine::scoring::{
    activity_score, age_score, bmi_score, combine_overall, height_score, weight_score,
};
use vitaldash_engine::snapshot::{
    DEFAULT_ACTIVITY_LEVEL, DEFAULT_AGE, DEFAULT_BMI, DEFAULT_HEIGHT, DEFAULT_WEIGHT,
    SnapshotPatch,
};
use vitaldash_engine::trends::TrendChartPoint;
use vitaldash_engine::{
    CalorieTargetRecord, DailySnapshot, HealthTrendPoint, TrendPeriod, today_local,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const USER_ID_HEADER: &str = "x-user-id";

const DEFAULT_TREND_LIMIT: usize = 12;
const MAX_TREND_LIMIT: usize = 60;
const DEFAULT_NUTRITION_DAYS: usize = 7;
const MAX_NUTRITION_DAYS: usize = 90;

/// Authenticated user identity, injected by the upstream gateway as the
/// `x-user-id` header. Absence is the only 401 this service produces.
pub struct UserId(pub String);

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| UserId(v.to_string()))
            .ok_or(ApiError::Unauthenticated)
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub today: DailySnapshot,
    pub calorie_target: Option<CalorieTargetRecord>,
    pub weekly_stats: NutritionSummary,
    pub last_updated: DateTime<Utc>,
}

pub async fn overview(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> ApiResult<Json<OverviewResponse>> {
    let today = state.snapshots.get_or_create(&user_id, today_local()).await?;
    let calorie_target = state
        .store
        .latest_calorie_target(&user_id)
        .await
        .map_err(vitaldash_engine::EngineError::from)?;
    let weekly = state.nutrition.window(&user_id, 7).await?;

    Ok(Json(OverviewResponse {
        today,
        calorie_target,
        weekly_stats: weekly.summary,
        last_updated: Utc::now(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarData {
    pub weight: u8,
    pub height: u8,
    pub bmi: u8,
    pub age: u8,
    pub activity: u8,
    pub health: u8,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBodyData {
    pub weight: f64,
    pub height: f64,
    pub bmi: f64,
    pub age: u32,
    pub activity_level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyMetricsResponse {
    pub radar_data: RadarData,
    pub raw_data: RawBodyData,
}

pub async fn body_metrics(
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> ApiResult<Json<BodyMetricsResponse>> {
    let record = state
        .store
        .latest_body_metrics(&user_id)
        .await
        .map_err(vitaldash_engine::EngineError::from)?;

    let raw = match &record {
        Some(r) => RawBodyData {
            weight: r.weight,
            height: r.height,
            bmi: r.bmi,
            age: r.age,
            activity_level: r.activity_level.clone(),
            measured_at: Some(r.created_at),
        },
        None => RawBodyData {
            weight: DEFAULT_WEIGHT,
            height: DEFAULT_HEIGHT,
            bmi: DEFAULT_BMI,
            age: DEFAULT_AGE,
            activity_level: DEFAULT_ACTIVITY_LEVEL.to_string(),
            measured_at: None,
        },
    };

    let weight = weight_score(Some(raw.weight), Some(raw.bmi));
    let height = height_score();
    let bmi = bmi_score(Some(raw.bmi));
    let age = age_score(Some(raw.age));
    let activity = activity_score(&raw.activity_level);
    let health = combine_overall(weight, height, bmi, age, activity);

    Ok(Json(BodyMetricsResponse {
        radar_data: RadarData {
            weight,
            height,
            bmi,
            age,
            activity,
            health,
        },
        raw_data: raw,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct TrendQuery {
    pub period: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendsResponse {
    pub chart_data: Vec<TrendChartPoint>,
    pub period: &'static str,
    pub trends: Vec<HealthTrendPoint>,
}

pub async fn health_trends(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(query): Query<TrendQuery>,
) -> ApiResult<Json<TrendsResponse>> {
    let period = TrendPeriod::parse_or_default(query.period.as_deref());
    let limit = query
        .limit
        .as_deref()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_TREND_LIMIT)
        .clamp(1, MAX_TREND_LIMIT);
    debug!(user_id, period = period.as_str(), limit, "trend query");

    let chart_data = state.trends.get_trend(&user_id, period, limit).await?;
    let trends = state.trends.stored_points(&user_id, period, limit).await?;

    Ok(Json(TrendsResponse {
        chart_data,
        period: period.as_str(),
        trends,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct NutritionQuery {
    pub days: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionResponse {
    pub chart_data: Vec<NutritionBucket>,
    pub summary: NutritionSummary,
}

pub async fn nutrition_stats(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Query(query): Query<NutritionQuery>,
) -> ApiResult<Json<NutritionResponse>> {
    let days = query
        .days
        .as_deref()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(DEFAULT_NUTRITION_DAYS)
        .clamp(1, MAX_NUTRITION_DAYS);
    debug!(user_id, days, "nutrition query");

    let window = state.nutrition.window(&user_id, days).await?;
    Ok(Json(NutritionResponse {
        chart_data: window.chart_data,
        summary: window.summary,
    }))
}

/// Body of `POST /api/dashboard/update`. The date is optional and defaults
/// to today; everything else is the partial snapshot patch.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub patch: SnapshotPatch,
}

pub async fn update_snapshot(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(request): Json<UpdateRequest>,
) -> ApiResult<Json<DailySnapshot>> {
    let date = request.date.unwrap_or_else(today_local);
    let updated = state.snapshots.update(&user_id, date, request.patch).await?;
    Ok(Json(updated))
}
