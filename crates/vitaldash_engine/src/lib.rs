//! Health metrics aggregation and scoring engine.
//!
//! The engine reads body metrics, calorie targets and food diary days owned
//! by other subsystems, and derives per-day [`DailySnapshot`] documents and
//! historical [`HealthTrendPoint`] series from them. All persistence goes
//! through the [`HealthStore`] trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod nutrition;
pub mod scoring;
pub mod snapshot;
pub mod trends;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Engine-level errors surfaced to callers of the services.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Trend bucketing granularity.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    Daily,
    Weekly,
    Monthly,
}

impl TrendPeriod {
    /// Parse a query-string value, falling back to `Daily` for anything
    /// unrecognized. Malformed input is coerced, never rejected.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some("weekly") => TrendPeriod::Weekly,
            Some("monthly") => TrendPeriod::Monthly,
            _ => TrendPeriod::Daily,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendPeriod::Daily => "daily",
            TrendPeriod::Weekly => "weekly",
            TrendPeriod::Monthly => "monthly",
        }
    }
}

/// Immutable body composition record. One per user submission; the newest
/// `created_at` wins for "current" queries.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BodyMetricsRecord {
    pub id: String,
    pub user_id: String,
    pub height: f64,
    pub weight: f64,
    pub age: u32,
    pub gender: String,
    pub activity_level: String,
    pub bmi: f64,
    pub bmi_category: String,
    pub bmr: f64,
    pub daily_calories: f64,
    pub ideal_weight_min: f64,
    pub ideal_weight_max: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MacroSplit {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

/// Calorie target computed by the calculator subsystem. Soft-deleted by
/// `is_active = false` rather than removed, so history stays queryable.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalorieTargetRecord {
    pub id: String,
    pub user_id: String,
    pub height: f64,
    pub weight: f64,
    pub age: u32,
    pub gender: String,
    pub activity_level: String,
    pub goal: String,
    pub bmr: f64,
    pub maintenance_calories: f64,
    pub target_calories: f64,
    pub macros: MacroSplit,
    pub bmi: f64,
    pub bmi_category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub food_id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub meal_type: String,
}

/// One user's food diary for one calendar day. Totals are a derived
/// projection over `entries`, recomputed by the diary subsystem on every
/// mutation; the engine only reads them.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodDiaryDay {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub entries: Vec<DiaryEntry>,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    pub total_calories: f64,
    pub target_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub total_fiber: f64,
    pub water_intake: f64,
    pub exercise_minutes: u32,
    pub steps: u32,
    pub sleep: f64,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBodyMetrics {
    pub weight: f64,
    pub height: f64,
    pub bmi: f64,
    pub age: u32,
    pub activity_level: String,
    pub health_score: u8,
}

/// The five normalized sub-scores plus their folded `overall`.
///
/// `overall` is always `round(mean(nutrition, exercise, hydration, sleep,
/// weight))`; the snapshot service recomputes it after every mutation and no
/// other path writes it.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    pub nutrition: u8,
    pub exercise: u8,
    pub hydration: u8,
    pub sleep: u8,
    pub weight: u8,
    pub overall: u8,
}

/// One day's consolidated health record for a user. Created lazily the first
/// time the day is queried; mutable via [`snapshot::SnapshotPatch`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySnapshot {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub stats: SnapshotStats,
    pub body_metrics: SnapshotBodyMetrics,
    pub scores: SubScores,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendHealthMetrics {
    pub weight: f64,
    pub bmi: f64,
    pub body_fat_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muscle_mass: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metabolic_age: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visceral_fat_level: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendActivityMetrics {
    pub exercise_minutes: u32,
    pub steps: u32,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendNutrition {
    pub avg_calories: f64,
    pub avg_protein: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GoalAchievements {
    pub goals_met: u32,
    pub goals_total: u32,
}

/// One period-bucket of historical aggregated health metrics.
///
/// Points with `synthetic = true` were fabricated to keep charts non-empty
/// and must not be mistaken for measured history.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthTrendPoint {
    pub id: String,
    pub user_id: String,
    pub period: TrendPeriod,
    pub date: NaiveDate,
    pub health_metrics: TrendHealthMetrics,
    pub overall_score: u8,
    pub activity_metrics: TrendActivityMetrics,
    pub nutrition_trends: TrendNutrition,
    pub goal_achievements: GoalAchievements,
    pub synthetic: bool,
}

/// Seam to the document store backing the engine.
///
/// The engine reads body metrics, calorie targets and diary days but never
/// mutates them; it writes snapshots and trend points only. The ingestion
/// methods exist for the surrounding subsystems (and tests) that own those
/// collections.
#[async_trait]
pub trait HealthStore: Send + Sync + 'static {
    /// Newest body metrics record for the user, by `created_at`.
    async fn latest_body_metrics(
        &self,
        user_id: &str,
    ) -> Result<Option<BodyMetricsRecord>, StoreError>;

    /// Newest calorie target for the user among records still active.
    async fn latest_calorie_target(
        &self,
        user_id: &str,
    ) -> Result<Option<CalorieTargetRecord>, StoreError>;

    /// The diary day matching `date` exactly, if the user logged anything.
    async fn diary_day(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<FoodDiaryDay>, StoreError>;

    /// The snapshot for (user, day), if one was materialized already.
    async fn snapshot(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySnapshot>, StoreError>;

    /// Atomic get-or-create keyed on (user, day): stores `candidate` only if
    /// no snapshot exists for that key, and returns the stored winner either
    /// way. Two concurrent calls observe the same document and id.
    async fn insert_snapshot_if_absent(
        &self,
        candidate: DailySnapshot,
    ) -> Result<DailySnapshot, StoreError>;

    /// Replace the snapshot stored under (user, day).
    async fn save_snapshot(&self, snapshot: DailySnapshot) -> Result<DailySnapshot, StoreError>;

    /// Up to `limit` trend points for (user, period), newest first.
    async fn trend_points(
        &self,
        user_id: &str,
        period: TrendPeriod,
        limit: usize,
    ) -> Result<Vec<HealthTrendPoint>, StoreError>;

    async fn insert_trend_point(&self, point: HealthTrendPoint) -> Result<(), StoreError>;

    async fn insert_body_metrics(&self, record: BodyMetricsRecord) -> Result<(), StoreError>;

    async fn insert_calorie_target(&self, record: CalorieTargetRecord) -> Result<(), StoreError>;

    async fn insert_diary_day(&self, day: FoodDiaryDay) -> Result<(), StoreError>;
}

/// Today in the server's local timezone, truncated to the calendar day.
pub fn today_local() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_period_parses_known_values() {
        assert_eq!(
            TrendPeriod::parse_or_default(Some("weekly")),
            TrendPeriod::Weekly
        );
        assert_eq!(
            TrendPeriod::parse_or_default(Some("monthly")),
            TrendPeriod::Monthly
        );
        assert_eq!(
            TrendPeriod::parse_or_default(Some("daily")),
            TrendPeriod::Daily
        );
    }

    #[test]
    fn trend_period_coerces_garbage_to_daily() {
        assert_eq!(
            TrendPeriod::parse_or_default(Some("hourly")),
            TrendPeriod::Daily
        );
        assert_eq!(TrendPeriod::parse_or_default(None), TrendPeriod::Daily);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = DailySnapshot {
            id: "s1".into(),
            user_id: "u1".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            stats: SnapshotStats::default(),
            body_metrics: SnapshotBodyMetrics::default(),
            scores: SubScores {
                nutrition: 70,
                exercise: 70,
                hydration: 70,
                sleep: 70,
                weight: 100,
                overall: 76,
            },
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("userId").is_some());
        assert!(value["stats"].get("totalCalories").is_some());
        assert!(value["bodyMetrics"].get("activityLevel").is_some());
        assert_eq!(value["scores"]["overall"], 76);
    }
}
