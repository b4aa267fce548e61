//! Daily snapshot materialization: cache-aside read with lazy synthesis, and
//! partial updates through a typed patch.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::scoring::{
    activity_score, age_score, bmi_score, combine_overall, height_score, weight_score,
};
use crate::{
    BodyMetricsRecord, CalorieTargetRecord, DailySnapshot, EngineResult, FoodDiaryDay, HealthStore,
    SnapshotBodyMetrics, SnapshotStats, SubScores,
};

pub const DEFAULT_TARGET_CALORIES: f64 = 2000.0;
pub const DEFAULT_WEIGHT: f64 = 70.0;
pub const DEFAULT_HEIGHT: f64 = 170.0;
pub const DEFAULT_BMI: f64 = 22.0;
pub const DEFAULT_AGE: u32 = 25;
pub const DEFAULT_ACTIVITY_LEVEL: &str = "moderate";

/// Neutral sub-score used until a real signal arrives for an axis.
pub const NEUTRAL_SCORE: u8 = 70;

/// Partial update for one snapshot. A present field replaces that field; an
/// absent field leaves the stored value untouched. `scores.overall` is not
/// representable here: it is always recomputed from the five sub-scores.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPatch {
    pub stats: Option<StatsPatch>,
    pub body_metrics: Option<BodyMetricsPatch>,
    pub scores: Option<ScoresPatch>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsPatch {
    pub total_calories: Option<f64>,
    pub target_calories: Option<f64>,
    pub total_protein: Option<f64>,
    pub total_carbs: Option<f64>,
    pub total_fat: Option<f64>,
    pub total_fiber: Option<f64>,
    pub water_intake: Option<f64>,
    pub exercise_minutes: Option<u32>,
    pub steps: Option<u32>,
    pub sleep: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyMetricsPatch {
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub bmi: Option<f64>,
    pub age: Option<u32>,
    pub activity_level: Option<String>,
    pub health_score: Option<u8>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoresPatch {
    pub nutrition: Option<u8>,
    pub exercise: Option<u8>,
    pub hydration: Option<u8>,
    pub sleep: Option<u8>,
    pub weight: Option<u8>,
}

impl SnapshotPatch {
    fn apply(self, snapshot: &mut DailySnapshot) {
        if let Some(stats) = self.stats {
            let target = &mut snapshot.stats;
            if let Some(v) = stats.total_calories {
                target.total_calories = v;
            }
            if let Some(v) = stats.target_calories {
                target.target_calories = v;
            }
            if let Some(v) = stats.total_protein {
                target.total_protein = v;
            }
            if let Some(v) = stats.total_carbs {
                target.total_carbs = v;
            }
            if let Some(v) = stats.total_fat {
                target.total_fat = v;
            }
            if let Some(v) = stats.total_fiber {
                target.total_fiber = v;
            }
            if let Some(v) = stats.water_intake {
                target.water_intake = v;
            }
            if let Some(v) = stats.exercise_minutes {
                target.exercise_minutes = v;
            }
            if let Some(v) = stats.steps {
                target.steps = v;
            }
            if let Some(v) = stats.sleep {
                target.sleep = v;
            }
        }
        if let Some(body) = self.body_metrics {
            let target = &mut snapshot.body_metrics;
            if let Some(v) = body.weight {
                target.weight = v;
            }
            if let Some(v) = body.height {
                target.height = v;
            }
            if let Some(v) = body.bmi {
                target.bmi = v;
            }
            if let Some(v) = body.age {
                target.age = v;
            }
            if let Some(v) = body.activity_level {
                target.activity_level = v;
            }
            if let Some(v) = body.health_score {
                target.health_score = v;
            }
        }
        if let Some(scores) = self.scores {
            let target = &mut snapshot.scores;
            if let Some(v) = scores.nutrition {
                target.nutrition = v;
            }
            if let Some(v) = scores.exercise {
                target.exercise = v;
            }
            if let Some(v) = scores.hydration {
                target.hydration = v;
            }
            if let Some(v) = scores.sleep {
                target.sleep = v;
            }
            if let Some(v) = scores.weight {
                target.weight = v;
            }
        }
    }
}

/// Materializes and updates [`DailySnapshot`] documents.
#[derive(Clone)]
pub struct SnapshotService {
    store: Arc<dyn HealthStore>,
}

impl SnapshotService {
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self { store }
    }

    /// Return the snapshot for (user, day), synthesizing and persisting one
    /// from the latest upstream records when absent. Reads never mutate an
    /// existing snapshot.
    pub async fn get_or_create(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> EngineResult<DailySnapshot> {
        if let Some(existing) = self.store.snapshot(user_id, date).await? {
            return Ok(existing);
        }

        let diary = self.store.diary_day(user_id, date).await?;
        let target = self.store.latest_calorie_target(user_id).await?;
        let body = self.store.latest_body_metrics(user_id).await?;

        debug!(user_id, %date, "materializing daily snapshot");
        let candidate = synthesize(user_id, date, diary.as_ref(), target.as_ref(), body.as_ref());
        Ok(self.store.insert_snapshot_if_absent(candidate).await?)
    }

    /// Load-or-create, merge the patch field-by-field, recompute
    /// `scores.overall`, persist.
    pub async fn update(
        &self,
        user_id: &str,
        date: NaiveDate,
        patch: SnapshotPatch,
    ) -> EngineResult<DailySnapshot> {
        let mut snapshot = self.get_or_create(user_id, date).await?;
        patch.apply(&mut snapshot);
        let scores = &mut snapshot.scores;
        scores.overall = combine_overall(
            scores.nutrition,
            scores.exercise,
            scores.hydration,
            scores.sleep,
            scores.weight,
        );
        Ok(self.store.save_snapshot(snapshot).await?)
    }
}

/// Build the snapshot a brand-new (user, day) pair resolves to when no
/// upstream records exist at all.
pub fn default_snapshot(user_id: &str, date: NaiveDate) -> DailySnapshot {
    synthesize(user_id, date, None, None, None)
}

fn synthesize(
    user_id: &str,
    date: NaiveDate,
    diary: Option<&FoodDiaryDay>,
    target: Option<&CalorieTargetRecord>,
    body: Option<&BodyMetricsRecord>,
) -> DailySnapshot {
    let stats = SnapshotStats {
        total_calories: diary.map(|d| d.total_calories).unwrap_or_default(),
        target_calories: target
            .map(|t| t.target_calories)
            .unwrap_or(DEFAULT_TARGET_CALORIES),
        total_protein: diary.map(|d| d.total_protein).unwrap_or_default(),
        total_carbs: diary.map(|d| d.total_carbs).unwrap_or_default(),
        total_fat: diary.map(|d| d.total_fat).unwrap_or_default(),
        ..SnapshotStats::default()
    };

    let weight = body.map(|b| b.weight).unwrap_or(DEFAULT_WEIGHT);
    let height = body.map(|b| b.height).unwrap_or(DEFAULT_HEIGHT);
    let bmi = body.map(|b| b.bmi).unwrap_or(DEFAULT_BMI);
    let age = body.map(|b| b.age).unwrap_or(DEFAULT_AGE);
    let activity_level = body
        .map(|b| b.activity_level.clone())
        .unwrap_or_else(|| DEFAULT_ACTIVITY_LEVEL.to_string());

    let health_score = combine_overall(
        weight_score(Some(weight), Some(bmi)),
        height_score(),
        bmi_score(Some(bmi)),
        age_score(Some(age)),
        activity_score(&activity_level),
    );

    let weight_sub_score = weight_score(Some(weight), Some(bmi));
    let scores = SubScores {
        nutrition: NEUTRAL_SCORE,
        exercise: NEUTRAL_SCORE,
        hydration: NEUTRAL_SCORE,
        sleep: NEUTRAL_SCORE,
        weight: weight_sub_score,
        overall: combine_overall(
            NEUTRAL_SCORE,
            NEUTRAL_SCORE,
            NEUTRAL_SCORE,
            NEUTRAL_SCORE,
            weight_sub_score,
        ),
    };

    DailySnapshot {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        date,
        stats,
        body_metrics: SnapshotBodyMetrics {
            weight,
            height,
            bmi,
            age,
            activity_level,
            health_score,
        },
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHealthStore;
    use chrono::{TimeZone, Utc};

    fn service() -> (SnapshotService, Arc<MemoryHealthStore>) {
        let store = Arc::new(MemoryHealthStore::new());
        (SnapshotService::new(store.clone()), store)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    #[tokio::test]
    async fn get_or_create_synthesizes_with_defaults() {
        let (service, _) = service();
        let snapshot = service.get_or_create("u1", day()).await.unwrap();

        assert_eq!(snapshot.stats.target_calories, DEFAULT_TARGET_CALORIES);
        assert_eq!(snapshot.stats.total_calories, 0.0);
        assert_eq!(snapshot.body_metrics.weight, DEFAULT_WEIGHT);
        assert_eq!(snapshot.body_metrics.activity_level, "moderate");
        // Default weight/bmi land in the healthy band.
        assert_eq!(snapshot.scores.weight, 100);
        assert_eq!(snapshot.scores.overall, combine_overall(70, 70, 70, 70, 100));
    }

    #[tokio::test]
    async fn get_or_create_is_stable_across_calls() {
        let (service, _) = service();
        let first = service.get_or_create("u1", day()).await.unwrap();
        let second = service.get_or_create("u1", day()).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn get_or_create_seeds_from_upstream_records() {
        let (service, store) = service();
        store
            .insert_diary_day(FoodDiaryDay {
                id: "d1".into(),
                user_id: "u1".into(),
                date: day(),
                entries: vec![],
                total_calories: 1850.0,
                total_protein: 110.0,
                total_carbs: 210.0,
                total_fat: 55.0,
            })
            .await
            .unwrap();
        store
            .insert_calorie_target(CalorieTargetRecord {
                id: "ct1".into(),
                user_id: "u1".into(),
                height: 180.0,
                weight: 82.0,
                age: 41,
                gender: "male".into(),
                activity_level: "very_active".into(),
                goal: "cut".into(),
                bmr: 1800.0,
                maintenance_calories: 2800.0,
                target_calories: 2300.0,
                macros: crate::MacroSplit {
                    protein: 150.0,
                    carbs: 250.0,
                    fats: 70.0,
                },
                bmi: 25.3,
                bmi_category: "overweight".into(),
                is_active: true,
                created_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            })
            .await
            .unwrap();
        store
            .insert_body_metrics(BodyMetricsRecord {
                id: "bm1".into(),
                user_id: "u1".into(),
                height: 180.0,
                weight: 82.0,
                age: 41,
                gender: "male".into(),
                activity_level: "very_active".into(),
                bmi: 25.3,
                bmi_category: "overweight".into(),
                bmr: 1800.0,
                daily_calories: 2800.0,
                ideal_weight_min: 63.0,
                ideal_weight_max: 81.0,
                created_at: Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
            })
            .await
            .unwrap();

        let snapshot = service.get_or_create("u1", day()).await.unwrap();
        assert_eq!(snapshot.stats.total_calories, 1850.0);
        assert_eq!(snapshot.stats.target_calories, 2300.0);
        assert_eq!(snapshot.body_metrics.weight, 82.0);
        assert_eq!(snapshot.body_metrics.age, 41);
        // BMI 25.3 is the 80-point weight band.
        assert_eq!(snapshot.scores.weight, 80);
    }

    #[tokio::test]
    async fn update_merges_partially_and_recomputes_overall() {
        let (service, _) = service();
        let before = service.get_or_create("u1", day()).await.unwrap();

        let patch = SnapshotPatch {
            scores: Some(ScoresPatch {
                nutrition: Some(90),
                ..ScoresPatch::default()
            }),
            ..SnapshotPatch::default()
        };
        let after = service.update("u1", day(), patch).await.unwrap();

        assert_eq!(after.scores.nutrition, 90);
        assert_eq!(after.scores.exercise, before.scores.exercise);
        assert_eq!(after.scores.hydration, before.scores.hydration);
        assert_eq!(
            after.scores.overall,
            combine_overall(90, 70, 70, 70, before.scores.weight)
        );
        assert_eq!(after.id, before.id);
    }

    #[tokio::test]
    async fn update_replaces_scalars_without_touching_siblings() {
        let (service, _) = service();
        service.get_or_create("u1", day()).await.unwrap();

        let patch = SnapshotPatch {
            stats: Some(StatsPatch {
                water_intake: Some(1.5),
                steps: Some(8200),
                ..StatsPatch::default()
            }),
            ..SnapshotPatch::default()
        };
        let updated = service.update("u1", day(), patch).await.unwrap();

        assert_eq!(updated.stats.water_intake, 1.5);
        assert_eq!(updated.stats.steps, 8200);
        assert_eq!(updated.stats.target_calories, DEFAULT_TARGET_CALORIES);
    }

    #[test]
    fn patch_json_has_no_overall_field() {
        // A client trying to set overall directly is ignored by construction.
        let raw = serde_json::json!({
            "scores": { "nutrition": 95, "overall": 1 }
        });
        let patch: SnapshotPatch = serde_json::from_value(raw).unwrap();
        assert_eq!(patch.scores.as_ref().unwrap().nutrition, Some(95));
    }
}
