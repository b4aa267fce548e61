//! In-memory [`HealthStore`] backed by mutex-guarded collections.
//!
//! Snapshots are keyed by (user, day), which is what makes
//! `insert_snapshot_if_absent` an atomic get-or-create: the whole check and
//! insert happens under one lock, so concurrent materializations of the same
//! day agree on a single document.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::{
    BodyMetricsRecord, CalorieTargetRecord, DailySnapshot, FoodDiaryDay, HealthStore,
    HealthTrendPoint, StoreError, TrendPeriod,
};

#[derive(Default)]
pub struct MemoryHealthStore {
    body_metrics: Mutex<HashMap<String, Vec<BodyMetricsRecord>>>,
    calorie_targets: Mutex<HashMap<String, Vec<CalorieTargetRecord>>>,
    diary_days: Mutex<HashMap<(String, NaiveDate), FoodDiaryDay>>,
    snapshots: Mutex<HashMap<(String, NaiveDate), DailySnapshot>>,
    trend_points: Mutex<HashMap<(String, TrendPeriod), Vec<HealthTrendPoint>>>,
}

impl MemoryHealthStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HealthStore for MemoryHealthStore {
    async fn latest_body_metrics(
        &self,
        user_id: &str,
    ) -> Result<Option<BodyMetricsRecord>, StoreError> {
        let records = self.body_metrics.lock().await;
        Ok(records
            .get(user_id)
            .and_then(|history| history.iter().max_by_key(|r| r.created_at))
            .cloned())
    }

    async fn latest_calorie_target(
        &self,
        user_id: &str,
    ) -> Result<Option<CalorieTargetRecord>, StoreError> {
        let records = self.calorie_targets.lock().await;
        Ok(records
            .get(user_id)
            .and_then(|history| {
                history
                    .iter()
                    .filter(|r| r.is_active)
                    .max_by_key(|r| r.created_at)
            })
            .cloned())
    }

    async fn diary_day(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<FoodDiaryDay>, StoreError> {
        let days = self.diary_days.lock().await;
        Ok(days.get(&(user_id.to_string(), date)).cloned())
    }

    async fn snapshot(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailySnapshot>, StoreError> {
        let snapshots = self.snapshots.lock().await;
        Ok(snapshots.get(&(user_id.to_string(), date)).cloned())
    }

    async fn insert_snapshot_if_absent(
        &self,
        candidate: DailySnapshot,
    ) -> Result<DailySnapshot, StoreError> {
        let mut snapshots = self.snapshots.lock().await;
        let key = (candidate.user_id.clone(), candidate.date);
        let stored = snapshots.entry(key).or_insert(candidate);
        Ok(stored.clone())
    }

    async fn save_snapshot(&self, snapshot: DailySnapshot) -> Result<DailySnapshot, StoreError> {
        let mut snapshots = self.snapshots.lock().await;
        let key = (snapshot.user_id.clone(), snapshot.date);
        snapshots.insert(key, snapshot.clone());
        Ok(snapshot)
    }

    async fn trend_points(
        &self,
        user_id: &str,
        period: TrendPeriod,
        limit: usize,
    ) -> Result<Vec<HealthTrendPoint>, StoreError> {
        let points = self.trend_points.lock().await;
        let mut matched = points
            .get(&(user_id.to_string(), period))
            .cloned()
            .unwrap_or_default();
        matched.sort_by(|a, b| b.date.cmp(&a.date));
        matched.truncate(limit);
        Ok(matched)
    }

    async fn insert_trend_point(&self, point: HealthTrendPoint) -> Result<(), StoreError> {
        let mut points = self.trend_points.lock().await;
        points
            .entry((point.user_id.clone(), point.period))
            .or_default()
            .push(point);
        Ok(())
    }

    async fn insert_body_metrics(&self, record: BodyMetricsRecord) -> Result<(), StoreError> {
        let mut records = self.body_metrics.lock().await;
        records.entry(record.user_id.clone()).or_default().push(record);
        Ok(())
    }

    async fn insert_calorie_target(&self, record: CalorieTargetRecord) -> Result<(), StoreError> {
        let mut records = self.calorie_targets.lock().await;
        records.entry(record.user_id.clone()).or_default().push(record);
        Ok(())
    }

    async fn insert_diary_day(&self, day: FoodDiaryDay) -> Result<(), StoreError> {
        let mut days = self.diary_days.lock().await;
        days.insert((day.user_id.clone(), day.date), day);
        Ok(())
    }
}
