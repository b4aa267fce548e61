//! Trend series builder: serves stored [`HealthTrendPoint`] history and
//! fabricates a plausible series when a user has none.
//!
//! Generated points are tagged `synthetic = true` and persisted, so a repeat
//! read returns the same series instead of rolling new random values. Charts
//! are never empty for a valid user.

use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate};
use rand::{RngExt, rng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{
    EngineResult, GoalAchievements, HealthStore, HealthTrendPoint, TrendActivityMetrics,
    TrendHealthMetrics, TrendNutrition, TrendPeriod, today_local,
};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// One chart-ready trend bucket, oldest-first in the output series.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendChartPoint {
    pub label: String,
    pub value: u8,
    pub date: NaiveDate,
    pub synthetic: bool,
    pub details: TrendChartDetails,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrendChartDetails {
    pub weight: f64,
    pub bmi: f64,
    pub body_fat: f64,
    pub goals: GoalAchievements,
}

#[derive(Clone)]
pub struct TrendService {
    store: Arc<dyn HealthStore>,
}

impl TrendService {
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self { store }
    }

    /// Up to `limit` trend buckets for the user, oldest-first. An empty
    /// history is masked by generating and persisting `limit` synthetic
    /// points anchored at today, so the series is never empty.
    pub async fn get_trend(
        &self,
        user_id: &str,
        period: TrendPeriod,
        limit: usize,
    ) -> EngineResult<Vec<TrendChartPoint>> {
        self.get_trend_at(user_id, period, limit, today_local()).await
    }

    /// Same as [`get_trend`](Self::get_trend) with an explicit anchor date
    /// for the synthetic fallback.
    pub async fn get_trend_at(
        &self,
        user_id: &str,
        period: TrendPeriod,
        limit: usize,
        anchor: NaiveDate,
    ) -> EngineResult<Vec<TrendChartPoint>> {
        let mut points = self.store.trend_points(user_id, period, limit).await?;

        if points.is_empty() {
            debug!(
                user_id,
                period = period.as_str(),
                limit,
                "no trend history, generating synthetic series"
            );
            for i in (0..limit).rev() {
                let point = generated_point(user_id, period, bucket_date(anchor, period, i));
                self.store.insert_trend_point(point.clone()).await?;
                points.push(point);
            }
        } else {
            // Store order is newest-first; charts want oldest-first.
            points.reverse();
        }

        Ok(points.iter().map(|p| chart_point(p, period)).collect())
    }

    /// The raw stored points backing [`get_trend`](Self::get_trend),
    /// newest-first, without triggering synthetic generation.
    pub async fn stored_points(
        &self,
        user_id: &str,
        period: TrendPeriod,
        limit: usize,
    ) -> EngineResult<Vec<HealthTrendPoint>> {
        Ok(self.store.trend_points(user_id, period, limit).await?)
    }
}

/// The date `steps_back` period-units before `anchor`. Months use calendar
/// arithmetic, which clamps day-of-month at short month ends.
fn bucket_date(anchor: NaiveDate, period: TrendPeriod, steps_back: usize) -> NaiveDate {
    match period {
        TrendPeriod::Daily => anchor - chrono::Days::new(steps_back as u64),
        TrendPeriod::Weekly => anchor - chrono::Days::new(7 * steps_back as u64),
        TrendPeriod::Monthly => anchor - Months::new(steps_back as u32),
    }
}

fn chart_point(point: &HealthTrendPoint, period: TrendPeriod) -> TrendChartPoint {
    let label = match period {
        TrendPeriod::Monthly => MONTH_NAMES[point.date.month0() as usize].to_string(),
        _ => point.date.day().to_string(),
    };
    TrendChartPoint {
        label,
        value: point.overall_score,
        date: point.date,
        synthetic: point.synthetic,
        details: TrendChartDetails {
            weight: point.health_metrics.weight,
            bmi: point.health_metrics.bmi,
            body_fat: point.health_metrics.body_fat_percentage,
            goals: point.goal_achievements.clone(),
        },
    }
}

fn generated_point(user_id: &str, period: TrendPeriod, date: NaiveDate) -> HealthTrendPoint {
    let mut rng = rng();
    let goals_total: u32 = 5;
    HealthTrendPoint {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        period,
        date,
        health_metrics: TrendHealthMetrics {
            weight: rng.random_range(70.0..80.0),
            bmi: rng.random_range(22.0..25.0),
            body_fat_percentage: rng.random_range(15.0..25.0),
            muscle_mass: None,
            metabolic_age: None,
            visceral_fat_level: None,
        },
        overall_score: rng.random_range(60..=90),
        activity_metrics: TrendActivityMetrics {
            exercise_minutes: rng.random_range(20..60),
            steps: rng.random_range(4000..12000),
        },
        nutrition_trends: TrendNutrition {
            avg_calories: rng.random_range(1600.0..2400.0),
            avg_protein: rng.random_range(60.0..120.0),
        },
        goal_achievements: GoalAchievements {
            goals_met: rng.random_range(2..=goals_total),
            goals_total,
        },
        synthetic: true,
    }
}

/// A deterministic-shape synthetic point for seeding stores in tests.
pub fn synthetic_point(user_id: &str, period: TrendPeriod, date: NaiveDate) -> HealthTrendPoint {
    generated_point(user_id, period, date)
}
