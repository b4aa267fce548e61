//! Nutrition rollup: a fixed-width daily window of macro totals with
//! zero-filled gaps and a mean summary.
//!
//! The window always contains exactly `days` buckets. Days the user never
//! logged contribute zeros instead of being omitted, so chart widths stay
//! stable and the summary mean divides by a constant.

use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{EngineResult, HealthStore, today_local};

const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionBucket {
    pub label: String,
    pub date: NaiveDate,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

/// Per-macro arithmetic mean over the whole window, zero days included.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionSummary {
    pub avg_calories: f64,
    pub avg_protein: f64,
    pub avg_carbs: f64,
    pub avg_fat: f64,
    pub avg_fiber: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionWindow {
    pub chart_data: Vec<NutritionBucket>,
    pub summary: NutritionSummary,
}

#[derive(Clone)]
pub struct NutritionService {
    store: Arc<dyn HealthStore>,
}

impl NutritionService {
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self { store }
    }

    /// Rollup over the `days`-wide window ending today, oldest bucket first.
    pub async fn window(&self, user_id: &str, days: usize) -> EngineResult<NutritionWindow> {
        self.window_ending(user_id, days, today_local()).await
    }

    /// Same as [`window`](Self::window) with an explicit final day.
    pub async fn window_ending(
        &self,
        user_id: &str,
        days: usize,
        end: NaiveDate,
    ) -> EngineResult<NutritionWindow> {
        let days = days.max(1);
        let mut chart_data = Vec::with_capacity(days);
        let mut logged = 0usize;

        for offset in (0..days).rev() {
            let date = end - Days::new(offset as u64);
            let bucket = match self.store.diary_day(user_id, date).await? {
                Some(day) => {
                    logged += 1;
                    NutritionBucket {
                        label: weekday_label(date),
                        date,
                        calories: day.total_calories,
                        protein: day.total_protein,
                        carbs: day.total_carbs,
                        fat: day.total_fat,
                        // Diary totals carry no fiber projection yet.
                        fiber: 0.0,
                    }
                }
                None => zero_bucket(date),
            };
            chart_data.push(bucket);
        }

        debug!(user_id, days, logged, "built nutrition window");

        let count = chart_data.len() as f64;
        let summary = NutritionSummary {
            avg_calories: chart_data.iter().map(|b| b.calories).sum::<f64>() / count,
            avg_protein: chart_data.iter().map(|b| b.protein).sum::<f64>() / count,
            avg_carbs: chart_data.iter().map(|b| b.carbs).sum::<f64>() / count,
            avg_fat: chart_data.iter().map(|b| b.fat).sum::<f64>() / count,
            avg_fiber: chart_data.iter().map(|b| b.fiber).sum::<f64>() / count,
        };

        Ok(NutritionWindow {
            chart_data,
            summary,
        })
    }
}

fn weekday_label(date: NaiveDate) -> String {
    WEEKDAY_NAMES[date.weekday().num_days_from_monday() as usize].to_string()
}

fn zero_bucket(date: NaiveDate) -> NutritionBucket {
    NutritionBucket {
        label: weekday_label(date),
        date,
        calories: 0.0,
        protein: 0.0,
        carbs: 0.0,
        fat: 0.0,
        fiber: 0.0,
    }
}
