//! Shared application state handed to every handler.

use std::sync::Arc;

use vitaldash_engine::nutrition::NutritionService;
use vitaldash_engine::snapshot::SnapshotService;
use vitaldash_engine::trends::TrendService;
use vitaldash_engine::HealthStore;

/// Cheap to clone; every field is an `Arc` or a thin wrapper around one.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HealthStore>,
    pub snapshots: SnapshotService,
    pub trends: TrendService,
    pub nutrition: NutritionService,
}

impl AppState {
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self {
            snapshots: SnapshotService::new(store.clone()),
            trends: TrendService::new(store.clone()),
            nutrition: NutritionService::new(store.clone()),
            store,
        }
    }
}
