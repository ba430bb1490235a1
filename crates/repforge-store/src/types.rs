//! Search filters, hits and store-level records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use repforge_core::{
    equipment_matches, Exercise, ExerciseCategory, Location, PrescribedExercise, SplitType,
};

/// Minimum location compatibility for an exercise to pass a location filter.
pub const MIN_LOCATION_COMPATIBILITY: f64 = 0.5;

/// Structured pre-filters applied before similarity ranking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Empty means any category.
    #[serde(default)]
    pub categories: Vec<ExerciseCategory>,
    #[serde(default)]
    pub min_difficulty: Option<u8>,
    #[serde(default)]
    pub max_difficulty: Option<u8>,
    #[serde(default)]
    pub location: Option<Location>,
    /// Any overlap with primary or secondary muscles. Empty means any.
    #[serde(default)]
    pub muscles: Vec<String>,
    /// Available equipment; every required item must fuzzy-match one of
    /// them unless the list contains `full_gym`.
    #[serde(default)]
    pub equipment: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_ids: Vec<i64>,
}

impl SearchFilters {
    pub fn matches(&self, ex: &Exercise) -> bool {
        if self.exclude_ids.contains(&ex.id) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&ex.category) {
            return false;
        }
        if self.min_difficulty.is_some_and(|min| ex.difficulty < min) {
            return false;
        }
        if self.max_difficulty.is_some_and(|max| ex.difficulty > max) {
            return false;
        }
        if let Some(location) = self.location {
            if ex.location_compatibility(location) < MIN_LOCATION_COMPATIBILITY {
                return false;
            }
        }
        if !self.muscles.is_empty() {
            let hit = ex
                .primary_muscles
                .iter()
                .chain(ex.secondary_muscles.iter())
                .any(|m| self.muscles.iter().any(|f| f.eq_ignore_ascii_case(m)));
            if !hit {
                return false;
            }
        }
        if let Some(available) = &self.equipment {
            let full_gym = available.iter().any(|e| e.eq_ignore_ascii_case("full_gym"));
            if !full_gym && !ex.required_equipment().all(|r| equipment_matches(r, available)) {
                return false;
            }
        }
        true
    }
}

/// A similarity search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityHit {
    pub id: i64,
    /// Cosine similarity, or the lexical fallback constant.
    pub similarity: f64,
}

/// A workout to be inserted.
#[derive(Debug, Clone)]
pub struct NewWorkout {
    pub user_id: i64,
    pub plan_id: Option<i64>,
    pub name: String,
    pub split_type: SplitType,
    pub scheduled_date: NaiveDate,
    pub day_of_week: u32,
    pub week_number: u32,
    pub estimated_minutes: u32,
    pub exercises: Vec<PrescribedExercise>,
}

/// Outcome of persisting a weekly plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPlan {
    pub plan_id: i64,
    pub week_number: u32,
    /// Number of previously active plans switched off (0 or 1).
    pub deactivated: usize,
    pub workout_ids: Vec<i64>,
}

/// Catalog statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub exercises: i64,
    pub embeddings: i64,
    pub embedding_models: Vec<String>,
    pub db_path: String,
}
