//! Exercise catalog entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::profile::{ExerciseType, ExperienceLevel, Goal, Location};

/// Catalog category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseCategory {
    Strength,
    Cardio,
    Hiit,
    Core,
    Flexibility,
    Plyometric,
    Mobility,
}

impl ExerciseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseCategory::Strength => "strength",
            ExerciseCategory::Cardio => "cardio",
            ExerciseCategory::Hiit => "hiit",
            ExerciseCategory::Core => "core",
            ExerciseCategory::Flexibility => "flexibility",
            ExerciseCategory::Plyometric => "plyometric",
            ExerciseCategory::Mobility => "mobility",
        }
    }
}

/// Case-insensitive substring match in either direction, so `dumbbell`
/// matches `dumbbells` and `adjustable dumbbells`.
pub fn equipment_matches(required: &str, available: &[String]) -> bool {
    let required = required.to_lowercase();
    available.iter().any(|a| {
        let a = a.to_lowercase();
        a.contains(&required) || required.contains(&a)
    })
}

/// An exercise in the catalog. The catalog is owned outside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    /// Assigned by the store; ignored on insert.
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    /// Extra free text indexed by lexical search.
    #[serde(default)]
    pub search_text: String,
    pub category: ExerciseCategory,
    pub movement_pattern: String,
    pub exercise_type: ExerciseType,
    #[serde(default)]
    pub primary_muscles: Vec<String>,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// 1 (easiest) to 5 (hardest).
    pub difficulty: u8,
    #[serde(default)]
    pub equipment_required: Vec<String>,
    #[serde(default)]
    pub equipment_optional: Vec<String>,
    pub home_compatibility: f64,
    pub gym_compatibility: f64,
    pub outdoor_compatibility: f64,
    #[serde(default)]
    pub goal_effectiveness: BTreeMap<Goal, f64>,
    /// Suitability per experience level on a 1–5 scale.
    #[serde(default)]
    pub experience_suitability: BTreeMap<ExperienceLevel, u8>,
    #[serde(default)]
    pub popularity: i64,
}

impl Exercise {
    /// Check the catalog invariants.
    pub fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.difficulty) {
            return Err(Error::InvalidExercise(format!(
                "{}: difficulty {} outside [1,5]",
                self.slug, self.difficulty
            )));
        }
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        for (field, v) in [
            ("home_compatibility", self.home_compatibility),
            ("gym_compatibility", self.gym_compatibility),
            ("outdoor_compatibility", self.outdoor_compatibility),
        ] {
            if !unit(v) {
                return Err(Error::InvalidExercise(format!(
                    "{}: {} {} outside [0,1]",
                    self.slug, field, v
                )));
            }
        }
        if let Some((goal, v)) = self.goal_effectiveness.iter().find(|(_, v)| !unit(**v)) {
            return Err(Error::InvalidExercise(format!(
                "{}: effectiveness {} for {:?} outside [0,1]",
                self.slug, v, goal
            )));
        }
        if let Some((level, v)) = self
            .experience_suitability
            .iter()
            .find(|(_, v)| !(1..=5).contains(*v))
        {
            return Err(Error::InvalidExercise(format!(
                "{}: suitability {} for {} outside [1,5]",
                self.slug, v, level
            )));
        }
        Ok(())
    }

    /// Compatibility with a location. `Mixed` takes the better of home and gym.
    pub fn location_compatibility(&self, location: Location) -> f64 {
        match location {
            Location::Home => self.home_compatibility,
            Location::Gym => self.gym_compatibility,
            Location::Outdoor => self.outdoor_compatibility,
            Location::Mixed => self.home_compatibility.max(self.gym_compatibility),
        }
    }

    /// Required equipment with bodyweight placeholders removed.
    pub fn required_equipment(&self) -> impl Iterator<Item = &str> {
        self.equipment_required
            .iter()
            .map(String::as_str)
            .filter(|e| !e.eq_ignore_ascii_case("none") && !e.eq_ignore_ascii_case("bodyweight"))
    }

    /// Text embedded for semantic search.
    pub fn embedding_text(&self) -> String {
        format!(
            "{}. {} Muscles: {}. Pattern: {}. {}",
            self.name,
            self.description,
            self.primary_muscles.join(", "),
            self.movement_pattern,
            self.search_text
        )
    }
}
