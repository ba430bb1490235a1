//! User profile, preferences and health data captured at onboarding.

use serde::{Deserialize, Serialize};

/// Training goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Strength,
    MuscleGain,
    WeightLoss,
    Endurance,
    GeneralFitness,
}

impl Goal {
    pub const ALL: [Goal; 5] = [
        Goal::Strength,
        Goal::MuscleGain,
        Goal::WeightLoss,
        Goal::Endurance,
        Goal::GeneralFitness,
    ];

    /// Phrase used when building natural-language search queries.
    pub fn phrase(&self) -> &'static str {
        match self {
            Goal::Strength => "build strength",
            Goal::MuscleGain => "build muscle",
            Goal::WeightLoss => "lose weight and burn fat",
            Goal::Endurance => "improve endurance",
            Goal::GeneralFitness => "improve general fitness",
        }
    }
}

/// Self-reported day-to-day activity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
}

/// Training experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
    Athlete,
}

impl std::fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExperienceLevel::Beginner => write!(f, "beginner"),
            ExperienceLevel::Intermediate => write!(f, "intermediate"),
            ExperienceLevel::Advanced => write!(f, "advanced"),
            ExperienceLevel::Athlete => write!(f, "athlete"),
        }
    }
}

/// Where the user prefers to train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Home,
    Gym,
    Outdoor,
    Mixed,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Home => write!(f, "home"),
            Location::Gym => write!(f, "gym"),
            Location::Outdoor => write!(f, "outdoor"),
            Location::Mixed => write!(f, "home or gym"),
        }
    }
}

/// How much rest the user wants between sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestPreference {
    Minimal,
    #[default]
    Moderate,
    Full,
}

/// Broad exercise type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Compound,
    Isolation,
    Cardio,
}

/// Read-only profile input to scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub fitness_level: FitnessLevel,
    pub experience_level: ExperienceLevel,
    pub primary_goal: Goal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_goal: Option<Goal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pushup_capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plank_hold_seconds: Option<u32>,
    /// Squat comfort on a 1–5 scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squat_comfort: Option<u8>,
}

/// Training logistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreferences {
    pub preferred_location: Location,
    /// Lower-case equipment tokens. `none` and `full_gym` are special.
    #[serde(default)]
    pub available_equipment: Vec<String>,
    pub days_per_week: u32,
    pub session_minutes: u32,
    #[serde(default)]
    pub preferred_exercise_types: Vec<ExerciseType>,
    #[serde(default)]
    pub rest_preference: RestPreference,
}

impl UserPreferences {
    /// Whether the user has access to a full gym.
    pub fn has_full_gym(&self) -> bool {
        self.available_equipment
            .iter()
            .any(|e| e.eq_ignore_ascii_case("full_gym"))
    }

    /// Whether the user declared bodyweight only.
    pub fn bodyweight_only(&self) -> bool {
        !self.available_equipment.is_empty()
            && self
                .available_equipment
                .iter()
                .all(|e| e.eq_ignore_ascii_case("none"))
    }
}

/// Health constraints. Never mutated by the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserHealth {
    #[serde(default)]
    pub injuries: Vec<String>,
    #[serde(default)]
    pub chronic_conditions: Vec<String>,
    #[serde(default)]
    pub pregnant: bool,
    #[serde(default)]
    pub recent_surgery: bool,
    #[serde(default)]
    pub contraindicated_movements: Vec<String>,
    #[serde(default)]
    pub contraindicated_exercises: Vec<String>,
}

/// Everything the engine needs to know about one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: i64,
    pub profile: UserProfile,
    pub preferences: UserPreferences,
    pub health: UserHealth,
}
