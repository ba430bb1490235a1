//! Weekly plans, workout days and persisted workouts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::exercise::ExerciseCategory;

/// Muscle focus of a single training day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    FullBody,
    Upper,
    Lower,
    Push,
    Pull,
    Legs,
    Chest,
    Back,
    Shoulders,
    Arms,
}

impl SplitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitType::FullBody => "full_body",
            SplitType::Upper => "upper",
            SplitType::Lower => "lower",
            SplitType::Push => "push",
            SplitType::Pull => "pull",
            SplitType::Legs => "legs",
            SplitType::Chest => "chest",
            SplitType::Back => "back",
            SplitType::Shoulders => "shoulders",
            SplitType::Arms => "arms",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "full_body" => Some(SplitType::FullBody),
            "upper" => Some(SplitType::Upper),
            "lower" => Some(SplitType::Lower),
            "push" => Some(SplitType::Push),
            "pull" => Some(SplitType::Pull),
            "legs" => Some(SplitType::Legs),
            "chest" => Some(SplitType::Chest),
            "back" => Some(SplitType::Back),
            "shoulders" => Some(SplitType::Shoulders),
            "arms" => Some(SplitType::Arms),
            _ => None,
        }
    }
}

/// One exercise with its prescription inside a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescribedExercise {
    pub exercise_id: i64,
    pub name: String,
    pub category: ExerciseCategory,
    pub sets: u32,
    /// Display string, e.g. `8-12` or `30-60 sec`.
    pub reps: String,
    pub rest_seconds: u32,
}

/// A planned training day. Not persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutDay {
    pub day_index: u32,
    pub day_label: String,
    pub split_type: SplitType,
    pub focus_muscles: Vec<String>,
    /// Days after Monday this session is scheduled on.
    pub weekday_offset: u32,
    pub exercises: Vec<PrescribedExercise>,
    pub estimated_minutes: u32,
}

/// Result of weekly plan generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyPlanResult {
    pub split_name: String,
    pub days_per_week: u32,
    pub days: Vec<WorkoutDay>,
    pub generated_at: DateTime<Utc>,
}

/// A persisted weekly plan row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredWeeklyPlan {
    pub id: i64,
    pub user_id: i64,
    pub week_number: u32,
    pub active: bool,
    pub created_at: i64,
    pub plan: WeeklyPlanResult,
}

/// Lifecycle of a scheduled workout. Transitions happen outside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutStatus {
    Scheduled,
    InProgress,
    Completed,
    Skipped,
}

impl WorkoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutStatus::Scheduled => "scheduled",
            WorkoutStatus::InProgress => "in_progress",
            WorkoutStatus::Completed => "completed",
            WorkoutStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(WorkoutStatus::Scheduled),
            "in_progress" => Some(WorkoutStatus::InProgress),
            "completed" => Some(WorkoutStatus::Completed),
            "skipped" => Some(WorkoutStatus::Skipped),
            _ => None,
        }
    }
}

/// One exercise row of a persisted workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub exercise_name: String,
    pub position: u32,
    pub sets: u32,
    pub reps: String,
    pub rest_seconds: u32,
}

/// A persisted, schedulable workout derived from a [`WorkoutDay`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    pub id: i64,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<i64>,
    pub name: String,
    pub split_type: SplitType,
    pub scheduled_date: NaiveDate,
    /// 0 = Monday.
    pub day_of_week: u32,
    pub week_number: u32,
    pub status: WorkoutStatus,
    pub estimated_minutes: u32,
    pub exercises: Vec<WorkoutExercise>,
}
