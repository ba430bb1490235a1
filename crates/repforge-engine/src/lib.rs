//! RepForge Engine — exercise recommendation and workout-plan assembly.
//!
//! Pipeline per plan day: similarity search (semantic, or lexical when the
//! embedding provider is unavailable) → constraint filter → scoring →
//! pattern-diverse selection → sets/reps/rest prescription.

pub mod constraints;
pub mod daily;
pub mod engine;
pub mod planner;
pub mod prescription;
pub mod scoring;
pub mod search;
pub mod selector;
pub mod split;

pub use constraints::{derive_exclusions, is_excluded, ChronicCondition, ExclusionSet, Injury};
pub use daily::DailyWorkoutGenerator;
pub use engine::RecommendationEngine;
pub use planner::PlanAssembler;
pub use scoring::{score, ScoreBreakdown, ScoredExercise, MIN_COMPOSITE_SCORE};
pub use search::{SearchMode, SearchOutcome, SimilarExercise, SimilaritySearch};
pub use selector::select;
pub use split::{plan_for, SplitPlan, SplitTemplate};
