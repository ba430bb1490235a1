//! Multi-criteria exercise scoring.

use serde::Serialize;

use repforge_core::{
    equipment_matches, Exercise, ExperienceLevel, FitnessLevel, UserHealth, UserPreferences,
    UserProfile,
};

use crate::constraints::{derive_exclusions, is_excluded, ExclusionSet};

/// Composites at or below this are discarded by callers before ranking.
pub const MIN_COMPOSITE_SCORE: f64 = 0.3;

const DEFAULT_GOAL_MATCH: f64 = 0.5;
const DEFAULT_EXPERIENCE_MATCH: f64 = 0.6;

/// Sub-score weights. They sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct ScoreWeights {
    pub goal: f64,
    pub difficulty: f64,
    pub equipment: f64,
    pub location: f64,
    pub experience: f64,
    pub semantic: f64,
}

pub const WEIGHTS: ScoreWeights = ScoreWeights {
    goal: 0.25,
    difficulty: 0.20,
    equipment: 0.20,
    location: 0.15,
    experience: 0.10,
    semantic: 0.10,
};

/// The six sub-scores, each in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub goal_match: f64,
    pub difficulty_match: f64,
    pub equipment_match: f64,
    pub location_match: f64,
    pub experience_match: f64,
    pub semantic_match: f64,
}

impl ScoreBreakdown {
    pub fn composite(&self) -> f64 {
        let w = WEIGHTS;
        (self.goal_match * w.goal
            + self.difficulty_match * w.difficulty
            + self.equipment_match * w.equipment
            + self.location_match * w.location
            + self.experience_match * w.experience
            + self.semantic_match * w.semantic)
            .clamp(0.0, 1.0)
    }
}

/// An exercise with its composite score. Transient, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredExercise {
    pub exercise: Exercise,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Score one candidate, or `None` if it is contraindicated.
///
/// `exclusions` is the precomputed set for `health`; pass `None` to derive
/// it here.
pub fn score(
    exercise: &Exercise,
    profile: &UserProfile,
    preferences: &UserPreferences,
    health: &UserHealth,
    exclusions: Option<&ExclusionSet>,
    semantic: f64,
) -> Option<ScoredExercise> {
    let excluded = match exclusions {
        Some(set) => is_excluded(exercise, set),
        None => is_excluded(exercise, &derive_exclusions(health)),
    };
    if excluded {
        return None;
    }

    let breakdown = ScoreBreakdown {
        goal_match: unit(
            exercise
                .goal_effectiveness
                .get(&profile.primary_goal)
                .copied()
                .unwrap_or(DEFAULT_GOAL_MATCH),
        ),
        difficulty_match: difficulty_match(target_difficulty(profile), exercise.difficulty),
        equipment_match: equipment_match(exercise, preferences),
        location_match: unit(exercise.location_compatibility(preferences.preferred_location)),
        experience_match: unit(
            exercise
                .experience_suitability
                .get(&profile.experience_level)
                .map(|&v| v as f64 / 5.0)
                .unwrap_or(DEFAULT_EXPERIENCE_MATCH),
        ),
        semantic_match: unit(semantic),
    };

    Some(ScoredExercise {
        exercise: exercise.clone(),
        score: breakdown.composite(),
        breakdown,
    })
}

/// Highest difficulty the user should be pushed to.
pub fn target_difficulty(profile: &UserProfile) -> u8 {
    let mut target: u8 = match profile.experience_level {
        ExperienceLevel::Beginner => 2,
        ExperienceLevel::Intermediate => 3,
        ExperienceLevel::Advanced => 4,
        ExperienceLevel::Athlete => 5,
    };

    match profile.fitness_level {
        FitnessLevel::Sedentary => target = target.min(2),
        FitnessLevel::LightlyActive => target = target.min(3),
        FitnessLevel::ModeratelyActive | FitnessLevel::VeryActive => {}
    }

    let senior = profile.age.is_some_and(|age| age > 60);
    if senior {
        target = target.min(3);
    }

    if profile.experience_level == ExperienceLevel::Athlete
        && profile.fitness_level != FitnessLevel::Sedentary
        && !senior
    {
        target = target.max(3);
    }
    target
}

/// Easier than target costs 0.2 per level, harder costs 0.3 per level.
pub fn difficulty_match(target: u8, difficulty: u8) -> f64 {
    let (t, d) = (target as f64, difficulty as f64);
    if d <= t {
        unit(1.0 - 0.2 * (t - d))
    } else {
        unit(1.0 - 0.3 * (d - t))
    }
}

pub fn equipment_match(exercise: &Exercise, preferences: &UserPreferences) -> f64 {
    let required: Vec<&str> = exercise.required_equipment().collect();
    if required.is_empty() || preferences.has_full_gym() {
        return 1.0;
    }
    if preferences.bodyweight_only() {
        return 0.0;
    }
    if required
        .iter()
        .all(|r| equipment_matches(r, &preferences.available_equipment))
    {
        1.0
    } else {
        0.3
    }
}

/// Sort by score descending. Stable, so equal scores keep input order.
pub fn rank(scored: &mut [ScoredExercise]) {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}
