//! Sets, reps, rest and duration.

use repforge_core::{ExerciseCategory, Goal, PrescribedExercise, RestPreference};

use crate::scoring::ScoredExercise;

/// Work time assumed per set, in seconds.
pub const WORK_SECONDS_PER_SET: u32 = 45;

pub const MIN_EXERCISES_PER_DAY: u32 = 3;
pub const MAX_EXERCISES_PER_DAY: u32 = 10;

const CARDIO_REPS: &str = "30-60 sec";
const CARDIO_REST_SECONDS: u32 = 30;

/// Sets and rep range for a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepScheme {
    pub sets: u32,
    pub reps: &'static str,
}

pub fn rep_scheme(goal: Goal) -> RepScheme {
    match goal {
        Goal::Strength => RepScheme { sets: 4, reps: "4-6" },
        Goal::MuscleGain => RepScheme { sets: 4, reps: "8-12" },
        Goal::WeightLoss => RepScheme { sets: 3, reps: "12-15" },
        Goal::Endurance => RepScheme { sets: 3, reps: "15-20" },
        Goal::GeneralFitness => RepScheme { sets: 3, reps: "10-12" },
    }
}

pub fn rest_seconds(rest: RestPreference) -> u32 {
    match rest {
        RestPreference::Minimal => 45,
        RestPreference::Moderate => 90,
        RestPreference::Full => 150,
    }
}

/// Average minutes one exercise takes, rest included.
pub fn minutes_per_exercise(rest: RestPreference) -> u32 {
    match rest {
        RestPreference::Minimal => 5,
        RestPreference::Moderate => 6,
        RestPreference::Full => 8,
    }
}

/// Exercises that fit a session, clamped to [3, 10].
pub fn exercise_count(session_minutes: u32, rest: RestPreference) -> usize {
    (session_minutes / minutes_per_exercise(rest)).clamp(MIN_EXERCISES_PER_DAY, MAX_EXERCISES_PER_DAY)
        as usize
}

/// `(sets, reps, rest_seconds)` for one exercise. Cardio gets a timed
/// interval and short rest whatever the preference.
pub fn prescription_for(
    goal: Goal,
    category: ExerciseCategory,
    rest: RestPreference,
) -> (u32, String, u32) {
    let scheme = rep_scheme(goal);
    if category == ExerciseCategory::Cardio {
        (scheme.sets, CARDIO_REPS.to_string(), CARDIO_REST_SECONDS)
    } else {
        (scheme.sets, scheme.reps.to_string(), rest_seconds(rest))
    }
}

pub fn prescribe(scored: &ScoredExercise, goal: Goal, rest: RestPreference) -> PrescribedExercise {
    let ex = &scored.exercise;
    let (sets, reps, rest_seconds) = prescription_for(goal, ex.category, rest);
    PrescribedExercise {
        exercise_id: ex.id,
        name: ex.name.clone(),
        category: ex.category,
        sets,
        reps,
        rest_seconds,
    }
}

/// Whole minutes, rounded up: Σ sets · (45 + rest) seconds.
pub fn estimate_minutes(exercises: &[PrescribedExercise]) -> u32 {
    let seconds: u32 = exercises
        .iter()
        .map(|e| e.sets * (WORK_SECONDS_PER_SET + e.rest_seconds))
        .sum();
    seconds.div_ceil(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prescribed(sets: u32, rest_seconds: u32) -> PrescribedExercise {
        PrescribedExercise {
            exercise_id: 1,
            name: "x".into(),
            category: ExerciseCategory::Strength,
            sets,
            reps: "8-12".into(),
            rest_seconds,
        }
    }

    #[test]
    fn test_rep_schemes() {
        assert_eq!(
            prescription_for(Goal::Strength, ExerciseCategory::Strength, RestPreference::Moderate),
            (4, "4-6".to_string(), 90)
        );
        assert_eq!(
            prescription_for(Goal::Endurance, ExerciseCategory::Core, RestPreference::Full),
            (3, "15-20".to_string(), 150)
        );
        for goal in Goal::ALL {
            let (_, reps, rest) =
                prescription_for(goal, ExerciseCategory::Cardio, RestPreference::Full);
            assert_eq!(reps, "30-60 sec");
            assert_eq!(rest, 30);
        }
    }

    #[test]
    fn test_three_by_three_at_ninety_seconds() {
        let day = vec![prescribed(3, 90), prescribed(3, 90), prescribed(3, 90)];
        // 3 * 3 * (45 + 90) = 1215 s
        assert_eq!(estimate_minutes(&day), 21);
        assert_eq!(estimate_minutes(&[]), 0);
        assert_eq!(estimate_minutes(&[prescribed(4, 75)]), 8);
    }

    #[test]
    fn test_exercise_count_clamped() {
        assert_eq!(exercise_count(45, RestPreference::Moderate), 7);
        assert_eq!(exercise_count(10, RestPreference::Full), 3);
        assert_eq!(exercise_count(120, RestPreference::Minimal), 10);
        assert_eq!(exercise_count(0, RestPreference::Minimal), 3);
    }
}
