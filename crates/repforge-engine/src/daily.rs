//! Single-day workout generation and exercise swaps.
//!
//! Unlike the weekly assembler, candidates come from a structured catalog
//! query (equipment, location, difficulty ceiling, focus muscles) ordered
//! by popularity. There is no semantic ranking; the semantic sub-score is
//! fixed at a neutral value.

use chrono::NaiveDate;
use tracing::{debug, info};

use repforge_core::{Error, Exercise, Result, UserContext, Workout, WorkoutExercise};
use repforge_store::{NewWorkout, SearchFilters, SqliteStore};

use crate::constraints::{derive_exclusions, is_excluded};
use crate::prescription::{estimate_minutes, exercise_count, prescribe};
use crate::scoring::{rank, score, target_difficulty, ScoredExercise, MIN_COMPOSITE_SCORE};
use crate::selector::select;
use crate::split::{plan_for, SplitDay};

/// Semantic sub-score used when no similarity is computed.
pub const NEUTRAL_SEMANTIC_SCORE: f64 = 0.5;

/// Rows pulled from the structured catalog query.
const DAILY_QUERY_LIMIT: usize = 60;

/// Split day trained on `day_of_week`. Rest days cycle through the
/// template so every weekday maps to some day.
pub fn split_day_for(days_per_week: u32, day_of_week: u32) -> SplitDay {
    let mut days = plan_for(days_per_week).days;
    match days.iter().position(|d| d.weekday_offset == day_of_week) {
        Some(i) => days.swap_remove(i),
        None => {
            let i = day_of_week as usize % days.len();
            days.swap_remove(i)
        }
    }
}

pub struct DailyWorkoutGenerator<'a> {
    store: &'a SqliteStore,
}

impl<'a> DailyWorkoutGenerator<'a> {
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Pick exercises for one day without persisting anything.
    pub fn pick(&self, ctx: &UserContext, day: &SplitDay) -> Result<Vec<ScoredExercise>> {
        let prefs = &ctx.preferences;
        let equipment = if prefs.available_equipment.is_empty() {
            None
        } else {
            Some(prefs.available_equipment.clone())
        };
        let filters = SearchFilters {
            location: Some(prefs.preferred_location),
            max_difficulty: Some(target_difficulty(&ctx.profile)),
            muscles: day.focus_muscles.clone(),
            equipment,
            ..Default::default()
        };
        let candidates = self.store.query_catalog(&filters, DAILY_QUERY_LIMIT)?;

        let exclusions = derive_exclusions(&ctx.health);
        let mut scored: Vec<ScoredExercise> = candidates
            .iter()
            .filter_map(|ex| {
                score(
                    ex,
                    &ctx.profile,
                    prefs,
                    &ctx.health,
                    Some(&exclusions),
                    NEUTRAL_SEMANTIC_SCORE,
                )
            })
            .filter(|s| s.score > MIN_COMPOSITE_SCORE)
            .collect();
        rank(&mut scored);

        let count = exercise_count(prefs.session_minutes, prefs.rest_preference);
        scored.truncate(count * 2);
        debug!(
            "{}: {} catalog rows, {} scored, {} slots",
            day.day_label,
            candidates.len(),
            scored.len(),
            count
        );
        Ok(select(&scored, count, &day.focus_muscles))
    }

    /// Generate and persist the workout for `day_of_week` (0 = Monday).
    pub fn generate(
        &self,
        ctx: &UserContext,
        day_of_week: u32,
        week_number: u32,
        date: NaiveDate,
    ) -> Result<Workout> {
        let day = split_day_for(ctx.preferences.days_per_week, day_of_week);
        let picked = self.pick(ctx, &day)?;
        if picked.is_empty() {
            return Err(Error::NoCandidates(format!(
                "no exercises fit {} for user {}",
                day.day_label, ctx.user_id
            )));
        }

        let exercises: Vec<_> = picked
            .iter()
            .map(|s| prescribe(s, ctx.profile.primary_goal, ctx.preferences.rest_preference))
            .collect();
        let workout = self.store.insert_workout(&NewWorkout {
            user_id: ctx.user_id,
            plan_id: None,
            name: day.day_label.clone(),
            split_type: day.split_type,
            scheduled_date: date,
            day_of_week,
            week_number,
            estimated_minutes: estimate_minutes(&exercises),
            exercises,
        })?;

        info!(
            "Generated workout {} ({}) for user {} on {}",
            workout.id, workout.name, ctx.user_id, date
        );
        Ok(workout)
    }

    /// Replace one exercise of a user's workout with the most popular
    /// alternative sharing its primary muscle and movement pattern.
    pub fn swap(&self, ctx: &UserContext, workout_exercise_id: i64) -> Result<WorkoutExercise> {
        let (row, owner) = self
            .store
            .workout_exercise(workout_exercise_id)?
            .filter(|(_, owner)| *owner == ctx.user_id)
            .ok_or_else(|| Error::NotFound(format!("workout exercise {}", workout_exercise_id)))?;
        debug!("Swapping workout exercise {} for user {}", row.id, owner);

        let current = self
            .store
            .get_exercise(row.exercise_id)?
            .ok_or_else(|| Error::NotFound(format!("exercise {}", row.exercise_id)))?;

        // Exercises already in the workout are not offered again.
        let mut exclude_ids = vec![current.id];
        if let Some(workout) = self.store.get_workout(row.workout_id)? {
            exclude_ids.extend(workout.exercises.iter().map(|e| e.exercise_id));
        }

        let replacement = self
            .find_alternative(ctx, &current, exclude_ids)?
            .ok_or_else(|| {
                Error::NoAlternativeFound(format!(
                    "no alternative for {} ({})",
                    current.name, current.movement_pattern
                ))
            })?;

        let updated = self.store.replace_workout_exercise(row.id, &replacement)?;
        info!(
            "Swapped {} for {} in workout {}",
            current.slug, replacement.slug, row.workout_id
        );
        Ok(updated)
    }

    fn find_alternative(
        &self,
        ctx: &UserContext,
        current: &Exercise,
        exclude_ids: Vec<i64>,
    ) -> Result<Option<Exercise>> {
        let Some(primary) = current.primary_muscles.first() else {
            return Ok(None);
        };
        let exclusions = derive_exclusions(&ctx.health);
        let filters = SearchFilters {
            exclude_ids,
            ..Default::default()
        };

        // query_catalog is ordered by popularity, so the first match wins.
        Ok(self
            .store
            .query_catalog(&filters, usize::MAX)?
            .into_iter()
            .find(|ex| {
                ex.movement_pattern.eq_ignore_ascii_case(&current.movement_pattern)
                    && ex.primary_muscles.iter().any(|m| m.eq_ignore_ascii_case(primary))
                    && !is_excluded(ex, &exclusions)
            }))
    }
}
