//! Weekly plan assembly.
//!
//! Each split day runs search → constraint filter → scoring → selection,
//! then gets its sets, reps, rest and duration.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, Utc};
use tracing::{debug, info, warn};

use repforge_core::{Result, UserContext, UserPreferences, UserProfile, WeeklyPlanResult, WorkoutDay};
use repforge_store::{SearchFilters, SqliteStore};

use crate::constraints::{derive_exclusions, ExclusionSet};
use crate::prescription::{estimate_minutes, exercise_count, prescribe};
use crate::scoring::{rank, score, ScoredExercise, MIN_COMPOSITE_SCORE};
use crate::search::{SimilaritySearch, DAY_PLAN_THRESHOLD};
use crate::selector::select;
use crate::split::{plan_for, SplitDay};

/// Hits requested from search per day before scoring.
const SEARCH_POOL_LIMIT: usize = 60;

/// Natural-language query for one day: goal, muscles, experience,
/// location and equipment in one sentence.
pub fn query_sentence(profile: &UserProfile, preferences: &UserPreferences, muscles: &[String]) -> String {
    format!(
        "{} exercises targeting {} for a {} training at {} with {}",
        profile.primary_goal.phrase(),
        muscles.join(", "),
        profile.experience_level,
        preferences.preferred_location,
        equipment_phrase(preferences)
    )
}

fn equipment_phrase(preferences: &UserPreferences) -> String {
    if preferences.has_full_gym() {
        "full gym equipment".to_string()
    } else if preferences.available_equipment.is_empty() || preferences.bodyweight_only() {
        "bodyweight only".to_string()
    } else {
        preferences.available_equipment.join(", ")
    }
}

/// First Monday strictly after `today`.
pub fn next_monday(today: NaiveDate) -> NaiveDate {
    let days_ahead = 7 - today.weekday().num_days_from_monday() as i64;
    today + Duration::days(days_ahead)
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Builds a [`WeeklyPlanResult`] for one user.
pub struct PlanAssembler<'a> {
    store: &'a SqliteStore,
    search: &'a SimilaritySearch,
}

impl<'a> PlanAssembler<'a> {
    pub fn new(store: &'a SqliteStore, search: &'a SimilaritySearch) -> Self {
        Self { store, search }
    }

    pub async fn assemble(&self, ctx: &UserContext) -> Result<WeeklyPlanResult> {
        let split = plan_for(ctx.preferences.days_per_week);
        let exclusions = derive_exclusions(&ctx.health);
        let count = exercise_count(ctx.preferences.session_minutes, ctx.preferences.rest_preference);

        info!(
            "Assembling {} plan for user {} ({} days, {} exercises/day, {} exclusions)",
            split.split_name,
            ctx.user_id,
            split.days.len(),
            count,
            exclusions.len()
        );

        let mut used: HashSet<i64> = HashSet::new();
        let mut days = Vec::with_capacity(split.days.len());
        for (index, day) in split.days.iter().enumerate() {
            let picked = self.pick_for_day(ctx, day, &exclusions, count, &used).await?;
            if picked.is_empty() {
                warn!("No exercises found for {} (user {})", day.day_label, ctx.user_id);
            }
            used.extend(picked.iter().map(|s| s.exercise.id));

            let exercises: Vec<_> = picked
                .iter()
                .map(|s| prescribe(s, ctx.profile.primary_goal, ctx.preferences.rest_preference))
                .collect();
            days.push(WorkoutDay {
                day_index: index as u32,
                day_label: day.day_label.clone(),
                split_type: day.split_type,
                focus_muscles: day.focus_muscles.clone(),
                weekday_offset: day.weekday_offset,
                estimated_minutes: estimate_minutes(&exercises),
                exercises,
            });
        }

        Ok(WeeklyPlanResult {
            split_name: split.split_name,
            days_per_week: days.len() as u32,
            days,
            generated_at: Utc::now(),
        })
    }

    async fn pick_for_day(
        &self,
        ctx: &UserContext,
        day: &SplitDay,
        exclusions: &ExclusionSet,
        count: usize,
        used: &HashSet<i64>,
    ) -> Result<Vec<ScoredExercise>> {
        let query = query_sentence(&ctx.profile, &ctx.preferences, &day.focus_muscles);
        let filters = SearchFilters {
            location: Some(ctx.preferences.preferred_location),
            muscles: day.focus_muscles.clone(),
            ..Default::default()
        };
        let outcome = self
            .search
            .search(&query, DAY_PLAN_THRESHOLD, SEARCH_POOL_LIMIT, &filters)
            .await?;

        let similarity: HashMap<i64, f64> =
            outcome.hits.iter().map(|h| (h.id, h.similarity)).collect();
        let ids: Vec<i64> = outcome.hits.iter().map(|h| h.id).collect();

        let mut scored: Vec<ScoredExercise> = self
            .store
            .get_exercises(&ids)?
            .iter()
            .filter_map(|ex| {
                score(
                    ex,
                    &ctx.profile,
                    &ctx.preferences,
                    &ctx.health,
                    Some(exclusions),
                    similarity.get(&ex.id).copied().unwrap_or(0.0),
                )
            })
            .filter(|s| s.score > MIN_COMPOSITE_SCORE)
            .collect();
        rank(&mut scored);

        let fresh: Vec<ScoredExercise> = scored
            .iter()
            .filter(|s| !used.contains(&s.exercise.id))
            .cloned()
            .collect();
        let mut pool = if fresh.len() >= count { fresh } else { scored };
        pool.truncate(count * 2);

        debug!(
            "{}: {} hits ({:?}), pool {} for {} slots",
            day.day_label,
            outcome.hits.len(),
            outcome.mode,
            pool.len(),
            count
        );
        Ok(select(&pool, count, &day.focus_muscles))
    }
}
