//! `RecommendationEngine`: the operations exposed to the routing layer.

use std::sync::Arc;

use chrono::{Datelike, Duration, Local, NaiveDate};
use tracing::{debug, info, warn};

use repforge_core::{Error, Result, WeeklyPlanResult, Workout, WorkoutExercise};
use repforge_infer::EmbeddingGateway;
use repforge_store::{SearchFilters, SqliteStore};

use crate::constraints::derive_exclusions;
use crate::daily::DailyWorkoutGenerator;
use crate::planner::{next_monday, week_start, PlanAssembler};
use crate::scoring::{rank, score, ScoredExercise, MIN_COMPOSITE_SCORE};
use crate::search::{SimilarExercise, SimilaritySearch, RECOMMENDATION_THRESHOLD};

/// Batch size used when embedding the catalog.
const EMBED_BATCH_SIZE: usize = 32;

type TodayFn = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Recommendation and plan engine over one store and one embedding gateway.
pub struct RecommendationEngine {
    store: Arc<SqliteStore>,
    search: SimilaritySearch,
    today: TodayFn,
}

impl RecommendationEngine {
    pub fn new(store: Arc<SqliteStore>, gateway: Arc<EmbeddingGateway>) -> Self {
        let search = SimilaritySearch::new(Arc::clone(&store), gateway);
        Self {
            store,
            search,
            today: Box::new(|| Local::now().date_naive()),
        }
    }

    /// Replace the clock used for "today" (tests, replays).
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Box::new(today);
        self
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn search(&self) -> &SimilaritySearch {
        &self.search
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    /// Ranked recommendations for a set of muscles.
    ///
    /// The query embedding and the user-context fetch run concurrently.
    pub async fn get_exercises_for_muscles(
        &self,
        user_id: i64,
        muscles: &[String],
        limit: usize,
    ) -> Result<Vec<ScoredExercise>> {
        let query = format!("exercises targeting {}", muscles.join(", "));

        let store = Arc::clone(&self.store);
        let context_task = tokio::task::spawn_blocking(move || store.user_context(user_id));
        let (embedding, ctx) = tokio::join!(self.search.embed_query(&query), context_task);
        let ctx = ctx.map_err(|e| Error::Internal(format!("user context task failed: {}", e)))??;

        let filters = SearchFilters {
            location: Some(ctx.preferences.preferred_location),
            muscles: muscles.to_vec(),
            ..Default::default()
        };
        let pool = (limit * 3).max(30);
        let outcome = self.search.search_with_embedding(
            &query,
            embedding,
            RECOMMENDATION_THRESHOLD,
            pool,
            &filters,
        )?;

        let exclusions = derive_exclusions(&ctx.health);
        let mut scored: Vec<ScoredExercise> = self
            .search
            .resolve(&outcome.hits)?
            .iter()
            .filter_map(|hit| {
                score(
                    &hit.exercise,
                    &ctx.profile,
                    &ctx.preferences,
                    &ctx.health,
                    Some(&exclusions),
                    hit.similarity,
                )
            })
            .filter(|s| s.score > MIN_COMPOSITE_SCORE)
            .collect();
        rank(&mut scored);
        scored.truncate(limit);

        debug!(
            "Recommended {} exercises for user {} ({:?} search)",
            scored.len(),
            user_id,
            outcome.mode
        );
        Ok(scored)
    }

    pub async fn generate_weekly_plan(&self, user_id: i64) -> Result<WeeklyPlanResult> {
        let ctx = self.store.user_context(user_id)?;
        PlanAssembler::new(&self.store, &self.search).assemble(&ctx).await
    }

    /// Persist a plan as the user's active plan, scheduled from next Monday.
    /// Returns the plan id.
    pub fn save_weekly_plan(&self, user_id: i64, plan: &WeeklyPlanResult) -> Result<i64> {
        let saved = self
            .store
            .save_weekly_plan(user_id, plan, next_monday(self.today()))?;
        Ok(saved.plan_id)
    }

    /// Generate a workout for a day of the current week. `day_of_week` is
    /// taken modulo 7 (0 = Monday).
    pub fn generate_workout(&self, user_id: i64, day_of_week: u32, week_number: u32) -> Result<Workout> {
        let ctx = self.store.user_context(user_id)?;
        let day_of_week = day_of_week % 7;
        let date = week_start(self.today()) + Duration::days(day_of_week as i64);
        DailyWorkoutGenerator::new(&self.store).generate(&ctx, day_of_week, week_number, date)
    }

    /// Today's workout, generated on first request and reused afterwards.
    pub fn get_todays_workout(&self, user_id: i64) -> Result<Workout> {
        let today = self.today();
        if let Some(existing) = self.store.workout_for_date(user_id, today)? {
            debug!("Returning existing workout {} for {}", existing.id, today);
            return Ok(existing);
        }

        let ctx = self.store.user_context(user_id)?;
        let week_number = self
            .store
            .active_plan(user_id)?
            .map(|p| p.week_number)
            .unwrap_or(1);
        let day_of_week = today.weekday().num_days_from_monday();
        DailyWorkoutGenerator::new(&self.store).generate(&ctx, day_of_week, week_number, today)
    }

    pub fn swap_exercise(&self, workout_exercise_id: i64, user_id: i64) -> Result<WorkoutExercise> {
        let ctx = self.store.user_context(user_id)?;
        DailyWorkoutGenerator::new(&self.store).swap(&ctx, workout_exercise_id)
    }

    /// Catalog entries closest to an exercise, best first.
    pub fn search_similar_exercises(&self, exercise_id: i64, limit: usize) -> Result<Vec<SimilarExercise>> {
        let outcome = self.search.search_by_exercise_id(exercise_id, limit)?;
        self.search.resolve(&outcome.hits)
    }

    /// Embed every exercise lacking a vector for the active model.
    /// Returns how many were embedded.
    pub async fn embed_catalog(&self) -> Result<usize> {
        let gateway = self.search.gateway();
        if !gateway.is_available() {
            return Err(Error::ProviderUnavailable(
                "configure an embedding provider to embed the catalog".into(),
            ));
        }
        let model = self.search.active_model();
        let pending = self.store.exercises_without_embedding(&model)?;
        if pending.is_empty() {
            info!("Catalog already embedded for model {}", model);
            return Ok(0);
        }

        let mut embedded = 0;
        for batch in pending.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|e| e.embedding_text()).collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let vectors = gateway.embed_batch(&refs).await?;
            if vectors.len() != batch.len() {
                warn!(
                    "Provider returned {} vectors for {} texts",
                    vectors.len(),
                    batch.len()
                );
            }
            for (exercise, vector) in batch.iter().zip(vectors.iter()) {
                self.store.add_exercise_embedding(exercise.id, &model, vector)?;
                embedded += 1;
            }
            debug!("Embedded {}/{} exercises", embedded, pending.len());
        }

        info!("Embedded {} exercises with model {}", embedded, model);
        Ok(embedded)
    }
}
