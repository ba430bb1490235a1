//! End-to-end flows through `RecommendationEngine` on an on-disk store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use ndarray::Array1;
use tempfile::TempDir;

use repforge_core::*;
use repforge_engine::{RecommendationEngine, SearchMode};
use repforge_infer::{EmbedderBackend, EmbeddingGateway, NoopEmbedder, ProviderInfo, QueryCache};
use repforge_store::{SearchFilters, SqliteStore, LEXICAL_FALLBACK_SIMILARITY};

const KNEE_TOKENS: [&str; 5] = ["squat", "lunge", "leg_press", "leg_extension", "jump"];

/// Counts muscle words; the last dimension is a constant bias so no
/// vector is zero.
struct MuscleWordEmbedder;

const VOCAB: [&str; 9] = [
    "chest", "back", "shoulders", "triceps", "biceps", "quadriceps", "hamstrings", "glutes", "calves",
];

#[async_trait]
impl EmbedderBackend for MuscleWordEmbedder {
    async fn embed(&self, text: &str) -> Result<Array1<f32>> {
        let mut v = vec![0.0f32; VOCAB.len() + 1];
        for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if let Some(i) = VOCAB.iter().position(|w| *w == word) {
                v[i] += 1.0;
            }
        }
        v[VOCAB.len()] = 1.0;
        Ok(Array1::from(v))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "test".into(),
            model: "muscle-words".into(),
            dimension: VOCAB.len() + 1,
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Reports itself available but every request fails.
struct FailingEmbedder;

#[async_trait]
impl EmbedderBackend for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Array1<f32>> {
        Err(Error::Http("503 Service Unavailable".into()))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "failing".into(),
            model: "failing-model".into(),
            dimension: 8,
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}

fn ex(name: &str, pattern: &str, primary: &[&str], difficulty: u8, equipment: &[&str], home: f64) -> Exercise {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "slug": name.to_lowercase().replace(' ', "-"),
        "description": format!("{} ({})", name, pattern.replace('_', " ")),
        "category": "strength",
        "movement_pattern": pattern,
        "exercise_type": "compound",
        "primary_muscles": primary,
        "difficulty": difficulty,
        "equipment_required": equipment,
        "home_compatibility": home,
        "gym_compatibility": 1.0,
        "outdoor_compatibility": 0.5,
        "goal_effectiveness": {"strength": 0.7, "muscle_gain": 0.7}
    }))
    .unwrap()
}

fn seed(store: &SqliteStore) {
    let mut catalog = vec![
        // push
        ex("Push-Up", "horizontal_push", &["chest", "triceps"], 2, &["none"], 1.0),
        ex("Pike Push-Up", "vertical_push", &["shoulders"], 2, &["none"], 1.0),
        ex("Diamond Push-Up", "close_push", &["triceps"], 2, &["none"], 1.0),
        ex("Chair Dip", "dip", &["triceps"], 2, &["none"], 1.0),
        ex("Archer Push-Up", "horizontal_push", &["chest"], 4, &["none"], 1.0),
        ex("Barbell Bench Press", "horizontal_push", &["chest"], 3, &["barbell", "bench"], 0.1),
        // pull
        ex("Inverted Row", "horizontal_pull", &["back", "biceps"], 2, &["none"], 0.8),
        ex("Superman", "back_extension", &["back"], 1, &["none"], 1.0),
        ex("Towel Curl", "curl", &["biceps"], 1, &["none"], 1.0),
        // legs
        ex("Bodyweight Squat", "squat", &["quadriceps", "glutes"], 1, &["none"], 1.0),
        ex("Reverse Lunge", "lunge", &["quadriceps", "glutes"], 2, &["none"], 1.0),
        ex("Jump Squat", "squat", &["quadriceps"], 3, &["none"], 1.0),
        ex("Wall Sit", "isometric_squat", &["quadriceps"], 1, &["none"], 1.0),
        ex("Box Jump", "plyometric", &["quadriceps", "calves"], 3, &["box"], 0.6),
        ex("Leg Press", "leg_press", &["quadriceps"], 2, &["leg press machine"], 0.0),
        ex("Leg Extension", "leg_extension", &["quadriceps"], 1, &["machine"], 0.0),
        ex("Glute Bridge", "hip_hinge", &["glutes", "hamstrings"], 1, &["none"], 1.0),
        ex("Single Leg Hip Hinge", "hip_hinge", &["hamstrings"], 2, &["none"], 1.0),
        ex("Calf Raise", "calf_raise", &["calves"], 1, &["none"], 1.0),
    ];
    for (i, e) in catalog.iter_mut().enumerate() {
        e.popularity = 100 - i as i64;
        store.add_exercise(e).unwrap();
    }
}

fn knee_user(store: &SqliteStore) -> i64 {
    knee_user_with(store, 3, 45)
}

fn knee_user_with(store: &SqliteStore, days_per_week: u32, session_minutes: u32) -> i64 {
    let profile = UserProfile {
        fitness_level: FitnessLevel::LightlyActive,
        experience_level: ExperienceLevel::Beginner,
        primary_goal: Goal::Strength,
        secondary_goal: None,
        age: Some(35),
        pushup_capacity: Some(10),
        plank_hold_seconds: Some(45),
        squat_comfort: Some(2),
    };
    let preferences = UserPreferences {
        preferred_location: Location::Home,
        available_equipment: vec!["none".into()],
        days_per_week,
        session_minutes,
        preferred_exercise_types: vec![ExerciseType::Compound],
        rest_preference: RestPreference::Moderate,
    };
    let health = UserHealth {
        injuries: vec!["knee".into()],
        ..Default::default()
    };
    store
        .create_user(Some(&profile), Some(&preferences), &health)
        .unwrap()
}

fn engine_with(backend: Arc<dyn EmbedderBackend>) -> (RecommendationEngine, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteStore::open(dir.path()).unwrap());
    seed(&store);
    let gateway = EmbeddingGateway::new(
        backend,
        QueryCache::new(64, Duration::from_secs(60)),
        Duration::from_secs(2),
    );
    // 2026-10-19 is a Monday.
    let engine = RecommendationEngine::new(store, Arc::new(gateway))
        .with_today(|| NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    (engine, dir)
}

fn lexical_engine() -> (RecommendationEngine, TempDir) {
    engine_with(Arc::new(NoopEmbedder::new(768)))
}

fn contains_knee_token(e: &Exercise) -> bool {
    let fields = [
        e.name.to_lowercase(),
        e.slug.to_lowercase(),
        e.movement_pattern.to_lowercase(),
    ];
    KNEE_TOKENS
        .iter()
        .any(|t| fields.iter().any(|f| f.contains(t)))
}

#[tokio::test]
async fn knee_injury_plan_has_no_knee_loading_exercises() {
    let (engine, _dir) = lexical_engine();
    let user = knee_user(engine.store());

    let plan = engine.generate_weekly_plan(user).await.unwrap();
    assert_eq!(plan.days.len(), 3);
    assert_eq!(plan.split_name, "Push/Pull/Legs");

    let mut total = 0;
    for day in &plan.days {
        for p in &day.exercises {
            let e = engine.store().get_exercise(p.exercise_id).unwrap().unwrap();
            assert!(!contains_knee_token(&e), "{} in {}", e.name, day.day_label);
            assert_eq!(p.sets, 4);
            assert_eq!(p.reps, "4-6");
            assert_eq!(p.rest_seconds, 90);
            total += 1;
        }
    }
    assert!(total > 0);

    let legs = &plan.days[2];
    assert_eq!(legs.split_type, SplitType::Legs);
    assert!(!legs.exercises.is_empty());
    assert!(legs.exercises.iter().any(|p| p.name == "Glute Bridge"));
}

#[tokio::test]
async fn saving_plans_keeps_exactly_one_active() {
    let (engine, _dir) = lexical_engine();
    let user = knee_user(engine.store());

    let plan = engine.generate_weekly_plan(user).await.unwrap();
    let first = engine.save_weekly_plan(user, &plan).unwrap();
    assert_eq!(engine.store().count_active_plans(user).unwrap(), 1);

    let second = engine.save_weekly_plan(user, &plan).unwrap();
    assert_ne!(first, second);
    assert_eq!(engine.store().count_active_plans(user).unwrap(), 1);

    let active = engine.store().active_plan(user).unwrap().unwrap();
    assert_eq!(active.id, second);
    assert_eq!(active.week_number, 2);

    // Scheduled from the Monday after "today".
    let workouts = engine.store().workouts_for_plan(second).unwrap();
    assert_eq!(workouts.len(), 3);
    assert_eq!(
        workouts[0].scheduled_date,
        NaiveDate::from_ymd_opt(2026, 10, 26).unwrap()
    );
}

#[tokio::test]
async fn lexical_fallback_tags_every_hit() {
    let (engine, _dir) = lexical_engine();
    let outcome = engine
        .search()
        .search("push", 0.9, 20, &SearchFilters::default())
        .await
        .unwrap();
    assert_eq!(outcome.mode, SearchMode::Lexical);
    assert!(outcome.hits.len() >= 4);
    assert!(outcome
        .hits
        .iter()
        .all(|h| h.similarity == LEXICAL_FALLBACK_SIMILARITY));
}

#[tokio::test]
async fn missing_user_and_incomplete_onboarding() {
    let (engine, _dir) = lexical_engine();
    assert!(matches!(
        engine.generate_weekly_plan(999).await,
        Err(Error::NotFound(_))
    ));

    let incomplete = engine
        .store()
        .create_user(None, None, &UserHealth::default())
        .unwrap();
    assert!(matches!(
        engine.generate_weekly_plan(incomplete).await,
        Err(Error::PreconditionFailed(_))
    ));
    assert!(matches!(
        engine.get_todays_workout(incomplete),
        Err(Error::PreconditionFailed(_))
    ));
}

#[test]
fn todays_workout_is_idempotent_and_swappable() {
    let (engine, _dir) = lexical_engine();
    let user = knee_user(engine.store());

    let first = engine.get_todays_workout(user).unwrap();
    let again = engine.get_todays_workout(user).unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(first.split_type, SplitType::Push);
    assert_eq!(first.day_of_week, 0);
    assert!(first
        .exercises
        .iter()
        .all(|e| e.exercise_name != "Archer Push-Up" && e.exercise_name != "Barbell Bench Press"));

    let push_up = first
        .exercises
        .iter()
        .find(|e| e.exercise_name == "Push-Up")
        .unwrap();

    // Another user's row is not visible.
    let other = knee_user(engine.store());
    assert!(matches!(
        engine.swap_exercise(push_up.id, other),
        Err(Error::NotFound(_))
    ));

    let swapped = engine.swap_exercise(push_up.id, user).unwrap();
    assert_eq!(swapped.exercise_name, "Archer Push-Up");
    assert_eq!(swapped.sets, push_up.sets);

    let pike = first
        .exercises
        .iter()
        .find(|e| e.exercise_name == "Pike Push-Up")
        .unwrap();
    assert!(matches!(
        engine.swap_exercise(pike.id, user),
        Err(Error::NoAlternativeFound(_))
    ));
}

#[tokio::test]
async fn semantic_recommendations_after_embedding_catalog() {
    let (engine, _dir) = engine_with(Arc::new(MuscleWordEmbedder));
    let user = knee_user(engine.store());

    let embedded = engine.embed_catalog().await.unwrap();
    assert_eq!(embedded, 19);
    assert_eq!(engine.embed_catalog().await.unwrap(), 0);

    let outcome = engine
        .search()
        .search("chest", 0.5, 10, &SearchFilters::default())
        .await
        .unwrap();
    assert_eq!(outcome.mode, SearchMode::Semantic);

    let recs = engine
        .get_exercises_for_muscles(user, &["chest".to_string()], 5)
        .await
        .unwrap();
    assert!(!recs.is_empty());
    assert!(recs.len() <= 5);
    assert!(recs.iter().any(|r| r.exercise.name == "Push-Up"));
    for r in &recs {
        assert!(r.exercise.primary_muscles.contains(&"chest".to_string()));
        assert!(r.score > 0.3 && r.score <= 1.0);
    }

    let similar = engine
        .search_similar_exercises(engine.store().all_exercises().unwrap()[0].id, 3)
        .unwrap();
    assert!(similar.iter().all(|s| s.exercise.name != "Push-Up"));
}

#[tokio::test]
async fn embedding_catalog_requires_a_provider() {
    let (engine, _dir) = lexical_engine();
    assert!(matches!(
        engine.embed_catalog().await,
        Err(Error::ProviderUnavailable(_))
    ));
}

#[tokio::test]
async fn failing_provider_degrades_to_lexical() {
    let (engine, _dir) = engine_with(Arc::new(FailingEmbedder));
    let user = knee_user(engine.store());

    let outcome = engine
        .search()
        .search("chest", 0.5, 10, &SearchFilters::default())
        .await
        .unwrap();
    assert_eq!(outcome.mode, SearchMode::Lexical);

    let plan = engine.generate_weekly_plan(user).await.unwrap();
    assert_eq!(plan.days.len(), 3);
    assert!(plan.days.iter().all(|d| !d.exercises.is_empty()));

    let recs = engine
        .get_exercises_for_muscles(user, &["chest".to_string()], 5)
        .await
        .unwrap();
    assert!(!recs.is_empty());
    assert!(recs
        .iter()
        .all(|r| r.breakdown.semantic_match == LEXICAL_FALLBACK_SIMILARITY));
}

#[tokio::test]
async fn semantic_knee_plan_respects_exclusions() {
    let (engine, _dir) = engine_with(Arc::new(MuscleWordEmbedder));
    let user = knee_user(engine.store());
    engine.embed_catalog().await.unwrap();

    let outcome = engine
        .search()
        .search("quadriceps glutes", 0.4, 10, &SearchFilters::default())
        .await
        .unwrap();
    assert_eq!(outcome.mode, SearchMode::Semantic);

    let plan = engine.generate_weekly_plan(user).await.unwrap();
    assert_eq!(plan.days.len(), 3);
    for day in &plan.days {
        assert!(!day.exercises.is_empty(), "{} is empty", day.day_label);
        for p in &day.exercises {
            let e = engine.store().get_exercise(p.exercise_id).unwrap().unwrap();
            assert!(!contains_knee_token(&e), "{} in {}", e.name, day.day_label);
        }
    }
}

#[tokio::test]
async fn days_do_not_repeat_exercises_when_pool_allows() {
    let (engine, _dir) = lexical_engine();
    // Two identical full-body days with three slots each.
    let user = knee_user_with(engine.store(), 2, 15);

    let plan = engine.generate_weekly_plan(user).await.unwrap();
    assert_eq!(plan.days.len(), 2);
    assert_eq!(plan.days[0].split_type, SplitType::FullBody);
    assert_eq!(plan.days[1].split_type, SplitType::FullBody);

    let first: Vec<i64> = plan.days[0].exercises.iter().map(|p| p.exercise_id).collect();
    let second: Vec<i64> = plan.days[1].exercises.iter().map(|p| p.exercise_id).collect();
    assert_eq!(first.len(), 3);
    assert_eq!(second.len(), 3);
    assert!(second.iter().all(|id| !first.contains(id)), "{:?} vs {:?}", first, second);
}
