//! Database schema SQL.

/// Catalog tables: exercises and their per-model embeddings.
///
/// The full exercise record lives in `data_json`; the scalar columns are
/// copies kept for ordering and inspection.
pub const CATALOG_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS exercises (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    movement_pattern TEXT NOT NULL,
    difficulty INTEGER NOT NULL CHECK (difficulty BETWEEN 1 AND 5),
    popularity INTEGER NOT NULL DEFAULT 0,
    data_json TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_exercises_pattern ON exercises(movement_pattern);
CREATE INDEX IF NOT EXISTS idx_exercises_popularity ON exercises(popularity DESC);

CREATE TABLE IF NOT EXISTS exercise_embeddings (
    exercise_id INTEGER NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
    model TEXT NOT NULL,
    dimension INTEGER NOT NULL,
    embedding BLOB NOT NULL,
    scale REAL NOT NULL,
    offset_val REAL NOT NULL,
    PRIMARY KEY (exercise_id, model)
);
"#;

/// User context, weekly plans and scheduled workouts.
pub const USER_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    profile_json TEXT,
    preferences_json TEXT,
    health_json TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER
);

CREATE TABLE IF NOT EXISTS weekly_plans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    week_number INTEGER NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    split_name TEXT NOT NULL,
    plan_json TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

-- At most one active plan per user.
CREATE UNIQUE INDEX IF NOT EXISTS idx_weekly_plans_active
    ON weekly_plans(user_id) WHERE active = 1;

CREATE TABLE IF NOT EXISTS workouts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    plan_id INTEGER REFERENCES weekly_plans(id),
    name TEXT NOT NULL,
    split_type TEXT NOT NULL,
    scheduled_date TEXT NOT NULL,
    day_of_week INTEGER NOT NULL,
    week_number INTEGER NOT NULL,
    status TEXT NOT NULL DEFAULT 'scheduled',
    estimated_minutes INTEGER NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_workouts_user_date ON workouts(user_id, scheduled_date);

CREATE TABLE IF NOT EXISTS workout_exercises (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    workout_id INTEGER NOT NULL REFERENCES workouts(id) ON DELETE CASCADE,
    exercise_id INTEGER NOT NULL REFERENCES exercises(id),
    exercise_name TEXT NOT NULL,
    position INTEGER NOT NULL,
    sets INTEGER NOT NULL,
    reps TEXT NOT NULL,
    rest_seconds INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_workout_exercises_workout ON workout_exercises(workout_id);
"#;
