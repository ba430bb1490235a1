//! Weekly plans and scheduled workouts.
//!
//! Saving a plan is one transaction: the previous active plan is switched
//! off, the new one inserted and every day scheduled as a workout. The
//! partial unique index on `weekly_plans(user_id) WHERE active = 1` backs
//! this up at the schema level.

use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use repforge_core::{
    Error, Exercise, Result, SplitType, StoredWeeklyPlan, WeeklyPlanResult, Workout,
    WorkoutExercise, WorkoutStatus,
};

use crate::sqlite::{db_err, now_millis, SqliteStore};
use crate::types::{NewWorkout, SavedPlan};

const DATE_FORMAT: &str = "%Y-%m-%d";

impl SqliteStore {
    /// Persist `plan` as the user's active plan and schedule one workout
    /// per day at `schedule_start + weekday_offset`.
    pub fn save_weekly_plan(
        &self,
        user_id: i64,
        plan: &WeeklyPlanResult,
        schedule_start: NaiveDate,
    ) -> Result<SavedPlan> {
        let plan_json = serde_json::to_string(plan)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;

        let user_exists: Option<i64> = tx
            .query_row("SELECT id FROM users WHERE id = ?1", params![user_id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(db_err)?;
        if user_exists.is_none() {
            return Err(Error::NotFound(format!("user {}", user_id)));
        }

        let deactivated = tx
            .execute(
                "UPDATE weekly_plans SET active = 0 WHERE user_id = ?1 AND active = 1",
                params![user_id],
            )
            .map_err(db_err)?;

        let last_week: Option<i64> = tx
            .query_row(
                "SELECT MAX(week_number) FROM weekly_plans WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        let week_number = last_week.unwrap_or(0) as u32 + 1;

        tx.execute(
            "INSERT INTO weekly_plans (user_id, week_number, active, split_name, plan_json, created_at) \
             VALUES (?1, ?2, 1, ?3, ?4, ?5)",
            params![user_id, week_number, plan.split_name, plan_json, now_millis()],
        )
        .map_err(db_err)?;
        let plan_id = tx.last_insert_rowid();

        let mut workout_ids = Vec::with_capacity(plan.days.len());
        for day in &plan.days {
            let workout = NewWorkout {
                user_id,
                plan_id: Some(plan_id),
                name: day.day_label.clone(),
                split_type: day.split_type,
                scheduled_date: schedule_start + Duration::days(day.weekday_offset as i64),
                day_of_week: day.weekday_offset % 7,
                week_number,
                estimated_minutes: day.estimated_minutes,
                exercises: day.exercises.clone(),
            };
            workout_ids.push(insert_workout_rows(&tx, &workout)?);
        }

        tx.commit().map_err(db_err)?;

        info!(
            "Saved weekly plan {} for user {} (week {}, {} workouts, {} deactivated)",
            plan_id,
            user_id,
            week_number,
            workout_ids.len(),
            deactivated
        );
        Ok(SavedPlan {
            plan_id,
            week_number,
            deactivated,
            workout_ids,
        })
    }

    /// The user's active plan, if any.
    pub fn active_plan(&self, user_id: i64) -> Result<Option<StoredWeeklyPlan>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT id, user_id, week_number, active, plan_json, created_at \
                 FROM weekly_plans WHERE user_id = ?1 AND active = 1",
            )
            .map_err(db_err)?
            .query_row(params![user_id], |row| {
                let plan_json: String = row.get(4)?;
                let plan: WeeklyPlanResult = serde_json::from_str(&plan_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(StoredWeeklyPlan {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    week_number: row.get(2)?,
                    active: row.get(3)?,
                    plan,
                    created_at: row.get(5)?,
                })
            })
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    pub fn count_active_plans(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COUNT(*) FROM weekly_plans WHERE user_id = ?1 AND active = 1",
            params![user_id],
            |row| row.get(0),
        )
        .map_err(db_err)
    }

    /// Insert a single workout outside of a weekly plan.
    pub fn insert_workout(&self, workout: &NewWorkout) -> Result<Workout> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction().map_err(db_err)?;
        let id = insert_workout_rows(&tx, workout)?;
        tx.commit().map_err(db_err)?;

        load_workout(&conn, id)?
            .ok_or_else(|| Error::Internal(format!("workout {} vanished after insert", id)))
    }

    pub fn get_workout(&self, workout_id: i64) -> Result<Option<Workout>> {
        let conn = self.conn.lock();
        load_workout(&conn, workout_id)
    }

    /// The most recently created workout scheduled for `date`.
    pub fn workout_for_date(&self, user_id: i64, date: NaiveDate) -> Result<Option<Workout>> {
        let conn = self.conn.lock();
        let id: Option<i64> = conn
            .query_row(
                "SELECT id FROM workouts WHERE user_id = ?1 AND scheduled_date = ?2 \
                 ORDER BY id DESC LIMIT 1",
                params![user_id, date.format(DATE_FORMAT).to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        match id {
            Some(id) => load_workout(&conn, id),
            None => Ok(None),
        }
    }

    pub fn workouts_for_plan(&self, plan_id: i64) -> Result<Vec<Workout>> {
        let conn = self.conn.lock();
        let ids: Vec<i64> = {
            let mut stmt = conn
                .prepare_cached("SELECT id FROM workouts WHERE plan_id = ?1 ORDER BY scheduled_date, id")
                .map_err(db_err)?;
            let rows = stmt
                .query_map(params![plan_id], |row| row.get(0))
                .map_err(db_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)?
        };
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(w) = load_workout(&conn, id)? {
                out.push(w);
            }
        }
        Ok(out)
    }

    /// A workout exercise row together with the owning user id.
    pub fn workout_exercise(&self, id: i64) -> Result<Option<(WorkoutExercise, i64)>> {
        let conn = self.conn.lock();
        let row = conn
            .prepare_cached(
                "SELECT we.id, we.workout_id, we.exercise_id, we.exercise_name, we.position, \
                 we.sets, we.reps, we.rest_seconds, w.user_id \
                 FROM workout_exercises we JOIN workouts w ON w.id = we.workout_id \
                 WHERE we.id = ?1",
            )
            .map_err(db_err)?
            .query_row(params![id], |row| Ok((row_to_workout_exercise(row)?, row.get(8)?)))
            .optional()
            .map_err(db_err)?;
        Ok(row)
    }

    /// Point a workout exercise row at `replacement`, keeping its prescription.
    pub fn replace_workout_exercise(&self, id: i64, replacement: &Exercise) -> Result<WorkoutExercise> {
        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE workout_exercises SET exercise_id = ?1, exercise_name = ?2 WHERE id = ?3",
                params![replacement.id, replacement.name, id],
            )
            .map_err(db_err)?;
        if count == 0 {
            return Err(Error::NotFound(format!("workout exercise {}", id)));
        }
        debug!("Workout exercise {} now points at {}", id, replacement.slug);

        let row = conn
            .prepare_cached(
                "SELECT id, workout_id, exercise_id, exercise_name, position, sets, reps, \
                 rest_seconds FROM workout_exercises WHERE id = ?1",
            )
            .map_err(db_err)?
            .query_row(params![id], row_to_workout_exercise)
            .map_err(db_err)?;
        Ok(row)
    }
}

fn insert_workout_rows(conn: &Connection, workout: &NewWorkout) -> Result<i64> {
    conn.execute(
        "INSERT INTO workouts (user_id, plan_id, name, split_type, scheduled_date, day_of_week, \
         week_number, status, estimated_minutes, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            workout.user_id,
            workout.plan_id,
            workout.name,
            workout.split_type.as_str(),
            workout.scheduled_date.format(DATE_FORMAT).to_string(),
            workout.day_of_week,
            workout.week_number,
            WorkoutStatus::Scheduled.as_str(),
            workout.estimated_minutes,
            now_millis(),
        ],
    )
    .map_err(db_err)?;
    let workout_id = conn.last_insert_rowid();

    let mut stmt = conn
        .prepare_cached(
            "INSERT INTO workout_exercises (workout_id, exercise_id, exercise_name, position, \
             sets, reps, rest_seconds) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .map_err(db_err)?;
    for (position, ex) in workout.exercises.iter().enumerate() {
        stmt.execute(params![
            workout_id,
            ex.exercise_id,
            ex.name,
            position as u32,
            ex.sets,
            ex.reps,
            ex.rest_seconds
        ])
        .map_err(db_err)?;
    }
    Ok(workout_id)
}

fn load_workout(conn: &Connection, workout_id: i64) -> Result<Option<Workout>> {
    type Header = (i64, i64, Option<i64>, String, String, String, u32, u32, String, u32);
    let header: Option<Header> = conn
        .query_row(
            "SELECT id, user_id, plan_id, name, split_type, scheduled_date, day_of_week, \
             week_number, status, estimated_minutes FROM workouts WHERE id = ?1",
            params![workout_id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                ))
            },
        )
        .optional()
        .map_err(db_err)?;
    let Some((id, user_id, plan_id, name, split, date, day_of_week, week_number, status, minutes)) =
        header
    else {
        return Ok(None);
    };

    let split_type = SplitType::parse(&split)
        .ok_or_else(|| Error::Database(format!("unknown split type {:?}", split)))?;
    let status = WorkoutStatus::parse(&status)
        .ok_or_else(|| Error::Database(format!("unknown workout status {:?}", status)))?;
    let scheduled_date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .map_err(|e| Error::Database(format!("bad scheduled_date {:?}: {}", date, e)))?;

    let mut stmt = conn
        .prepare_cached(
            "SELECT id, workout_id, exercise_id, exercise_name, position, sets, reps, rest_seconds \
             FROM workout_exercises WHERE workout_id = ?1 ORDER BY position",
        )
        .map_err(db_err)?;
    let exercises = stmt
        .query_map(params![id], row_to_workout_exercise)
        .map_err(db_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(db_err)?;

    Ok(Some(Workout {
        id,
        user_id,
        plan_id,
        name,
        split_type,
        scheduled_date,
        day_of_week,
        week_number,
        status,
        estimated_minutes: minutes,
        exercises,
    }))
}

fn row_to_workout_exercise(row: &rusqlite::Row<'_>) -> rusqlite::Result<WorkoutExercise> {
    Ok(WorkoutExercise {
        id: row.get(0)?,
        workout_id: row.get(1)?,
        exercise_id: row.get(2)?,
        exercise_name: row.get(3)?,
        position: row.get(4)?,
        sets: row.get(5)?,
        reps: row.get(6)?,
        rest_seconds: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::sqlite::tests::{exercise, test_store};
    use repforge_core::{ExerciseCategory, PrescribedExercise, UserHealth, WorkoutDay};

    fn plan_with(store: &SqliteStore) -> WeeklyPlanResult {
        let push = store
            .add_exercise(&exercise("push-up", "horizontal_push", &["chest"]))
            .unwrap();
        let row = store
            .add_exercise(&exercise("inverted-row", "horizontal_pull", &["back"]))
            .unwrap();
        let day = |index: u32, offset: u32, split: SplitType, id: i64, name: &str| WorkoutDay {
            day_index: index,
            day_label: format!("Day {}", index + 1),
            split_type: split,
            focus_muscles: vec![],
            weekday_offset: offset,
            exercises: vec![PrescribedExercise {
                exercise_id: id,
                name: name.into(),
                category: ExerciseCategory::Strength,
                sets: 3,
                reps: "10-12".into(),
                rest_seconds: 90,
            }],
            estimated_minutes: 7,
        };
        WeeklyPlanResult {
            split_name: "Full Body".into(),
            days_per_week: 2,
            days: vec![
                day(0, 0, SplitType::FullBody, push, "push up"),
                day(1, 3, SplitType::FullBody, row, "inverted row"),
            ],
            generated_at: Utc::now(),
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_save_schedules_days() {
        let (store, _dir) = test_store();
        let user = store.create_user(None, None, &UserHealth::default()).unwrap();
        let plan = plan_with(&store);

        let saved = store.save_weekly_plan(user, &plan, monday()).unwrap();
        assert_eq!(saved.week_number, 1);
        assert_eq!(saved.deactivated, 0);
        assert_eq!(saved.workout_ids.len(), 2);

        let workouts = store.workouts_for_plan(saved.plan_id).unwrap();
        assert_eq!(workouts[0].scheduled_date, monday());
        assert_eq!(
            workouts[1].scheduled_date,
            NaiveDate::from_ymd_opt(2026, 10, 22).unwrap()
        );
        assert_eq!(workouts[1].day_of_week, 3);
        assert_eq!(workouts[1].status, WorkoutStatus::Scheduled);
        assert_eq!(workouts[1].exercises[0].reps, "10-12");

        let thursday = store
            .workout_for_date(user, NaiveDate::from_ymd_opt(2026, 10, 22).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(thursday.id, workouts[1].id);
    }

    #[test]
    fn test_second_save_leaves_one_active_plan() {
        let (store, _dir) = test_store();
        let user = store.create_user(None, None, &UserHealth::default()).unwrap();
        let plan = plan_with(&store);

        let first = store.save_weekly_plan(user, &plan, monday()).unwrap();
        let second = store
            .save_weekly_plan(user, &plan, monday() + Duration::days(7))
            .unwrap();

        assert_eq!(second.deactivated, 1);
        assert_eq!(second.week_number, first.week_number + 1);
        assert_eq!(store.count_active_plans(user).unwrap(), 1);
        let active = store.active_plan(user).unwrap().unwrap();
        assert_eq!(active.id, second.plan_id);
        assert_eq!(active.plan.days.len(), 2);
    }

    #[test]
    fn test_save_for_unknown_user() {
        let (store, _dir) = test_store();
        let plan = WeeklyPlanResult {
            split_name: "Push/Pull/Legs".into(),
            days_per_week: 3,
            days: vec![],
            generated_at: Utc::now(),
        };
        assert!(matches!(
            store.save_weekly_plan(99, &plan, monday()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_replace_workout_exercise() {
        let (store, _dir) = test_store();
        let user = store.create_user(None, None, &UserHealth::default()).unwrap();
        let plan = plan_with(&store);
        let saved = store.save_weekly_plan(user, &plan, monday()).unwrap();

        let workout = store.get_workout(saved.workout_ids[0]).unwrap().unwrap();
        let row_id = workout.exercises[0].id;
        let (row, owner) = store.workout_exercise(row_id).unwrap().unwrap();
        assert_eq!(owner, user);

        let mut diamond = exercise("diamond-push-up", "horizontal_push", &["chest"]);
        diamond.id = store.add_exercise(&diamond).unwrap();
        let updated = store.replace_workout_exercise(row_id, &diamond).unwrap();
        assert_eq!(updated.exercise_id, diamond.id);
        assert_eq!(updated.sets, row.sets);
        assert_eq!(updated.position, row.position);

        assert!(matches!(
            store.replace_workout_exercise(9999, &diamond),
            Err(Error::NotFound(_))
        ));
        assert!(store.workout_exercise(9999).unwrap().is_none());
    }

    #[test]
    fn test_insert_single_workout() {
        let (store, _dir) = test_store();
        let user = store.create_user(None, None, &UserHealth::default()).unwrap();
        let workout = store
            .insert_workout(&NewWorkout {
                user_id: user,
                plan_id: None,
                name: "Push".into(),
                split_type: SplitType::Push,
                scheduled_date: monday(),
                day_of_week: 0,
                week_number: 1,
                estimated_minutes: 0,
                exercises: vec![],
            })
            .unwrap();
        assert_eq!(workout.plan_id, None);
        assert_eq!(workout.split_type, SplitType::Push);
        assert!(workout.exercises.is_empty());
    }
}
