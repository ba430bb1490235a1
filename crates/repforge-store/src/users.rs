//! User context storage.
//!
//! Profile and preferences are written when onboarding completes. A user
//! row without them is "found but incomplete", which is a different
//! failure from a missing user.

use rusqlite::{params, OptionalExtension};

use repforge_core::{Error, Result, UserContext, UserHealth, UserPreferences, UserProfile};

use crate::sqlite::{db_err, now_millis, SqliteStore};

impl SqliteStore {
    /// Create a user. Profile and preferences may be absent until onboarding completes.
    pub fn create_user(
        &self,
        profile: Option<&UserProfile>,
        preferences: Option<&UserPreferences>,
        health: &UserHealth,
    ) -> Result<i64> {
        let profile_json = profile.map(serde_json::to_string).transpose()?;
        let preferences_json = preferences.map(serde_json::to_string).transpose()?;
        let health_json = serde_json::to_string(health)?;

        let conn = self.conn.lock();
        let id = conn
            .prepare_cached(
                "INSERT INTO users (profile_json, preferences_json, health_json, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .map_err(db_err)?
            .insert(params![profile_json, preferences_json, health_json, now_millis()])
            .map_err(db_err)?;
        Ok(id)
    }

    /// Replace a user's profile, preferences and health.
    pub fn update_user(
        &self,
        user_id: i64,
        profile: Option<&UserProfile>,
        preferences: Option<&UserPreferences>,
        health: &UserHealth,
    ) -> Result<()> {
        let profile_json = profile.map(serde_json::to_string).transpose()?;
        let preferences_json = preferences.map(serde_json::to_string).transpose()?;
        let health_json = serde_json::to_string(health)?;

        let conn = self.conn.lock();
        let count = conn
            .execute(
                "UPDATE users SET profile_json = ?1, preferences_json = ?2, health_json = ?3, \
                 updated_at = ?4 WHERE id = ?5",
                params![profile_json, preferences_json, health_json, now_millis(), user_id],
            )
            .map_err(db_err)?;
        if count == 0 {
            return Err(Error::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }

    /// Fetch everything the engine needs about a user.
    pub fn user_context(&self, user_id: i64) -> Result<UserContext> {
        let row: Option<(Option<String>, Option<String>, Option<String>)> = {
            let conn = self.conn.lock();
            let row = conn
                .prepare_cached(
                    "SELECT profile_json, preferences_json, health_json FROM users WHERE id = ?1",
                )
                .map_err(db_err)?
                .query_row(params![user_id], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })
                .optional()
                .map_err(db_err)?;
            row
        };

        let (profile_json, preferences_json, health_json) =
            row.ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;

        let profile: UserProfile = match profile_json {
            Some(json) => serde_json::from_str(&json)?,
            None => {
                return Err(Error::PreconditionFailed(format!(
                    "user {} has no profile; onboarding must be completed",
                    user_id
                )))
            }
        };
        let preferences: UserPreferences = match preferences_json {
            Some(json) => serde_json::from_str(&json)?,
            None => {
                return Err(Error::PreconditionFailed(format!(
                    "user {} has no preferences; onboarding must be completed",
                    user_id
                )))
            }
        };
        let health = health_json
            .map(|json| serde_json::from_str(&json))
            .transpose()?
            .unwrap_or_default();

        Ok(UserContext {
            user_id,
            profile,
            preferences,
            health,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::sqlite::tests::test_store;
    use repforge_core::*;

    fn profile() -> UserProfile {
        UserProfile {
            fitness_level: FitnessLevel::ModeratelyActive,
            experience_level: ExperienceLevel::Intermediate,
            primary_goal: Goal::MuscleGain,
            secondary_goal: None,
            age: Some(34),
            pushup_capacity: Some(20),
            plank_hold_seconds: Some(60),
            squat_comfort: Some(4),
        }
    }

    fn preferences() -> UserPreferences {
        UserPreferences {
            preferred_location: Location::Gym,
            available_equipment: vec!["full_gym".into()],
            days_per_week: 4,
            session_minutes: 60,
            preferred_exercise_types: vec![ExerciseType::Compound],
            rest_preference: RestPreference::Moderate,
        }
    }

    #[test]
    fn test_user_context_round_trip() {
        let (store, _dir) = test_store();
        let health = UserHealth {
            injuries: vec!["knee".into()],
            ..Default::default()
        };
        let id = store
            .create_user(Some(&profile()), Some(&preferences()), &health)
            .unwrap();
        let ctx = store.user_context(id).unwrap();
        assert_eq!(ctx.user_id, id);
        assert_eq!(ctx.profile.primary_goal, Goal::MuscleGain);
        assert_eq!(ctx.preferences.days_per_week, 4);
        assert_eq!(ctx.health.injuries, vec!["knee".to_string()]);
    }

    #[test]
    fn test_missing_user_is_not_found() {
        let (store, _dir) = test_store();
        assert!(matches!(store.user_context(42), Err(Error::NotFound(_))));
        assert!(matches!(
            store.update_user(42, None, None, &UserHealth::default()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_incomplete_onboarding_is_precondition_failure() {
        let (store, _dir) = test_store();
        let id = store
            .create_user(Some(&profile()), None, &UserHealth::default())
            .unwrap();
        assert!(matches!(
            store.user_context(id),
            Err(Error::PreconditionFailed(_))
        ));

        store
            .update_user(id, Some(&profile()), Some(&preferences()), &UserHealth::default())
            .unwrap();
        assert!(store.user_context(id).is_ok());
    }
}
