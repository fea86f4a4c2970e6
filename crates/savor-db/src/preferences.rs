use crate::Database;
use crate::models::{ANONYMOUS, Author, InitOutcome, parse_timestamp};
use crate::queries::ensure_author;
use anyhow::Result;
use rusqlite::{OptionalExtension, Row, TransactionBehavior, params};
use savor_types::api::SavePreferencesRequest;
use savor_types::models::UserPreferences;
use tracing::{info, warn};

const PREFERENCE_COLUMNS: &str = "user_id, diet_type, other_diet, allergies, other_allergy,
    disliked_ingredients, goal, other_goal, preferred_cuisines, other_cuisine, status, updated_at";

/// Initial onboarding status for a freshly created user.
pub const STATUS_INACTIVE: &str = "inactive";

impl Database {
    pub fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {PREFERENCE_COLUMNS} FROM user_preferences WHERE user_id = ?1"
            );
            let row = conn
                .query_row(&sql, [user_id], preferences_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Replace a user's preferences wholesale, creating the user if needed.
    pub fn save_preferences(
        &self,
        author: &Author,
        prefs: &SavePreferencesRequest,
    ) -> Result<UserPreferences> {
        let allergies = serde_json::to_string(&prefs.allergies)?;
        let disliked = serde_json::to_string(&prefs.disliked_ingredients)?;
        let cuisines = serde_json::to_string(&prefs.preferred_cuisines)?;

        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            ensure_author(&tx, author)?;

            let saved = tx.query_row(
                &format!(
                    "INSERT INTO user_preferences (
                        user_id, diet_type, other_diet, allergies, other_allergy,
                        disliked_ingredients, goal, other_goal, preferred_cuisines,
                        other_cuisine, status
                     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                     ON CONFLICT (user_id) DO UPDATE SET
                        diet_type = excluded.diet_type,
                        other_diet = excluded.other_diet,
                        allergies = excluded.allergies,
                        other_allergy = excluded.other_allergy,
                        disliked_ingredients = excluded.disliked_ingredients,
                        goal = excluded.goal,
                        other_goal = excluded.other_goal,
                        preferred_cuisines = excluded.preferred_cuisines,
                        other_cuisine = excluded.other_cuisine,
                        status = excluded.status,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     RETURNING {PREFERENCE_COLUMNS}"
                ),
                params![
                    author.id,
                    prefs.diet_type,
                    prefs.other_diet,
                    allergies,
                    prefs.other_allergy,
                    disliked,
                    prefs.goal,
                    prefs.other_goal,
                    cuisines,
                    prefs.other_cuisine,
                    prefs.status,
                ],
                preferences_from_row,
            )?;

            tx.commit()?;
            Ok(saved)
        })
    }

    /// First-login setup: create the user and an inactive preference row.
    /// Existing users are left untouched.
    pub fn initialize_user(
        &self,
        user_id: &str,
        name: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<InitOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
                [user_id],
                |row| row.get(0),
            )?;
            if exists {
                return Ok(InitOutcome::AlreadyInitialized);
            }

            tx.execute(
                "INSERT INTO users (id, name, avatar) VALUES (?1, ?2, ?3)",
                params![user_id, name.unwrap_or(ANONYMOUS), avatar],
            )?;
            tx.execute(
                "INSERT INTO user_preferences (user_id, status) VALUES (?1, ?2)
                 ON CONFLICT (user_id) DO NOTHING",
                params![user_id, STATUS_INACTIVE],
            )?;

            tx.commit()?;
            info!("Initialized user {}", user_id);
            Ok(InitOutcome::Created)
        })
    }
}

fn preferences_from_row(row: &Row<'_>) -> rusqlite::Result<UserPreferences> {
    let user_id: String = row.get(0)?;
    let list = |idx: usize| -> rusqlite::Result<Vec<String>> {
        let raw: String = row.get(idx)?;
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Corrupt list in column {} for user '{}': {}", idx, user_id, e);
            Vec::new()
        }))
    };

    Ok(UserPreferences {
        diet_type: row.get(1)?,
        other_diet: row.get(2)?,
        allergies: list(3)?,
        other_allergy: row.get(4)?,
        disliked_ingredients: list(5)?,
        goal: row.get(6)?,
        other_goal: row.get(7)?,
        preferred_cuisines: list(8)?,
        other_cuisine: row.get(9)?,
        status: row.get(10)?,
        updated_at: parse_timestamp(&row.get::<_, String>(11)?),
        user_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(id: &str) -> Author {
        Author {
            id: id.to_string(),
            name: None,
            avatar: None,
        }
    }

    fn vegan() -> SavePreferencesRequest {
        SavePreferencesRequest {
            diet_type: Some("vegan".into()),
            allergies: vec!["peanuts".into(), "shellfish".into()],
            preferred_cuisines: vec!["thai".into()],
            status: Some("active".into()),
            ..Default::default()
        }
    }

    #[test]
    fn initialize_creates_user_and_inactive_preferences() {
        let db = Database::open_in_memory().unwrap();

        let avatar = Some("https://img/u1.png");
        let outcome = db.initialize_user("u1", None, avatar).unwrap();
        assert_eq!(outcome, InitOutcome::Created);

        let user = db.get_user("u1").unwrap().unwrap();
        assert_eq!(user.name, ANONYMOUS);

        let prefs = db.get_preferences("u1").unwrap().unwrap();
        assert_eq!(prefs.status.as_deref(), Some(STATUS_INACTIVE));
        assert!(prefs.allergies.is_empty());

        let again = db.initialize_user("u1", Some("Ada"), None).unwrap();
        assert_eq!(again, InitOutcome::AlreadyInitialized);
        assert_eq!(db.get_user("u1").unwrap().unwrap().name, ANONYMOUS);
    }

    #[test]
    fn save_overwrites_previous_answers() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_user("u1", "Ada", None).unwrap();

        let saved = db.save_preferences(&author("u1"), &vegan()).unwrap();
        assert_eq!(saved.diet_type.as_deref(), Some("vegan"));
        assert_eq!(saved.allergies, vec!["peanuts", "shellfish"]);

        let keto = SavePreferencesRequest {
            diet_type: Some("keto".into()),
            ..Default::default()
        };
        let saved = db.save_preferences(&author("u1"), &keto).unwrap();
        assert_eq!(saved.diet_type.as_deref(), Some("keto"));
        assert!(saved.allergies.is_empty());
        assert_eq!(saved.status, None);

        assert_eq!(db.get_preferences("u1").unwrap().unwrap(), saved);
        assert_eq!(db.get_user("u1").unwrap().unwrap().name, "Ada");
    }

    #[test]
    fn missing_preferences_are_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_preferences("nobody").unwrap().is_none());
    }

    #[test]
    fn save_creates_unknown_user() {
        let db = Database::open_in_memory().unwrap();
        db.save_preferences(&author("new"), &vegan()).unwrap();
        assert_eq!(db.get_user("new").unwrap().unwrap().name, ANONYMOUS);
    }
}
