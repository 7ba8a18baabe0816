use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{Preferences, Role, User, UserRow};

const USER_COLUMNS: &str = "id, username, password_hash, role, menu_type, number_of_people, \
                            is_active, password_changed_at, created_at";

fn into_user(row: Option<UserRow>) -> anyhow::Result<Option<User>> {
    row.map(User::try_from).transpose()
}

impl User {
    /// Find a user by username.
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await
        .context("find user by username")?;
        into_user(row)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        into_user(row)
    }

    /// Create a new user with a hashed password.
    pub async fn create(
        db: &PgPool,
        username: &str,
        password_hash: &str,
        role: Role,
        prefs: Preferences,
    ) -> Result<User, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, password_hash, role, menu_type, number_of_people)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(prefs.menu_type.map(|t| t.as_str()))
        .bind(prefs.number_of_people.map(|h| i16::from(h.get())))
        .fetch_one(db)
        .await?;
        User::try_from(row).map_err(|e| sqlx::Error::Decode(e.into()))
    }

    pub async fn update_preferences(
        db: &PgPool,
        id: Uuid,
        prefs: Preferences,
    ) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET menu_type = $2, number_of_people = $3
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(prefs.menu_type.map(|t| t.as_str()))
        .bind(prefs.number_of_people.map(|h| i16::from(h.get())))
        .fetch_one(db)
        .await
        .context("update preferences")?;
        User::try_from(row)
    }

    /// Store a new hash and stamp the change so older tokens stop working.
    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
               SET password_hash = $2, password_changed_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await
        .context("update password")?;
        Ok(())
    }

    pub async fn deactivate(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("deactivate user")?;
        Ok(())
    }
}
