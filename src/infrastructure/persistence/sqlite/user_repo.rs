//! SQLite User Repository
//!
//! 用户与收藏故事

use async_trait::async_trait;
use chrono::Utc;
use sqlx::FromRow;
use uuid::Uuid;

use super::story_repo::{StoryRow, STORY_COLUMNS};
use super::{map_db_error, parse_time, parse_uuid, DbPool};
use crate::application::ports::{
    AuthorRecord, RepositoryError, StoryRecord, UserRecord, UserRepositoryPort,
};
use crate::domain::Role;

/// SQLite User Repository
pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: String,
    username: String,
    alias: String,
    role: String,
    created_at: String,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(UserRecord {
            id: parse_uuid(&row.id)?,
            username: row.username,
            alias: row.alias,
            role: Role::from_str(&row.role).unwrap_or_default(),
            created_at: parse_time(&row.created_at)?,
        })
    }
}

#[derive(FromRow)]
struct AuthorRow {
    id: String,
    username: String,
    alias: String,
    role: String,
    created_at: String,
    story_count: i64,
}

#[async_trait]
impl UserRepositoryPort for SqliteUserRepository {
    async fn save(&self, user: &UserRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, alias, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                alias = excluded.alias,
                role = excluded.role
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.alias)
        .bind(user.role.as_str())
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, alias, role, created_at FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, alias, role, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    async fn search_authors(&self, alias: &str) -> Result<Vec<AuthorRecord>, RepositoryError> {
        let pattern = format!("%{}%", alias.to_lowercase());
        let rows: Vec<AuthorRow> = sqlx::query_as(
            r#"
            SELECT u.id, u.username, u.alias, u.role, u.created_at, COUNT(s.id) AS story_count
            FROM users u
            JOIN stories s ON s.user_id = u.id
            WHERE LOWER(u.alias) LIKE ?
            GROUP BY u.id
            ORDER BY u.alias ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter()
            .map(|row| {
                let story_count = row.story_count as usize;
                let user = UserRecord::try_from(UserRow {
                    id: row.id,
                    username: row.username,
                    alias: row.alias,
                    role: row.role,
                    created_at: row.created_at,
                })?;
                Ok(AuthorRecord { user, story_count })
            })
            .collect()
    }

    async fn add_saved_story(&self, user_id: Uuid, story_id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO saved_stories (user_id, story_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, story_id) DO NOTHING
            "#,
        )
        .bind(user_id.to_string())
        .bind(story_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn remove_saved_story(
        &self,
        user_id: Uuid,
        story_id: Uuid,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM saved_stories WHERE user_id = ? AND story_id = ?")
            .bind(user_id.to_string())
            .bind(story_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_saved_stories(&self, user_id: Uuid) -> Result<Vec<StoryRecord>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {STORY_COLUMNS} FROM stories s
            JOIN saved_stories ss ON ss.story_id = s.id
            WHERE ss.user_id = ?
            ORDER BY ss.created_at DESC
            "#
        );
        let rows: Vec<StoryRow> = sqlx::query_as(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(StoryRecord::try_from).collect()
    }
}
