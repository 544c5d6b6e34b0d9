//! SQLite Comment Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::{map_db_error, parse_time, parse_uuid, DbPool};
use crate::application::ports::{CommentRecord, CommentRepositoryPort, RepositoryError};

/// SQLite Comment Repository
pub struct SqliteCommentRepository {
    pool: DbPool,
}

impl SqliteCommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct CommentRow {
    id: String,
    story_id: String,
    user_id: String,
    body: String,
    created_at: String,
    modified_at: String,
}

impl TryFrom<CommentRow> for CommentRecord {
    type Error = RepositoryError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(CommentRecord {
            id: parse_uuid(&row.id)?,
            story_id: parse_uuid(&row.story_id)?,
            user_id: parse_uuid(&row.user_id)?,
            body: row.body,
            created_at: parse_time(&row.created_at)?,
            modified_at: parse_time(&row.modified_at)?,
        })
    }
}

const COMMENT_COLUMNS: &str = "id, story_id, user_id, body, created_at, modified_at";

#[async_trait]
impl CommentRepositoryPort for SqliteCommentRepository {
    async fn save(&self, comment: &CommentRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, story_id, user_id, body, created_at, modified_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                body = excluded.body,
                modified_at = excluded.modified_at
            "#,
        )
        .bind(comment.id.to_string())
        .bind(comment.story_id.to_string())
        .bind(comment.user_id.to_string())
        .bind(&comment.body)
        .bind(comment.created_at.to_rfc3339())
        .bind(comment.modified_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, RepositoryError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?");
        let row: Option<CommentRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(CommentRecord::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    async fn find_by_story(&self, story_id: Uuid) -> Result<Vec<CommentRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE story_id = ? ORDER BY created_at ASC"
        );
        let rows: Vec<CommentRow> = sqlx::query_as(&sql)
            .bind(story_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(CommentRecord::try_from).collect()
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<CommentRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE user_id = ? ORDER BY created_at DESC"
        );
        let rows: Vec<CommentRow> = sqlx::query_as(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(CommentRecord::try_from).collect()
    }

    async fn find_all(&self) -> Result<Vec<CommentRecord>, RepositoryError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments ORDER BY created_at DESC");
        let rows: Vec<CommentRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(CommentRecord::try_from).collect()
    }
}
