//! SQLite Chapter Repository
//!
//! 章节内容。位置读取自 story_chapters，写入由顺序引擎负责。

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::{map_db_error, parse_time, parse_uuid, DbPool};
use crate::application::ports::{
    ChapterRecord, ChapterRepositoryPort, ChapterSummaryRecord, RepositoryError,
};

/// SQLite Chapter Repository
pub struct SqliteChapterRepository {
    pool: DbPool,
}

impl SqliteChapterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ChapterRow {
    id: String,
    title: String,
    body: String,
    user_id: String,
    created_at: String,
    modified_at: String,
}

impl TryFrom<ChapterRow> for ChapterRecord {
    type Error = RepositoryError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        Ok(ChapterRecord {
            id: parse_uuid(&row.id)?,
            title: row.title,
            body: row.body,
            user_id: parse_uuid(&row.user_id)?,
            created_at: parse_time(&row.created_at)?,
            modified_at: parse_time(&row.modified_at)?,
        })
    }
}

#[derive(FromRow)]
struct ChapterSummaryRow {
    id: String,
    title: String,
    chapter_order: i64,
    modified_at: String,
}

impl TryFrom<ChapterSummaryRow> for ChapterSummaryRecord {
    type Error = RepositoryError;

    fn try_from(row: ChapterSummaryRow) -> Result<Self, Self::Error> {
        Ok(ChapterSummaryRecord {
            id: parse_uuid(&row.id)?,
            title: row.title,
            order: row.chapter_order,
            modified_at: parse_time(&row.modified_at)?,
        })
    }
}

#[async_trait]
impl ChapterRepositoryPort for SqliteChapterRepository {
    async fn save(&self, chapter: &ChapterRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO chapters (id, title, body, user_id, created_at, modified_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                modified_at = excluded.modified_at
            "#,
        )
        .bind(chapter.id.to_string())
        .bind(&chapter.title)
        .bind(&chapter.body)
        .bind(chapter.user_id.to_string())
        .bind(chapter.created_at.to_rfc3339())
        .bind(chapter.modified_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> = sqlx::query_as(
            "SELECT id, title, body, user_id, created_at, modified_at FROM chapters WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(ChapterRecord::try_from).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM chapters WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    async fn find_summaries_by_story(
        &self,
        story_id: Uuid,
    ) -> Result<Vec<ChapterSummaryRecord>, RepositoryError> {
        let rows: Vec<ChapterSummaryRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.title, sc.chapter_order, c.modified_at
            FROM story_chapters sc
            JOIN chapters c ON c.id = sc.chapter_id
            WHERE sc.story_id = ?
            ORDER BY sc.chapter_order ASC
            "#,
        )
        .bind(story_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.into_iter().map(ChapterSummaryRecord::try_from).collect()
    }

    async fn find_first_by_story(
        &self,
        story_id: Uuid,
    ) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> = sqlx::query_as(
            r#"
            SELECT c.id, c.title, c.body, c.user_id, c.created_at, c.modified_at
            FROM story_chapters sc
            JOIN chapters c ON c.id = sc.chapter_id
            WHERE sc.story_id = ?
            ORDER BY sc.chapter_order ASC
            LIMIT 1
            "#,
        )
        .bind(story_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.map(ChapterRecord::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::test_support::{
        seed_story, seed_user, setup_pool,
    };
    use chrono::Utc;

    fn chapter(user_id: Uuid, title: &str, body: &str) -> ChapterRecord {
        let now = Utc::now();
        ChapterRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            body: body.to_string(),
            user_id,
            created_at: now,
            modified_at: now,
        }
    }

    #[tokio::test]
    async fn test_save_update_delete() {
        let pool = setup_pool().await;
        let user = seed_user(&pool, "writer").await;
        let repo = SqliteChapterRepository::new(pool);

        let mut record = chapter(user, "One", "Once upon a time");
        repo.save(&record).await.unwrap();

        record.body = "It was a dark night".to_string();
        repo.save(&record).await.unwrap();
        let found = repo.find_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(found.body, "It was a dark night");

        repo.delete(record.id).await.unwrap();
        assert!(repo.find_by_id(record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summaries_follow_order() {
        let pool = setup_pool().await;
        let user = seed_user(&pool, "writer").await;
        let story = seed_story(&pool, user, "tale").await;
        let repo = SqliteChapterRepository::new(pool.clone());

        let first = chapter(user, "First", "aaa");
        let second = chapter(user, "Second", "bbb");
        repo.save(&first).await.unwrap();
        repo.save(&second).await.unwrap();
        for (chapter_id, order) in [(second.id, 1), (first.id, 0)] {
            sqlx::query(
                "INSERT INTO story_chapters (story_id, chapter_id, chapter_order) VALUES (?, ?, ?)",
            )
            .bind(story.to_string())
            .bind(chapter_id.to_string())
            .bind(order)
            .execute(&pool)
            .await
            .unwrap();
        }

        let toc = repo.find_summaries_by_story(story).await.unwrap();
        let titles: Vec<&str> = toc.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(toc[1].order, 1);

        let head = repo.find_first_by_story(story).await.unwrap().unwrap();
        assert_eq!(head.id, first.id);
        assert!(repo
            .find_first_by_story(Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }
}
