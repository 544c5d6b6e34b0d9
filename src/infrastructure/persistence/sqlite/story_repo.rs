//! SQLite Story Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::taxonomy_repo::{CategoryRow, TagRow, CATEGORY_COLUMNS, TAG_COLUMNS};
use super::{map_db_error, parse_time, parse_uuid, DbPool};
use crate::application::ports::{
    CategoryRecord, RepositoryError, StoryFilter, StoryRecord, StoryRepositoryPort, TagRecord,
};

/// stories 表的列（别名 s）
pub(super) const STORY_COLUMNS: &str = "s.id, s.title, s.brief, s.slug, s.user_id, s.is_published, s.has_chapters, s.is_featured, s.created_at, s.modified_at";

/// SQLite Story Repository
pub struct SqliteStoryRepository {
    pool: DbPool,
}

impl SqliteStoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
pub(super) struct StoryRow {
    id: String,
    title: String,
    brief: String,
    slug: String,
    user_id: String,
    is_published: bool,
    has_chapters: bool,
    is_featured: bool,
    created_at: String,
    modified_at: String,
}

impl TryFrom<StoryRow> for StoryRecord {
    type Error = RepositoryError;

    fn try_from(row: StoryRow) -> Result<Self, Self::Error> {
        Ok(StoryRecord {
            id: parse_uuid(&row.id)?,
            title: row.title,
            brief: row.brief,
            slug: row.slug,
            user_id: parse_uuid(&row.user_id)?,
            is_published: row.is_published,
            has_chapters: row.has_chapters,
            is_featured: row.is_featured,
            created_at: parse_time(&row.created_at)?,
            modified_at: parse_time(&row.modified_at)?,
        })
    }
}

/// 过滤条件对应的 SQL 与参数
fn filter_query(filter: &StoryFilter) -> (String, Vec<String>) {
    match filter {
        StoryFilter::Published => (
            format!(
                "SELECT {STORY_COLUMNS} FROM stories s WHERE s.is_published = 1 ORDER BY s.created_at DESC"
            ),
            vec![],
        ),
        StoryFilter::Featured => (
            format!(
                "SELECT {STORY_COLUMNS} FROM stories s WHERE s.is_published = 1 AND s.is_featured = 1 ORDER BY s.modified_at DESC"
            ),
            vec![],
        ),
        StoryFilter::ByCategory(category_id) => (
            format!(
                r#"
                SELECT {STORY_COLUMNS} FROM stories s
                JOIN story_categories sc ON sc.story_id = s.id
                WHERE sc.category_id = ? AND s.is_published = 1
                ORDER BY s.created_at DESC
                "#
            ),
            vec![category_id.to_string()],
        ),
        StoryFilter::ByTag(tag_id) => (
            format!(
                r#"
                SELECT {STORY_COLUMNS} FROM stories s
                JOIN story_tags st ON st.story_id = s.id
                WHERE st.tag_id = ? AND s.is_published = 1
                ORDER BY s.created_at DESC
                "#
            ),
            vec![tag_id.to_string()],
        ),
        StoryFilter::ByAuthor(user_id) => (
            format!(
                "SELECT {STORY_COLUMNS} FROM stories s WHERE s.user_id = ? AND s.is_published = 1 ORDER BY s.created_at DESC"
            ),
            vec![user_id.to_string()],
        ),
        StoryFilter::Owned { user_id, drafts } => (
            format!(
                "SELECT {STORY_COLUMNS} FROM stories s WHERE s.user_id = ? AND s.is_published = ? ORDER BY s.modified_at DESC"
            ),
            vec![user_id.to_string(), if *drafts { "0" } else { "1" }.to_string()],
        ),
        StoryFilter::All {
            alias_contains: None,
        } => (
            format!("SELECT {STORY_COLUMNS} FROM stories s ORDER BY s.created_at DESC"),
            vec![],
        ),
        StoryFilter::All {
            alias_contains: Some(alias),
        } => (
            format!(
                r#"
                SELECT {STORY_COLUMNS} FROM stories s
                JOIN users u ON u.id = s.user_id
                WHERE LOWER(u.alias) LIKE ?
                ORDER BY s.created_at DESC
                "#
            ),
            vec![format!("%{}%", alias.to_lowercase())],
        ),
    }
}

#[async_trait]
impl StoryRepositoryPort for SqliteStoryRepository {
    async fn save(&self, story: &StoryRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO stories (id, title, brief, slug, user_id, is_published, has_chapters, is_featured, created_at, modified_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                brief = excluded.brief,
                is_published = excluded.is_published,
                has_chapters = excluded.has_chapters,
                is_featured = excluded.is_featured,
                modified_at = excluded.modified_at
            "#,
        )
        .bind(story.id.to_string())
        .bind(&story.title)
        .bind(&story.brief)
        .bind(&story.slug)
        .bind(story.user_id.to_string())
        .bind(story.is_published)
        .bind(story.has_chapters)
        .bind(story.is_featured)
        .bind(story.created_at.to_rfc3339())
        .bind(story.modified_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoryRecord>, RepositoryError> {
        let sql = format!("SELECT {STORY_COLUMNS} FROM stories s WHERE s.id = ?");
        let row: Option<StoryRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(StoryRecord::try_from).transpose()
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM stories WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(row.is_some())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        // 使用事务确保原子性
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // 章节只通过顺序表挂在故事下，先删章节（顺序条目级联删除）
        sqlx::query(
            "DELETE FROM chapters WHERE id IN (SELECT chapter_id FROM story_chapters WHERE story_id = ?)",
        )
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        // 评论、分类/标签关联、收藏随故事级联删除
        let result = sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("story {}", id)));
        }

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    async fn find(&self, filter: &StoryFilter) -> Result<Vec<StoryRecord>, RepositoryError> {
        let (sql, params) = filter_query(filter);
        let mut query = sqlx::query_as::<_, StoryRow>(&sql);
        for param in params {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(map_db_error)?;

        rows.into_iter().map(StoryRecord::try_from).collect()
    }

    async fn search(&self, query: &str) -> Result<Vec<StoryRecord>, RepositoryError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = format!("%{}%", query.to_lowercase());

        let sql = format!(
            r#"
            SELECT DISTINCT {STORY_COLUMNS} FROM stories s
            JOIN users u ON u.id = s.user_id
            LEFT JOIN story_chapters sc ON sc.story_id = s.id
            LEFT JOIN chapters c ON c.id = sc.chapter_id
            WHERE s.is_published = 1 AND (
                LOWER(s.title) LIKE ?
                OR LOWER(s.brief) LIKE ?
                OR LOWER(c.body) LIKE ?
                OR LOWER(u.alias) LIKE ?
            )
            ORDER BY s.title ASC
            "#
        );
        let rows: Vec<StoryRow> = sqlx::query_as(&sql)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(StoryRecord::try_from).collect()
    }

    async fn set_tags(&self, story_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("DELETE FROM story_tags WHERE story_id = ?")
            .bind(story_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        for tag_id in tag_ids {
            sqlx::query(
                "INSERT INTO story_tags (story_id, tag_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
            )
            .bind(story_id.to_string())
            .bind(tag_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn set_categories(
        &self,
        story_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("DELETE FROM story_categories WHERE story_id = ?")
            .bind(story_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        for category_id in category_ids {
            sqlx::query(
                "INSERT INTO story_categories (story_id, category_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
            )
            .bind(story_id.to_string())
            .bind(category_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }

        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    async fn find_tags(&self, story_id: Uuid) -> Result<Vec<TagRecord>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {TAG_COLUMNS} FROM tags t
            JOIN story_tags st ON st.tag_id = t.id
            WHERE st.story_id = ?
            ORDER BY t.name ASC
            "#
        );
        let rows: Vec<TagRow> = sqlx::query_as(&sql)
            .bind(story_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(TagRecord::try_from).collect()
    }

    async fn find_categories(&self, story_id: Uuid) -> Result<Vec<CategoryRecord>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {CATEGORY_COLUMNS} FROM categories c
            JOIN story_categories sc ON sc.category_id = c.id
            WHERE sc.story_id = ?
            ORDER BY c.name ASC
            "#
        );
        let rows: Vec<CategoryRow> = sqlx::query_as(&sql)
            .bind(story_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(CategoryRecord::try_from).collect()
    }
}
