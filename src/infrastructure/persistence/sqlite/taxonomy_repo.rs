//! SQLite Category / Tag Repositories

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::{map_db_error, parse_time, parse_uuid, DbPool};
use crate::application::ports::{
    CategoryRecord, CategoryRepositoryPort, RepositoryError, TagRecord, TagRepositoryPort,
};

/// categories 表的列（别名 c）
pub(super) const CATEGORY_COLUMNS: &str =
    "c.id, c.name, c.description, c.parent_id, c.user_id, c.created_at, c.modified_at";

/// tags 表的列（别名 t）
pub(super) const TAG_COLUMNS: &str = "t.id, t.name, t.user_id, t.created_at";

/// `IN (...)` 的占位符
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

// ============================================================================
// Category
// ============================================================================

/// SQLite Category Repository
pub struct SqliteCategoryRepository {
    pool: DbPool,
}

impl SqliteCategoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
pub(super) struct CategoryRow {
    id: String,
    name: String,
    description: Option<String>,
    parent_id: Option<String>,
    user_id: Option<String>,
    created_at: String,
    modified_at: String,
}

impl TryFrom<CategoryRow> for CategoryRecord {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(CategoryRecord {
            id: parse_uuid(&row.id)?,
            name: row.name,
            description: row.description,
            parent_id: row.parent_id.as_deref().map(parse_uuid).transpose()?,
            user_id: row.user_id.as_deref().map(parse_uuid).transpose()?,
            created_at: parse_time(&row.created_at)?,
            modified_at: parse_time(&row.modified_at)?,
        })
    }
}

#[async_trait]
impl CategoryRepositoryPort for SqliteCategoryRepository {
    async fn save(&self, category: &CategoryRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, parent_id, user_id, created_at, modified_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                parent_id = excluded.parent_id,
                modified_at = excluded.modified_at
            "#,
        )
        .bind(category.id.to_string())
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.parent_id.map(|id| id.to_string()))
        .bind(category.user_id.map(|id| id.to_string()))
        .bind(category.created_at.to_rfc3339())
        .bind(category.modified_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories c WHERE c.id = ?");
        let row: Option<CategoryRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(CategoryRecord::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<CategoryRecord>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories c WHERE c.name = ?");
        let row: Option<CategoryRow> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(CategoryRecord::try_from).transpose()
    }

    async fn find_all(&self) -> Result<Vec<CategoryRecord>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories c ORDER BY c.name ASC");
        let rows: Vec<CategoryRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(CategoryRecord::try_from).collect()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CategoryRecord>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories c WHERE c.id IN ({}) ORDER BY c.name ASC",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, CategoryRow>(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(map_db_error)?;

        rows.into_iter().map(CategoryRecord::try_from).collect()
    }
}

// ============================================================================
// Tag
// ============================================================================

/// SQLite Tag Repository
pub struct SqliteTagRepository {
    pool: DbPool,
}

impl SqliteTagRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
pub(super) struct TagRow {
    id: String,
    name: String,
    user_id: Option<String>,
    created_at: String,
}

impl TryFrom<TagRow> for TagRecord {
    type Error = RepositoryError;

    fn try_from(row: TagRow) -> Result<Self, Self::Error> {
        Ok(TagRecord {
            id: parse_uuid(&row.id)?,
            name: row.name,
            user_id: row.user_id.as_deref().map(parse_uuid).transpose()?,
            created_at: parse_time(&row.created_at)?,
        })
    }
}

#[async_trait]
impl TagRepositoryPort for SqliteTagRepository {
    async fn save(&self, tag: &TagRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO tags (id, name, user_id, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(tag.id.to_string())
        .bind(&tag.name)
        .bind(tag.user_id.map(|id| id.to_string()))
        .bind(tag.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TagRecord>, RepositoryError> {
        let sql = format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.id = ?");
        let row: Option<TagRow> = sqlx::query_as(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(TagRecord::try_from).transpose()
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<TagRecord>, RepositoryError> {
        // name 列是 COLLATE NOCASE
        let sql = format!("SELECT {TAG_COLUMNS} FROM tags t WHERE t.name = ?");
        let row: Option<TagRow> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(TagRecord::try_from).transpose()
    }

    async fn search(&self, query: Option<&str>) -> Result<Vec<TagRecord>, RepositoryError> {
        let rows: Vec<TagRow> = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let sql = format!(
                    "SELECT {TAG_COLUMNS} FROM tags t WHERE LOWER(t.name) LIKE ? ORDER BY t.name ASC"
                );
                sqlx::query_as(&sql)
                    .bind(format!("%{}%", q.to_lowercase()))
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!("SELECT {TAG_COLUMNS} FROM tags t ORDER BY t.name ASC");
                sqlx::query_as(&sql).fetch_all(&self.pool).await
            }
        }
        .map_err(map_db_error)?;

        rows.into_iter().map(TagRecord::try_from).collect()
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<TagRecord>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {TAG_COLUMNS} FROM tags t WHERE t.id IN ({}) ORDER BY t.name ASC",
            placeholders(ids.len())
        );
        let mut query = sqlx::query_as::<_, TagRow>(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(map_db_error)?;

        rows.into_iter().map(TagRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::test_support::setup_pool;
    use chrono::Utc;

    fn category(name: &str, parent_id: Option<Uuid>) -> CategoryRecord {
        let now = Utc::now();
        CategoryRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            parent_id,
            user_id: None,
            created_at: now,
            modified_at: now,
        }
    }

    fn tag(name: &str) -> TagRecord {
        TagRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            user_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_category_save_and_find() {
        let pool = setup_pool().await;
        let repo = SqliteCategoryRepository::new(pool);

        let fantasy = category("Fantasy", None);
        let mut epic = category("Epic", Some(fantasy.id));
        repo.save(&fantasy).await.unwrap();
        repo.save(&epic).await.unwrap();

        let found = repo.find_by_id(epic.id).await.unwrap().unwrap();
        assert_eq!(found.parent_id, Some(fantasy.id));
        assert!(repo.find_by_name("Fantasy").await.unwrap().is_some());

        epic.description = Some("long tales".to_string());
        repo.save(&epic).await.unwrap();
        let found = repo.find_by_id(epic.id).await.unwrap().unwrap();
        assert_eq!(found.description.as_deref(), Some("long tales"));

        let all = repo.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Epic");
    }

    #[tokio::test]
    async fn test_category_find_by_ids_ignores_unknown() {
        let pool = setup_pool().await;
        let repo = SqliteCategoryRepository::new(pool);
        let horror = category("Horror", None);
        repo.save(&horror).await.unwrap();

        let found = repo.find_by_ids(&[horror.id, Uuid::new_v4()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_category_name() {
        let pool = setup_pool().await;
        let repo = SqliteCategoryRepository::new(pool);

        repo.save(&category("Horror", None)).await.unwrap();
        let err = repo.save(&category("Horror", None)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_tag_name_case_insensitive() {
        let pool = setup_pool().await;
        let repo = SqliteTagRepository::new(pool);
        let dragons = tag("Dragons");
        repo.save(&dragons).await.unwrap();

        let found = repo.find_by_name("dRAGONS").await.unwrap().unwrap();
        assert_eq!(found.id, dragons.id);

        let err = repo.save(&tag("DRAGONS")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_tag_search() {
        let pool = setup_pool().await;
        let repo = SqliteTagRepository::new(pool);
        for name in ["dragons", "dragonflies", "elves"] {
            repo.save(&tag(name)).await.unwrap();
        }

        assert_eq!(repo.search(Some("DRAGON")).await.unwrap().len(), 2);
        assert_eq!(repo.search(None).await.unwrap().len(), 3);
        assert_eq!(repo.search(Some("  ")).await.unwrap().len(), 3);
    }
}
