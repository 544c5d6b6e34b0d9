//! SQLite Persistence - SQLite 数据库持久化实现

mod chapter_repo;
mod comment_repo;
mod database;
mod ordering_store;
mod story_repo;
mod taxonomy_repo;
mod user_repo;

pub use chapter_repo::*;
pub use comment_repo::*;
pub use database::*;
pub use ordering_store::*;
pub use story_repo::*;
pub use taxonomy_repo::*;
pub use user_repo::*;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::application::ports::RepositoryError;

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(value).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

pub(crate) fn parse_time(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
        .with_timezone(&Utc))
}

/// 测试用的建库与造数
#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{create_pool, run_migrations, DatabaseConfig, DbPool};

    pub async fn setup_pool() -> DbPool {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    pub async fn seed_user(pool: &DbPool, username: &str) -> Uuid {
        seed_user_with_role(pool, username, "author").await
    }

    pub async fn seed_user_with_role(pool: &DbPool, username: &str, role: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, username, alias, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(username)
        .bind(username)
        .bind(role)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .unwrap();
        id
    }

    pub async fn seed_story(pool: &DbPool, user_id: Uuid, slug: &str) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO stories (id, title, brief, slug, user_id, created_at, modified_at)
            VALUES (?, ?, '', ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(slug)
        .bind(slug)
        .bind(user_id.to_string())
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();
        id
    }

    pub async fn seed_chapter(pool: &DbPool, user_id: Uuid, title: &str) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO chapters (id, title, body, user_id, created_at, modified_at)
            VALUES (?, ?, '', ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(title)
        .bind(user_id.to_string())
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();
        id
    }
}
