//! SQLite Ordering Store
//!
//! story_chapters 表。写操作在 [`SqliteOrderingUnitOfWork`] 持有的事务中执行，
//! 事务未提交即被 drop 时由 sqlx 自动回滚。

use async_trait::async_trait;
use sqlx::{FromRow, Sqlite, Transaction};
use uuid::Uuid;

use super::{map_db_error, DbPool};
use crate::application::ports::{
    OrderingEntryRecord, OrderingStorePort, OrderingUnitOfWork, RepositoryError,
};
use crate::domain::story::ShiftRange;

/// SQLite Ordering Store
pub struct SqliteOrderingStore {
    pool: DbPool,
}

impl SqliteOrderingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct OrderingRow {
    story_id: String,
    chapter_id: String,
    chapter_order: i64,
}

impl TryFrom<OrderingRow> for OrderingEntryRecord {
    type Error = RepositoryError;

    fn try_from(row: OrderingRow) -> Result<Self, Self::Error> {
        Ok(OrderingEntryRecord {
            story_id: Uuid::parse_str(&row.story_id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            chapter_id: Uuid::parse_str(&row.chapter_id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            order: row.chapter_order,
        })
    }
}

const SELECT_BY_CHAPTER: &str =
    "SELECT story_id, chapter_id, chapter_order FROM story_chapters WHERE chapter_id = ?";

/// 不改任何行的写语句，只用于让事务立即持有写锁
const CLAIM_WRITE_LOCK: &str =
    "UPDATE story_chapters SET chapter_order = chapter_order WHERE 0";

const SELECT_BY_STORY: &str = "SELECT story_id, chapter_id, chapter_order FROM story_chapters WHERE story_id = ? ORDER BY chapter_order ASC";

#[async_trait]
impl OrderingStorePort for SqliteOrderingStore {
    async fn begin(&self) -> Result<Box<dyn OrderingUnitOfWork>, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        // 在第一次读之前拿到写锁，等价于 BEGIN IMMEDIATE；
        // 写者之间由 busy_timeout 排队，不会出现读锁升级失败
        sqlx::query(CLAIM_WRITE_LOCK)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        Ok(Box::new(SqliteOrderingUnitOfWork { tx }))
    }

    async fn get_by_chapter(
        &self,
        chapter_id: Uuid,
    ) -> Result<Option<OrderingEntryRecord>, RepositoryError> {
        let row: Option<OrderingRow> = sqlx::query_as(SELECT_BY_CHAPTER)
            .bind(chapter_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(OrderingEntryRecord::try_from).transpose()
    }

    async fn list_by_story(
        &self,
        story_id: Uuid,
    ) -> Result<Vec<OrderingEntryRecord>, RepositoryError> {
        let rows: Vec<OrderingRow> = sqlx::query_as(SELECT_BY_STORY)
            .bind(story_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(OrderingEntryRecord::try_from).collect()
    }
}

/// 一次顺序写操作的事务
pub struct SqliteOrderingUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl OrderingUnitOfWork for SqliteOrderingUnitOfWork {
    async fn story_exists(&mut self, story_id: Uuid) -> Result<bool, RepositoryError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM stories WHERE id = ?")
            .bind(story_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        Ok(row.is_some())
    }

    async fn chapter_exists(&mut self, chapter_id: Uuid) -> Result<bool, RepositoryError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM chapters WHERE id = ?")
            .bind(chapter_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;
        Ok(row.is_some())
    }

    async fn get_by_chapter(
        &mut self,
        chapter_id: Uuid,
    ) -> Result<Option<OrderingEntryRecord>, RepositoryError> {
        let row: Option<OrderingRow> = sqlx::query_as(SELECT_BY_CHAPTER)
            .bind(chapter_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        row.map(OrderingEntryRecord::try_from).transpose()
    }

    async fn count_by_story(&mut self, story_id: Uuid) -> Result<i64, RepositoryError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM story_chapters WHERE story_id = ?")
                .bind(story_id.to_string())
                .fetch_one(&mut *self.tx)
                .await
                .map_err(map_db_error)?;
        Ok(count)
    }

    async fn list_by_story(
        &mut self,
        story_id: Uuid,
    ) -> Result<Vec<OrderingEntryRecord>, RepositoryError> {
        let rows: Vec<OrderingRow> = sqlx::query_as(SELECT_BY_STORY)
            .bind(story_id.to_string())
            .fetch_all(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        rows.into_iter().map(OrderingEntryRecord::try_from).collect()
    }

    async fn shift(&mut self, story_id: Uuid, range: ShiftRange) -> Result<u64, RepositoryError> {
        let result = match range.to {
            Some(to) => sqlx::query(
                r#"
                UPDATE story_chapters SET chapter_order = chapter_order + ?
                WHERE story_id = ? AND chapter_order >= ? AND chapter_order <= ?
                "#,
            )
            .bind(range.delta)
            .bind(story_id.to_string())
            .bind(range.from)
            .bind(to)
            .execute(&mut *self.tx)
            .await,
            None => sqlx::query(
                r#"
                UPDATE story_chapters SET chapter_order = chapter_order + ?
                WHERE story_id = ? AND chapter_order >= ?
                "#,
            )
            .bind(range.delta)
            .bind(story_id.to_string())
            .bind(range.from)
            .execute(&mut *self.tx)
            .await,
        }
        .map_err(map_db_error)?;

        tracing::debug!(
            story_id = %story_id,
            from = range.from,
            to = ?range.to,
            delta = range.delta,
            rows = result.rows_affected(),
            "Shifted chapter orders"
        );

        Ok(result.rows_affected())
    }

    async fn create(&mut self, entry: &OrderingEntryRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO story_chapters (story_id, chapter_id, chapter_order) VALUES (?, ?, ?)",
        )
        .bind(entry.story_id.to_string())
        .bind(entry.chapter_id.to_string())
        .bind(entry.order)
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    async fn set_order(&mut self, entry: &OrderingEntryRecord) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE story_chapters SET chapter_order = ? WHERE story_id = ? AND chapter_id = ?",
        )
        .bind(entry.order)
        .bind(entry.story_id.to_string())
        .bind(entry.chapter_id.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "ordering entry {}/{}",
                entry.story_id, entry.chapter_id
            )));
        }
        Ok(())
    }

    async fn delete(&mut self, entry: &OrderingEntryRecord) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM story_chapters WHERE story_id = ? AND chapter_id = ?")
                .bind(entry.story_id.to_string())
                .bind(entry.chapter_id.to_string())
                .execute(&mut *self.tx)
                .await
                .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "ordering entry {}/{}",
                entry.story_id, entry.chapter_id
            )));
        }
        Ok(())
    }

    async fn delete_chapter(&mut self, chapter_id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chapters WHERE id = ?")
            .bind(chapter_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("chapter {}", chapter_id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await.map_err(map_db_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::test_support::{
        seed_chapter, seed_story, seed_user, setup_pool,
    };

    async fn seeded(n: usize) -> (DbPool, SqliteOrderingStore, Uuid, Vec<Uuid>) {
        let pool = setup_pool().await;
        let user = seed_user(&pool, "writer").await;
        let story = seed_story(&pool, user, "tale").await;
        let store = SqliteOrderingStore::new(pool.clone());

        let mut chapters = Vec::new();
        for i in 0..n {
            chapters.push(seed_chapter(&pool, user, &format!("ch{}", i)).await);
        }

        // 内存库只有一个连接，事务期间不能再用 pool
        let mut uow = store.begin().await.unwrap();
        for (i, chapter) in chapters.iter().enumerate() {
            uow.create(&OrderingEntryRecord {
                story_id: story,
                chapter_id: *chapter,
                order: i as i64,
            })
            .await
            .unwrap();
        }
        uow.commit().await.unwrap();

        (pool, store, story, chapters)
    }

    async fn orders(store: &SqliteOrderingStore, story: Uuid) -> Vec<(Uuid, i64)> {
        store
            .list_by_story(story)
            .await
            .unwrap()
            .into_iter()
            .map(|e| (e.chapter_id, e.order))
            .collect()
    }

    #[tokio::test]
    async fn test_list_sorted_and_get_by_chapter() {
        let (_pool, store, story, chapters) = seeded(3).await;

        let entries = store.list_by_story(story).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].chapter_id, chapters[2]);

        let entry = store.get_by_chapter(chapters[1]).await.unwrap().unwrap();
        assert_eq!(entry.order, 1);
        assert!(store.get_by_chapter(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_shift_open_and_bounded() {
        let (_pool, store, story, chapters) = seeded(4).await;

        let mut uow = store.begin().await.unwrap();
        let moved = uow
            .shift(
                story,
                ShiftRange {
                    from: 1,
                    to: Some(2),
                    delta: 1,
                },
            )
            .await
            .unwrap();
        assert_eq!(moved, 2);
        uow.commit().await.unwrap();

        assert_eq!(
            orders(&store, story).await,
            vec![
                (chapters[0], 0),
                (chapters[1], 2),
                (chapters[2], 3),
                (chapters[3], 3)
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_rolls_back() {
        let (_pool, store, story, chapters) = seeded(2).await;
        let before = orders(&store, story).await;

        {
            let mut uow = store.begin().await.unwrap();
            uow.shift(story, ShiftRange::open_slot_at(0)).await.unwrap();
            uow.delete(&OrderingEntryRecord {
                story_id: story,
                chapter_id: chapters[0],
                order: 1,
            })
            .await
            .unwrap();
        }

        assert_eq!(orders(&store, story).await, before);
    }

    #[tokio::test]
    async fn test_create_duplicate_pair() {
        let (_pool, store, story, chapters) = seeded(1).await;

        let mut uow = store.begin().await.unwrap();
        let err = uow
            .create(&OrderingEntryRecord {
                story_id: story,
                chapter_id: chapters[0],
                order: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_exists_checks() {
        let (_pool, store, story, chapters) = seeded(1).await;

        let mut uow = store.begin().await.unwrap();
        assert!(uow.story_exists(story).await.unwrap());
        assert!(!uow.story_exists(Uuid::new_v4()).await.unwrap());
        assert!(uow.chapter_exists(chapters[0]).await.unwrap());
        assert!(!uow.chapter_exists(Uuid::new_v4()).await.unwrap());
        assert_eq!(uow.count_by_story(story).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_order_and_delete_missing_entry() {
        let (_pool, store, story, _chapters) = seeded(1).await;
        let missing = OrderingEntryRecord {
            story_id: story,
            chapter_id: Uuid::new_v4(),
            order: 0,
        };

        let mut uow = store.begin().await.unwrap();
        assert!(matches!(
            uow.set_order(&missing).await.unwrap_err(),
            RepositoryError::NotFound(_)
        ));
        assert!(matches!(
            uow.delete(&missing).await.unwrap_err(),
            RepositoryError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_chapter_rolls_back_with_unit_of_work() {
        let (pool, store, _story, chapters) = seeded(1).await;

        {
            let mut uow = store.begin().await.unwrap();
            uow.delete_chapter(chapters[0]).await.unwrap();
            assert!(matches!(
                uow.delete_chapter(Uuid::new_v4()).await.unwrap_err(),
                RepositoryError::NotFound(_)
            ));
        }

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chapters")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_entries_cascade_with_story() {
        let (pool, store, story, chapters) = seeded(2).await;

        sqlx::query("DELETE FROM stories WHERE id = ?")
            .bind(story.to_string())
            .execute(&pool)
            .await
            .unwrap();

        assert!(store.list_by_story(story).await.unwrap().is_empty());
        assert!(store.get_by_chapter(chapters[0]).await.unwrap().is_none());
    }
}
