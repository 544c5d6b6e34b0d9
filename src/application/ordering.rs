//! Chapter Ordering Engine - 章节顺序引擎
//!
//! 维护每个故事的章节序列：插入、移动、删除后 order 始终是从 0 开始、
//! 连续不重复的整数序列。
//!
//! 每个操作：
//! 1. 获取故事锁（同一故事串行，不同故事并行）
//! 2. 在一个事务中完成 读取 -> 平移 -> 写入目标条目
//! 3. 事务冲突时有限次重试，其余错误直接返回

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::application::ports::{
    OrderingEntryRecord, OrderingStorePort, OrderingUnitOfWork, RepositoryError, StoryLockPort,
};
use crate::domain::story::{
    clamp_insert_position, clamp_move_position, plan_move, validate_position, ShiftRange,
};

/// 顺序引擎错误
#[derive(Debug, Error)]
pub enum OrderingError {
    #[error("Story not found: {0}")]
    StoryNotFound(Uuid),

    #[error("Chapter not found: {0}")]
    ChapterNotFound(Uuid),

    /// 章节存在，但在该故事中没有顺序条目
    #[error("Orphan chapter: {chapter_id} has no position in story {story_id}")]
    OrphanChapter { story_id: Uuid, chapter_id: Uuid },

    /// 章节已经在某个故事的序列中
    #[error("Chapter {chapter_id} already belongs to story {story_id}")]
    DuplicateMembership { story_id: Uuid, chapter_id: Uuid },

    #[error("Invalid position: {0}")]
    InvalidPosition(i64),

    /// 事务因并发竞争未能提交（唯一可重试的错误）
    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl OrderingError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrderingError::TransactionConflict(_))
    }
}

impl From<RepositoryError> for OrderingError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(msg) => OrderingError::TransactionConflict(msg),
            other => OrderingError::Storage(other.to_string()),
        }
    }
}

/// 事务冲突重试策略
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 首次尝试之外的最大重试次数
    pub max_retries: u32,
    /// 第 n 次重试前等待 n * backoff
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(25),
        }
    }
}

/// 移动结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub entry: OrderingEntryRecord,
    pub previous_order: i64,
}

impl MoveOutcome {
    pub fn moved(&self) -> bool {
        self.entry.order != self.previous_order
    }
}

/// 章节顺序引擎
pub struct ChapterOrderingEngine {
    store: Arc<dyn OrderingStorePort>,
    locks: Arc<dyn StoryLockPort>,
    policy: RetryPolicy,
}

impl ChapterOrderingEngine {
    pub fn new(store: Arc<dyn OrderingStorePort>, locks: Arc<dyn StoryLockPort>) -> Self {
        Self::with_policy(store, locks, RetryPolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn OrderingStorePort>,
        locks: Arc<dyn StoryLockPort>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            locks,
            policy,
        }
    }

    /// 把章节插入到 `pos`，`pos` 之后（含）的章节后移一位
    ///
    /// 超出末尾的位置按追加处理。
    pub async fn insert(
        &self,
        story_id: Uuid,
        chapter_id: Uuid,
        pos: i64,
    ) -> Result<OrderingEntryRecord, OrderingError> {
        let pos = validate_position(pos).map_err(|_| OrderingError::InvalidPosition(pos))?;

        let _guard = self.locks.acquire(story_id).await;
        let entry = self
            .retrying("insert", story_id, || self.try_insert(story_id, chapter_id, pos))
            .await?;

        tracing::info!(
            story_id = %story_id,
            chapter_id = %chapter_id,
            requested = pos,
            order = entry.order,
            "Chapter inserted into sequence"
        );

        Ok(entry)
    }

    /// 把章节移动到 `new_pos`，中间的章节各平移一位
    pub async fn move_to(
        &self,
        story_id: Uuid,
        chapter_id: Uuid,
        new_pos: i64,
    ) -> Result<MoveOutcome, OrderingError> {
        let new_pos =
            validate_position(new_pos).map_err(|_| OrderingError::InvalidPosition(new_pos))?;

        let _guard = self.locks.acquire(story_id).await;
        let outcome = self
            .retrying("move", story_id, || self.try_move(story_id, chapter_id, new_pos))
            .await?;

        if outcome.moved() {
            tracing::info!(
                story_id = %story_id,
                chapter_id = %chapter_id,
                from = outcome.previous_order,
                to = outcome.entry.order,
                "Chapter moved"
            );
        } else {
            tracing::debug!(
                story_id = %story_id,
                chapter_id = %chapter_id,
                order = outcome.entry.order,
                "Chapter move is a no-op"
            );
        }

        Ok(outcome)
    }

    /// 移除章节的顺序条目，后面的章节前移一位
    pub async fn remove(
        &self,
        story_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<OrderingEntryRecord, OrderingError> {
        let _guard = self.locks.acquire(story_id).await;
        let removed = self
            .retrying("remove", story_id, || {
                self.try_remove(story_id, chapter_id, false)
            })
            .await?;

        tracing::info!(
            story_id = %story_id,
            chapter_id = %chapter_id,
            order = removed.order,
            "Chapter removed from sequence"
        );

        Ok(removed)
    }

    /// 删除章节：移除顺序条目、后续章节前移、删除章节行，三步同一事务提交
    ///
    /// 章节不在该故事的序列中时返回 OrphanChapter，章节行保留。
    pub async fn delete_chapter(
        &self,
        story_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<OrderingEntryRecord, OrderingError> {
        let _guard = self.locks.acquire(story_id).await;
        let removed = self
            .retrying("delete_chapter", story_id, || {
                self.try_remove(story_id, chapter_id, true)
            })
            .await?;

        tracing::info!(
            story_id = %story_id,
            chapter_id = %chapter_id,
            order = removed.order,
            "Chapter deleted"
        );

        Ok(removed)
    }

    /// 故事目录（按 order 升序）
    pub async fn table_of_contents(
        &self,
        story_id: Uuid,
    ) -> Result<Vec<OrderingEntryRecord>, OrderingError> {
        Ok(self.store.list_by_story(story_id).await?)
    }

    /// 章节所在的顺序条目
    pub async fn position_of(
        &self,
        chapter_id: Uuid,
    ) -> Result<Option<OrderingEntryRecord>, OrderingError> {
        Ok(self.store.get_by_chapter(chapter_id).await?)
    }

    async fn try_insert(
        &self,
        story_id: Uuid,
        chapter_id: Uuid,
        pos: i64,
    ) -> Result<OrderingEntryRecord, OrderingError> {
        let mut uow = self.store.begin().await?;
        ensure_exists(uow.as_mut(), story_id, chapter_id).await?;

        if let Some(existing) = uow.get_by_chapter(chapter_id).await? {
            return Err(OrderingError::DuplicateMembership {
                story_id: existing.story_id,
                chapter_id,
            });
        }

        let count = uow.count_by_story(story_id).await?;
        let order = clamp_insert_position(pos, count);

        uow.shift(story_id, ShiftRange::open_slot_at(order)).await?;

        let entry = OrderingEntryRecord {
            story_id,
            chapter_id,
            order,
        };
        uow.create(&entry).await.map_err(|e| match e {
            RepositoryError::Duplicate(_) => OrderingError::DuplicateMembership {
                story_id,
                chapter_id,
            },
            other => other.into(),
        })?;

        uow.commit().await?;
        Ok(entry)
    }

    async fn try_move(
        &self,
        story_id: Uuid,
        chapter_id: Uuid,
        new_pos: i64,
    ) -> Result<MoveOutcome, OrderingError> {
        let mut uow = self.store.begin().await?;
        ensure_exists(uow.as_mut(), story_id, chapter_id).await?;
        let current = membership(uow.as_mut(), story_id, chapter_id).await?;

        let count = uow.count_by_story(story_id).await?;
        let target = clamp_move_position(new_pos, count);

        let Some(range) = plan_move(current.order, target) else {
            // 未写入任何数据，drop 即回滚
            return Ok(MoveOutcome {
                previous_order: current.order,
                entry: current,
            });
        };

        uow.shift(story_id, range).await?;

        let entry = OrderingEntryRecord {
            order: target,
            ..current.clone()
        };
        uow.set_order(&entry).await?;
        uow.commit().await?;

        Ok(MoveOutcome {
            entry,
            previous_order: current.order,
        })
    }

    async fn try_remove(
        &self,
        story_id: Uuid,
        chapter_id: Uuid,
        delete_row: bool,
    ) -> Result<OrderingEntryRecord, OrderingError> {
        let mut uow = self.store.begin().await?;
        ensure_exists(uow.as_mut(), story_id, chapter_id).await?;
        let current = membership(uow.as_mut(), story_id, chapter_id).await?;

        uow.delete(&current).await?;
        uow.shift(story_id, ShiftRange::close_gap_after(current.order))
            .await?;
        if delete_row {
            uow.delete_chapter(chapter_id).await?;
        }
        uow.commit().await?;

        Ok(current)
    }

    async fn retrying<T, F, Fut>(
        &self,
        op: &'static str,
        story_id: Uuid,
        mut attempt_fn: F,
    ) -> Result<T, OrderingError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, OrderingError>>,
    {
        let mut attempt = 0u32;
        loop {
            match attempt_fn().await {
                Err(OrderingError::TransactionConflict(msg)) if attempt < self.policy.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        op = op,
                        story_id = %story_id,
                        attempt = attempt,
                        error = %msg,
                        "Ordering transaction conflict, retrying"
                    );
                    tokio::time::sleep(self.policy.backoff * attempt).await;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::error!(
                            op = op,
                            story_id = %story_id,
                            attempts = attempt + 1,
                            error = %e,
                            "Ordering transaction conflict, giving up"
                        );
                    }
                    return Err(e);
                }
                Ok(value) => return Ok(value),
            }
        }
    }
}

async fn ensure_exists(
    uow: &mut dyn OrderingUnitOfWork,
    story_id: Uuid,
    chapter_id: Uuid,
) -> Result<(), OrderingError> {
    if !uow.story_exists(story_id).await? {
        return Err(OrderingError::StoryNotFound(story_id));
    }
    if !uow.chapter_exists(chapter_id).await? {
        return Err(OrderingError::ChapterNotFound(chapter_id));
    }
    Ok(())
}

/// 章节在该故事中的条目，不存在即为孤儿章节
async fn membership(
    uow: &mut dyn OrderingUnitOfWork,
    story_id: Uuid,
    chapter_id: Uuid,
) -> Result<OrderingEntryRecord, OrderingError> {
    match uow.get_by_chapter(chapter_id).await? {
        Some(entry) if entry.story_id == story_id => Ok(entry),
        _ => Err(OrderingError::OrphanChapter {
            story_id,
            chapter_id,
        }),
    }
}
