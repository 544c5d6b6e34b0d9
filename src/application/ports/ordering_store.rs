//! Ordering Store Port - 章节顺序表
//!
//! (story, chapter) -> order 的持久化映射。写操作只能在
//! [`OrderingUnitOfWork`] 中进行：平移与目标条目的写入一起提交或一起回滚。

use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::story::ShiftRange;

/// 顺序条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingEntryRecord {
    pub story_id: Uuid,
    pub chapter_id: Uuid,
    pub order: i64,
}

/// Ordering Store Port
#[async_trait]
pub trait OrderingStorePort: Send + Sync {
    /// 开启一个工作单元（数据库事务）
    async fn begin(&self) -> Result<Box<dyn OrderingUnitOfWork>, RepositoryError>;

    /// 章节所在的顺序条目；None 表示孤儿章节（或章节不存在）
    async fn get_by_chapter(
        &self,
        chapter_id: Uuid,
    ) -> Result<Option<OrderingEntryRecord>, RepositoryError>;

    /// 故事的全部条目，按 order 升序
    async fn list_by_story(&self, story_id: Uuid) -> Result<Vec<OrderingEntryRecord>, RepositoryError>;
}

/// 工作单元
///
/// 未调用 `commit` 就被 drop 时，全部写入回滚。
#[async_trait]
pub trait OrderingUnitOfWork: Send {
    /// 故事是否存在
    async fn story_exists(&mut self, story_id: Uuid) -> Result<bool, RepositoryError>;

    /// 章节是否存在
    async fn chapter_exists(&mut self, chapter_id: Uuid) -> Result<bool, RepositoryError>;

    /// 章节所在的顺序条目
    async fn get_by_chapter(
        &mut self,
        chapter_id: Uuid,
    ) -> Result<Option<OrderingEntryRecord>, RepositoryError>;

    /// 故事的条目数
    async fn count_by_story(&mut self, story_id: Uuid) -> Result<i64, RepositoryError>;

    /// 故事的全部条目，按 order 升序
    async fn list_by_story(
        &mut self,
        story_id: Uuid,
    ) -> Result<Vec<OrderingEntryRecord>, RepositoryError>;

    /// 对区间内的条目批量加减 delta，返回受影响行数
    async fn shift(&mut self, story_id: Uuid, range: ShiftRange) -> Result<u64, RepositoryError>;

    /// 新建条目；(story, chapter) 已存在时返回 Duplicate
    async fn create(&mut self, entry: &OrderingEntryRecord) -> Result<(), RepositoryError>;

    /// 覆写条目的 order
    async fn set_order(&mut self, entry: &OrderingEntryRecord) -> Result<(), RepositoryError>;

    /// 删除条目（不做重新编号）
    async fn delete(&mut self, entry: &OrderingEntryRecord) -> Result<(), RepositoryError>;

    /// 删除章节本身（与移除条目在同一事务中）
    async fn delete_chapter(&mut self, chapter_id: Uuid) -> Result<(), RepositoryError>;

    /// 提交
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}
