//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（如 SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::Role;

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// 并发写冲突（数据库忙/被锁），可重试
    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// User Repository
// ============================================================================

/// 用户实体（用于持久化）
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub alias: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// 作者搜索结果
#[derive(Debug, Clone)]
pub struct AuthorRecord {
    pub user: UserRecord,
    pub story_count: usize,
}

/// User Repository Port
#[async_trait]
pub trait UserRepositoryPort: Send + Sync {
    /// 保存用户（username 唯一）
    async fn save(&self, user: &UserRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepositoryError>;

    /// 根据用户名查找用户
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, RepositoryError>;

    /// 修改角色
    async fn update_role(&self, id: Uuid, role: Role) -> Result<(), RepositoryError>;

    /// 按昵称搜索至少发表过一个故事的作者
    async fn search_authors(&self, alias: &str) -> Result<Vec<AuthorRecord>, RepositoryError>;

    /// 收藏故事（重复收藏无副作用）
    async fn add_saved_story(&self, user_id: Uuid, story_id: Uuid) -> Result<(), RepositoryError>;

    /// 取消收藏，返回是否确实存在该收藏
    async fn remove_saved_story(&self, user_id: Uuid, story_id: Uuid)
        -> Result<bool, RepositoryError>;

    /// 获取用户收藏的故事
    async fn find_saved_stories(&self, user_id: Uuid) -> Result<Vec<StoryRecord>, RepositoryError>;
}

// ============================================================================
// Story Repository
// ============================================================================

/// 故事实体（用于持久化）
#[derive(Debug, Clone)]
pub struct StoryRecord {
    pub id: Uuid,
    pub title: String,
    pub brief: String,
    pub slug: String,
    pub user_id: Uuid,
    pub is_published: bool,
    pub has_chapters: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// 故事列表过滤条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryFilter {
    /// 已发布，按创建时间倒序
    Published,
    /// 已发布且被推荐
    Featured,
    /// 某分类下已发布的故事
    ByCategory(Uuid),
    /// 某标签下已发布的故事
    ByTag(Uuid),
    /// 某作者已发布的故事
    ByAuthor(Uuid),
    /// 用户自己的故事：drafts=true 返回未发布的，否则返回已发布的
    Owned { user_id: Uuid, drafts: bool },
    /// 全部故事（管理员），可按作者昵称过滤
    All { alias_contains: Option<String> },
}

/// Story Repository Port
#[async_trait]
pub trait StoryRepositoryPort: Send + Sync {
    /// 保存故事（存在则更新）
    async fn save(&self, story: &StoryRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找故事
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoryRecord>, RepositoryError>;

    /// slug 是否已被占用
    async fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError>;

    /// 删除故事及其章节、顺序条目、评论与关联
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// 按条件列出故事
    async fn find(&self, filter: &StoryFilter) -> Result<Vec<StoryRecord>, RepositoryError>;

    /// 全文搜索已发布故事（标题、简介、章节正文、作者昵称）
    async fn search(&self, query: &str) -> Result<Vec<StoryRecord>, RepositoryError>;

    /// 替换故事的标签集合
    async fn set_tags(&self, story_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepositoryError>;

    /// 替换故事的分类集合
    async fn set_categories(
        &self,
        story_id: Uuid,
        category_ids: &[Uuid],
    ) -> Result<(), RepositoryError>;

    /// 故事的标签
    async fn find_tags(&self, story_id: Uuid) -> Result<Vec<TagRecord>, RepositoryError>;

    /// 故事的分类
    async fn find_categories(&self, story_id: Uuid) -> Result<Vec<CategoryRecord>, RepositoryError>;
}

// ============================================================================
// Chapter Repository
// ============================================================================

/// 章节实体（用于持久化）
///
/// 章节本身不保存位置，位置由顺序表 story_chapters 决定
#[derive(Debug, Clone)]
pub struct ChapterRecord {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// 目录条目
#[derive(Debug, Clone)]
pub struct ChapterSummaryRecord {
    pub id: Uuid,
    pub title: String,
    pub order: i64,
    pub modified_at: DateTime<Utc>,
}

/// Chapter Repository Port
#[async_trait]
pub trait ChapterRepositoryPort: Send + Sync {
    /// 保存章节（存在则更新标题、正文）
    async fn save(&self, chapter: &ChapterRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找章节
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChapterRecord>, RepositoryError>;

    /// 删除章节
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// 故事目录，按顺序升序
    async fn find_summaries_by_story(
        &self,
        story_id: Uuid,
    ) -> Result<Vec<ChapterSummaryRecord>, RepositoryError>;

    /// 故事的第一章（用于摘要）
    async fn find_first_by_story(
        &self,
        story_id: Uuid,
    ) -> Result<Option<ChapterRecord>, RepositoryError>;
}

// ============================================================================
// Category Repository
// ============================================================================

/// 分类实体（用于持久化）
#[derive(Debug, Clone)]
pub struct CategoryRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Category Repository Port
#[async_trait]
pub trait CategoryRepositoryPort: Send + Sync {
    /// 保存分类（存在则更新）
    async fn save(&self, category: &CategoryRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找分类
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CategoryRecord>, RepositoryError>;

    /// 根据名称查找分类
    async fn find_by_name(&self, name: &str) -> Result<Option<CategoryRecord>, RepositoryError>;

    /// 全部分类，按名称排序
    async fn find_all(&self) -> Result<Vec<CategoryRecord>, RepositoryError>;

    /// 批量查找（不存在的 ID 被忽略）
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<CategoryRecord>, RepositoryError>;
}

// ============================================================================
// Tag Repository
// ============================================================================

/// 标签实体（用于持久化）
#[derive(Debug, Clone)]
pub struct TagRecord {
    pub id: Uuid,
    pub name: String,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Tag Repository Port
#[async_trait]
pub trait TagRepositoryPort: Send + Sync {
    /// 保存标签
    async fn save(&self, tag: &TagRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找标签
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TagRecord>, RepositoryError>;

    /// 按名称查找（大小写不敏感）
    async fn find_by_name(&self, name: &str) -> Result<Option<TagRecord>, RepositoryError>;

    /// 按名称片段搜索，query 为 None 时返回全部
    async fn search(&self, query: Option<&str>) -> Result<Vec<TagRecord>, RepositoryError>;

    /// 批量查找（不存在的 ID 被忽略）
    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<TagRecord>, RepositoryError>;
}

// ============================================================================
// Comment Repository
// ============================================================================

/// 评论实体（用于持久化）
#[derive(Debug, Clone)]
pub struct CommentRecord {
    pub id: Uuid,
    pub story_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Comment Repository Port
#[async_trait]
pub trait CommentRepositoryPort: Send + Sync {
    /// 保存评论
    async fn save(&self, comment: &CommentRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找评论
    async fn find_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>, RepositoryError>;

    /// 删除评论
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;

    /// 故事下的评论，按时间正序
    async fn find_by_story(&self, story_id: Uuid) -> Result<Vec<CommentRecord>, RepositoryError>;

    /// 用户发表的评论，按时间倒序
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<CommentRecord>, RepositoryError>;

    /// 全部评论，按时间倒序
    async fn find_all(&self) -> Result<Vec<CommentRecord>, RepositoryError>;
}
