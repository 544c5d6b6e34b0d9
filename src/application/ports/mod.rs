//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod ordering_store;
mod repositories;
mod story_lock;

pub use ordering_store::{OrderingEntryRecord, OrderingStorePort, OrderingUnitOfWork};
pub use repositories::{
    AuthorRecord, CategoryRecord, CategoryRepositoryPort, ChapterRecord, ChapterRepositoryPort,
    ChapterSummaryRecord, CommentRecord, CommentRepositoryPort, RepositoryError, StoryFilter,
    StoryRecord, StoryRepositoryPort, TagRecord, TagRepositoryPort, UserRecord,
    UserRepositoryPort,
};
pub use story_lock::{StoryGuard, StoryLockPort};
