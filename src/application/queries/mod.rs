//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：处理所有读操作

mod chapter_queries;
mod comment_queries;
mod story_queries;
mod taxonomy_queries;
mod user_queries;

pub mod handlers;

pub use chapter_queries::*;
pub use comment_queries::*;
pub use story_queries::*;
pub use taxonomy_queries::*;
pub use user_queries::*;
