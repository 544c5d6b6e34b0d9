//! Domain Layer - 领域层
//!
//! 包含三个限界上下文:
//! - Story Context: 故事、章节与章节顺序
//! - Taxonomy Context: 分类树与标签
//! - Account Context: 角色与权限

pub mod account;
pub mod story;
pub mod taxonomy;

pub use account::{Actor, Role};
