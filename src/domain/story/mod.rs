//! Story Context - 故事限界上下文
//!
//! 职责:
//! - 故事与章节的值对象校验
//! - 章节顺序计算（插入/移动/删除的平移区间）
//! - slug 生成

mod errors;
mod ordering;
mod slug;
mod value_objects;

pub use errors::StoryError;
pub use ordering::{
    clamp_insert_position, clamp_move_position, is_contiguous, plan_move, validate_position,
    ShiftRange, ORDER_BASE,
};
pub use slug::{slug_candidate, slugify, FALLBACK_SLUG, MAX_SLUG_BASE_CHARS};
pub use value_objects::{excerpt, ChapterBody, ChapterTitle, StoryTitle, MAX_TITLE_CHARS};
