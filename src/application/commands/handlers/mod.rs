//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod chapter_handlers;
mod comment_handlers;
mod story_handlers;
mod taxonomy_handlers;
mod user_handlers;

pub use chapter_handlers::*;
pub use comment_handlers::*;
pub use story_handlers::*;
pub use taxonomy_handlers::*;
pub use user_handlers::*;
