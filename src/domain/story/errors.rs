//! Story Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoryError {
    #[error("无效的标题: {0}")]
    InvalidTitle(String),

    #[error("无效的章节标题: {0}")]
    InvalidChapterTitle(String),

    #[error("章节正文不能包含 HTML 标签")]
    HtmlInBody,

    #[error("无效的章节位置: {0}")]
    InvalidPosition(i64),
}
