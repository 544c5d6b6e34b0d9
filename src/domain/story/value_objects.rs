//! Story Context - Value Objects

use serde::{Deserialize, Serialize};

use super::StoryError;

/// 故事标题最大长度（字符）
pub const MAX_TITLE_CHARS: usize = 255;

/// 故事标题
///
/// 不变量: 非空（去除首尾空白后），不超过 255 字符
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryTitle(String);

impl StoryTitle {
    pub fn new(title: impl Into<String>) -> Result<Self, StoryError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(StoryError::InvalidTitle("标题不能为空".to_string()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(StoryError::InvalidTitle(format!(
                "标题长度不能超过{}字符",
                MAX_TITLE_CHARS
            )));
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for StoryTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 章节标题（允许为空）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterTitle(String);

impl ChapterTitle {
    pub fn new(title: impl Into<String>) -> Result<Self, StoryError> {
        let title = title.into().trim().to_string();
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(StoryError::InvalidChapterTitle(format!(
                "章节标题长度不能超过{}字符",
                MAX_TITLE_CHARS
            )));
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// 章节正文
///
/// 不变量: 不包含 HTML 标签，正文以纯文本保存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterBody(String);

impl ChapterBody {
    pub fn new(body: impl Into<String>) -> Result<Self, StoryError> {
        let body = body.into();
        if contains_html_tag(&body) {
            return Err(StoryError::HtmlInBody);
        }
        Ok(Self(body))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// 截取正文前 `max_words` 个单词作为摘要，被截断时追加 "..."
pub fn excerpt(text: &str, max_words: usize) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }
    if words.len() <= max_words {
        return Some(words.join(" "));
    }
    Some(format!("{}...", words[..max_words].join(" ")))
}

/// 判断文本中是否出现形如 `<tag ...>`、`</tag>`、`<!-- -->` 的标签
fn contains_html_tag(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            let starts_tag = bytes
                .get(i + 1)
                .map(|b| b.is_ascii_alphabetic() || *b == b'/' || *b == b'!')
                .unwrap_or(false);
            if starts_tag && bytes[i + 1..].contains(&b'>') {
                return true;
            }
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_title_rejects_blank() {
        assert!(StoryTitle::new("   ").is_err());
        assert_eq!(StoryTitle::new("  About Cats ").unwrap().as_str(), "About Cats");
    }

    #[test]
    fn test_story_title_length_limit() {
        let long = "a".repeat(MAX_TITLE_CHARS + 1);
        assert!(StoryTitle::new(long).is_err());
        assert!(StoryTitle::new("a".repeat(MAX_TITLE_CHARS)).is_ok());
    }

    #[test]
    fn test_chapter_title_may_be_empty() {
        assert_eq!(ChapterTitle::new("").unwrap().as_str(), "");
    }

    #[test]
    fn test_chapter_body_rejects_html() {
        assert_eq!(
            ChapterBody::new("hello <b>world</b>").unwrap_err(),
            StoryError::HtmlInBody
        );
        assert!(ChapterBody::new("<!-- hidden -->").is_err());
    }

    #[test]
    fn test_chapter_body_allows_angle_brackets_in_prose() {
        assert!(ChapterBody::new("a < b and c > d").is_ok());
        assert!(ChapterBody::new("<3 forever").is_ok());
    }

    #[test]
    fn test_excerpt_truncates_words() {
        assert_eq!(excerpt("one two three", 2).as_deref(), Some("one two..."));
        assert_eq!(excerpt("one  two", 5).as_deref(), Some("one two"));
        assert_eq!(excerpt("   ", 5), None);
    }
}
