//! Slug 生成
//!
//! 与标题对应的 URL 片段：小写 ASCII 字母数字，以 `-` 连接，
//! 最长 20 字符；重名时追加 `-1`、`-2` ...

/// slug 主体最大长度
pub const MAX_SLUG_BASE_CHARS: usize = 20;

/// 标题中没有可用字符时的兜底 slug
pub const FALLBACK_SLUG: &str = "story";

/// 从标题生成 slug 主体
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_dash = true;
        }
        // 其他标点直接丢弃
    }

    let mut slug: String = slug.chars().take(MAX_SLUG_BASE_CHARS).collect();
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// 第 `attempt` 个候选 slug（0 为主体本身）
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}
