//! User Queries

use crate::domain::Actor;

/// 当前用户
#[derive(Debug, Clone)]
pub struct GetMe {
    pub actor: Actor,
}

/// 按昵称搜索作者
#[derive(Debug, Clone)]
pub struct SearchAuthors {
    pub alias: String,
}

/// 当前用户收藏的故事
#[derive(Debug, Clone)]
pub struct ListSavedStories {
    pub actor: Actor,
}
