//! Comment Queries

use uuid::Uuid;

use crate::domain::Actor;

/// 故事下的评论
#[derive(Debug, Clone)]
pub struct ListStoryComments {
    pub story_id: Uuid,
}

/// 当前用户的评论
#[derive(Debug, Clone)]
pub struct ListMyComments {
    pub actor: Actor,
}

/// 全部评论（管理员）
#[derive(Debug, Clone)]
pub struct ListAllComments {
    pub actor: Actor,
}
