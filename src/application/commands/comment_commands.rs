//! Comment Commands

use uuid::Uuid;

use crate::domain::Actor;

/// 发表评论命令
#[derive(Debug, Clone)]
pub struct CreateComment {
    pub actor: Actor,
    pub story_id: Uuid,
    pub body: String,
}

/// 删除评论命令
#[derive(Debug, Clone)]
pub struct DeleteComment {
    pub actor: Actor,
    pub comment_id: Uuid,
}
