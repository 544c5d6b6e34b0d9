//! User Commands

use uuid::Uuid;

use crate::domain::{Actor, Role};

/// 注册用户命令
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub username: String,
    pub alias: String,
    pub role: Role,
}

/// 修改用户角色命令（管理员）
#[derive(Debug, Clone)]
pub struct ChangeUserRole {
    pub actor: Actor,
    pub user_id: Uuid,
    pub role: Role,
}

/// 收藏故事命令
#[derive(Debug, Clone)]
pub struct SaveStory {
    pub actor: Actor,
    pub story_id: Uuid,
}

/// 取消收藏命令
#[derive(Debug, Clone)]
pub struct UnsaveStory {
    pub actor: Actor,
    pub story_id: Uuid,
}
