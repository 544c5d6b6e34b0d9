//! Account Context - 用户角色与权限规则
//!
//! 认证由上游网关完成，这里只根据角色字符串和故事归属判断权限。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 读者
    Reader,
    /// 作者
    Author,
    /// 管理员
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Author => "author",
            Role::Administrator => "administrator",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "reader" => Some(Role::Reader),
            "author" => Some(Role::Author),
            "administrator" => Some(Role::Administrator),
            _ => None,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Reader
    }
}

/// 发起请求的用户
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    /// 作者或管理员可以创作
    pub fn is_author(&self) -> bool {
        matches!(self.role, Role::Author | Role::Administrator)
    }

    /// 管理员，或拥有该故事的作者
    pub fn can_manage_story(&self, owner_id: Uuid) -> bool {
        if self.is_admin() {
            return true;
        }
        self.role == Role::Author && self.user_id == owner_id
    }

    /// 管理员，或资源本人
    pub fn owns_or_admin(&self, owner_id: Uuid) -> bool {
        self.is_admin() || self.user_id == owner_id
    }
}
