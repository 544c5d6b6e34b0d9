//! Category / Tag Commands

use uuid::Uuid;

use crate::domain::Actor;

/// 创建分类命令
#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub actor: Actor,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

/// 父分类的修改方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParentChange {
    #[default]
    Keep,
    Clear,
    Set(Uuid),
}

/// 更新分类命令
#[derive(Debug, Clone)]
pub struct UpdateCategory {
    pub actor: Actor,
    pub category_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent: ParentChange,
}

/// 添加标签命令
#[derive(Debug, Clone)]
pub struct AddTag {
    pub actor: Actor,
    pub name: String,
}
