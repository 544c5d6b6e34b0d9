//! Story Commands

use uuid::Uuid;

use crate::domain::Actor;

/// 创建故事命令
#[derive(Debug, Clone)]
pub struct CreateStory {
    pub actor: Actor,
    pub title: String,
    pub brief: Option<String>,
}

/// 标签引用：已有标签的 ID，或按名称引用（不存在则创建）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRef {
    Id(Uuid),
    Name(String),
}

/// 更新故事命令，None 表示不修改
#[derive(Debug, Clone)]
pub struct UpdateStory {
    pub actor: Actor,
    pub story_id: Uuid,
    pub title: Option<String>,
    pub brief: Option<String>,
    pub is_published: Option<bool>,
    pub has_chapters: Option<bool>,
    /// 仅管理员可修改
    pub is_featured: Option<bool>,
    pub tags: Option<Vec<TagRef>>,
    pub categories: Option<Vec<Uuid>>,
}

impl UpdateStory {
    pub fn new(actor: Actor, story_id: Uuid) -> Self {
        Self {
            actor,
            story_id,
            title: None,
            brief: None,
            is_published: None,
            has_chapters: None,
            is_featured: None,
            tags: None,
            categories: None,
        }
    }
}

/// 删除故事命令
#[derive(Debug, Clone)]
pub struct DeleteStory {
    pub actor: Actor,
    pub story_id: Uuid,
}
