//! Chapter Commands

use uuid::Uuid;

use crate::domain::Actor;

/// 创建章节命令
#[derive(Debug, Clone)]
pub struct CreateChapter {
    pub actor: Actor,
    pub story_id: Uuid,
    pub title: String,
    pub body: String,
    /// 插入位置，None 表示追加到末尾
    pub position: Option<i64>,
}

/// 更新章节内容命令
#[derive(Debug, Clone)]
pub struct UpdateChapter {
    pub actor: Actor,
    pub chapter_id: Uuid,
    pub title: Option<String>,
    pub body: Option<String>,
}

/// 移动章节命令
#[derive(Debug, Clone)]
pub struct MoveChapter {
    pub actor: Actor,
    pub story_id: Uuid,
    pub chapter_id: Uuid,
    pub position: i64,
}

/// 删除章节命令
#[derive(Debug, Clone)]
pub struct DeleteChapter {
    pub actor: Actor,
    pub story_id: Uuid,
    pub chapter_id: Uuid,
}
