//! Story Queries

use uuid::Uuid;

use crate::application::ports::StoryFilter;
use crate::domain::Actor;

/// 故事详情查询（公开）
#[derive(Debug, Clone)]
pub struct GetStory {
    pub story_id: Uuid,
}

/// 故事列表查询
///
/// `Owned` 需要调用者本人，`All` 需要管理员
#[derive(Debug, Clone)]
pub struct ListStories {
    pub actor: Option<Actor>,
    pub filter: StoryFilter,
}

/// 搜索故事查询
#[derive(Debug, Clone)]
pub struct SearchStories {
    pub query: String,
}

/// 调用者是否为故事作者
#[derive(Debug, Clone)]
pub struct CheckStoryAuthor {
    pub actor: Actor,
    pub story_id: Uuid,
}
