//! Chapter Queries

use uuid::Uuid;

/// 章节详情查询
#[derive(Debug, Clone)]
pub struct GetChapter {
    pub chapter_id: Uuid,
}

/// 故事目录查询
#[derive(Debug, Clone)]
pub struct GetTableOfContents {
    pub story_id: Uuid,
}
