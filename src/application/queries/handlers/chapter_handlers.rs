//! Chapter Query Handlers

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ordering::ChapterOrderingEngine;
use crate::application::ports::{
    ChapterRecord, ChapterRepositoryPort, ChapterSummaryRecord, StoryRepositoryPort,
};
use crate::application::queries::{GetChapter, GetTableOfContents};

// ============================================================================
// Response DTOs
// ============================================================================

/// 章节详情
#[derive(Debug, Clone, Serialize)]
pub struct ChapterResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub user_id: Uuid,
    /// 孤儿章节没有所属故事和位置
    pub story_id: Option<Uuid>,
    pub order: Option<i64>,
    pub created_at: String,
    pub modified_at: String,
}

impl ChapterResponse {
    pub fn new(record: ChapterRecord, story_id: Option<Uuid>, order: Option<i64>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            body: record.body,
            user_id: record.user_id,
            story_id,
            order,
            created_at: record.created_at.to_rfc3339(),
            modified_at: record.modified_at.to_rfc3339(),
        }
    }
}

/// 目录条目
#[derive(Debug, Clone, Serialize)]
pub struct ChapterSummaryResponse {
    pub id: Uuid,
    pub title: String,
    pub order: i64,
    pub modified_at: String,
}

impl From<ChapterSummaryRecord> for ChapterSummaryResponse {
    fn from(record: ChapterSummaryRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            order: record.order,
            modified_at: record.modified_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GetChapter Handler
pub struct GetChapterHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    engine: Arc<ChapterOrderingEngine>,
}

impl GetChapterHandler {
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        engine: Arc<ChapterOrderingEngine>,
    ) -> Self {
        Self {
            chapter_repo,
            engine,
        }
    }

    pub async fn handle(&self, query: GetChapter) -> Result<ChapterResponse, ApplicationError> {
        let chapter = self
            .chapter_repo
            .find_by_id(query.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", query.chapter_id))?;

        let position = self.engine.position_of(chapter.id).await?;

        Ok(ChapterResponse::new(
            chapter,
            position.as_ref().map(|p| p.story_id),
            position.map(|p| p.order),
        ))
    }
}

/// GetTableOfContents Handler
pub struct GetTableOfContentsHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
}

impl GetTableOfContentsHandler {
    pub fn new(
        story_repo: Arc<dyn StoryRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
    ) -> Self {
        Self {
            story_repo,
            chapter_repo,
        }
    }

    pub async fn handle(
        &self,
        query: GetTableOfContents,
    ) -> Result<Vec<ChapterSummaryResponse>, ApplicationError> {
        self.story_repo
            .find_by_id(query.story_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Story", query.story_id))?;

        let toc = self.chapter_repo.find_summaries_by_story(query.story_id).await?;
        Ok(toc.into_iter().map(ChapterSummaryResponse::from).collect())
    }
}
