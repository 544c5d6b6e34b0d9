//! Story Query Handlers

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::chapter_handlers::ChapterSummaryResponse;
use super::comment_handlers::CommentResponse;
use super::taxonomy_handlers::{describe_category, CategoryResponse, TagResponse};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    CategoryRepositoryPort, ChapterRepositoryPort, CommentRepositoryPort, StoryFilter,
    StoryRecord, StoryRepositoryPort,
};
use crate::application::queries::{CheckStoryAuthor, GetStory, ListStories, SearchStories};
use crate::domain::story::excerpt;

/// 摘要取第一章的前 50 个单词
pub const EXCERPT_WORDS: usize = 50;

// ============================================================================
// Response DTOs
// ============================================================================

/// 故事响应
#[derive(Debug, Clone, Serialize)]
pub struct StoryResponse {
    pub id: Uuid,
    pub title: String,
    pub brief: String,
    pub slug: String,
    pub user_id: Uuid,
    pub is_published: bool,
    pub has_chapters: bool,
    pub is_featured: bool,
    pub created_at: String,
    pub modified_at: String,
}

impl From<StoryRecord> for StoryResponse {
    fn from(record: StoryRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            brief: record.brief,
            slug: record.slug,
            user_id: record.user_id,
            is_published: record.is_published,
            has_chapters: record.has_chapters,
            is_featured: record.is_featured,
            created_at: record.created_at.to_rfc3339(),
            modified_at: record.modified_at.to_rfc3339(),
        }
    }
}

/// 列表中的故事摘要
#[derive(Debug, Clone, Serialize)]
pub struct StorySummaryResponse {
    #[serde(flatten)]
    pub story: StoryResponse,
    pub first_category: Option<String>,
    pub excerpt: Option<String>,
}

/// 故事详情
#[derive(Debug, Clone, Serialize)]
pub struct StoryDetailResponse {
    #[serde(flatten)]
    pub story: StoryResponse,
    pub categories: Vec<CategoryResponse>,
    pub tags: Vec<TagResponse>,
    pub chapters: Vec<ChapterSummaryResponse>,
    pub comments: Vec<CommentResponse>,
}

/// 作者检查结果
#[derive(Debug, Clone, Serialize)]
pub struct StoryAuthorCheck {
    pub story_id: Uuid,
    pub is_author: bool,
}

/// 为故事列表补充首个分类与第一章摘要
pub(crate) async fn summarize(
    story_repo: &dyn StoryRepositoryPort,
    chapter_repo: &dyn ChapterRepositoryPort,
    records: Vec<StoryRecord>,
) -> Result<Vec<StorySummaryResponse>, ApplicationError> {
    let mut summaries = Vec::with_capacity(records.len());

    for record in records {
        let first_category = story_repo
            .find_categories(record.id)
            .await?
            .into_iter()
            .next()
            .map(|c| c.name);
        let excerpt = chapter_repo
            .find_first_by_story(record.id)
            .await?
            .and_then(|chapter| excerpt(&chapter.body, EXCERPT_WORDS));

        summaries.push(StorySummaryResponse {
            story: StoryResponse::from(record),
            first_category,
            excerpt,
        });
    }

    Ok(summaries)
}

// ============================================================================
// Handlers
// ============================================================================

/// GetStory Handler - 故事详情
pub struct GetStoryHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    category_repo: Arc<dyn CategoryRepositoryPort>,
    comment_repo: Arc<dyn CommentRepositoryPort>,
}

impl GetStoryHandler {
    pub fn new(
        story_repo: Arc<dyn StoryRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        category_repo: Arc<dyn CategoryRepositoryPort>,
        comment_repo: Arc<dyn CommentRepositoryPort>,
    ) -> Self {
        Self {
            story_repo,
            chapter_repo,
            category_repo,
            comment_repo,
        }
    }

    pub async fn handle(&self, query: GetStory) -> Result<StoryDetailResponse, ApplicationError> {
        let story = self
            .story_repo
            .find_by_id(query.story_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Story", query.story_id))?;

        let mut categories = Vec::new();
        for record in self.story_repo.find_categories(story.id).await? {
            categories.push(describe_category(self.category_repo.as_ref(), record).await?);
        }

        let tags = self
            .story_repo
            .find_tags(story.id)
            .await?
            .into_iter()
            .map(TagResponse::from)
            .collect();

        let chapters = self
            .chapter_repo
            .find_summaries_by_story(story.id)
            .await?
            .into_iter()
            .map(ChapterSummaryResponse::from)
            .collect();

        let comments = self
            .comment_repo
            .find_by_story(story.id)
            .await?
            .into_iter()
            .map(CommentResponse::from)
            .collect();

        Ok(StoryDetailResponse {
            story: StoryResponse::from(story),
            categories,
            tags,
            chapters,
            comments,
        })
    }
}

/// ListStories Handler
pub struct ListStoriesHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
}

impl ListStoriesHandler {
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
        query: ListStories,
    ) -> Result<Vec<StorySummaryResponse>, ApplicationError> {
        match (&query.filter, query.actor) {
            (StoryFilter::All { .. }, Some(actor)) if actor.is_admin() => {}
            (StoryFilter::All { .. }, _) => {
                return Err(ApplicationError::forbidden("Only administrators can list all stories"));
            }
            (StoryFilter::Owned { user_id, .. }, Some(actor)) if actor.user_id == *user_id => {}
            (StoryFilter::Owned { .. }, _) => {
                return Err(ApplicationError::forbidden("Cannot list another user's stories"));
            }
            _ => {}
        }

        let records = self.story_repo.find(&query.filter).await?;
        summarize(self.story_repo.as_ref(), self.chapter_repo.as_ref(), records).await
    }
}

/// SearchStories Handler
pub struct SearchStoriesHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
}

impl SearchStoriesHandler {
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
        query: SearchStories,
    ) -> Result<Vec<StorySummaryResponse>, ApplicationError> {
        if query.query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records = self.story_repo.search(&query.query).await?;
        tracing::debug!(query = %query.query, hits = records.len(), "Story search");

        summarize(self.story_repo.as_ref(), self.chapter_repo.as_ref(), records).await
    }
}

/// CheckStoryAuthor Handler
pub struct CheckStoryAuthorHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
}

impl CheckStoryAuthorHandler {
    pub fn new(story_repo: Arc<dyn StoryRepositoryPort>) -> Self {
        Self { story_repo }
    }

    pub async fn handle(&self, query: CheckStoryAuthor) -> Result<StoryAuthorCheck, ApplicationError> {
        let story = self
            .story_repo
            .find_by_id(query.story_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Story", query.story_id))?;

        Ok(StoryAuthorCheck {
            story_id: story.id,
            is_author: story.user_id == query.actor.user_id,
        })
    }
}
