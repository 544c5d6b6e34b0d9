//! User Query Handlers

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::story_handlers::{summarize, StorySummaryResponse};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AuthorRecord, ChapterRepositoryPort, StoryRepositoryPort, UserRecord, UserRepositoryPort,
};
use crate::application::queries::{GetMe, ListSavedStories, SearchAuthors};
use crate::domain::Role;

/// 用户响应
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub alias: String,
    pub role: Role,
    pub created_at: String,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            alias: record.alias,
            role: record.role,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// 作者搜索结果
#[derive(Debug, Clone, Serialize)]
pub struct AuthorResponse {
    pub id: Uuid,
    pub alias: String,
    pub story_count: usize,
}

impl From<AuthorRecord> for AuthorResponse {
    fn from(record: AuthorRecord) -> Self {
        Self {
            id: record.user.id,
            alias: record.user.alias,
            story_count: record.story_count,
        }
    }
}

/// GetMe Handler
pub struct GetMeHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
}

impl GetMeHandler {
    pub fn new(user_repo: Arc<dyn UserRepositoryPort>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, query: GetMe) -> Result<UserResponse, ApplicationError> {
        let user = self
            .user_repo
            .find_by_id(query.actor.user_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("User", query.actor.user_id))?;

        Ok(UserResponse::from(user))
    }
}

/// SearchAuthors Handler
pub struct SearchAuthorsHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
}

impl SearchAuthorsHandler {
    pub fn new(user_repo: Arc<dyn UserRepositoryPort>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, query: SearchAuthors) -> Result<Vec<AuthorResponse>, ApplicationError> {
        let authors = self.user_repo.search_authors(query.alias.trim()).await?;
        Ok(authors.into_iter().map(AuthorResponse::from).collect())
    }
}

/// ListSavedStories Handler
pub struct ListSavedStoriesHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
    story_repo: Arc<dyn StoryRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
}

impl ListSavedStoriesHandler {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryPort>,
        story_repo: Arc<dyn StoryRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
    ) -> Self {
        Self {
            user_repo,
            story_repo,
            chapter_repo,
        }
    }

    pub async fn handle(
        &self,
        query: ListSavedStories,
    ) -> Result<Vec<StorySummaryResponse>, ApplicationError> {
        let records = self.user_repo.find_saved_stories(query.actor.user_id).await?;
        summarize(self.story_repo.as_ref(), self.chapter_repo.as_ref(), records).await
    }
}
