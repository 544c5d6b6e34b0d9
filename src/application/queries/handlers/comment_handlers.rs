//! Comment Query Handlers

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{CommentRecord, CommentRepositoryPort, StoryRepositoryPort};
use crate::application::queries::{ListAllComments, ListMyComments, ListStoryComments};

/// 评论响应
#[derive(Debug, Clone, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub story_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: String,
    pub modified_at: String,
}

impl From<CommentRecord> for CommentResponse {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            story_id: record.story_id,
            user_id: record.user_id,
            body: record.body,
            created_at: record.created_at.to_rfc3339(),
            modified_at: record.modified_at.to_rfc3339(),
        }
    }
}

/// ListStoryComments Handler
pub struct ListStoryCommentsHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    comment_repo: Arc<dyn CommentRepositoryPort>,
}

impl ListStoryCommentsHandler {
    pub fn new(
        story_repo: Arc<dyn StoryRepositoryPort>,
        comment_repo: Arc<dyn CommentRepositoryPort>,
    ) -> Self {
        Self {
            story_repo,
            comment_repo,
        }
    }

    pub async fn handle(
        &self,
        query: ListStoryComments,
    ) -> Result<Vec<CommentResponse>, ApplicationError> {
        self.story_repo
            .find_by_id(query.story_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Story", query.story_id))?;

        let comments = self.comment_repo.find_by_story(query.story_id).await?;
        Ok(comments.into_iter().map(CommentResponse::from).collect())
    }
}

/// ListMyComments Handler
pub struct ListMyCommentsHandler {
    comment_repo: Arc<dyn CommentRepositoryPort>,
}

impl ListMyCommentsHandler {
    pub fn new(comment_repo: Arc<dyn CommentRepositoryPort>) -> Self {
        Self { comment_repo }
    }

    pub async fn handle(&self, query: ListMyComments) -> Result<Vec<CommentResponse>, ApplicationError> {
        let comments = self.comment_repo.find_by_user(query.actor.user_id).await?;
        Ok(comments.into_iter().map(CommentResponse::from).collect())
    }
}

/// ListAllComments Handler（管理员）
pub struct ListAllCommentsHandler {
    comment_repo: Arc<dyn CommentRepositoryPort>,
}

impl ListAllCommentsHandler {
    pub fn new(comment_repo: Arc<dyn CommentRepositoryPort>) -> Self {
        Self { comment_repo }
    }

    pub async fn handle(&self, query: ListAllComments) -> Result<Vec<CommentResponse>, ApplicationError> {
        if !query.actor.is_admin() {
            return Err(ApplicationError::forbidden("Only administrators can list all comments"));
        }

        let comments = self.comment_repo.find_all().await?;
        Ok(comments.into_iter().map(CommentResponse::from).collect())
    }
}
