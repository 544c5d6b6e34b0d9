//! Comment Command Handlers

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{CreateComment, DeleteComment};
use crate::application::error::ApplicationError;
use crate::application::ports::{CommentRecord, CommentRepositoryPort, StoryRepositoryPort};
use crate::application::queries::handlers::CommentResponse;

/// CreateComment Handler
pub struct CreateCommentHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    comment_repo: Arc<dyn CommentRepositoryPort>,
}

impl CreateCommentHandler {
    pub fn new(
        story_repo: Arc<dyn StoryRepositoryPort>,
        comment_repo: Arc<dyn CommentRepositoryPort>,
    ) -> Self {
        Self {
            story_repo,
            comment_repo,
        }
    }

    pub async fn handle(&self, command: CreateComment) -> Result<CommentResponse, ApplicationError> {
        self.story_repo
            .find_by_id(command.story_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Story", command.story_id))?;

        let body = command.body.trim();
        if body.is_empty() {
            return Err(ApplicationError::validation("Comment body must not be empty"));
        }

        let now = Utc::now();
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            story_id: command.story_id,
            user_id: command.actor.user_id,
            body: body.to_string(),
            created_at: now,
            modified_at: now,
        };
        self.comment_repo.save(&comment).await?;

        tracing::debug!(comment_id = %comment.id, story_id = %comment.story_id, "Comment created");

        Ok(CommentResponse::from(comment))
    }
}

/// DeleteComment Handler
pub struct DeleteCommentHandler {
    comment_repo: Arc<dyn CommentRepositoryPort>,
}

impl DeleteCommentHandler {
    pub fn new(comment_repo: Arc<dyn CommentRepositoryPort>) -> Self {
        Self { comment_repo }
    }

    pub async fn handle(&self, command: DeleteComment) -> Result<(), ApplicationError> {
        let comment = self
            .comment_repo
            .find_by_id(command.comment_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Comment", command.comment_id))?;

        if !command.actor.owns_or_admin(comment.user_id) {
            return Err(ApplicationError::forbidden("Not allowed to delete this comment"));
        }

        self.comment_repo.delete(comment.id).await?;

        tracing::info!(
            comment_id = %comment.id,
            deleted_by = %command.actor.user_id,
            "Comment deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Actor, Role};
    use crate::infrastructure::persistence::sqlite::test_support::{
        seed_story, seed_user, seed_user_with_role, setup_pool,
    };
    use crate::infrastructure::persistence::sqlite::{SqliteCommentRepository, SqliteStoryRepository};

    #[tokio::test]
    async fn test_comment_lifecycle() {
        let pool = setup_pool().await;
        let author = seed_user(&pool, "author").await;
        let reader = seed_user_with_role(&pool, "reader", "reader").await;
        let stranger = seed_user_with_role(&pool, "stranger", "reader").await;
        let story_id = seed_story(&pool, author, "tale").await;

        let comment_repo: Arc<dyn CommentRepositoryPort> =
            Arc::new(SqliteCommentRepository::new(pool.clone()));
        let create = CreateCommentHandler::new(
            Arc::new(SqliteStoryRepository::new(pool.clone())),
            comment_repo.clone(),
        );
        let delete = DeleteCommentHandler::new(comment_repo.clone());

        let reader_actor = Actor::new(reader, Role::Reader);
        let err = create
            .handle(CreateComment {
                actor: reader_actor,
                story_id,
                body: "   ".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));

        let comment = create
            .handle(CreateComment {
                actor: reader_actor,
                story_id,
                body: " Loved it ".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(comment.body, "Loved it");

        let err = delete
            .handle(DeleteComment {
                actor: Actor::new(stranger, Role::Reader),
                comment_id: comment.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Forbidden(_)));

        delete
            .handle(DeleteComment {
                actor: reader_actor,
                comment_id: comment.id,
            })
            .await
            .unwrap();
        assert!(comment_repo.find_by_story(story_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comment_on_missing_story() {
        let pool = setup_pool().await;
        let reader = seed_user_with_role(&pool, "reader", "reader").await;
        let create = CreateCommentHandler::new(
            Arc::new(SqliteStoryRepository::new(pool.clone())),
            Arc::new(SqliteCommentRepository::new(pool)),
        );

        let err = create
            .handle(CreateComment {
                actor: Actor::new(reader, Role::Reader),
                story_id: Uuid::new_v4(),
                body: "hello".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { resource_type: "Story", .. }));
    }
}
