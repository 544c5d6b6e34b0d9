//! Story Command Handlers

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{CreateStory, DeleteStory, TagRef, UpdateStory};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    CategoryRepositoryPort, RepositoryError, StoryLockPort, StoryRecord, StoryRepositoryPort,
    TagRecord, TagRepositoryPort,
};
use crate::application::queries::handlers::StoryResponse;
use crate::domain::story::{slug_candidate, slugify, StoryTitle};
use crate::domain::taxonomy::validate_tag_name;
use crate::domain::Actor;
use crate::infrastructure::events::EventPublisher;

/// slug 后缀最多尝试次数
const MAX_SLUG_ATTEMPTS: u32 = 1000;

// ============================================================================
// CreateStory
// ============================================================================

/// CreateStory Handler
pub struct CreateStoryHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
}

impl CreateStoryHandler {
    pub fn new(story_repo: Arc<dyn StoryRepositoryPort>) -> Self {
        Self { story_repo }
    }

    pub async fn handle(&self, command: CreateStory) -> Result<StoryResponse, ApplicationError> {
        if !command.actor.is_author() {
            return Err(ApplicationError::forbidden("Only authors can create stories"));
        }

        let title = StoryTitle::new(command.title)?;
        let base = slugify(title.as_str());
        let now = Utc::now();

        let mut story = StoryRecord {
            id: Uuid::new_v4(),
            title: title.into_inner(),
            brief: command.brief.unwrap_or_default().trim().to_string(),
            slug: String::new(),
            user_id: command.actor.user_id,
            is_published: false,
            has_chapters: false,
            is_featured: false,
            created_at: now,
            modified_at: now,
        };

        // 并发创建同名故事时，唯一约束兜底，换下一个后缀重试
        for attempt in 0..MAX_SLUG_ATTEMPTS {
            let candidate = slug_candidate(&base, attempt);
            if self.story_repo.slug_exists(&candidate).await? {
                continue;
            }
            story.slug = candidate;
            match self.story_repo.save(&story).await {
                Ok(()) => {
                    tracing::info!(
                        story_id = %story.id,
                        slug = %story.slug,
                        user_id = %story.user_id,
                        "Story created"
                    );
                    return Ok(StoryResponse::from(story));
                }
                Err(RepositoryError::Duplicate(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApplicationError::business_rule(format!(
            "No free slug for '{}'",
            base
        )))
    }
}

// ============================================================================
// UpdateStory
// ============================================================================

/// UpdateStory Handler
pub struct UpdateStoryHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    category_repo: Arc<dyn CategoryRepositoryPort>,
    tag_repo: Arc<dyn TagRepositoryPort>,
}

impl UpdateStoryHandler {
    pub fn new(
        story_repo: Arc<dyn StoryRepositoryPort>,
        category_repo: Arc<dyn CategoryRepositoryPort>,
        tag_repo: Arc<dyn TagRepositoryPort>,
    ) -> Self {
        Self {
            story_repo,
            category_repo,
            tag_repo,
        }
    }

    pub async fn handle(&self, command: UpdateStory) -> Result<StoryResponse, ApplicationError> {
        let mut story = self
            .story_repo
            .find_by_id(command.story_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Story", command.story_id))?;

        if !command.actor.can_manage_story(story.user_id) {
            return Err(ApplicationError::forbidden("Not allowed to edit this story"));
        }
        if command.is_featured.is_some() && !command.actor.is_admin() {
            return Err(ApplicationError::forbidden("Only administrators can feature stories"));
        }

        // 先做全部校验，再写入
        if let Some(title) = command.title {
            story.title = StoryTitle::new(title)?.into_inner();
        }
        let category_ids = match command.categories {
            Some(ids) => Some(self.resolve_categories(ids).await?),
            None => None,
        };
        let tag_ids = match command.tags {
            Some(refs) => Some(self.resolve_tags(&command.actor, refs).await?),
            None => None,
        };

        if let Some(brief) = command.brief {
            story.brief = brief.trim().to_string();
        }
        if let Some(is_published) = command.is_published {
            story.is_published = is_published;
        }
        if let Some(has_chapters) = command.has_chapters {
            story.has_chapters = has_chapters;
        }
        if let Some(is_featured) = command.is_featured {
            story.is_featured = is_featured;
        }
        story.modified_at = Utc::now();

        self.story_repo.save(&story).await?;
        if let Some(ids) = category_ids {
            self.story_repo.set_categories(story.id, &ids).await?;
        }
        if let Some(ids) = tag_ids {
            self.story_repo.set_tags(story.id, &ids).await?;
        }

        tracing::info!(story_id = %story.id, "Story updated");

        Ok(StoryResponse::from(story))
    }

    /// 分类必须全部存在
    async fn resolve_categories(&self, ids: Vec<Uuid>) -> Result<Vec<Uuid>, ApplicationError> {
        let mut unique = Vec::with_capacity(ids.len());
        let mut seen = HashSet::new();
        for id in ids {
            if seen.insert(id) {
                unique.push(id);
            }
        }

        let found: HashSet<Uuid> = self
            .category_repo
            .find_by_ids(&unique)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();

        if let Some(missing) = unique.iter().find(|id| !found.contains(id)) {
            return Err(ApplicationError::not_found("Category", *missing));
        }
        Ok(unique)
    }

    /// 按 ID 引用的标签必须存在，按名称引用的不存在则创建
    async fn resolve_tags(
        &self,
        actor: &Actor,
        refs: Vec<TagRef>,
    ) -> Result<Vec<Uuid>, ApplicationError> {
        let mut ids = Vec::with_capacity(refs.len());

        for tag_ref in refs {
            let id = match tag_ref {
                TagRef::Id(id) => {
                    self.tag_repo
                        .find_by_id(id)
                        .await?
                        .ok_or_else(|| ApplicationError::not_found("Tag", id))?
                        .id
                }
                TagRef::Name(name) => {
                    let name = validate_tag_name(&name)?;
                    match self.tag_repo.find_by_name(&name).await? {
                        Some(existing) => existing.id,
                        None => {
                            let tag = TagRecord {
                                id: Uuid::new_v4(),
                                name,
                                user_id: Some(actor.user_id),
                                created_at: Utc::now(),
                            };
                            self.tag_repo.save(&tag).await?;
                            tracing::debug!(tag_id = %tag.id, name = %tag.name, "Tag created from story update");
                            tag.id
                        }
                    }
                }
            };
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        Ok(ids)
    }
}

// ============================================================================
// DeleteStory
// ============================================================================

/// DeleteStory Handler
pub struct DeleteStoryHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    locks: Arc<dyn StoryLockPort>,
    event_publisher: Arc<EventPublisher>,
}

impl DeleteStoryHandler {
    pub fn new(
        story_repo: Arc<dyn StoryRepositoryPort>,
        locks: Arc<dyn StoryLockPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            story_repo,
            locks,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: DeleteStory) -> Result<(), ApplicationError> {
        let story = self
            .story_repo
            .find_by_id(command.story_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Story", command.story_id))?;

        if !command.actor.can_manage_story(story.user_id) {
            return Err(ApplicationError::forbidden("Not allowed to delete this story"));
        }

        // 与章节顺序写操作互斥
        {
            let _guard = self.locks.acquire(story.id).await;
            self.story_repo.delete(story.id).await?;
        }
        self.locks.forget(story.id);
        self.event_publisher.publish_story_deleted(story.id);

        tracing::info!(
            story_id = %story.id,
            title = %story.title,
            deleted_by = %command.actor.user_id,
            "Story deleted"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::infrastructure::events::WsEvent;
    use crate::infrastructure::memory::InMemoryStoryLocks;
    use crate::infrastructure::persistence::sqlite::test_support::{
        seed_user, seed_user_with_role, setup_pool,
    };
    use crate::infrastructure::persistence::sqlite::{
        DbPool, SqliteCategoryRepository, SqliteStoryRepository, SqliteTagRepository,
    };

    struct Ctx {
        pool: DbPool,
        story_repo: Arc<dyn StoryRepositoryPort>,
        create: CreateStoryHandler,
        update: UpdateStoryHandler,
        author: Actor,
    }

    async fn ctx() -> Ctx {
        let pool = setup_pool().await;
        let author = seed_user(&pool, "writer").await;
        let story_repo: Arc<dyn StoryRepositoryPort> =
            Arc::new(SqliteStoryRepository::new(pool.clone()));

        Ctx {
            create: CreateStoryHandler::new(story_repo.clone()),
            update: UpdateStoryHandler::new(
                story_repo.clone(),
                Arc::new(SqliteCategoryRepository::new(pool.clone())),
                Arc::new(SqliteTagRepository::new(pool.clone())),
            ),
            story_repo,
            pool,
            author: Actor::new(author, Role::Author),
        }
    }

    fn create_cmd(actor: Actor, title: &str) -> CreateStory {
        CreateStory {
            actor,
            title: title.to_string(),
            brief: None,
        }
    }

    #[tokio::test]
    async fn test_create_assigns_unique_slugs() {
        let c = ctx().await;

        let first = c.create.handle(create_cmd(c.author, "About Cats")).await.unwrap();
        let second = c.create.handle(create_cmd(c.author, "About Cats")).await.unwrap();
        let third = c.create.handle(create_cmd(c.author, "about cats!")).await.unwrap();

        assert_eq!(first.slug, "about-cats");
        assert_eq!(second.slug, "about-cats-1");
        assert_eq!(third.slug, "about-cats-2");
        assert!(!first.is_published);
    }

    #[tokio::test]
    async fn test_reader_cannot_create_story() {
        let c = ctx().await;
        let reader = seed_user_with_role(&c.pool, "reader", "reader").await;

        let err = c
            .create
            .handle(create_cmd(Actor::new(reader, Role::Reader), "Nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_featured_requires_admin() {
        let c = ctx().await;
        let story = c.create.handle(create_cmd(c.author, "Tale")).await.unwrap();

        let mut cmd = UpdateStory::new(c.author, story.id);
        cmd.is_featured = Some(true);
        let err = c.update.handle(cmd).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Forbidden(_)));

        let admin = seed_user_with_role(&c.pool, "admin", "administrator").await;
        let mut cmd = UpdateStory::new(Actor::new(admin, Role::Administrator), story.id);
        cmd.is_featured = Some(true);
        cmd.is_published = Some(true);
        let updated = c.update.handle(cmd).await.unwrap();
        assert!(updated.is_featured);
        assert!(updated.is_published);
    }

    #[tokio::test]
    async fn test_update_tags_by_name_and_unknown_category() {
        let c = ctx().await;
        let story = c.create.handle(create_cmd(c.author, "Tale")).await.unwrap();

        let mut cmd = UpdateStory::new(c.author, story.id);
        cmd.tags = Some(vec![
            TagRef::Name("Dragons".to_string()),
            TagRef::Name("dragons".to_string()),
            TagRef::Name("Magic".to_string()),
        ]);
        c.update.handle(cmd).await.unwrap();

        let tags = c.story_repo.find_tags(story.id).await.unwrap();
        let mut names: Vec<String> = tags.into_iter().map(|t| t.name).collect();
        names.sort();
        assert_eq!(names, vec!["Dragons".to_string(), "Magic".to_string()]);

        // 未知分类时整个更新失败，标题保持不变
        let mut cmd = UpdateStory::new(c.author, story.id);
        cmd.title = Some("Renamed".to_string());
        cmd.categories = Some(vec![Uuid::new_v4()]);
        let err = c.update.handle(cmd).await.unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { resource_type: "Category", .. }));

        let unchanged = c.story_repo.find_by_id(story.id).await.unwrap().unwrap();
        assert_eq!(unchanged.title, "Tale");
    }

    #[tokio::test]
    async fn test_delete_story_publishes_and_forgets_lock() {
        let c = ctx().await;
        let story = c.create.handle(create_cmd(c.author, "Tale")).await.unwrap();

        let locks = InMemoryStoryLocks::new().arc();
        let publisher = EventPublisher::new().arc();
        let mut rx = publisher.subscribe_global();
        let handler = DeleteStoryHandler::new(c.story_repo.clone(), locks.clone(), publisher);

        let other = seed_user(&c.pool, "other").await;
        let err = handler
            .handle(DeleteStory {
                actor: Actor::new(other, Role::Author),
                story_id: story.id,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Forbidden(_)));

        handler
            .handle(DeleteStory {
                actor: c.author,
                story_id: story.id,
            })
            .await
            .unwrap();

        assert!(c.story_repo.find_by_id(story.id).await.unwrap().is_none());
        assert!(locks.is_empty());
        match rx.recv().await.unwrap() {
            WsEvent::StoryDeleted { story_id } => assert_eq!(story_id, story.id),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
