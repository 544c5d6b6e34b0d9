//! Chapter Command Handlers
//!
//! 章节内容写在 chapters 表，位置变化全部经过 [`ChapterOrderingEngine`]。

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{CreateChapter, DeleteChapter, MoveChapter, UpdateChapter};
use crate::application::error::ApplicationError;
use crate::application::ordering::ChapterOrderingEngine;
use crate::application::ports::{
    ChapterRecord, ChapterRepositoryPort, StoryRecord, StoryRepositoryPort,
};
use crate::application::queries::handlers::ChapterResponse;
use crate::domain::story::{ChapterBody, ChapterTitle};
use crate::domain::Actor;
use crate::infrastructure::events::EventPublisher;

/// 移动结果
#[derive(Debug, Clone, Serialize)]
pub struct MoveChapterResponse {
    pub story_id: Uuid,
    pub chapter_id: Uuid,
    pub from: i64,
    pub to: i64,
}

/// 删除结果
#[derive(Debug, Clone, Serialize)]
pub struct DeleteChapterResponse {
    pub story_id: Uuid,
    pub chapter_id: Uuid,
    /// 删除前的位置
    pub order: i64,
}

/// 加载故事并检查管理权限（在调用顺序引擎之前）
async fn authorize_story(
    story_repo: &dyn StoryRepositoryPort,
    actor: &Actor,
    story_id: Uuid,
) -> Result<StoryRecord, ApplicationError> {
    let story = story_repo
        .find_by_id(story_id)
        .await?
        .ok_or_else(|| ApplicationError::not_found("Story", story_id))?;

    if !actor.can_manage_story(story.user_id) {
        return Err(ApplicationError::forbidden(
            "Not allowed to change chapters of this story",
        ));
    }
    Ok(story)
}

// ============================================================================
// CreateChapter
// ============================================================================

/// CreateChapter Handler - 创建章节并插入目录
pub struct CreateChapterHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    engine: Arc<ChapterOrderingEngine>,
    event_publisher: Arc<EventPublisher>,
}

impl CreateChapterHandler {
    pub fn new(
        story_repo: Arc<dyn StoryRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        engine: Arc<ChapterOrderingEngine>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            story_repo,
            chapter_repo,
            engine,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: CreateChapter) -> Result<ChapterResponse, ApplicationError> {
        let story =
            authorize_story(self.story_repo.as_ref(), &command.actor, command.story_id).await?;

        let title = ChapterTitle::new(command.title)?;
        let body = ChapterBody::new(command.body)?;
        if let Some(pos) = command.position {
            if pos < 0 {
                return Err(ApplicationError::validation(format!(
                    "Invalid position: {}",
                    pos
                )));
            }
        }

        let now = Utc::now();
        let chapter = ChapterRecord {
            id: Uuid::new_v4(),
            title: title.into_inner(),
            body: body.into_inner(),
            user_id: command.actor.user_id,
            created_at: now,
            modified_at: now,
        };
        self.chapter_repo.save(&chapter).await?;

        // 未指定位置时追加到末尾（超出范围的位置会被收敛到末尾）
        let position = command.position.unwrap_or(i64::MAX);
        let entry = match self.engine.insert(story.id, chapter.id, position).await {
            Ok(entry) => entry,
            Err(e) => {
                // 插入失败则撤销章节，避免留下孤儿章节
                if let Err(cleanup) = self.chapter_repo.delete(chapter.id).await {
                    tracing::error!(
                        chapter_id = %chapter.id,
                        error = %cleanup,
                        "Failed to remove chapter after insert failure"
                    );
                }
                return Err(e.into());
            }
        };

        self.event_publisher
            .publish_chapter_added(story.id, chapter.id, entry.order);

        Ok(ChapterResponse::new(
            chapter,
            Some(entry.story_id),
            Some(entry.order),
        ))
    }
}

// ============================================================================
// UpdateChapter
// ============================================================================

/// UpdateChapter Handler - 修改标题/正文（不影响位置）
pub struct UpdateChapterHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    engine: Arc<ChapterOrderingEngine>,
}

impl UpdateChapterHandler {
    pub fn new(
        story_repo: Arc<dyn StoryRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        engine: Arc<ChapterOrderingEngine>,
    ) -> Self {
        Self {
            story_repo,
            chapter_repo,
            engine,
        }
    }

    pub async fn handle(&self, command: UpdateChapter) -> Result<ChapterResponse, ApplicationError> {
        let mut chapter = self
            .chapter_repo
            .find_by_id(command.chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", command.chapter_id))?;

        let position = self.engine.position_of(chapter.id).await?;
        match &position {
            Some(entry) => {
                authorize_story(self.story_repo.as_ref(), &command.actor, entry.story_id).await?;
            }
            // 孤儿章节只有章节作者或管理员可改
            None if !command.actor.owns_or_admin(chapter.user_id) => {
                return Err(ApplicationError::forbidden("Not allowed to edit this chapter"));
            }
            None => {}
        }

        if let Some(title) = command.title {
            chapter.title = ChapterTitle::new(title)?.into_inner();
        }
        if let Some(body) = command.body {
            chapter.body = ChapterBody::new(body)?.into_inner();
        }
        chapter.modified_at = Utc::now();

        self.chapter_repo.save(&chapter).await?;

        tracing::info!(chapter_id = %chapter.id, "Chapter updated");

        Ok(ChapterResponse::new(
            chapter,
            position.as_ref().map(|p| p.story_id),
            position.map(|p| p.order),
        ))
    }
}

// ============================================================================
// MoveChapter
// ============================================================================

/// MoveChapter Handler
pub struct MoveChapterHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    engine: Arc<ChapterOrderingEngine>,
    event_publisher: Arc<EventPublisher>,
}

impl MoveChapterHandler {
    pub fn new(
        story_repo: Arc<dyn StoryRepositoryPort>,
        engine: Arc<ChapterOrderingEngine>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            story_repo,
            engine,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: MoveChapter) -> Result<MoveChapterResponse, ApplicationError> {
        authorize_story(self.story_repo.as_ref(), &command.actor, command.story_id).await?;

        let outcome = self
            .engine
            .move_to(command.story_id, command.chapter_id, command.position)
            .await?;

        if outcome.moved() {
            self.event_publisher.publish_chapter_moved(
                command.story_id,
                command.chapter_id,
                outcome.previous_order,
                outcome.entry.order,
            );
        }

        Ok(MoveChapterResponse {
            story_id: command.story_id,
            chapter_id: command.chapter_id,
            from: outcome.previous_order,
            to: outcome.entry.order,
        })
    }
}

// ============================================================================
// DeleteChapter
// ============================================================================

/// DeleteChapter Handler - 移出目录并删除章节
pub struct DeleteChapterHandler {
    story_repo: Arc<dyn StoryRepositoryPort>,
    engine: Arc<ChapterOrderingEngine>,
    event_publisher: Arc<EventPublisher>,
}

impl DeleteChapterHandler {
    pub fn new(
        story_repo: Arc<dyn StoryRepositoryPort>,
        engine: Arc<ChapterOrderingEngine>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            story_repo,
            engine,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        command: DeleteChapter,
    ) -> Result<DeleteChapterResponse, ApplicationError> {
        authorize_story(self.story_repo.as_ref(), &command.actor, command.story_id).await?;

        // 条目与章节行同一事务删除；孤儿章节返回错误，章节本身保留
        let removed = self
            .engine
            .delete_chapter(command.story_id, command.chapter_id)
            .await?;

        self.event_publisher.publish_chapter_removed(
            command.story_id,
            command.chapter_id,
            removed.order,
        );

        tracing::info!(
            story_id = %command.story_id,
            chapter_id = %command.chapter_id,
            deleted_by = %command.actor.user_id,
            "Chapter deleted"
        );

        Ok(DeleteChapterResponse {
            story_id: command.story_id,
            chapter_id: command.chapter_id,
            order: removed.order,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{OrderingStorePort, RepositoryError};
    use crate::domain::Role;
    use crate::infrastructure::memory::InMemoryStoryLocks;
    use crate::infrastructure::persistence::sqlite::test_support::{
        seed_story, seed_user, seed_user_with_role, setup_pool,
    };
    use crate::infrastructure::persistence::sqlite::{
        DbPool, SqliteChapterRepository, SqliteOrderingStore, SqliteStoryRepository,
    };

    struct Ctx {
        pool: DbPool,
        create: CreateChapterHandler,
        update: UpdateChapterHandler,
        moving: MoveChapterHandler,
        delete: DeleteChapterHandler,
        store: Arc<SqliteOrderingStore>,
        owner: Actor,
        story_id: Uuid,
    }

    async fn ctx() -> Ctx {
        let pool = setup_pool().await;
        let owner_id = seed_user(&pool, "owner").await;
        let story_id = seed_story(&pool, owner_id, "tale").await;

        let story_repo: Arc<dyn StoryRepositoryPort> =
            Arc::new(SqliteStoryRepository::new(pool.clone()));
        let chapter_repo: Arc<dyn ChapterRepositoryPort> =
            Arc::new(SqliteChapterRepository::new(pool.clone()));
        let store = Arc::new(SqliteOrderingStore::new(pool.clone()));
        let engine = Arc::new(ChapterOrderingEngine::new(
            store.clone(),
            Arc::new(InMemoryStoryLocks::new()),
        ));
        let publisher = EventPublisher::new().arc();

        Ctx {
            create: CreateChapterHandler::new(
                story_repo.clone(),
                chapter_repo.clone(),
                engine.clone(),
                publisher.clone(),
            ),
            update: UpdateChapterHandler::new(story_repo.clone(), chapter_repo.clone(), engine.clone()),
            moving: MoveChapterHandler::new(story_repo.clone(), engine.clone(), publisher.clone()),
            delete: DeleteChapterHandler::new(story_repo, engine, publisher),
            pool,
            store,
            owner: Actor::new(owner_id, Role::Author),
            story_id,
        }
    }

    fn create_cmd(actor: Actor, story_id: Uuid, title: &str, position: Option<i64>) -> CreateChapter {
        CreateChapter {
            actor,
            story_id,
            title: title.to_string(),
            body: format!("{} body", title),
            position,
        }
    }

    async fn chapter_count(pool: &DbPool) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chapters")
            .fetch_one(pool)
            .await
            .unwrap();
        count
    }

    #[tokio::test]
    async fn test_create_appends_by_default() {
        let c = ctx().await;

        let a = c.create.handle(create_cmd(c.owner, c.story_id, "A", None)).await.unwrap();
        let b = c.create.handle(create_cmd(c.owner, c.story_id, "B", None)).await.unwrap();
        let first = c
            .create
            .handle(create_cmd(c.owner, c.story_id, "Prologue", Some(0)))
            .await
            .unwrap();

        assert_eq!(a.order, Some(0));
        assert_eq!(b.order, Some(1));
        assert_eq!(first.order, Some(0));

        let toc = c.store.list_by_story(c.story_id).await.unwrap();
        let ids: Vec<Uuid> = toc.iter().map(|e| e.chapter_id).collect();
        assert_eq!(ids, vec![first.id, a.id, b.id]);
    }

    #[tokio::test]
    async fn test_create_rejects_html_and_negative_position() {
        let c = ctx().await;

        let mut cmd = create_cmd(c.owner, c.story_id, "A", None);
        cmd.body = "<p>hello</p>".to_string();
        let err = c.create.handle(cmd).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));

        let err = c
            .create
            .handle(create_cmd(c.owner, c.story_id, "A", Some(-2)))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));
        assert_eq!(chapter_count(&c.pool).await, 0);
    }

    #[tokio::test]
    async fn test_create_requires_story_owner() {
        let c = ctx().await;
        let stranger = seed_user(&c.pool, "stranger").await;
        let reader = seed_user_with_role(&c.pool, "reader", "reader").await;

        let err = c
            .create
            .handle(create_cmd(Actor::new(stranger, Role::Author), c.story_id, "A", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Forbidden(_)));

        let err = c
            .create
            .handle(create_cmd(Actor::new(reader, Role::Reader), c.story_id, "A", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Forbidden(_)));

        // 管理员可以操作任何故事
        let admin = seed_user_with_role(&c.pool, "admin", "administrator").await;
        c.create
            .handle(create_cmd(Actor::new(admin, Role::Administrator), c.story_id, "A", None))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_on_missing_story() {
        let c = ctx().await;
        let err = c
            .create
            .handle(create_cmd(c.owner, Uuid::new_v4(), "A", None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { resource_type: "Story", .. }));
    }

    #[tokio::test]
    async fn test_create_removes_chapter_when_insert_fails() {
        let c = ctx().await;
        c.create.handle(create_cmd(c.owner, c.story_id, "A", None)).await.unwrap();

        // 模拟插入阶段失败：故事在授权之后被删除
        let story_repo = SqliteStoryRepository::new(c.pool.clone());
        let vanishing = seed_story(&c.pool, c.owner.user_id, "vanishing").await;
        let handler_story_repo: Arc<dyn StoryRepositoryPort> = Arc::new(VanishingStoryRepo {
            inner: story_repo,
            pool: c.pool.clone(),
        });
        let engine = Arc::new(ChapterOrderingEngine::new(
            c.store.clone(),
            Arc::new(InMemoryStoryLocks::new()),
        ));
        let handler = CreateChapterHandler::new(
            handler_story_repo,
            Arc::new(SqliteChapterRepository::new(c.pool.clone())),
            engine,
            EventPublisher::new().arc(),
        );

        let err = handler
            .handle(create_cmd(c.owner, vanishing, "B", None))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::NotFound { resource_type: "Story", .. }));
        assert_eq!(chapter_count(&c.pool).await, 1);
    }

    /// 返回故事后立即把它从数据库删掉
    struct VanishingStoryRepo {
        inner: SqliteStoryRepository,
        pool: DbPool,
    }

    #[async_trait::async_trait]
    impl StoryRepositoryPort for VanishingStoryRepo {
        async fn save(&self, story: &StoryRecord) -> Result<(), RepositoryError> {
            self.inner.save(story).await
        }
        async fn find_by_id(&self, id: Uuid) -> Result<Option<StoryRecord>, RepositoryError> {
            let found = self.inner.find_by_id(id).await?;
            sqlx::query("DELETE FROM stories WHERE id = ?")
                .bind(id.to_string())
                .execute(&self.pool)
                .await
                .unwrap();
            Ok(found)
        }
        async fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
            self.inner.slug_exists(slug).await
        }
        async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
            self.inner.delete(id).await
        }
        async fn find(
            &self,
            filter: &crate::application::ports::StoryFilter,
        ) -> Result<Vec<StoryRecord>, RepositoryError> {
            self.inner.find(filter).await
        }
        async fn search(&self, query: &str) -> Result<Vec<StoryRecord>, RepositoryError> {
            self.inner.search(query).await
        }
        async fn set_tags(&self, story_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepositoryError> {
            self.inner.set_tags(story_id, tag_ids).await
        }
        async fn set_categories(
            &self,
            story_id: Uuid,
            category_ids: &[Uuid],
        ) -> Result<(), RepositoryError> {
            self.inner.set_categories(story_id, category_ids).await
        }
        async fn find_tags(
            &self,
            story_id: Uuid,
        ) -> Result<Vec<crate::application::ports::TagRecord>, RepositoryError> {
            self.inner.find_tags(story_id).await
        }
        async fn find_categories(
            &self,
            story_id: Uuid,
        ) -> Result<Vec<crate::application::ports::CategoryRecord>, RepositoryError> {
            self.inner.find_categories(story_id).await
        }
    }

    #[tokio::test]
    async fn test_move_and_delete_flow() {
        let c = ctx().await;
        let a = c.create.handle(create_cmd(c.owner, c.story_id, "A", None)).await.unwrap();
        let b = c.create.handle(create_cmd(c.owner, c.story_id, "B", None)).await.unwrap();
        let cc = c.create.handle(create_cmd(c.owner, c.story_id, "C", None)).await.unwrap();

        let moved = c
            .moving
            .handle(MoveChapter {
                actor: c.owner,
                story_id: c.story_id,
                chapter_id: cc.id,
                position: 0,
            })
            .await
            .unwrap();
        assert_eq!((moved.from, moved.to), (2, 0));

        let removed = c
            .delete
            .handle(DeleteChapter {
                actor: c.owner,
                story_id: c.story_id,
                chapter_id: a.id,
            })
            .await
            .unwrap();
        assert_eq!(removed.order, 1);

        let toc = c.store.list_by_story(c.story_id).await.unwrap();
        let seq: Vec<(Uuid, i64)> = toc.iter().map(|e| (e.chapter_id, e.order)).collect();
        assert_eq!(seq, vec![(cc.id, 0), (b.id, 1)]);
        assert_eq!(chapter_count(&c.pool).await, 2);
    }

    #[tokio::test]
    async fn test_delete_orphan_keeps_chapter_row() {
        let c = ctx().await;
        let a = c.create.handle(create_cmd(c.owner, c.story_id, "A", None)).await.unwrap();
        let other = seed_story(&c.pool, c.owner.user_id, "other").await;

        let err = c
            .delete
            .handle(DeleteChapter {
                actor: c.owner,
                story_id: other,
                chapter_id: a.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ValidationError(_)));
        assert_eq!(chapter_count(&c.pool).await, 1);
        assert_eq!(c.store.list_by_story(c.story_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_position() {
        let c = ctx().await;
        c.create.handle(create_cmd(c.owner, c.story_id, "A", None)).await.unwrap();
        let b = c.create.handle(create_cmd(c.owner, c.story_id, "B", None)).await.unwrap();

        let updated = c
            .update
            .handle(UpdateChapter {
                actor: c.owner,
                chapter_id: b.id,
                title: Some("B, revised".to_string()),
                body: None,
            })
            .await
            .unwrap();

        assert_eq!(updated.title, "B, revised");
        assert_eq!(updated.body, "B body");
        assert_eq!(updated.order, Some(1));

        let stranger = seed_user(&c.pool, "stranger").await;
        let err = c
            .update
            .handle(UpdateChapter {
                actor: Actor::new(stranger, Role::Author),
                chapter_id: b.id,
                title: Some("hijack".to_string()),
                body: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Forbidden(_)));
    }
}
