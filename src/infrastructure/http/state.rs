//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    AddTagHandler, ChangeUserRoleHandler, CreateCategoryHandler, CreateChapterHandler,
    CreateCommentHandler, CreateStoryHandler, DeleteChapterHandler, DeleteCommentHandler,
    DeleteStoryHandler, MoveChapterHandler, RegisterUserHandler, SaveStoryHandler,
    UnsaveStoryHandler, UpdateCategoryHandler, UpdateChapterHandler, UpdateStoryHandler,
    // Query handlers
    CheckStoryAuthorHandler, GetCategoryHandler, GetChapterHandler, GetMeHandler,
    GetStoryHandler, GetTableOfContentsHandler, ListAllCommentsHandler, ListCategoriesHandler,
    ListMyCommentsHandler, ListSavedStoriesHandler, ListStoriesHandler,
    ListStoryCommentsHandler, ListTagsHandler, SearchAuthorsHandler, SearchStoriesHandler,
    // Engine & ports
    ChapterOrderingEngine, StoryLockPort,
};
use crate::application::ports::{
    CategoryRepositoryPort, ChapterRepositoryPort, CommentRepositoryPort, StoryRepositoryPort,
    TagRepositoryPort, UserRepositoryPort,
};
use crate::infrastructure::events::EventPublisher;

/// 仓储端口集合
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepositoryPort>,
    pub stories: Arc<dyn StoryRepositoryPort>,
    pub chapters: Arc<dyn ChapterRepositoryPort>,
    pub categories: Arc<dyn CategoryRepositoryPort>,
    pub tags: Arc<dyn TagRepositoryPort>,
    pub comments: Arc<dyn CommentRepositoryPort>,
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub user_repo: Arc<dyn UserRepositoryPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub register_user_handler: RegisterUserHandler,
    pub change_user_role_handler: ChangeUserRoleHandler,
    pub save_story_handler: SaveStoryHandler,
    pub unsave_story_handler: UnsaveStoryHandler,
    pub create_story_handler: CreateStoryHandler,
    pub update_story_handler: UpdateStoryHandler,
    pub delete_story_handler: DeleteStoryHandler,
    pub create_chapter_handler: CreateChapterHandler,
    pub update_chapter_handler: UpdateChapterHandler,
    pub move_chapter_handler: MoveChapterHandler,
    pub delete_chapter_handler: DeleteChapterHandler,
    pub create_category_handler: CreateCategoryHandler,
    pub update_category_handler: UpdateCategoryHandler,
    pub add_tag_handler: AddTagHandler,
    pub create_comment_handler: CreateCommentHandler,
    pub delete_comment_handler: DeleteCommentHandler,

    // ========== Query Handlers ==========
    pub get_me_handler: GetMeHandler,
    pub search_authors_handler: SearchAuthorsHandler,
    pub list_saved_stories_handler: ListSavedStoriesHandler,
    pub get_story_handler: GetStoryHandler,
    pub list_stories_handler: ListStoriesHandler,
    pub search_stories_handler: SearchStoriesHandler,
    pub check_story_author_handler: CheckStoryAuthorHandler,
    pub get_chapter_handler: GetChapterHandler,
    pub get_toc_handler: GetTableOfContentsHandler,
    pub list_categories_handler: ListCategoriesHandler,
    pub get_category_handler: GetCategoryHandler,
    pub list_tags_handler: ListTagsHandler,
    pub list_story_comments_handler: ListStoryCommentsHandler,
    pub list_my_comments_handler: ListMyCommentsHandler,
    pub list_all_comments_handler: ListAllCommentsHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        repos: Repositories,
        engine: Arc<ChapterOrderingEngine>,
        locks: Arc<dyn StoryLockPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        let Repositories {
            users,
            stories,
            chapters,
            categories,
            tags,
            comments,
        } = repos;

        Self {
            // Ports
            user_repo: users.clone(),
            event_publisher: event_publisher.clone(),

            // Command handlers
            register_user_handler: RegisterUserHandler::new(users.clone()),
            change_user_role_handler: ChangeUserRoleHandler::new(users.clone()),
            save_story_handler: SaveStoryHandler::new(users.clone(), stories.clone()),
            unsave_story_handler: UnsaveStoryHandler::new(users.clone()),
            create_story_handler: CreateStoryHandler::new(stories.clone()),
            update_story_handler: UpdateStoryHandler::new(
                stories.clone(),
                categories.clone(),
                tags.clone(),
            ),
            delete_story_handler: DeleteStoryHandler::new(
                stories.clone(),
                locks,
                event_publisher.clone(),
            ),
            create_chapter_handler: CreateChapterHandler::new(
                stories.clone(),
                chapters.clone(),
                engine.clone(),
                event_publisher.clone(),
            ),
            update_chapter_handler: UpdateChapterHandler::new(
                stories.clone(),
                chapters.clone(),
                engine.clone(),
            ),
            move_chapter_handler: MoveChapterHandler::new(
                stories.clone(),
                engine.clone(),
                event_publisher.clone(),
            ),
            delete_chapter_handler: DeleteChapterHandler::new(
                stories.clone(),
                engine.clone(),
                event_publisher.clone(),
            ),
            create_category_handler: CreateCategoryHandler::new(categories.clone()),
            update_category_handler: UpdateCategoryHandler::new(categories.clone()),
            add_tag_handler: AddTagHandler::new(tags.clone()),
            create_comment_handler: CreateCommentHandler::new(stories.clone(), comments.clone()),
            delete_comment_handler: DeleteCommentHandler::new(comments.clone()),

            // Query handlers
            get_me_handler: GetMeHandler::new(users.clone()),
            search_authors_handler: SearchAuthorsHandler::new(users.clone()),
            list_saved_stories_handler: ListSavedStoriesHandler::new(
                users,
                stories.clone(),
                chapters.clone(),
            ),
            get_story_handler: GetStoryHandler::new(
                stories.clone(),
                chapters.clone(),
                categories.clone(),
                comments.clone(),
            ),
            list_stories_handler: ListStoriesHandler::new(stories.clone(), chapters.clone()),
            search_stories_handler: SearchStoriesHandler::new(stories.clone(), chapters.clone()),
            check_story_author_handler: CheckStoryAuthorHandler::new(stories.clone()),
            get_chapter_handler: GetChapterHandler::new(chapters.clone(), engine),
            get_toc_handler: GetTableOfContentsHandler::new(stories.clone(), chapters),
            list_categories_handler: ListCategoriesHandler::new(categories.clone()),
            get_category_handler: GetCategoryHandler::new(categories),
            list_tags_handler: ListTagsHandler::new(tags),
            list_story_comments_handler: ListStoryCommentsHandler::new(stories, comments.clone()),
            list_my_comments_handler: ListMyCommentsHandler::new(comments.clone()),
            list_all_comments_handler: ListAllCommentsHandler::new(comments),
        }
    }
}
