//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repository、OrderingStore、StoryLock）
//! - ordering: 章节顺序引擎
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ordering;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // User commands
    ChangeUserRole,
    RegisterUser,
    SaveStory,
    UnsaveStory,
    // Story commands
    CreateStory,
    DeleteStory,
    TagRef,
    UpdateStory,
    // Chapter commands
    CreateChapter,
    DeleteChapter,
    MoveChapter,
    UpdateChapter,
    // Taxonomy commands
    AddTag,
    CreateCategory,
    ParentChange,
    UpdateCategory,
    // Comment commands
    CreateComment,
    DeleteComment,
    // Handlers
    handlers::{
        AddTagHandler, ChangeUserRoleHandler, CreateCategoryHandler, CreateChapterHandler,
        CreateCommentHandler, CreateStoryHandler, DeleteChapterHandler, DeleteChapterResponse,
        DeleteCommentHandler, DeleteStoryHandler, MoveChapterHandler, MoveChapterResponse,
        RegisterUserHandler, SaveStoryHandler, UnsaveStoryHandler, UpdateCategoryHandler,
        UpdateChapterHandler, UpdateStoryHandler,
    },
};

pub use error::ApplicationError;

pub use ordering::{ChapterOrderingEngine, MoveOutcome, OrderingError, RetryPolicy};

pub use ports::{
    OrderingEntryRecord, OrderingStorePort, OrderingUnitOfWork, RepositoryError, StoryFilter,
    StoryGuard, StoryLockPort,
};

pub use queries::{
    // Story queries
    CheckStoryAuthor,
    GetStory,
    ListStories,
    SearchStories,
    // User queries
    GetMe,
    ListSavedStories,
    SearchAuthors,
    // Chapter queries
    GetChapter,
    GetTableOfContents,
    // Taxonomy queries
    GetCategory,
    ListCategories,
    ListTags,
    // Comment queries
    ListAllComments,
    ListMyComments,
    ListStoryComments,
    // Handlers
    handlers::{
        AuthorResponse, CategoryResponse, ChapterResponse, ChapterSummaryResponse,
        CheckStoryAuthorHandler, CommentResponse, GetCategoryHandler, GetChapterHandler,
        GetMeHandler, GetStoryHandler, GetTableOfContentsHandler, ListAllCommentsHandler,
        ListCategoriesHandler, ListMyCommentsHandler, ListSavedStoriesHandler,
        ListStoriesHandler, ListStoryCommentsHandler, ListTagsHandler, SearchAuthorsHandler,
        SearchStoriesHandler, StoryAuthorCheck, StoryDetailResponse, StoryResponse,
        StorySummaryResponse, TagResponse, UserResponse,
    },
};
