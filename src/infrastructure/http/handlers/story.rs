//! Story HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    CheckStoryAuthor, CreateStory, DeleteStory, GetStory, ListStories, SearchStories,
    StoryAuthorCheck, StoryDetailResponse, StoryFilter, StoryResponse, StorySummaryResponse,
    TagRef, UpdateStory,
};
use crate::domain::Actor;
use crate::infrastructure::http::auth::Caller;
use crate::infrastructure::http::dto::{ApiResponse, IdRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateStoryRequest {
    pub title: String,
    pub brief: Option<String>,
}

/// 标签：已有标签的 ID，或 `{"name": ...}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TagInput {
    Id(Uuid),
    Named { name: String },
}

impl From<TagInput> for TagRef {
    fn from(input: TagInput) -> Self {
        match input {
            TagInput::Id(id) => TagRef::Id(id),
            TagInput::Named { name } => TagRef::Name(name),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStoryRequest {
    pub id: Uuid,
    pub title: Option<String>,
    pub brief: Option<String>,
    pub is_published: Option<bool>,
    pub has_chapters: Option<bool>,
    pub is_featured: Option<bool>,
    pub tags: Option<Vec<TagInput>>,
    pub categories: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
pub struct MyStoriesRequest {
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct AllStoriesRequest {
    pub alias: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteStoryResponse {
    pub id: Uuid,
}

// ============================================================================
// Handlers
// ============================================================================

/// 创建故事
pub async fn create_story(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<CreateStoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StoryResponse>>), ApiError> {
    let command = CreateStory {
        actor,
        title: req.title,
        brief: req.brief,
    };

    let story = state.create_story_handler.handle(command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(story))))
}

/// 更新故事
pub async fn update_story(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<UpdateStoryRequest>,
) -> Result<Json<ApiResponse<StoryResponse>>, ApiError> {
    let mut command = UpdateStory::new(actor, req.id);
    command.title = req.title;
    command.brief = req.brief;
    command.is_published = req.is_published;
    command.has_chapters = req.has_chapters;
    command.is_featured = req.is_featured;
    command.tags = req
        .tags
        .map(|tags| tags.into_iter().map(TagRef::from).collect());
    command.categories = req.categories;

    let story = state.update_story_handler.handle(command).await?;
    Ok(Json(ApiResponse::success(story)))
}

/// 删除故事
pub async fn delete_story(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<DeleteStoryResponse>>, ApiError> {
    state
        .delete_story_handler
        .handle(DeleteStory {
            actor,
            story_id: req.id,
        })
        .await?;
    Ok(Json(ApiResponse::success(DeleteStoryResponse { id: req.id })))
}

/// 故事详情
pub async fn get_story(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<StoryDetailResponse>>, ApiError> {
    let story = state
        .get_story_handler
        .handle(GetStory { story_id: req.id })
        .await?;
    Ok(Json(ApiResponse::success(story)))
}

async fn list_with(
    state: &AppState,
    actor: Option<Actor>,
    filter: StoryFilter,
) -> Result<Json<ApiResponse<Vec<StorySummaryResponse>>>, ApiError> {
    let stories = state
        .list_stories_handler
        .handle(ListStories { actor, filter })
        .await?;
    Ok(Json(ApiResponse::success(stories)))
}

/// 已发布的故事
pub async fn list_published(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<StorySummaryResponse>>>, ApiError> {
    list_with(&state, None, StoryFilter::Published).await
}

/// 推荐故事
pub async fn list_featured(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<StorySummaryResponse>>>, ApiError> {
    list_with(&state, None, StoryFilter::Featured).await
}

/// 我的故事（`draft` 为 true 时返回草稿）
pub async fn list_mine(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<MyStoriesRequest>,
) -> Result<Json<ApiResponse<Vec<StorySummaryResponse>>>, ApiError> {
    let filter = StoryFilter::Owned {
        user_id: actor.user_id,
        drafts: req.draft,
    };
    list_with(&state, Some(actor), filter).await
}

/// 全部故事（管理员）
pub async fn list_all(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<AllStoriesRequest>,
) -> Result<Json<ApiResponse<Vec<StorySummaryResponse>>>, ApiError> {
    let alias_contains = req.alias.filter(|a| !a.trim().is_empty());
    list_with(&state, Some(actor), StoryFilter::All { alias_contains }).await
}

/// 某分类下的故事
pub async fn list_by_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<Vec<StorySummaryResponse>>>, ApiError> {
    list_with(&state, None, StoryFilter::ByCategory(req.id)).await
}

/// 某标签下的故事
pub async fn list_by_tag(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<Vec<StorySummaryResponse>>>, ApiError> {
    list_with(&state, None, StoryFilter::ByTag(req.id)).await
}

/// 某作者的故事
pub async fn list_by_author(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<Vec<StorySummaryResponse>>>, ApiError> {
    list_with(&state, None, StoryFilter::ByAuthor(req.id)).await
}

/// 搜索故事
pub async fn search_stories(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<ApiResponse<Vec<StorySummaryResponse>>>, ApiError> {
    let stories = state
        .search_stories_handler
        .handle(SearchStories { query: req.q })
        .await?;
    Ok(Json(ApiResponse::success(stories)))
}

/// 调用者是否为作者
pub async fn check_author(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<StoryAuthorCheck>>, ApiError> {
    let check = state
        .check_story_author_handler
        .handle(CheckStoryAuthor {
            actor,
            story_id: req.id,
        })
        .await?;
    Ok(Json(ApiResponse::success(check)))
}
