//! User HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    AuthorResponse, ChangeUserRole, GetMe, ListSavedStories, RegisterUser, SaveStory,
    SearchAuthors, StorySummaryResponse, UnsaveStory, UserResponse,
};
use crate::domain::Role;
use crate::infrastructure::http::auth::Caller;
use crate::infrastructure::http::dto::{ApiResponse, Empty, StoryIdRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct SearchAuthorsRequest {
    #[serde(default)]
    pub alias: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// 注册用户
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let command = RegisterUser {
        username: req.username,
        alias: req.alias,
        role: req.role,
    };

    let user = state.register_user_handler.handle(command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// 当前用户
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = state.get_me_handler.handle(GetMe { actor }).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// 修改用户角色（管理员）
pub async fn change_user_role(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let command = ChangeUserRole {
        actor,
        user_id: req.user_id,
        role: req.role,
    };

    let user = state.change_user_role_handler.handle(command).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// 按昵称搜索作者
pub async fn search_authors(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchAuthorsRequest>,
) -> Result<Json<ApiResponse<Vec<AuthorResponse>>>, ApiError> {
    let authors = state
        .search_authors_handler
        .handle(SearchAuthors { alias: req.alias })
        .await?;
    Ok(Json(ApiResponse::success(authors)))
}

/// 收藏的故事
pub async fn list_saved_stories(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
) -> Result<Json<ApiResponse<Vec<StorySummaryResponse>>>, ApiError> {
    let stories = state
        .list_saved_stories_handler
        .handle(ListSavedStories { actor })
        .await?;
    Ok(Json(ApiResponse::success(stories)))
}

/// 收藏故事
pub async fn save_story(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<StoryIdRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .save_story_handler
        .handle(SaveStory {
            actor,
            story_id: req.story_id,
        })
        .await?;
    Ok(Json(ApiResponse::ok()))
}

/// 取消收藏
pub async fn unsave_story(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<StoryIdRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .unsave_story_handler
        .handle(UnsaveStory {
            actor,
            story_id: req.story_id,
        })
        .await?;
    Ok(Json(ApiResponse::ok()))
}
