//! Comment HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    CommentResponse, CreateComment, DeleteComment, ListAllComments, ListMyComments,
    ListStoryComments,
};
use crate::infrastructure::http::auth::Caller;
use crate::infrastructure::http::dto::{ApiResponse, Empty, IdRequest, StoryIdRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub story_id: Uuid,
    pub body: String,
}

/// 故事的评论
pub async fn list_story_comments(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StoryIdRequest>,
) -> Result<Json<ApiResponse<Vec<CommentResponse>>>, ApiError> {
    let comments = state
        .list_story_comments_handler
        .handle(ListStoryComments {
            story_id: req.story_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(comments)))
}

/// 发表评论
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CommentResponse>>), ApiError> {
    let comment = state
        .create_comment_handler
        .handle(CreateComment {
            actor,
            story_id: req.story_id,
            body: req.body,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}

/// 删除评论
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .delete_comment_handler
        .handle(DeleteComment {
            actor,
            comment_id: req.id,
        })
        .await?;
    Ok(Json(ApiResponse::ok()))
}

/// 我的评论
pub async fn list_my_comments(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
) -> Result<Json<ApiResponse<Vec<CommentResponse>>>, ApiError> {
    let comments = state
        .list_my_comments_handler
        .handle(ListMyComments { actor })
        .await?;
    Ok(Json(ApiResponse::success(comments)))
}

/// 全部评论（管理员，新的在前）
pub async fn list_all_comments(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
) -> Result<Json<ApiResponse<Vec<CommentResponse>>>, ApiError> {
    let comments = state
        .list_all_comments_handler
        .handle(ListAllComments { actor })
        .await?;
    Ok(Json(ApiResponse::success(comments)))
}
