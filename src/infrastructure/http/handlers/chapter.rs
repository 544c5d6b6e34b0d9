//! Chapter HTTP Handlers
//!
//! 插入、移动、删除都经过章节顺序引擎；权限检查在调用引擎之前完成。

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    ChapterResponse, ChapterSummaryResponse, CreateChapter, DeleteChapter, DeleteChapterResponse,
    GetChapter, GetTableOfContents, MoveChapter, MoveChapterResponse, UpdateChapter,
};
use crate::infrastructure::http::auth::Caller;
use crate::infrastructure::http::dto::{ApiResponse, IdRequest, StoryIdRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateChapterRequest {
    pub story_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// 省略时追加到末尾
    pub position: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChapterRequest {
    pub id: Uuid,
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveChapterRequest {
    pub story_id: Uuid,
    pub chapter_id: Uuid,
    pub position: i64,
}

#[derive(Debug, Deserialize)]
pub struct DeleteChapterRequest {
    pub story_id: Uuid,
    pub chapter_id: Uuid,
}

// ============================================================================
// Handlers
// ============================================================================

/// 创建章节并插入目录
pub async fn create_chapter(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<CreateChapterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ChapterResponse>>), ApiError> {
    let command = CreateChapter {
        actor,
        story_id: req.story_id,
        title: req.title,
        body: req.body,
        position: req.position,
    };

    let chapter = state.create_chapter_handler.handle(command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(chapter))))
}

/// 修改章节标题/正文
pub async fn update_chapter(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<UpdateChapterRequest>,
) -> Result<Json<ApiResponse<ChapterResponse>>, ApiError> {
    let command = UpdateChapter {
        actor,
        chapter_id: req.id,
        title: req.title,
        body: req.body,
    };

    let chapter = state.update_chapter_handler.handle(command).await?;
    Ok(Json(ApiResponse::success(chapter)))
}

/// 移动章节
pub async fn move_chapter(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<MoveChapterRequest>,
) -> Result<Json<ApiResponse<MoveChapterResponse>>, ApiError> {
    let command = MoveChapter {
        actor,
        story_id: req.story_id,
        chapter_id: req.chapter_id,
        position: req.position,
    };

    let moved = state.move_chapter_handler.handle(command).await?;
    Ok(Json(ApiResponse::success(moved)))
}

/// 删除章节
pub async fn delete_chapter(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<DeleteChapterRequest>,
) -> Result<Json<ApiResponse<DeleteChapterResponse>>, ApiError> {
    let command = DeleteChapter {
        actor,
        story_id: req.story_id,
        chapter_id: req.chapter_id,
    };

    let removed = state.delete_chapter_handler.handle(command).await?;
    Ok(Json(ApiResponse::success(removed)))
}

/// 章节详情
pub async fn get_chapter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<ChapterResponse>>, ApiError> {
    let chapter = state
        .get_chapter_handler
        .handle(GetChapter { chapter_id: req.id })
        .await?;
    Ok(Json(ApiResponse::success(chapter)))
}

/// 故事目录
pub async fn table_of_contents(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StoryIdRequest>,
) -> Result<Json<ApiResponse<Vec<ChapterSummaryResponse>>>, ApiError> {
    let toc = state
        .get_toc_handler
        .handle(GetTableOfContents {
            story_id: req.story_id,
        })
        .await?;
    Ok(Json(ApiResponse::success(toc)))
}
