//! Category / Tag HTTP Handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    AddTag, CategoryResponse, CreateCategory, GetCategory, ListCategories, ListTags,
    ParentChange, TagResponse, UpdateCategory,
};
use crate::infrastructure::http::auth::Caller;
use crate::infrastructure::http::dto::{ApiResponse, IdRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    /// 为 true 时把分类移到根上（优先于 parent_id）
    #[serde(default)]
    pub clear_parent: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct TagListParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddTagRequest {
    pub name: String,
}

// ============================================================================
// Category handlers
// ============================================================================

/// 列出全部分类
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CategoryResponse>>>, ApiError> {
    let categories = state.list_categories_handler.handle(ListCategories).await?;
    Ok(Json(ApiResponse::success(categories)))
}

/// 分类详情
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdRequest>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ApiError> {
    let category = state
        .get_category_handler
        .handle(GetCategory {
            category_id: req.id,
        })
        .await?;
    Ok(Json(ApiResponse::success(category)))
}

/// 创建分类（管理员）
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ApiError> {
    let command = CreateCategory {
        actor,
        name: req.name,
        description: req.description,
        parent_id: req.parent_id,
    };

    let category = state.create_category_handler.handle(command).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(category))))
}

/// 更新分类（管理员）
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ApiError> {
    let parent = match (req.clear_parent, req.parent_id) {
        (true, _) => ParentChange::Clear,
        (false, Some(id)) => ParentChange::Set(id),
        (false, None) => ParentChange::Keep,
    };
    let command = UpdateCategory {
        actor,
        category_id: req.id,
        name: req.name,
        description: req.description,
        parent,
    };

    let category = state.update_category_handler.handle(command).await?;
    Ok(Json(ApiResponse::success(category)))
}

// ============================================================================
// Tag handlers
// ============================================================================

/// 列出/搜索标签：`GET /api/tag/list?q=...`
pub async fn list_tags(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TagListParams>,
) -> Result<Json<ApiResponse<Vec<TagResponse>>>, ApiError> {
    let query = params.q.filter(|q| !q.trim().is_empty());
    let tags = state.list_tags_handler.handle(ListTags { query }).await?;
    Ok(Json(ApiResponse::success(tags)))
}

/// 添加标签（管理员，已存在时返回原标签）
pub async fn add_tag(
    State(state): State<Arc<AppState>>,
    Caller(actor): Caller,
    Json(req): Json<AddTagRequest>,
) -> Result<Json<ApiResponse<TagResponse>>, ApiError> {
    let tag = state
        .add_tag_handler
        .handle(AddTag {
            actor,
            name: req.name,
        })
        .await?;
    Ok(Json(ApiResponse::success(tag)))
}
