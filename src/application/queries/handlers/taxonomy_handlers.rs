//! Category / Tag Query Handlers

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    CategoryRecord, CategoryRepositoryPort, TagRecord, TagRepositoryPort,
};
use crate::application::queries::{GetCategory, ListCategories, ListTags};
use crate::domain::taxonomy::category_path;

// ============================================================================
// Response DTOs
// ============================================================================

/// 分类响应
#[derive(Debug, Clone, Serialize)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub parent_name: Option<String>,
    /// 自根到当前分类，如 `Fantasy > Epic`
    pub path: String,
    pub created_at: String,
    pub modified_at: String,
}

/// 标签响应
#[derive(Debug, Clone, Serialize)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<TagRecord> for TagResponse {
    fn from(record: TagRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
        }
    }
}

/// 分类的祖先链（自下而上，含 `start` 本身）
pub(crate) async fn ancestor_chain(
    repo: &dyn CategoryRepositoryPort,
    start: Uuid,
) -> Result<Vec<CategoryRecord>, ApplicationError> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(start);

    while let Some(id) = current {
        if !seen.insert(id) {
            // 已存在的环，数据损坏时也不会死循环
            tracing::warn!(category_id = %id, "Category cycle detected in stored data");
            break;
        }
        match repo.find_by_id(id).await? {
            Some(record) => {
                current = record.parent_id;
                chain.push(record);
            }
            None => break,
        }
    }

    Ok(chain)
}

/// 组装分类响应（父名与路径）
pub(crate) async fn describe_category(
    repo: &dyn CategoryRepositoryPort,
    record: CategoryRecord,
) -> Result<CategoryResponse, ApplicationError> {
    let ancestors = match record.parent_id {
        Some(parent_id) => ancestor_chain(repo, parent_id).await?,
        None => Vec::new(),
    };

    let mut names: Vec<String> = ancestors.iter().rev().map(|c| c.name.clone()).collect();
    names.push(record.name.clone());

    Ok(CategoryResponse {
        id: record.id,
        parent_name: ancestors.first().map(|p| p.name.clone()),
        path: category_path(&names),
        name: record.name,
        description: record.description,
        parent_id: record.parent_id,
        created_at: record.created_at.to_rfc3339(),
        modified_at: record.modified_at.to_rfc3339(),
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// ListCategories Handler
pub struct ListCategoriesHandler {
    category_repo: Arc<dyn CategoryRepositoryPort>,
}

impl ListCategoriesHandler {
    pub fn new(category_repo: Arc<dyn CategoryRepositoryPort>) -> Self {
        Self { category_repo }
    }

    pub async fn handle(
        &self,
        _query: ListCategories,
    ) -> Result<Vec<CategoryResponse>, ApplicationError> {
        let records = self.category_repo.find_all().await?;

        let mut responses = Vec::with_capacity(records.len());
        for record in records {
            responses.push(describe_category(self.category_repo.as_ref(), record).await?);
        }
        Ok(responses)
    }
}

/// GetCategory Handler
pub struct GetCategoryHandler {
    category_repo: Arc<dyn CategoryRepositoryPort>,
}

impl GetCategoryHandler {
    pub fn new(category_repo: Arc<dyn CategoryRepositoryPort>) -> Self {
        Self { category_repo }
    }

    pub async fn handle(&self, query: GetCategory) -> Result<CategoryResponse, ApplicationError> {
        let record = self
            .category_repo
            .find_by_id(query.category_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Category", query.category_id))?;

        describe_category(self.category_repo.as_ref(), record).await
    }
}

/// ListTags Handler
pub struct ListTagsHandler {
    tag_repo: Arc<dyn TagRepositoryPort>,
}

impl ListTagsHandler {
    pub fn new(tag_repo: Arc<dyn TagRepositoryPort>) -> Self {
        Self { tag_repo }
    }

    pub async fn handle(&self, query: ListTags) -> Result<Vec<TagResponse>, ApplicationError> {
        let tags = self.tag_repo.search(query.query.as_deref()).await?;
        Ok(tags.into_iter().map(TagResponse::from).collect())
    }
}
