//! Category / Tag Command Handlers（管理员）

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{AddTag, CreateCategory, ParentChange, UpdateCategory};
use crate::application::error::ApplicationError;
use crate::application::ports::{CategoryRecord, CategoryRepositoryPort, TagRecord, TagRepositoryPort};
use crate::application::queries::handlers::{
    ancestor_chain, describe_category, CategoryResponse, TagResponse,
};
use crate::domain::taxonomy::{
    check_no_cycle, validate_category_description, validate_category_name, validate_tag_name,
};

// ============================================================================
// CreateCategory
// ============================================================================

/// CreateCategory Handler
pub struct CreateCategoryHandler {
    category_repo: Arc<dyn CategoryRepositoryPort>,
}

impl CreateCategoryHandler {
    pub fn new(category_repo: Arc<dyn CategoryRepositoryPort>) -> Self {
        Self { category_repo }
    }

    pub async fn handle(&self, command: CreateCategory) -> Result<CategoryResponse, ApplicationError> {
        if !command.actor.is_admin() {
            return Err(ApplicationError::forbidden("Only administrators can manage categories"));
        }

        let name = validate_category_name(&command.name)?;
        let description = validate_category_description(command.description)?;
        if let Some(parent_id) = command.parent_id {
            self.category_repo
                .find_by_id(parent_id)
                .await?
                .ok_or_else(|| ApplicationError::not_found("Category", parent_id))?;
        }

        let now = Utc::now();
        let category = CategoryRecord {
            id: Uuid::new_v4(),
            name,
            description,
            parent_id: command.parent_id,
            user_id: Some(command.actor.user_id),
            created_at: now,
            modified_at: now,
        };
        self.category_repo.save(&category).await?;

        tracing::info!(category_id = %category.id, name = %category.name, "Category created");

        describe_category(self.category_repo.as_ref(), category).await
    }
}

// ============================================================================
// UpdateCategory
// ============================================================================

/// UpdateCategory Handler
pub struct UpdateCategoryHandler {
    category_repo: Arc<dyn CategoryRepositoryPort>,
}

impl UpdateCategoryHandler {
    pub fn new(category_repo: Arc<dyn CategoryRepositoryPort>) -> Self {
        Self { category_repo }
    }

    pub async fn handle(&self, command: UpdateCategory) -> Result<CategoryResponse, ApplicationError> {
        if !command.actor.is_admin() {
            return Err(ApplicationError::forbidden("Only administrators can manage categories"));
        }

        let mut category = self
            .category_repo
            .find_by_id(command.category_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Category", command.category_id))?;

        if let Some(name) = command.name {
            category.name = validate_category_name(&name)?;
        }
        if command.description.is_some() {
            category.description = validate_category_description(command.description)?;
        }

        match command.parent {
            ParentChange::Keep => {}
            ParentChange::Clear => category.parent_id = None,
            ParentChange::Set(parent_id) => {
                let chain = ancestor_chain(self.category_repo.as_ref(), parent_id).await?;
                if chain.is_empty() {
                    return Err(ApplicationError::not_found("Category", parent_id));
                }
                let ids: Vec<Uuid> = chain.iter().map(|c| c.id).collect();
                check_no_cycle(category.id, &ids)?;
                category.parent_id = Some(parent_id);
            }
        }
        category.modified_at = Utc::now();

        self.category_repo.save(&category).await?;

        tracing::info!(category_id = %category.id, "Category updated");

        describe_category(self.category_repo.as_ref(), category).await
    }
}

// ============================================================================
// AddTag
// ============================================================================

/// AddTag Handler - 同名标签（大小写不敏感）已存在时直接返回
pub struct AddTagHandler {
    tag_repo: Arc<dyn TagRepositoryPort>,
}

impl AddTagHandler {
    pub fn new(tag_repo: Arc<dyn TagRepositoryPort>) -> Self {
        Self { tag_repo }
    }

    pub async fn handle(&self, command: AddTag) -> Result<TagResponse, ApplicationError> {
        if !command.actor.is_admin() {
            return Err(ApplicationError::forbidden("Only administrators can add tags"));
        }

        let name = validate_tag_name(&command.name)?;
        if let Some(existing) = self.tag_repo.find_by_name(&name).await? {
            return Ok(TagResponse::from(existing));
        }

        let tag = TagRecord {
            id: Uuid::new_v4(),
            name,
            user_id: Some(command.actor.user_id),
            created_at: Utc::now(),
        };
        self.tag_repo.save(&tag).await?;

        tracing::info!(tag_id = %tag.id, name = %tag.name, "Tag added");

        Ok(TagResponse::from(tag))
    }
}
