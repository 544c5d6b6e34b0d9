//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;
use uuid::Uuid;

use crate::application::ordering::OrderingError;
use crate::domain::story::StoryError;
use crate::domain::taxonomy::TaxonomyError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: Uuid,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 业务规则违反
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// 无权限
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 并发冲突，重试耗尽后返回，客户端可重试
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: Uuid) -> Self {
        Self::NotFound { resource_type, id }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建业务规则违反错误
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRuleViolation(message.into())
    }

    /// 创建无权限错误
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<crate::application::ports::RepositoryError> for ApplicationError {
    fn from(err: crate::application::ports::RepositoryError) -> Self {
        use crate::application::ports::RepositoryError;
        match err {
            RepositoryError::Duplicate(msg) => Self::BusinessRuleViolation(msg),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::RepositoryError(other.to_string()),
        }
    }
}

impl From<OrderingError> for ApplicationError {
    fn from(err: OrderingError) -> Self {
        match err {
            OrderingError::StoryNotFound(id) => Self::not_found("Story", id),
            OrderingError::ChapterNotFound(id) => Self::not_found("Chapter", id),
            OrderingError::OrphanChapter { .. } | OrderingError::InvalidPosition(_) => {
                Self::ValidationError(err.to_string())
            }
            OrderingError::DuplicateMembership { .. } => Self::BusinessRuleViolation(err.to_string()),
            OrderingError::TransactionConflict(_) => Self::Conflict(err.to_string()),
            OrderingError::Storage(msg) => Self::RepositoryError(msg),
        }
    }
}

impl From<StoryError> for ApplicationError {
    fn from(err: StoryError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<TaxonomyError> for ApplicationError {
    fn from(err: TaxonomyError) -> Self {
        Self::ValidationError(err.to_string())
    }
}
