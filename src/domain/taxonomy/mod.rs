//! Taxonomy Context - 分类与标签
//!
//! 分类是一棵树（parent 指针），标签是扁平的、大小写不敏感的名字。

use thiserror::Error;
use uuid::Uuid;

/// 分类名最大长度
pub const MAX_CATEGORY_NAME_CHARS: usize = 50;
/// 分类描述最大长度
pub const MAX_CATEGORY_DESCRIPTION_CHARS: usize = 200;
/// 标签名最大长度
pub const MAX_TAG_NAME_CHARS: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("无效的分类名: {0}")]
    InvalidCategoryName(String),

    #[error("分类描述长度不能超过{0}字符")]
    DescriptionTooLong(usize),

    #[error("分类不能成为自己的祖先: {0}")]
    CategoryCycle(Uuid),

    #[error("无效的标签名: {0}")]
    InvalidTagName(String),
}

/// 校验分类名
pub fn validate_category_name(name: &str) -> Result<String, TaxonomyError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TaxonomyError::InvalidCategoryName("分类名不能为空".to_string()));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_CHARS {
        return Err(TaxonomyError::InvalidCategoryName(format!(
            "分类名长度不能超过{}字符",
            MAX_CATEGORY_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

/// 校验分类描述
pub fn validate_category_description(
    description: Option<String>,
) -> Result<Option<String>, TaxonomyError> {
    match description {
        Some(d) if d.chars().count() > MAX_CATEGORY_DESCRIPTION_CHARS => Err(
            TaxonomyError::DescriptionTooLong(MAX_CATEGORY_DESCRIPTION_CHARS),
        ),
        other => Ok(other),
    }
}

/// 校验标签名
pub fn validate_tag_name(name: &str) -> Result<String, TaxonomyError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TaxonomyError::InvalidTagName("标签名不能为空".to_string()));
    }
    if name.chars().count() > MAX_TAG_NAME_CHARS {
        return Err(TaxonomyError::InvalidTagName(format!(
            "标签名长度不能超过{}字符",
            MAX_TAG_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

/// 检查把 `category_id` 的父节点设为 `new_parent` 是否成环
///
/// `ancestors_of_parent` 为新父节点及其全部祖先（自下而上）。
pub fn check_no_cycle(
    category_id: Uuid,
    ancestors_of_parent: &[Uuid],
) -> Result<(), TaxonomyError> {
    if ancestors_of_parent.contains(&category_id) {
        return Err(TaxonomyError::CategoryCycle(category_id));
    }
    Ok(())
}

/// 分类路径显示，如 `Fantasy > High Fantasy`
///
/// `names` 自根到叶排列。
pub fn category_path(names: &[String]) -> String {
    names.join(" > ")
}
