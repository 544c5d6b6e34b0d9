//! Category / Tag Queries

use uuid::Uuid;

/// 列出全部分类
#[derive(Debug, Clone)]
pub struct ListCategories;

/// 获取分类
#[derive(Debug, Clone)]
pub struct GetCategory {
    pub category_id: Uuid,
}

/// 列出/搜索标签
#[derive(Debug, Clone, Default)]
pub struct ListTags {
    pub query: Option<String>,
}
