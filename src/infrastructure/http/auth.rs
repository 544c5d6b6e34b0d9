//! 调用者身份
//!
//! 认证由上游网关完成，网关把用户 ID 放在 `X-User-Id` 请求头中。
//! 这里只负责把它解析成 [`Actor`]。

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::Actor;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 用户 ID 请求头
pub const USER_ID_HEADER: &str = "x-user-id";

/// 已识别的调用者
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Actor);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Missing caller identity".to_string()))?;

        let user_id = raw
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or_else(|| ApiError::Unauthorized("Malformed caller identity".to_string()))?;

        let user = state
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?
            .ok_or_else(|| ApiError::Unauthorized(format!("Unknown user: {}", user_id)))?;

        Ok(Caller(Actor::new(user.id, user.role)))
    }
}
