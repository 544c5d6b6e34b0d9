//! User Command Handlers

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{ChangeUserRole, RegisterUser, SaveStory, UnsaveStory};
use crate::application::error::ApplicationError;
use crate::application::ports::{StoryRepositoryPort, UserRecord, UserRepositoryPort};
use crate::application::queries::handlers::UserResponse;
use crate::domain::Role;

/// 用户名最大长度
const MAX_USERNAME_CHARS: usize = 150;

// ============================================================================
// RegisterUser
// ============================================================================

/// RegisterUser Handler
pub struct RegisterUserHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
}

impl RegisterUserHandler {
    pub fn new(user_repo: Arc<dyn UserRepositoryPort>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, command: RegisterUser) -> Result<UserResponse, ApplicationError> {
        if command.role == Role::Administrator {
            return Err(ApplicationError::validation(
                "Role must be reader or author",
            ));
        }

        let username = command.username.trim().to_string();
        if username.is_empty() || username.chars().count() > MAX_USERNAME_CHARS {
            return Err(ApplicationError::validation(format!(
                "Username must be 1-{} characters",
                MAX_USERNAME_CHARS
            )));
        }
        let alias = match command.alias.trim() {
            "" => username.clone(),
            alias => alias.to_string(),
        };

        let user = UserRecord {
            id: Uuid::new_v4(),
            username,
            alias,
            role: command.role,
            created_at: Utc::now(),
        };
        self.user_repo.save(&user).await?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            role = user.role.as_str(),
            "User registered"
        );

        Ok(UserResponse::from(user))
    }

    /// 确保存在指定用户名的管理员账户（启动时调用）
    pub async fn ensure_administrator(&self, username: &str) -> Result<Uuid, ApplicationError> {
        if let Some(existing) = self.user_repo.find_by_username(username).await? {
            if existing.role != Role::Administrator {
                self.user_repo
                    .update_role(existing.id, Role::Administrator)
                    .await?;
                tracing::info!(user_id = %existing.id, username = %username, "User promoted to administrator");
            }
            return Ok(existing.id);
        }

        let admin = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            alias: username.to_string(),
            role: Role::Administrator,
            created_at: Utc::now(),
        };
        self.user_repo.save(&admin).await?;

        tracing::info!(user_id = %admin.id, username = %username, "Bootstrap administrator created");
        Ok(admin.id)
    }
}

// ============================================================================
// ChangeUserRole
// ============================================================================

/// ChangeUserRole Handler（管理员）
pub struct ChangeUserRoleHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
}

impl ChangeUserRoleHandler {
    pub fn new(user_repo: Arc<dyn UserRepositoryPort>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, command: ChangeUserRole) -> Result<UserResponse, ApplicationError> {
        if !command.actor.is_admin() {
            return Err(ApplicationError::forbidden("Only administrators can change roles"));
        }

        let mut user = self
            .user_repo
            .find_by_id(command.user_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("User", command.user_id))?;

        self.user_repo.update_role(user.id, command.role).await?;
        user.role = command.role;

        tracing::info!(
            user_id = %user.id,
            role = command.role.as_str(),
            changed_by = %command.actor.user_id,
            "User role changed"
        );

        Ok(UserResponse::from(user))
    }
}

// ============================================================================
// Saved stories
// ============================================================================

/// SaveStory Handler
pub struct SaveStoryHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
    story_repo: Arc<dyn StoryRepositoryPort>,
}

impl SaveStoryHandler {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryPort>,
        story_repo: Arc<dyn StoryRepositoryPort>,
    ) -> Self {
        Self {
            user_repo,
            story_repo,
        }
    }

    pub async fn handle(&self, command: SaveStory) -> Result<(), ApplicationError> {
        self.story_repo
            .find_by_id(command.story_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Story", command.story_id))?;

        self.user_repo
            .add_saved_story(command.actor.user_id, command.story_id)
            .await?;

        tracing::debug!(user_id = %command.actor.user_id, story_id = %command.story_id, "Story saved");
        Ok(())
    }
}

/// UnsaveStory Handler
pub struct UnsaveStoryHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
}

impl UnsaveStoryHandler {
    pub fn new(user_repo: Arc<dyn UserRepositoryPort>) -> Self {
        Self { user_repo }
    }

    pub async fn handle(&self, command: UnsaveStory) -> Result<(), ApplicationError> {
        let removed = self
            .user_repo
            .remove_saved_story(command.actor.user_id, command.story_id)
            .await?;

        if !removed {
            return Err(ApplicationError::not_found("Saved story", command.story_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::test_support::setup_pool;
    use crate::infrastructure::persistence::sqlite::SqliteUserRepository;

    fn register(username: &str, role: Role) -> RegisterUser {
        RegisterUser {
            username: username.to_string(),
            alias: String::new(),
            role,
        }
    }

    #[tokio::test]
    async fn test_register_defaults_alias_and_rejects_admin() {
        let pool = setup_pool().await;
        let handler = RegisterUserHandler::new(Arc::new(SqliteUserRepository::new(pool)));

        let user = handler.handle(register(" ada ", Role::Author)).await.unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(user.alias, "ada");

        let err = handler
            .handle(register("root", Role::Administrator))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));

        let err = handler.handle(register("   ", Role::Reader)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationError(_)));

        // 用户名唯一
        let err = handler.handle(register("ada", Role::Reader)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::BusinessRuleViolation(_)));
    }

    #[tokio::test]
    async fn test_ensure_administrator_promotes_existing_user() {
        let pool = setup_pool().await;
        let repo = Arc::new(SqliteUserRepository::new(pool));
        let handler = RegisterUserHandler::new(repo.clone());

        let user = handler.handle(register("boss", Role::Reader)).await.unwrap();
        let id = handler.ensure_administrator("boss").await.unwrap();
        assert_eq!(id, user.id);
        assert_eq!(
            repo.find_by_id(id).await.unwrap().unwrap().role,
            Role::Administrator
        );

        // 再次调用是幂等的
        assert_eq!(handler.ensure_administrator("boss").await.unwrap(), id);
        let fresh = handler.ensure_administrator("keeper").await.unwrap();
        assert_ne!(fresh, id);
    }

    #[tokio::test]
    async fn test_change_role_requires_admin() {
        let pool = setup_pool().await;
        let repo: Arc<dyn UserRepositoryPort> = Arc::new(SqliteUserRepository::new(pool));
        let register_handler = RegisterUserHandler::new(repo.clone());
        let handler = ChangeUserRoleHandler::new(repo);

        let user = register_handler.handle(register("ada", Role::Author)).await.unwrap();
        let admin_id = register_handler.ensure_administrator("admin").await.unwrap();

        let err = handler
            .handle(ChangeUserRole {
                actor: crate::domain::Actor::new(user.id, Role::Author),
                user_id: user.id,
                role: Role::Administrator,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Forbidden(_)));

        let changed = handler
            .handle(ChangeUserRole {
                actor: crate::domain::Actor::new(admin_id, Role::Administrator),
                user_id: user.id,
                role: Role::Reader,
            })
            .await
            .unwrap();
        assert_eq!(changed.role, Role::Reader);
    }
}
