//! Identity service: logins, tokens and agent management
//!
//! HTTP handlers stay thin and delegate every identity use-case here.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AdminConfig;
use crate::domain::{
    DomainError, DomainResult, NewUser, RepositoryProvider, User, UserChanges, UserFilter,
    UserRole,
};
use crate::infrastructure::crypto::jwt::{create_token, verify_token, JwtConfig};
use crate::infrastructure::crypto::password::{hash_password, verify_password, DEFAULT_COST};
use crate::shared::{PaginatedResult, PaginationParams};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: User,
}

/// Account to create; the password is still plain text here
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub role: UserRole,
}

pub struct IdentityService {
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
    hash_cost: u32,
}

impl IdentityService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, jwt_config: JwtConfig) -> Self {
        Self {
            repos,
            jwt_config,
            hash_cost: DEFAULT_COST,
        }
    }

    /// Override the bcrypt cost (tests use the minimum).
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    fn hash(&self, password: &str) -> DomainResult<String> {
        hash_password(password, self.hash_cost)
            .map_err(|e| DomainError::Validation(format!("Failed to hash password: {}", e)))
    }

    async fn require_user(&self, id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", id))
    }

    // ── Authentication ──────────────────────────────────────────

    /// Authenticate by username or email + password and issue a JWT.
    pub async fn login(&self, username_or_email: &str, password: &str) -> DomainResult<AuthResult> {
        let users = self.repos.users();
        let user = match users.find_by_username(username_or_email).await? {
            Some(user) => Some(user),
            None => users.find_by_email(username_or_email).await?,
        };

        let Some(user) = user else {
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        };

        if !user.is_active {
            warn!(username = %user.username, "Login attempt on disabled account");
            return Err(DomainError::Unauthorized("Account is disabled".into()));
        }

        let valid = verify_password(password, &user.password_hash).unwrap_or(false);
        if !valid {
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        }

        let token = create_token(&user.id, &user.username, user.role.as_str(), &self.jwt_config)
            .map_err(|e| DomainError::Validation(format!("Failed to create token: {}", e)))?;

        users.touch_last_login(&user.id).await?;
        info!(user_id = %user.id, username = %user.username, "User logged in");

        Ok(AuthResult {
            token,
            token_type: "Bearer".into(),
            expires_in: self.jwt_config.expiration_hours * 3600,
            user,
        })
    }

    /// Resolve a bearer token to a still-active user.
    pub async fn authenticate_token(&self, token: &str) -> DomainResult<User> {
        let claims = verify_token(token, &self.jwt_config)
            .map_err(|e| DomainError::Unauthorized(format!("Invalid token: {}", e)))?;

        let user = self
            .repos
            .users()
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("User no longer exists".into()))?;

        if !user.is_active {
            return Err(DomainError::Unauthorized("Account is disabled".into()));
        }
        Ok(user)
    }

    pub async fn me(&self, user_id: &str) -> DomainResult<User> {
        self.require_user(user_id).await
    }

    /// Change a user's password. Verifies the current password first.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::Validation(format!(
                "New password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let user = self.require_user(user_id).await?;

        let valid = verify_password(current_password, &user.password_hash).unwrap_or(false);
        if !valid {
            return Err(DomainError::Unauthorized("Invalid current password".into()));
        }

        let new_hash = self.hash(new_password)?;
        self.repos.users().update_password(user_id, &new_hash).await?;

        info!(user_id, "Password changed");
        Ok(())
    }

    // ── Agent management ────────────────────────────────────────

    pub async fn list_users(
        &self,
        filter: &UserFilter,
        params: &PaginationParams,
    ) -> DomainResult<PaginatedResult<User>> {
        self.repos.users().list(filter, params).await
    }

    pub async fn get_user(&self, id: &str) -> DomainResult<User> {
        self.require_user(id).await
    }

    pub async fn create_user(&self, agent: NewAgent) -> DomainResult<User> {
        let username = agent.username.trim();
        if username.len() < 3 || username.len() > 50 {
            return Err(DomainError::Validation("Username must be 3-50 characters".into()));
        }
        if agent.password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if !agent.email.contains('@') {
            return Err(DomainError::Validation("Invalid email address".into()));
        }

        let users = self.repos.users();
        if users.find_by_username(username).await?.is_some() {
            return Err(DomainError::Conflict("Username already exists".into()));
        }
        if users.find_by_email(&agent.email).await?.is_some() {
            return Err(DomainError::Conflict("Email already exists".into()));
        }

        let user = users
            .create(NewUser {
                username: username.to_string(),
                email: agent.email,
                full_name: agent.full_name,
                phone: agent.phone,
                password_hash: self.hash(&agent.password)?,
                role: agent.role,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "User created");
        Ok(user)
    }

    /// Update an account. `actor_id` may not deactivate themself.
    pub async fn update_user(
        &self,
        actor_id: &str,
        id: &str,
        changes: UserChanges,
    ) -> DomainResult<User> {
        if actor_id == id && changes.is_active == Some(false) {
            return Err(DomainError::Forbidden("You cannot deactivate your own account".into()));
        }
        if matches!(&changes.email, Some(email) if !email.contains('@')) {
            return Err(DomainError::Validation("Invalid email address".into()));
        }
        if changes.is_empty() {
            return self.require_user(id).await;
        }
        self.repos.users().update(id, changes).await
    }

    /// Delete an account. `actor_id` may not delete themself.
    pub async fn delete_user(&self, actor_id: &str, id: &str) -> DomainResult<()> {
        if actor_id == id {
            return Err(DomainError::Forbidden("You cannot delete your own account".into()));
        }
        self.repos.users().delete(id).await?;
        info!(user_id = id, deleted_by = actor_id, "User deleted");
        Ok(())
    }

    // ── Bootstrap ───────────────────────────────────────────────

    /// Create the configured admin when no users exist yet.
    pub async fn ensure_default_admin(&self, admin: &AdminConfig) -> DomainResult<Option<User>> {
        if self.repos.users().count().await? > 0 {
            return Ok(None);
        }

        let user = self
            .create_user(NewAgent {
                username: admin.username.clone(),
                email: admin.email.clone(),
                password: admin.password.clone(),
                full_name: Some("Administrator".into()),
                phone: None,
                role: UserRole::Admin,
            })
            .await?;

        warn!(
            username = %user.username,
            "Created default admin user; change its password after first login"
        );
        Ok(Some(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;
    use crate::infrastructure::database::test_db;

    async fn service() -> IdentityService {
        let repos = Arc::new(SeaOrmRepositoryProvider::new(test_db().await));
        IdentityService::new(repos, JwtConfig::new("test-secret", 1)).with_hash_cost(4)
    }

    fn agent(username: &str) -> NewAgent {
        NewAgent {
            username: username.into(),
            email: format!("{}@example.com", username),
            password: "password123".into(),
            full_name: None,
            phone: None,
            role: UserRole::Agent,
        }
    }

    #[tokio::test]
    async fn login_by_username_or_email() {
        let svc = service().await;
        svc.create_user(agent("maria")).await.unwrap();

        let auth = svc.login("maria", "password123").await.unwrap();
        assert_eq!(auth.token_type, "Bearer");
        assert_eq!(auth.expires_in, 3600);

        let user = svc.authenticate_token(&auth.token).await.unwrap();
        assert_eq!(user.username, "maria");

        let by_email = svc.login("maria@example.com", "password123").await.unwrap();
        assert_eq!(by_email.user.id, user.id);
        assert!(svc.me(&user.id).await.unwrap().last_login_at.is_some());
    }

    #[tokio::test]
    async fn wrong_password_and_disabled_account_are_rejected() {
        let svc = service().await;
        let admin = svc.create_user(NewAgent { role: UserRole::Admin, ..agent("boss") }).await.unwrap();
        let user = svc.create_user(agent("maria")).await.unwrap();

        let err = svc.login("maria", "nope-nope").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        let auth = svc.login("maria", "password123").await.unwrap();
        svc.update_user(
            &admin.id,
            &user.id,
            UserChanges { is_active: Some(false), ..Default::default() },
        )
        .await
        .unwrap();

        assert!(svc.login("maria", "password123").await.is_err());
        assert!(svc.authenticate_token(&auth.token).await.is_err());
    }

    #[tokio::test]
    async fn change_password_requires_current_password() {
        let svc = service().await;
        let user = svc.create_user(agent("maria")).await.unwrap();

        let err = svc.change_password(&user.id, "password123", "short").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = svc.change_password(&user.id, "wrong-pass", "new-password").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));

        svc.change_password(&user.id, "password123", "new-password").await.unwrap();
        assert!(svc.login("maria", "new-password").await.is_ok());
        assert!(svc.login("maria", "password123").await.is_err());
    }

    #[tokio::test]
    async fn admin_cannot_remove_themself() {
        let svc = service().await;
        let admin = svc.create_user(NewAgent { role: UserRole::Admin, ..agent("boss") }).await.unwrap();

        let err = svc.delete_user(&admin.id, &admin.id).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let err = svc
            .update_user(
                &admin.id,
                &admin.id,
                UserChanges { is_active: Some(false), ..Default::default() },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let other = svc.create_user(agent("maria")).await.unwrap();
        svc.delete_user(&admin.id, &other.id).await.unwrap();
        assert!(matches!(
            svc.get_user(&other.id).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let svc = service().await;
        svc.create_user(agent("maria")).await.unwrap();
        let err = svc.create_user(agent("maria")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn default_admin_created_once() {
        let svc = service().await;
        let admin = AdminConfig::default();

        let created = svc.ensure_default_admin(&admin).await.unwrap().unwrap();
        assert!(created.is_admin());
        assert!(svc.ensure_default_admin(&admin).await.unwrap().is_none());
        assert!(svc.login(&admin.username, &admin.password).await.is_ok());
    }
}
