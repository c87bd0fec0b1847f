//! Account service: registration, token login and caller resolution.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use jardin_common::{
    AppError, AppResult, TokenGenerator,
    config::{BootstrapAdminConfig, RegistrationConfig},
    token::is_well_formed,
};
use jardin_db::{
    entities::{auth_token, user, user_profile},
    repositories::{AuthTokenRepository, UserProfileRepository, UserRepository},
};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail};

use super::FieldCheck;
use crate::policy::{Caller, Role, resolve_role};

#[allow(clippy::unwrap_used)]
static USERNAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

/// Input for creating an account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(
        length(min = 1, max = 150),
        regex(
            path = *USERNAME_PATTERN,
            message = "Enter a valid username. Letters, digits and @/./+/-/_ only."
        )
    )]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Username and password exchanged for a token.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Token issued on login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Profile nested in account output.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub role: Role,
    pub display_name: String,
    pub phone: String,
}

impl From<user_profile::Model> for ProfileResponse {
    fn from(p: user_profile::Model) -> Self {
        Self {
            role: p.role,
            display_name: p.display_name,
            phone: p.phone,
        }
    }
}

/// The authenticated account.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub profile: Option<ProfileResponse>,
}

impl MeResponse {
    fn render(u: user::Model, profile: Option<user_profile::Model>) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            is_staff: u.is_staff,
            profile: profile.map(ProfileResponse::from),
        }
    }
}

/// A newly registered account with its token.
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredAccount {
    #[serde(flatten)]
    pub user: MeResponse,
    pub token: String,
}

/// Account service.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
    token_repo: AuthTokenRepository,
    token_gen: TokenGenerator,
    registration: RegistrationConfig,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        profile_repo: UserProfileRepository,
        token_repo: AuthTokenRepository,
        registration: RegistrationConfig,
    ) -> Self {
        Self {
            user_repo,
            profile_repo,
            token_repo,
            token_gen: TokenGenerator::new(),
            registration,
        }
    }

    /// Register an account with a profile and a token.
    pub async fn register(&self, input: RegisterInput) -> AppResult<RegisteredAccount> {
        if !self.registration.enabled {
            return Err(AppError::Forbidden("Registration is disabled".to_string()));
        }
        input.validate()?;

        let mut check = FieldCheck::new();
        let email = input.email.unwrap_or_default().trim().to_string();
        if !email.is_empty() && !email.validate_email() {
            check.push("email", "Enter a valid email address.");
        }
        check.finish()?;

        if self.user_repo.find_by_username(&input.username).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A user with that username already exists: {}",
                input.username
            )));
        }

        let role = match input.role {
            Some(role) if self.registration.allow_role_choice => role,
            _ => Role::Editor,
        };

        let user = self
            .user_repo
            .create(new_user(&input.username, email, &input.password, false)?)
            .await?;
        let (profile, token) = self.ensure_account_records(&user, role).await?;

        tracing::info!(user_id = user.id, username = %user.username, role = ?profile.role, "Account registered");

        Ok(RegisteredAccount {
            user: MeResponse::render(user, Some(profile)),
            token: token.key,
        })
    }

    /// Exchange credentials for the account's token.
    pub async fn login(&self, input: LoginInput) -> AppResult<TokenResponse> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .filter(|u| u.is_active);

        let verified = match &user {
            Some(u) => verify_password(&input.password, &u.password)?,
            None => false,
        };
        let Some(user) = user.filter(|_| verified) else {
            return Err(AppError::field(
                "non_field_errors",
                "Unable to log in with provided credentials.",
            ));
        };

        let token = match self.token_repo.find_by_user_id(user.id).await? {
            Some(token) => token,
            None => self.issue_token(user.id).await?,
        };

        Ok(TokenResponse { token: token.key })
    }

    /// The caller's own account.
    pub async fn me(&self, caller: &Caller) -> AppResult<MeResponse> {
        let user_id = caller.user_id.ok_or(AppError::Unauthorized)?;

        let user = self.user_repo.get_by_id(user_id).await?;
        let profile = self.profile_repo.find_by_user_id(user.id).await?;
        Ok(MeResponse::render(user, profile))
    }

    /// Resolve a token key to a caller; `None` when the key is unknown.
    pub async fn authenticate(&self, key: &str) -> AppResult<Option<Caller>> {
        if !is_well_formed(key) {
            return Ok(None);
        }

        let Some(user) = self.user_repo.find_by_token(key).await? else {
            return Ok(None);
        };
        let role = resolve_role(self.profile_repo.find_by_user_id(user.id).await);

        Ok(Some(Caller::authenticated(&user, role)))
    }

    /// Create the configured administrator unless it already exists.
    pub async fn ensure_superuser(&self, admin: &BootstrapAdminConfig) -> AppResult<()> {
        let user = match self.user_repo.find_by_username(&admin.username).await? {
            Some(user) => user,
            None => {
                let user = self
                    .user_repo
                    .create(new_user(
                        &admin.username,
                        admin.email.clone(),
                        &admin.password,
                        true,
                    )?)
                    .await?;
                tracing::info!(username = %user.username, "Bootstrap administrator created");
                user
            }
        };

        self.ensure_account_records(&user, Role::Admin).await?;
        Ok(())
    }

    /// Make sure the account has exactly one profile and one token.
    ///
    /// Existing records are kept; `role` only applies to a new profile.
    pub async fn ensure_account_records(
        &self,
        user: &user::Model,
        role: Role,
    ) -> AppResult<(user_profile::Model, auth_token::Model)> {
        let profile = match self.profile_repo.find_by_user_id(user.id).await? {
            Some(profile) => profile,
            None => {
                self.profile_repo
                    .create(user_profile::ActiveModel {
                        user_id: Set(user.id),
                        role: Set(role),
                        display_name: Set(String::new()),
                        phone: Set(String::new()),
                        ..Default::default()
                    })
                    .await?
            }
        };

        let token = match self.token_repo.find_by_user_id(user.id).await? {
            Some(token) => token,
            None => self.issue_token(user.id).await?,
        };

        Ok((profile, token))
    }

    async fn issue_token(&self, user_id: i64) -> AppResult<auth_token::Model> {
        self.token_repo
            .create(auth_token::ActiveModel {
                key: Set(self.token_gen.generate()),
                user_id: Set(user_id),
                created_at: Set(Utc::now().into()),
            })
            .await
    }
}

fn new_user(
    username: &str,
    email: String,
    password: &str,
    superuser: bool,
) -> AppResult<user::ActiveModel> {
    Ok(user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email),
        password: Set(hash_password(password)?),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        is_staff: Set(superuser),
        is_superuser: Set(superuser),
        is_active: Set(true),
        date_joined: Set(Utc::now().into()),
        ..Default::default()
    })
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jardin_db::test_utils::logged_statements;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    const KEY: &str = "0123456789abcdef0123456789abcdef01234567";

    fn test_user(id: i64, username: &str, password: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            email: String::new(),
            password: hash_password(password).unwrap(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            is_superuser: false,
            is_active: true,
            date_joined: Utc::now().into(),
        }
    }

    fn test_profile(user_id: i64, role: Role) -> user_profile::Model {
        user_profile::Model {
            id: user_id,
            user_id,
            role,
            display_name: String::new(),
            phone: String::new(),
        }
    }

    fn test_token(user_id: i64) -> auth_token::Model {
        auth_token::Model {
            key: KEY.to_string(),
            user_id,
            created_at: Utc::now().into(),
        }
    }

    fn empty() -> Arc<DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn service(
        user_db: Arc<DatabaseConnection>,
        profile_db: Arc<DatabaseConnection>,
        token_db: Arc<DatabaseConnection>,
        registration: RegistrationConfig,
    ) -> AccountService {
        AccountService::new(
            UserRepository::new(user_db),
            UserProfileRepository::new(profile_db),
            AuthTokenRepository::new(token_db),
            registration,
        )
    }

    fn insert_ok() -> MockExecResult {
        MockExecResult {
            last_insert_id: 1,
            rows_affected: 1,
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("cascada123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("cascada123", &hash).unwrap());
        assert!(!verify_password("mirador123", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(verify_password("x", "not-a-hash").is_err());
    }

    #[tokio::test]
    async fn test_register_ignores_role_unless_allowed() {
        let user = test_user(1, "guia", "cascada123");
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .append_query_results([[user]])
                .append_exec_results([insert_ok()])
                .into_connection(),
        );
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_profile::Model>::new()])
                .append_query_results([[test_profile(1, Role::Editor)]])
                .append_exec_results([insert_ok()])
                .into_connection(),
        );
        let token_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<auth_token::Model>::new()])
                .append_query_results([[test_token(1)]])
                .append_exec_results([insert_ok()])
                .into_connection(),
        );

        let svc = service(user_db, profile_db.clone(), token_db, RegistrationConfig::default());
        let input = RegisterInput {
            username: "guia".to_string(),
            email: None,
            password: "cascada123".to_string(),
            role: Some(Role::Admin),
        };

        let account = svc.register(input).await.unwrap();
        drop(svc);

        assert_eq!(account.token, KEY);
        let log = logged_statements(profile_db);
        assert!(log[1].contains("\"editor\""));
    }

    #[tokio::test]
    async fn test_register_duplicate_username_is_conflict() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(1, "guia", "cascada123")]])
                .into_connection(),
        );
        let svc = service(user_db, empty(), empty(), RegistrationConfig::default());
        let input = RegisterInput {
            username: "guia".to_string(),
            email: Some("guia@example.com".to_string()),
            password: "cascada123".to_string(),
            role: None,
        };

        let result = svc.register(input).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password_and_bad_email() {
        let svc = service(empty(), empty(), empty(), RegistrationConfig::default());

        let input = RegisterInput {
            username: "guia".to_string(),
            email: None,
            password: "short".to_string(),
            role: None,
        };
        match svc.register(input).await {
            Err(AppError::InvalidFields(fields)) => assert!(fields.contains_key("password")),
            other => panic!("unexpected result: {other:?}"),
        }

        let input = RegisterInput {
            username: "guia".to_string(),
            email: Some("not-an-email".to_string()),
            password: "cascada123".to_string(),
            role: None,
        };
        match svc.register(input).await {
            Err(AppError::InvalidFields(fields)) => assert!(fields.contains_key("email")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_registration_disabled() {
        let svc = service(
            empty(),
            empty(),
            empty(),
            RegistrationConfig {
                enabled: false,
                allow_role_choice: false,
            },
        );
        let input = RegisterInput {
            username: "guia".to_string(),
            email: None,
            password: "cascada123".to_string(),
            role: None,
        };

        assert!(matches!(
            svc.register(input).await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_login_returns_existing_token() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(1, "guia", "cascada123")]])
                .into_connection(),
        );
        let token_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_token(1)]])
                .into_connection(),
        );
        let svc = service(user_db, empty(), token_db, RegistrationConfig::default());

        let token = svc
            .login(LoginInput {
                username: "guia".to_string(),
                password: "cascada123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(token.token, KEY);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user(1, "guia", "cascada123")]])
                .into_connection(),
        );
        let svc = service(user_db, empty(), empty(), RegistrationConfig::default());

        let result = svc
            .login(LoginInput {
                username: "guia".to_string(),
                password: "mirador123".to_string(),
            })
            .await;
        match result {
            Err(AppError::InvalidFields(fields)) => {
                assert!(fields.contains_key("non_field_errors"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_malformed_key_skips_database() {
        let user_db = empty();
        let svc = service(user_db.clone(), empty(), empty(), RegistrationConfig::default());

        assert!(svc.authenticate("nope").await.unwrap().is_none());
        drop(svc);
        assert!(logged_statements(user_db).is_empty());
    }

    #[tokio::test]
    async fn test_authenticate_without_profile_has_no_role() {
        let user = test_user(5, "sinperfil", "cascada123");
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[(test_token(5), user)]])
                .into_connection(),
        );
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user_profile::Model>::new()])
                .into_connection(),
        );
        let svc = service(user_db, profile_db, empty(), RegistrationConfig::default());

        let caller = svc.authenticate(KEY).await.unwrap().unwrap();
        assert_eq!(caller.user_id, Some(5));
        assert_eq!(caller.role, None);
    }

    #[tokio::test]
    async fn test_authenticate_profile_failure_degrades_to_no_role() {
        let user = test_user(5, "guia", "cascada123");
        let user_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[(test_token(5), user)]])
                .into_connection(),
        );
        let profile_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
                .into_connection(),
        );
        let svc = service(user_db, profile_db, empty(), RegistrationConfig::default());

        let caller = svc.authenticate(KEY).await.unwrap().unwrap();
        assert!(caller.is_authenticated());
        assert_eq!(caller.role, None);
    }
}
