use chrono::{Duration, Utc};
use shared::{Language, RegisterUserRequest};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{
    generate_reset_token, hash_password, hash_reset_token, verify_password, Claims, TokenCodec, TokenType,
};
use crate::domain::models::user::{PasswordResetToken, User};
use crate::error::{AppError, ValidationErrors};
use crate::storage::{current_timestamp, DbConnection, TokenRepository, UserRepository};

const PASSWORD_RESET_TTL_HOURS: i64 = 1;
const MIN_PASSWORD_LENGTH: usize = 4;
const MAX_PASSWORD_LENGTH: usize = 100;
const MAX_NAME_LENGTH: usize = 255;
const MAX_PHONE_LENGTH: usize = 20;

const BAD_CREDENTIALS: &str = "Incorrect email or password";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Accounts, credentials and sessions
#[derive(Clone)]
pub struct AuthService {
    user_repository: UserRepository,
    token_repository: TokenRepository,
    codec: TokenCodec,
    frontend_url: String,
}

impl AuthService {
    pub fn new(db: DbConnection, codec: TokenCodec, frontend_url: impl Into<String>) -> Self {
        Self {
            user_repository: UserRepository::new(db.clone()),
            token_repository: TokenRepository::new(db),
            codec,
            frontend_url: frontend_url.into(),
        }
    }

    /// Create an account. The email must not be registered yet.
    pub async fn register(&self, request: &RegisterUserRequest) -> Result<User, AppError> {
        let email = normalize_email(&request.email);
        info!("Registering user {}", email);

        let mut errors = ValidationErrors::new();
        if !is_valid_email(&email) {
            errors.add("email", "Invalid email address");
        }
        let name = request.name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            errors.add("name", format!("must be between 1 and {} characters", MAX_NAME_LENGTH));
        }
        if let Some(phone) = &request.phone {
            if phone.chars().count() > MAX_PHONE_LENGTH {
                errors.add("phone", format!("must be at most {} characters", MAX_PHONE_LENGTH));
            }
        }
        check_password(&mut errors, "password", &request.password);
        errors.into_result()?;

        let existing = self
            .user_repository
            .get_user_by_email(&email)
            .await
            .map_err(AppError::internal("Failed to register user"))?;
        if existing.is_some() {
            warn!("Registration rejected, email already registered: {}", email);
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&request.password).map_err(|e| {
            error!("Password hashing failed: {}", e);
            AppError::Internal("Failed to register user".to_string())
        })?;

        let now = current_timestamp();
        let user = User {
            id: Uuid::new_v4(),
            email,
            name: name.to_string(),
            phone: request.phone.clone(),
            password_hash,
            language: Language::default(),
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
        };

        self.user_repository
            .store_user(&user)
            .await
            .map_err(AppError::internal("Failed to register user"))?;

        info!("Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Exchange credentials for an access and refresh token
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let email = normalize_email(email);
        let user = self
            .user_repository
            .get_user_by_email(&email)
            .await
            .map_err(AppError::internal("Failed to log in"))?;

        let user = match user {
            Some(user) if user.is_active => user,
            _ => {
                warn!("Login failed for {}", email);
                return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
            }
        };

        match verify_password(password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => {
                warn!("Login failed for {}", email);
                return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
            }
            Err(e) => {
                error!("Stored password hash for user {} is unusable: {}", user.id, e);
                return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
            }
        }

        let now = Utc::now();
        let pair = TokenPair {
            access_token: self.issue(user.id, TokenType::Access, now)?,
            refresh_token: self.issue(user.id, TokenType::Refresh, now)?,
        };

        info!("User {} logged in", user.id);
        Ok(pair)
    }

    /// New access token for a valid refresh token; the refresh token itself is reused
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let claims = self.codec.decode(refresh_token, TokenType::Refresh, now).map_err(|e| {
            warn!("Refresh rejected: {}", e);
            AppError::Unauthorized("Could not refresh token".to_string())
        })?;

        self.ensure_not_revoked(&claims).await?;
        let user = self.active_user(claims.sub, "User not found or inactive").await?;

        Ok(TokenPair {
            access_token: self.issue(user.id, TokenType::Access, now)?,
            refresh_token: refresh_token.to_string(),
        })
    }

    /// Revoke the presented access token until it expires
    pub async fn logout(&self, claims: &Claims) -> Result<(), AppError> {
        let now = Utc::now();
        self.token_repository
            .revoke_token(&claims.jti, claims.sub, claims.token_type.as_str(), claims.expires_at(), now)
            .await
            .map_err(AppError::internal("Failed to log out"))?;

        // housekeeping only; a failure here does not undo the logout
        match self.token_repository.delete_expired_revocations(now).await {
            Ok(0) => {}
            Ok(purged) => info!("Purged {} expired token revocations", purged),
            Err(e) => warn!("Failed to purge expired revocations: {:#}", e),
        }

        info!("User {} logged out", claims.sub);
        Ok(())
    }

    /// Resolve a bearer access token to its active user
    pub async fn authenticate(&self, token: &str) -> Result<(User, Claims), AppError> {
        let claims = self.codec.decode(token, TokenType::Access, Utc::now()).map_err(|e| {
            warn!("Rejected access token: {}", e);
            AppError::Unauthorized("Could not validate credentials".to_string())
        })?;

        self.ensure_not_revoked(&claims).await?;
        let user = self.active_user(claims.sub, "User not found or inactive").await?;
        Ok((user, claims))
    }

    /// Issue a reset token for an active account. Unknown emails are not
    /// reported, so callers always answer the same way.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        let user = self
            .user_repository
            .get_user_by_email(&email)
            .await
            .map_err(AppError::internal("Failed to request password reset"))?;

        let user = match user {
            Some(user) if user.is_active => user,
            _ => {
                info!("Password reset requested for unknown or inactive email");
                return Ok(());
            }
        };

        let token = generate_reset_token();
        let now = current_timestamp();
        let reset = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token_hash: hash_reset_token(&token),
            expires_at: now + Duration::hours(PASSWORD_RESET_TTL_HOURS),
            used_at: None,
            created_at: now,
        };
        self.token_repository
            .store_password_reset(&reset)
            .await
            .map_err(AppError::internal("Failed to request password reset"))?;

        // no mail transport; the link is logged for the operator to deliver
        info!(
            "Password reset link for user {}: {}/reset-password?token={}",
            user.id, self.frontend_url, token
        );
        Ok(())
    }

    /// Set a new password using a reset token. The token works once.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();
        check_password(&mut errors, "new_password", new_password);
        errors.into_result()?;

        let now = Utc::now();
        let invalid = || AppError::BadRequest("Invalid or expired reset token".to_string());

        let reset = self
            .token_repository
            .find_valid_password_reset(&hash_reset_token(token), now)
            .await
            .map_err(AppError::internal("Failed to reset password"))?
            .ok_or_else(invalid)?;

        let user = self
            .user_repository
            .get_user(reset.user_id)
            .await
            .map_err(AppError::internal("Failed to reset password"))?;
        if !user.map_or(false, |u| u.is_active) {
            return Err(invalid());
        }

        let password_hash = hash_password(new_password).map_err(|e| {
            error!("Password hashing failed: {}", e);
            AppError::Internal("Failed to update password".to_string())
        })?;

        let consumed = self
            .token_repository
            .consume_password_reset(reset.id, reset.user_id, &password_hash, now)
            .await
            .map_err(AppError::internal("Failed to update password"))?;
        if !consumed {
            return Err(invalid());
        }

        info!("Password reset for user {}", reset.user_id);
        Ok(())
    }

    pub async fn update_language(&self, user: &User, language: Language) -> Result<(), AppError> {
        let updated = self
            .user_repository
            .update_language(user.id, language, Utc::now())
            .await
            .map_err(AppError::internal("Failed to update language preference"))?;

        if !updated {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        info!("User {} language set to {}", user.id, language);
        Ok(())
    }

    fn issue(&self, user_id: Uuid, token_type: TokenType, now: chrono::DateTime<Utc>) -> Result<String, AppError> {
        self.codec.issue(user_id, token_type, now).map_err(|e| {
            error!("Failed to issue {} token: {}", token_type.as_str(), e);
            AppError::Internal("Failed to issue token".to_string())
        })
    }

    async fn ensure_not_revoked(&self, claims: &Claims) -> Result<(), AppError> {
        let revoked = self
            .token_repository
            .is_token_revoked(&claims.jti, Utc::now())
            .await
            .map_err(AppError::internal("Failed to validate token"))?;

        if revoked {
            return Err(AppError::Unauthorized("Token has been revoked".to_string()));
        }
        Ok(())
    }

    async fn active_user(&self, user_id: Uuid, message: &str) -> Result<User, AppError> {
        let user = self
            .user_repository
            .get_user(user_id)
            .await
            .map_err(AppError::internal("Failed to load user"))?;

        match user {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AppError::Unauthorized(message.to_string())),
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn check_password(errors: &mut ValidationErrors, field: &str, password: &str) {
    let length = password.chars().count();
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        errors.add(
            field,
            format!(
                "Password must be between {} and {} characters long",
                MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    async fn init_test() -> (AuthService, DbConnection) {
        let db = DbConnection::in_memory().await.expect("Failed to create test database");
        let codec = TokenCodec::new("test-secret", Duration::minutes(15), Duration::days(7));
        (AuthService::new(db.clone(), codec, "http://localhost:3000"), db)
    }

    fn registration(email: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            email: email.to_string(),
            name: "Mama Amani".to_string(),
            phone: Some("+255700000000".to_string()),
            password: "pass1234".to_string(),
        }
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("parent@example.com"));
        assert!(!is_valid_email("parent.example.com"));
        assert!(!is_valid_email("parent@localhost"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (service, _db) = init_test().await;
        let user = service.register(&registration("Parent@Example.com")).await.unwrap();
        assert_eq!(user.email, "parent@example.com");
        assert_eq!(user.language, Language::English);
        assert_ne!(user.password_hash, "pass1234");

        let pair = service.login("parent@example.com", "pass1234").await.unwrap();
        let (authenticated, claims) = service.authenticate(&pair.access_token).await.unwrap();
        assert_eq!(authenticated.id, user.id);
        assert_eq!(claims.token_type, TokenType::Access);

        // refresh tokens are not accepted as access tokens
        assert!(matches!(
            service.authenticate(&pair.refresh_token).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let (service, _db) = init_test().await;
        service.register(&registration("parent@example.com")).await.unwrap();

        assert!(matches!(
            service.register(&registration("parent@example.com")).await,
            Err(AppError::Conflict(_))
        ));

        let bad = RegisterUserRequest {
            email: "not-an-email".to_string(),
            name: " ".to_string(),
            phone: Some("0".repeat(21)),
            password: "abc".to_string(),
        };
        match service.register(&bad).await {
            Err(AppError::Validation(errors)) => assert_eq!(errors.fields.len(), 4),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let (service, db) = init_test().await;
        let user = service.register(&registration("parent@example.com")).await.unwrap();

        let wrong_password = service.login("parent@example.com", "nope").await;
        let unknown_user = service.login("nobody@example.com", "pass1234").await;
        for result in [wrong_password, unknown_user] {
            assert!(matches!(result, Err(AppError::Unauthorized(message)) if message == BAD_CREDENTIALS));
        }

        sqlx::query("UPDATE users SET is_active = FALSE WHERE id = ?")
            .bind(user.id.to_string())
            .execute(db.pool())
            .await
            .unwrap();
        assert!(matches!(
            service.login("parent@example.com", "pass1234").await,
            Err(AppError::Unauthorized(message)) if message == BAD_CREDENTIALS
        ));
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let (service, _db) = init_test().await;
        service.register(&registration("parent@example.com")).await.unwrap();
        let pair = service.login("parent@example.com", "pass1234").await.unwrap();

        let refreshed = service.refresh(&pair.refresh_token).await.unwrap();
        assert_eq!(refreshed.refresh_token, pair.refresh_token);
        assert!(service.authenticate(&refreshed.access_token).await.is_ok());

        assert!(matches!(
            service.refresh(&pair.access_token).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_access_token() {
        let (service, _db) = init_test().await;
        service.register(&registration("parent@example.com")).await.unwrap();
        let pair = service.login("parent@example.com", "pass1234").await.unwrap();

        let (_, claims) = service.authenticate(&pair.access_token).await.unwrap();
        service.logout(&claims).await.unwrap();

        assert!(matches!(
            service.authenticate(&pair.access_token).await,
            Err(AppError::Unauthorized(message)) if message == "Token has been revoked"
        ));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (service, db) = init_test().await;
        let user = service.register(&registration("parent@example.com")).await.unwrap();

        // unknown emails succeed silently
        service.request_password_reset("nobody@example.com").await.unwrap();
        service.request_password_reset("parent@example.com").await.unwrap();

        // the raw token is never stored; plant a known one next to the issued one
        let token = generate_reset_token();
        let now = Utc::now();
        TokenRepository::new(db.clone())
            .store_password_reset(&PasswordResetToken {
                id: Uuid::new_v4(),
                user_id: user.id,
                token_hash: hash_reset_token(&token),
                expires_at: now + Duration::hours(1),
                used_at: None,
                created_at: now,
            })
            .await
            .unwrap();

        let row = sqlx::query("SELECT COUNT(*) AS n FROM password_reset_tokens WHERE user_id = ?")
            .bind(user.id.to_string())
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("n"), 2);

        assert!(matches!(
            service.reset_password("wrong-token", "newpass").await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            service.reset_password(&token, "no").await,
            Err(AppError::Validation(_))
        ));

        service.reset_password(&token, "newpass").await.unwrap();
        assert!(service.login("parent@example.com", "newpass").await.is_ok());
        assert!(matches!(
            service.login("parent@example.com", "pass1234").await,
            Err(AppError::Unauthorized(_))
        ));

        // a used token cannot be replayed
        assert!(matches!(
            service.reset_password(&token, "another").await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_update_language() {
        let (service, _db) = init_test().await;
        let user = service.register(&registration("parent@example.com")).await.unwrap();
        service.update_language(&user, Language::Swahili).await.unwrap();

        let pair = service.login("parent@example.com", "pass1234").await.unwrap();
        let (reloaded, _) = service.authenticate(&pair.access_token).await.unwrap();
        assert_eq!(reloaded.language, Language::Swahili);
    }
}
