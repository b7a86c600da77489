use crate::data::UserRepository;
use crate::domain::user::{
    is_valid_username, AuthUser, LoginRequest, RegisterRequest, UserResponse,
};
use crate::domain::DomainError;
use crate::infrastructure::captcha::CaptchaVerifier;
use crate::infrastructure::jwt::JwtService;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    jwt_service: Arc<JwtService>,
    captcha: Arc<dyn CaptchaVerifier>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        jwt_service: Arc<JwtService>,
        captcha: Arc<dyn CaptchaVerifier>,
    ) -> Self {
        Self {
            user_repo,
            jwt_service,
            captcha,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<UserResponse, DomainError> {
        tracing::debug!("Registration attempt for username: {}", req.username);

        if !is_valid_username(&req.username) {
            return Err(DomainError::ValidationError(
                "Username must be 3-15 Latin or Cyrillic letters".to_string(),
            ));
        }
        if req.password.is_empty() {
            return Err(DomainError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        if !self.captcha.verify(&req.recaptcha).await {
            tracing::warn!("Registration failed: captcha check for {}", req.username);
            return Err(DomainError::CaptchaFailed);
        }

        if self.user_repo.exists(&req.username).await? {
            tracing::warn!("Registration failed: username {} taken", req.username);
            return Err(DomainError::UserAlreadyExists);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Password hashing failed: {}", e);
                DomainError::InternalError(format!("Password hashing failed: {}", e))
            })?
            .to_string();

        // Accounts have no real mailbox; the address is derived from the name.
        let email = format!("{}@example.com", req.username);
        let user = self
            .user_repo
            .create(&req.username, &email, &password_hash)
            .await?;

        tracing::info!(
            "User registered: id={}, username={}",
            user.id,
            user.username
        );

        Ok(UserResponse::from(user))
    }

    pub async fn login(&self, req: LoginRequest) -> Result<(String, UserResponse), DomainError> {
        tracing::debug!("Login attempt for username: {}", req.username);

        let user = self
            .user_repo
            .find_by_username(&req.username)
            .await
            .map_err(|_| DomainError::InvalidCredentials)?;

        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
            tracing::error!("Invalid password hash format: {}", e);
            DomainError::InternalError(format!("Invalid password hash: {}", e))
        })?;

        if Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            tracing::warn!("Invalid password for user {}", user.username);
            return Err(DomainError::InvalidCredentials);
        }

        let auth_user = AuthUser {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
        };
        let token = self.jwt_service.generate_token(&auth_user)?;

        tracing::info!(
            "User logged in: id={}, username={}",
            user.id,
            user.username
        );

        Ok((token, UserResponse::from(user)))
    }

    pub async fn current_user(&self, user_id: i64) -> Result<UserResponse, DomainError> {
        let user = self.user_repo.find_by_id(user_id).await?;
        Ok(UserResponse::from(user))
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, DomainError> {
        self.user_repo.exists(username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::infrastructure::captcha::StaticVerifier;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct InMemoryUsers {
        users: Mutex<Vec<User>>,
    }

    impl InMemoryUsers {
        fn new() -> Self {
            Self {
                users: Mutex::new(Vec::new()),
            }
        }

        fn with_user(username: &str, password: &str, is_admin: bool) -> Self {
            let salt = SaltString::generate(&mut OsRng);
            let hash = Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .unwrap()
                .to_string();
            Self {
                users: Mutex::new(vec![User {
                    id: 1,
                    username: username.to_string(),
                    email: format!("{}@example.com", username),
                    password_hash: hash,
                    is_admin,
                }]),
            }
        }
    }

    #[async_trait]
    impl UserRepository for InMemoryUsers {
        async fn create(
            &self,
            username: &str,
            email: &str,
            password_hash: &str,
        ) -> Result<User, DomainError> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.username == username) {
                return Err(DomainError::UserAlreadyExists);
            }
            let user = User {
                id: users.len() as i64 + 1,
                username: username.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                is_admin: false,
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username == username)
                .cloned()
                .ok_or(DomainError::UserNotFound)
        }

        async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or(DomainError::UserNotFound)
        }

        async fn exists(&self, username: &str) -> Result<bool, DomainError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .any(|u| u.username == username))
        }
    }

    fn service(repo: InMemoryUsers, captcha_ok: bool) -> AuthService {
        AuthService::new(
            Arc::new(repo),
            Arc::new(JwtService::new("unit-test-secret-unit-test-secret!").unwrap()),
            Arc::new(StaticVerifier(captcha_ok)),
        )
    }

    fn register_req(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: "secret".to_string(),
            recaptcha: "token".to_string(),
        }
    }

    #[tokio::test]
    async fn register_accepts_latin_and_cyrillic_names() {
        let svc = service(InMemoryUsers::new(), true);
        assert!(svc.register(register_req("Ivan")).await.is_ok());
        assert!(svc.register(register_req("Иван")).await.is_ok());
    }

    #[tokio::test]
    async fn register_rejects_bad_usernames() {
        let svc = service(InMemoryUsers::new(), true);

        for bad in ["ab", "Ivan42", "Ivan Petrov"] {
            let err = svc.register(register_req(bad)).await.unwrap_err();
            assert!(matches!(err, DomainError::ValidationError(_)), "{}", bad);
        }
    }

    #[tokio::test]
    async fn register_rejects_failed_captcha() {
        let svc = service(InMemoryUsers::new(), false);
        let err = svc.register(register_req("Ivan")).await.unwrap_err();
        assert!(matches!(err, DomainError::CaptchaFailed));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let svc = service(InMemoryUsers::with_user("Ivan", "pw", false), true);
        let err = svc.register(register_req("Ivan")).await.unwrap_err();
        assert!(matches!(err, DomainError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn login_issues_token_carrying_admin_flag() {
        let svc = service(InMemoryUsers::with_user("Ivan", "secret", true), true);

        let (token, user) = svc
            .login(LoginRequest {
                username: "Ivan".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        assert!(user.is_admin);
        let verified = JwtService::new("unit-test-secret-unit-test-secret!")
            .unwrap()
            .verify_token(&token)
            .unwrap();
        assert_eq!(verified.username, "Ivan");
        assert!(verified.is_admin);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_invalid_credentials() {
        let svc = service(InMemoryUsers::with_user("Ivan", "secret", false), true);

        let err = svc
            .login(LoginRequest {
                username: "Ivan".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_with_unknown_user_is_invalid_credentials() {
        let svc = service(InMemoryUsers::new(), true);

        let err = svc
            .login(LoginRequest {
                username: "Nobody".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn username_exists_reflects_store() {
        let svc = service(InMemoryUsers::with_user("Ivan", "pw", false), true);
        assert!(svc.username_exists("Ivan").await.unwrap());
        assert!(!svc.username_exists("Maria").await.unwrap());
    }
}
