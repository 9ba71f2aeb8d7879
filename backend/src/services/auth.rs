//! Account registration and credential login
//!
//! Password hashing and verification run on the blocking thread pool.

use crate::auth::{JwtService, PasswordService};
use crate::error::ApiError;
use crate::repositories::{NewUser, UserRepository};
use tracing::{debug, info};
use validator::Validate;
use yoga_studio_shared::types::{JwtResponse, LoginRequest, MessageResponse, SignupRequest};
use yoga_studio_shared::validation::describe_errors;
use yoga_studio_shared::Principal;

pub const BAD_CREDENTIALS: &str = "Bad credentials";
pub const EMAIL_TAKEN: &str = "Error: Email is already taken!";
pub const REGISTERED: &str = "User registered successfully!";

/// Authentication service
pub struct AuthService;

impl AuthService {
    /// Register a new non-admin account
    pub async fn register(
        users: &dyn UserRepository,
        request: SignupRequest,
    ) -> Result<MessageResponse, ApiError> {
        request
            .validate()
            .map_err(|e| ApiError::Validation(describe_errors(&e)))?;

        if users
            .exists_by_email(&request.email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::BadRequest(EMAIL_TAKEN.to_string()));
        }

        let password_hash = PasswordService::hash_async(request.password)
            .await
            .map_err(ApiError::Internal)?;

        let user = users
            .create(NewUser {
                email: request.email,
                first_name: request.first_name,
                last_name: request.last_name,
                password_hash,
                admin: false,
            })
            .await
            .map_err(ApiError::Internal)?;

        info!(user_id = user.id, "User registered");
        Ok(MessageResponse::new(REGISTERED))
    }

    /// Check credentials and issue a bearer token
    ///
    /// Unknown email and wrong password both fail with the same
    /// `Unauthenticated` error, reported against `request_path`.
    pub async fn login(
        users: &dyn UserRepository,
        jwt: &JwtService,
        request: LoginRequest,
        request_path: &str,
    ) -> Result<JwtResponse, ApiError> {
        let bad_credentials = || ApiError::unauthenticated(BAD_CREDENTIALS, request_path);

        if request.validate().is_err() {
            return Err(bad_credentials());
        }

        let Some(user) = users
            .find_by_email(&request.email)
            .await
            .map_err(ApiError::Internal)?
        else {
            debug!("Login attempt for unknown email");
            return Err(bad_credentials());
        };

        let valid = PasswordService::verify_async(request.password, user.password_hash.clone())
            .await
            .map_err(ApiError::Internal)?;
        if !valid {
            debug!(user_id = user.id, "Login attempt with wrong password");
            return Err(bad_credentials());
        }

        let principal: Principal = user.principal();
        let token = jwt.issue(&principal).map_err(ApiError::Internal)?;

        info!(user_id = user.id, "User logged in");
        Ok(JwtResponse {
            token,
            token_type: "Bearer".to_string(),
            id: user.id,
            username: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            admin: user.admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::MemoryStore;
    use yoga_studio_shared::Role;

    fn signup(email: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            first_name: "toto".to_string(),
            last_name: "toto".to_string(),
            password: "test!1234".to_string(),
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let jwt = JwtService::new("test-secret", 3600);

        let message = AuthService::register(&store, signup("toto@mail.com"))
            .await
            .unwrap();
        assert_eq!(message.message, REGISTERED);

        let response = AuthService::login(
            &store,
            &jwt,
            login("toto@mail.com", "test!1234"),
            "/api/auth/login",
        )
        .await
        .unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.username, "toto@mail.com");
        assert!(!response.admin);

        let principal = jwt.verify(&response.token).unwrap();
        assert_eq!(principal.id, response.id);
        assert_eq!(principal.role, Role::User);
    }

    #[tokio::test]
    async fn test_login_token_resolves_to_username() {
        let store = MemoryStore::new();
        let jwt = JwtService::new("test-secret", 3600);
        AuthService::register(&store, signup("email@test.com"))
            .await
            .unwrap();

        let response = AuthService::login(
            &store,
            &jwt,
            login("email@test.com", "test!1234"),
            "/api/auth/login",
        )
        .await
        .unwrap();
        assert_eq!(jwt.verify(&response.token).unwrap().username, "email@test.com");

        let wrong = AuthService::login(
            &store,
            &jwt,
            login("email@test.com", "not-the-password"),
            "/api/auth/login",
        )
        .await;
        assert!(matches!(wrong, Err(ApiError::Unauthenticated { .. })));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryStore::new();
        AuthService::register(&store, signup("email@test.com"))
            .await
            .unwrap();

        let result = AuthService::register(&store, signup("email@test.com")).await;
        match result {
            Err(ApiError::BadRequest(msg)) => assert_eq!(msg, EMAIL_TAKEN),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_request() {
        let store = MemoryStore::new();
        let mut request = signup("not-an-email");
        request.password = "abc".to_string();

        let result = AuthService::register(&store, request).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));
        assert!(!store.exists_by_email("not-an-email").await.unwrap());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let jwt = JwtService::new("test-secret", 3600);
        AuthService::register(&store, signup("toto@mail.com"))
            .await
            .unwrap();

        let path = "/api/auth/login";
        let unknown = AuthService::login(&store, &jwt, login("nobody@mail.com", "test!1234"), path)
            .await
            .unwrap_err();
        let wrong = AuthService::login(&store, &jwt, login("toto@mail.com", "wrong-password"), path)
            .await
            .unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(
            wrong,
            ApiError::Unauthenticated { ref message, ref path }
                if message == BAD_CREDENTIALS && path == "/api/auth/login"
        ));
    }

    #[tokio::test]
    async fn test_seeded_admin_can_log_in() {
        let store = MemoryStore::new();
        let hash = PasswordService::hash("test!12345").unwrap();
        store.seed(hash).await.unwrap();
        let jwt = JwtService::new("test-secret", 3600);

        let response = AuthService::login(
            &store,
            &jwt,
            login("yoga@studio.com", "test!12345"),
            "/api/auth/login",
        )
        .await
        .unwrap();

        assert!(response.admin);
        assert_eq!(jwt.verify(&response.token).unwrap().role, Role::Admin);
    }
}
