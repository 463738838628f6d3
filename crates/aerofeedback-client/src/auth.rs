//! Login, registration and session handling

use aerofeedback_core::validation::check_credentials;
use aerofeedback_core::{Credentials, LoginResponse, RegisterRequest, User};
use reqwest::Method;
use tracing::{info, instrument};

use crate::error::{ClientError, ClientResult};
use crate::http::{ApiClient, unwrap_field};

/// Authentication endpoints plus the locally stored session token
#[derive(Debug, Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    /// Create the service
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Log in and remember the issued token
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input, the server's message
    /// for rejected credentials, or a token storage error.
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> ClientResult<User> {
        check_credentials(credentials)?;

        let body = self
            .client
            .call_with_body(Method::POST, "/api/auth/login", credentials, "Login failed")
            .await?;
        let login: LoginResponse = serde_json::from_value(body)?;

        self.client.tokens().store(&login.access_token).await?;
        info!(user_id = login.user.id, role = %login.user.role, "Logged in");
        Ok(login.user)
    }

    /// Create an account. Nothing is sent when local validation fails.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing messages per field, or the
    /// server's message when it refuses the registration.
    #[instrument(skip_all, fields(email = %request.email, role = %request.role))]
    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<User> {
        request.check()?;

        let body = self
            .client
            .call_with_body(
                Method::POST,
                "/api/auth/register",
                request,
                "Registration failed",
            )
            .await?;
        let user: User = unwrap_field(body, "user")?;
        info!(user_id = user.id, "Registered account");
        Ok(user)
    }

    /// The user the stored token belongs to
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Unauthenticated`] when no token is stored, or
    /// the server's message when the token is rejected.
    pub async fn current_user(&self) -> ClientResult<User> {
        if self.client.tokens().load().await?.is_none() {
            return Err(ClientError::Unauthenticated);
        }

        let body = self
            .client
            .call(Method::GET, "/api/auth/me", "Failed to fetch current user")
            .await?;
        unwrap_field(body, "user")
    }

    /// Whether a session token is stored
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be read.
    pub async fn is_authenticated(&self) -> ClientResult<bool> {
        Ok(self.client.tokens().load().await?.is_some())
    }

    /// Forget the stored token. Purely local.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be cleared.
    pub async fn logout(&self) -> ClientResult<()> {
        self.client.tokens().clear().await?;
        info!("Logged out");
        Ok(())
    }
}
