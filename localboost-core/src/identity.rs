//! Identity provider — Supabase GoTrue.
//!
//! Credentials are forwarded untouched; the resulting user id and access
//! token are relayed without being parsed or verified.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SupabaseConfig;
use crate::models::AuthSession;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError>;
}

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider understood the request and refused it.
    #[error("{message}")]
    Rejected { code: u16, message: String },

    #[error("Identity provider error ({code}): {message}")]
    Unavailable { code: u16, message: String },

    #[error("Identity provider URL or key is not configured")]
    NotConfigured,
}

impl IdentityError {
    pub fn is_unavailable(&self) -> bool {
        match self {
            IdentityError::Http(e) => e.is_connect() || e.is_timeout(),
            IdentityError::Unavailable { .. } | IdentityError::NotConfigured => true,
            IdentityError::Rejected { .. } => false,
        }
    }
}

pub fn create_identity_provider(
    config: &SupabaseConfig,
) -> Result<Arc<SupabaseAuthClient>, IdentityError> {
    Ok(Arc::new(SupabaseAuthClient::new(config)?))
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// Sign-up answers with a session when confirmation is off and with the bare
/// user object when it is on; token grants always answer with a session.
#[derive(Debug, Deserialize)]
struct GoTrueResponse {
    access_token: Option<String>,
    user: Option<GoTrueUser>,
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct GoTrueErrorResponse {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl GoTrueErrorResponse {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseAuthClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseAuthClient {
    pub fn new(config: &SupabaseConfig) -> Result<Self, IdentityError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// `GET /auth/v1/health`, used by `localboost-server --health`.
    pub async fn health(&self) -> Result<serde_json::Value, IdentityError> {
        let request = self.authorized(self.client.get(self.url("/auth/v1/health")?));
        let response = request.send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await.unwrap_or_default())
    }

    fn url(&self, path: &str) -> Result<String, IdentityError> {
        if self.base_url.is_empty() || self.api_key.is_empty() {
            return Err(IdentityError::NotConfigured);
        }
        Ok(format!("{}{}", self.base_url, path))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn post_credentials(
        &self,
        url: String,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let response = self
            .authorized(self.client.post(url))
            .json(&Credentials { email, password })
            .send()
            .await?;

        let body: GoTrueResponse = check_status(response).await?.json().await?;

        Ok(AuthSession {
            user_id: body.user.map(|u| u.id).or(body.id),
            access_token: body.access_token,
        })
    }
}

async fn check_status(response: Response) -> Result<Response, IdentityError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<GoTrueErrorResponse>(&body)
        .ok()
        .and_then(GoTrueErrorResponse::into_message)
        .unwrap_or(body);
    let code = status.as_u16();

    if status.is_server_error() {
        tracing::error!(code, message = %message, "Identity provider error");
        Err(IdentityError::Unavailable { code, message })
    } else {
        Err(IdentityError::Rejected { code, message })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseAuthClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let url = self.url("/auth/v1/signup")?;
        self.post_credentials(url, email, password).await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, IdentityError> {
        let url = self.url("/auth/v1/token?grant_type=password")?;
        self.post_credentials(url, email, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SupabaseAuthClient {
        SupabaseAuthClient::new(&SupabaseConfig {
            url: server.uri(),
            api_key: "anon-key".to_string(),
        })
        .unwrap()
    }

    fn session_body(user_id: &str, token: &str) -> serde_json::Value {
        serde_json::json!({
            "access_token": token,
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": { "id": user_id, "email": "joe@cafe.test" }
        })
    }

    #[tokio::test]
    async fn test_sign_up_returns_user_and_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer anon-key"))
            .and(body_json(serde_json::json!({
                "email": "joe@cafe.test",
                "password": "hunter22"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("u-1", "jwt-1")))
            .expect(1)
            .mount(&server)
            .await;

        let session = client(&server)
            .sign_up("joe@cafe.test", "hunter22")
            .await
            .unwrap();

        assert_eq!(session.user_id.as_deref(), Some("u-1"));
        assert_eq!(session.access_token.as_deref(), Some("jwt-1"));
    }

    #[tokio::test]
    async fn test_sign_up_pending_confirmation_has_no_session() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "u-2",
                "email": "new@cafe.test",
                "confirmation_sent_at": "2026-02-23T10:00:00Z"
            })))
            .mount(&server)
            .await;

        let session = client(&server).sign_up("new@cafe.test", "pw").await.unwrap();

        assert_eq!(session.user_id.as_deref(), Some("u-2"));
        assert!(session.access_token.is_none());
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_is_rejected_with_provider_message() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "code": 422,
                "error_code": "user_already_exists",
                "msg": "User already registered"
            })))
            .mount(&server)
            .await;

        match client(&server).sign_up("joe@cafe.test", "pw").await {
            Err(IdentityError::Rejected { code, message }) => {
                assert_eq!(code, 422);
                assert_eq!(message, "User already registered");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_sign_in_uses_password_grant() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_body("u-1", "jwt-2")))
            .expect(1)
            .mount(&server)
            .await;

        let session = client(&server)
            .sign_in_with_password("joe@cafe.test", "hunter22")
            .await
            .unwrap();

        assert_eq!(session.access_token.as_deref(), Some("jwt-2"));
    }

    #[tokio::test]
    async fn test_sign_in_bad_credentials_uses_error_description() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .sign_in_with_password("joe@cafe.test", "wrong")
            .await
            .unwrap_err();

        assert!(!err.is_unavailable());
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client(&server).sign_up("a@b.c", "pw").await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_missing_configuration_is_reported_before_any_call() {
        let auth = SupabaseAuthClient::new(&SupabaseConfig::default()).unwrap();
        let err = auth.sign_up("a@b.c", "pw").await.unwrap_err();
        assert!(matches!(err, IdentityError::NotConfigured));
    }

    #[tokio::test]
    async fn test_health_reads_gotrue_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "v2.150.0",
                "name": "GoTrue"
            })))
            .mount(&server)
            .await;

        let body = client(&server).health().await.unwrap();
        assert_eq!(body["name"], "GoTrue");
    }
}
