//! LocalBoost HTTP API
//!
//! Axum-based HTTP server exposing the campaign service.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function returning `(StatusCode, serde_json::Value)`. The inner
//! functions are directly testable without axum dispatch machinery.
//!
//! Endpoints:
//! - POST /signup            — create an account
//! - POST /login             — password sign-in
//! - POST /generate-campaign — generate and store campaign posts
//! - GET  /campaigns         — list a user's campaigns, newest first
//! - GET  /test              — fixed acknowledgement, no provider calls
//! - GET  /version           — server version info

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::service::{CampaignInput, CampaignService};

pub const TEST_MESSAGE: &str = "Backend is working with Supabase!";

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub service: CampaignService,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
        .route("/generate-campaign", post(generate_campaign_handler))
        .route("/campaigns", get(campaigns_handler))
        .route("/test", get(test_handler))
        .route("/version", get(version_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server on `addr`.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: Arc<HttpState>,
    addr: &str,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("LocalBoost HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateCampaignRequest {
    pub business_name: Option<String>,
    pub campaign_type: Option<String>,
    pub story: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CampaignsQuery {
    pub user_id: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::Validation(format!("{} is required", field))),
    }
}

impl CredentialsRequest {
    pub fn validate(self) -> Result<(String, String), ApiError> {
        Ok((
            required(self.email, "email")?,
            required(self.password, "password")?,
        ))
    }
}

impl GenerateCampaignRequest {
    /// Presence checks only; values are passed on verbatim.
    pub fn validate(self) -> Result<CampaignInput, ApiError> {
        Ok(CampaignInput {
            business_name: required(self.business_name, "business_name")?,
            campaign_type: required(self.campaign_type, "campaign_type")?,
            story: self.story.unwrap_or_default(),
            user_id: required(self.user_id, "user_id")?,
        })
    }
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

pub fn test_inner() -> serde_json::Value {
    serde_json::json!({ "message": TEST_MESSAGE })
}

pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "service": "localboost",
    })
}

pub async fn signup_inner(
    service: &CampaignService,
    req: CredentialsRequest,
) -> (StatusCode, serde_json::Value) {
    let result = match req.validate() {
        Ok((email, password)) => service.register(&email, &password).await,
        Err(e) => Err(e),
    };
    session_reply(result)
}

pub async fn login_inner(
    service: &CampaignService,
    req: CredentialsRequest,
) -> (StatusCode, serde_json::Value) {
    let result = match req.validate() {
        Ok((email, password)) => service.authenticate(&email, &password).await,
        Err(e) => Err(e),
    };
    session_reply(result)
}

pub async fn generate_campaign_inner(
    service: &CampaignService,
    req: GenerateCampaignRequest,
) -> (StatusCode, serde_json::Value) {
    let input = match req.validate() {
        Ok(input) => input,
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "Rejected generation request");
            return e.into_parts();
        }
    };

    match service.generate_campaign(input).await {
        Ok(generated) => (
            StatusCode::OK,
            serde_json::json!({
                "success": true,
                "posts": generated.posts,
                "business_name": generated.business_name,
            }),
        ),
        Err(e) => e.into_parts(),
    }
}

/// An absent `user_id` is forwarded as the empty string.
pub async fn campaigns_inner(
    service: &CampaignService,
    query: CampaignsQuery,
) -> (StatusCode, serde_json::Value) {
    let user_id = query.user_id.unwrap_or_default();
    match service.list_campaigns(&user_id).await {
        Ok(campaigns) => (
            StatusCode::OK,
            serde_json::json!({
                "success": true,
                "campaigns": campaigns,
            }),
        ),
        Err(e) => e.into_parts(),
    }
}

fn session_reply(
    result: Result<localboost_core::AuthSession, ApiError>,
) -> (StatusCode, serde_json::Value) {
    match result {
        Ok(session) => (
            StatusCode::OK,
            serde_json::json!({
                "success": true,
                "user": session.user_id,
                "session": session.access_token,
            }),
        ),
        Err(e) => e.into_parts(),
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

fn body_or_reject<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

pub async fn signup_handler(
    State(state): State<Arc<HttpState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match body_or_reject(payload) {
        Ok(req) => signup_inner(&state.service, req).await,
        Err(e) => e.into_parts(),
    };
    (status, Json(body))
}

pub async fn login_handler(
    State(state): State<Arc<HttpState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match body_or_reject(payload) {
        Ok(req) => login_inner(&state.service, req).await,
        Err(e) => e.into_parts(),
    };
    (status, Json(body))
}

pub async fn generate_campaign_handler(
    State(state): State<Arc<HttpState>>,
    payload: Result<Json<GenerateCampaignRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match body_or_reject(payload) {
        Ok(req) => generate_campaign_inner(&state.service, req).await,
        Err(e) => {
            tracing::error!(kind = e.kind(), error = %e, "Rejected generation request");
            e.into_parts()
        }
    };
    (status, Json(body))
}

pub async fn campaigns_handler(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<CampaignsQuery>,
) -> impl IntoResponse {
    let (status, body) = campaigns_inner(&state.service, query).await;
    (status, Json(body))
}

pub async fn test_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(test_inner()))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::stubs::{MemoryStore, StubGeneration, StubIdentity};

    const OWNER: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";

    fn make_service(reject_with: Option<(u16, String)>, generation: StubGeneration) -> CampaignService {
        CampaignService::new(
            Arc::new(StubIdentity {
                reject_with,
                ..StubIdentity::accepting()
            }),
            Arc::new(MemoryStore::default()),
            Arc::new(generation),
        )
    }

    fn credentials(email: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    fn joes_cafe() -> GenerateCampaignRequest {
        GenerateCampaignRequest {
            business_name: Some("Joe's Cafe".to_string()),
            campaign_type: Some("grand opening".to_string()),
            story: Some("family-owned, serves coffee".to_string()),
            user_id: Some(OWNER.to_string()),
        }
    }

    #[test]
    fn test_test_inner_is_fixed() {
        assert_eq!(test_inner()["message"], TEST_MESSAGE);
    }

    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert_eq!(v["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(v["service"], "localboost");
    }

    #[test]
    fn test_generate_request_story_is_optional() {
        let input = GenerateCampaignRequest {
            story: None,
            ..joes_cafe()
        }
        .validate()
        .unwrap();
        assert_eq!(input.story, "");
    }

    #[test]
    fn test_generate_request_requires_fields() {
        for (req, field) in [
            (GenerateCampaignRequest { business_name: None, ..joes_cafe() }, "business_name"),
            (GenerateCampaignRequest { campaign_type: Some("  ".into()), ..joes_cafe() }, "campaign_type"),
            (GenerateCampaignRequest { user_id: None, ..joes_cafe() }, "user_id"),
        ] {
            assert_eq!(
                req.validate().unwrap_err(),
                ApiError::Validation(format!("{} is required", field))
            );
        }
    }

    #[tokio::test]
    async fn test_signup_inner_success_shape() {
        let svc = make_service(None, StubGeneration::replying("x"));
        let (status, body) = signup_inner(&svc, credentials("joe@cafe.test", "pw")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["session"], "token-123");
        assert!(body["user"].is_string());
    }

    #[tokio::test]
    async fn test_signup_inner_rejection_is_400() {
        let svc = make_service(
            Some((422, "Password should be at least 6 characters".into())),
            StubGeneration::replying("x"),
        );
        let (status, body) = signup_inner(&svc, credentials("joe@cafe.test", "pw")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Password should be at least 6 characters");
    }

    #[tokio::test]
    async fn test_login_inner_rejection_is_401() {
        let svc = make_service(
            Some((400, "Invalid login credentials".into())),
            StubGeneration::replying("x"),
        );
        let (status, body) = login_inner(&svc, credentials("joe@cafe.test", "bad")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "provider_auth");
    }

    #[tokio::test]
    async fn test_login_inner_missing_password_is_400() {
        let svc = make_service(None, StubGeneration::replying("x"));
        let req = CredentialsRequest {
            email: Some("joe@cafe.test".into()),
            password: None,
        };
        let (status, body) = login_inner(&svc, req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "password is required");
    }

    #[tokio::test]
    async fn test_generate_then_list_returns_same_posts() {
        let svc = make_service(None, StubGeneration::replying("1. Opening day!"));

        let (status, body) = generate_campaign_inner(&svc, joes_cafe()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["posts"], "1. Opening day!");
        assert_eq!(body["business_name"], "Joe's Cafe");

        let query = CampaignsQuery {
            user_id: Some(OWNER.to_string()),
        };
        let (status, body) = campaigns_inner(&svc, query).await;
        assert_eq!(status, StatusCode::OK);
        let campaigns = body["campaigns"].as_array().unwrap();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0]["business_name"], "Joe's Cafe");
        let posts: serde_json::Value =
            serde_json::from_str(campaigns[0]["posts"].as_str().unwrap()).unwrap();
        assert_eq!(posts["content"], "1. Opening day!");
    }

    #[tokio::test]
    async fn test_generate_inner_provider_error_is_failure() {
        let svc = make_service(None, StubGeneration::failing(500));
        let (status, body) = generate_campaign_inner(&svc, joes_cafe()).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
        assert_eq!(body["kind"], "generation_failed");
    }

    #[tokio::test]
    async fn test_campaigns_inner_without_user_id_is_empty_success() {
        let svc = make_service(None, StubGeneration::replying("x"));
        let (status, body) = campaigns_inner(&svc, CampaignsQuery::default()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({ "success": true, "campaigns": [] }));
    }
}
