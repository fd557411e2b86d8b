//! Campaign service — one delegation per operation.
//!
//! Provider clients are injected at construction; the service holds no other
//! state and never retries.

use std::sync::Arc;

use localboost_core::{
    prompt, AuthSession, CampaignRecord, CampaignStore, GenerationError, GenerationProvider,
    IdentityError, IdentityProvider, NewCampaign, StorageError,
};

use crate::error::ApiError;

/// Validated input of a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignInput {
    pub business_name: String,
    pub campaign_type: String,
    pub story: String,
    pub user_id: String,
}

#[derive(Debug, Clone)]
pub struct GeneratedCampaign {
    pub posts: String,
    pub business_name: String,
    pub record: CampaignRecord,
}

#[derive(Clone)]
pub struct CampaignService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn CampaignStore>,
    generation: Arc<dyn GenerationProvider>,
}

impl CampaignService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn CampaignStore>,
        generation: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            identity,
            store,
            generation,
        }
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        self.identity
            .sign_up(email, password)
            .await
            .map_err(|e| identity_error(e, ApiError::Validation))
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        self.identity
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| identity_error(e, ApiError::ProviderAuth))
    }

    /// Generate posts, then store them. A failed write fails the request.
    pub async fn generate_campaign(
        &self,
        input: CampaignInput,
    ) -> Result<GeneratedCampaign, ApiError> {
        let prompt =
            prompt::build_campaign_prompt(&input.business_name, &input.campaign_type, &input.story);

        let posts = self.generation.generate(&prompt).await.map_err(|e| {
            tracing::error!(
                provider = self.generation.name(),
                business_name = %input.business_name,
                error = %e,
                "Campaign generation failed"
            );
            generation_error(e)
        })?;

        let campaign = NewCampaign::new(
            input.user_id,
            input.business_name.as_str(),
            input.campaign_type,
            input.story,
            &posts,
        );

        let record = self.store.insert(&campaign).await.map_err(|e| {
            tracing::error!(
                backend = self.store.name(),
                business_name = %input.business_name,
                unavailable = e.is_unavailable(),
                error = %e,
                "Generated campaign could not be stored"
            );
            ApiError::StorageWriteFailed(storage_message(&e))
        })?;

        tracing::info!(
            campaign_id = ?record.id(),
            business_name = %input.business_name,
            chars = posts.len(),
            "Campaign generated"
        );

        Ok(GeneratedCampaign {
            posts,
            business_name: input.business_name,
            record,
        })
    }

    pub async fn list_campaigns(&self, user_id: &str) -> Result<Vec<CampaignRecord>, ApiError> {
        self.store.list_for_user(user_id).await.map_err(|e| {
            tracing::error!(
                backend = self.store.name(),
                unavailable = e.is_unavailable(),
                error = %e,
                "Listing campaigns failed"
            );
            ApiError::StorageReadFailed(storage_message(&e))
        })
    }
}

/// `rejected` picks the kind for a refusal: sign-up and login differ.
fn identity_error(e: IdentityError, rejected: fn(String) -> ApiError) -> ApiError {
    match e {
        IdentityError::Rejected { message, .. } => {
            tracing::warn!(message = %message, "Identity provider rejected request");
            rejected(message)
        }
        e if e.is_unavailable() => {
            tracing::error!(error = %e, "Identity provider unavailable");
            ApiError::ProviderUnavailable(e.to_string())
        }
        // Answered, but the reply could not be read.
        e => {
            tracing::error!(error = %e, "Unreadable identity provider reply");
            rejected(format!("Identity provider reply could not be read: {}", e))
        }
    }
}

fn generation_error(e: GenerationError) -> ApiError {
    if e.is_unavailable() {
        ApiError::ProviderUnavailable(format!("Generation provider unavailable: {}", e))
    } else {
        ApiError::GenerationFailed(e.to_string())
    }
}

fn storage_message(e: &StorageError) -> String {
    match e {
        StorageError::Api { message, .. } => message.clone(),
        e => e.to_string(),
    }
}

// ============================================================================
// Test doubles shared by the unit tests of this crate
// ============================================================================
