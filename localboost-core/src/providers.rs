use std::sync::Arc;

use crate::config::LocalBoostConfig;
use crate::error::LocalBoostError;
use crate::generation::{create_generation_provider, GenerationProvider};
use crate::identity::{create_identity_provider, SupabaseAuthClient};
use crate::storage::{create_campaign_store, CampaignStore};

/// Provider clients, built once at startup and shared by every request.
#[derive(Clone)]
pub struct Providers {
    pub identity: Arc<SupabaseAuthClient>,
    pub store: Arc<dyn CampaignStore>,
    pub generation: Arc<dyn GenerationProvider>,
}

impl Providers {
    pub fn from_config(config: &LocalBoostConfig) -> Result<Self, LocalBoostError> {
        Ok(Self {
            identity: create_identity_provider(&config.identity)?,
            store: create_campaign_store(&config.storage, &config.identity)?,
            generation: create_generation_provider(&config.generation)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_default_config() {
        let providers = Providers::from_config(&LocalBoostConfig::default()).unwrap();
        assert_eq!(providers.store.name(), "rest");
        assert_eq!(providers.generation.name(), "openai");
    }

    #[tokio::test]
    async fn postgres_without_url_still_builds_and_fails_per_call() {
        let mut config = LocalBoostConfig::default();
        config.storage.backend = crate::config::StorageBackend::Postgres;
        let providers = Providers::from_config(&config).unwrap();
        assert_eq!(providers.store.name(), "postgres");

        let err = providers.store.list_for_user("u1").await.unwrap_err();
        assert!(matches!(err, crate::storage::StorageError::NotConfigured(_)));
    }
}
