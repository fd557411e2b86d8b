pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod identity;
pub mod models;
pub mod prompt;
pub mod providers;
pub mod storage;

pub use config::LocalBoostConfig;
pub use error::LocalBoostError;
pub use generation::{
    create_generation_provider, GenerationError, GenerationParams, GenerationProvider,
    OpenAiChatClient,
};
pub use identity::{create_identity_provider, IdentityError, IdentityProvider, SupabaseAuthClient};
pub use models::{AuthSession, CampaignRecord, NewCampaign};
pub use providers::Providers;
pub use storage::{
    create_campaign_store, CampaignStore, PgCampaignStore, RestCampaignStore, StorageError,
    UnconfiguredStore,
};
