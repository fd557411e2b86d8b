pub mod error;
pub mod http;
pub mod service;

pub use error::ApiError;
pub use service::{CampaignInput, CampaignService, GeneratedCampaign};
