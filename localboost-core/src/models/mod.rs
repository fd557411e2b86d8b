pub mod account;
pub mod campaign;

pub use account::AuthSession;
pub use campaign::{CampaignRecord, NewCampaign};
