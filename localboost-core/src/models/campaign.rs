use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One stored campaign row, exactly as the storage provider returned it.
/// Column names and types belong to the provider's table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignRecord(pub Map<String, Value>);

impl CampaignRecord {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn id(&self) -> Option<&Value> {
        self.get("id")
    }

    pub fn business_name(&self) -> Option<&str> {
        self.get("business_name").and_then(Value::as_str)
    }

    /// The generated text held in the `posts` column. Accepts the
    /// `{"content": ...}` blob as text or as a json column; other text is
    /// returned as is.
    pub fn post_content(&self) -> String {
        match self.get("posts") {
            Some(Value::String(text)) => serde_json::from_str::<PostsBlob>(text)
                .map(|b| b.content)
                .unwrap_or_else(|_| text.clone()),
            Some(Value::Object(blob)) => blob
                .get("content")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }
}

impl From<Map<String, Value>> for CampaignRecord {
    fn from(row: Map<String, Value>) -> Self {
        Self(row)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCampaign {
    pub user_id: String,
    pub business_name: String,
    pub campaign_type: String,
    pub story: String,
    pub posts: String,
}

impl NewCampaign {
    pub fn new(
        user_id: impl Into<String>,
        business_name: impl Into<String>,
        campaign_type: impl Into<String>,
        story: impl Into<String>,
        generated: &str,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            business_name: business_name.into(),
            campaign_type: campaign_type.into(),
            story: story.into(),
            posts: wrap_posts(generated),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PostsBlob {
    content: String,
}

pub fn wrap_posts(generated: &str) -> String {
    serde_json::json!({ "content": generated }).to_string()
}
