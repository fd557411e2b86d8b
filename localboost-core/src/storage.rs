//! Storage provider — campaign records.
//!
//! Two backends share the `CampaignStore` trait:
//! - **rest** — Supabase PostgREST (`/rest/v1/<table>`)
//! - **postgres** — direct `sqlx` connection to the same table
//!
//! Rows are relayed as the backend returns them; the table's columns and
//! types belong to the storage provider. The owner identifier is forwarded as
//! given, and the backend decides how to answer an empty or unknown owner
//! (no rows, or an error such as a rejected uuid).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;

use serde_json::Value;

use crate::config::{StorageBackend, StorageConfig, SupabaseConfig};
use crate::models::{CampaignRecord, NewCampaign};

#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Insert one record and return it as stored.
    async fn insert(&self, campaign: &NewCampaign) -> Result<CampaignRecord, StorageError>;

    /// All records owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<CampaignRecord>, StorageError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Insert returned no row")]
    NothingWritten,

    #[error("Storage backend is not configured: {0}")]
    NotConfigured(String),
}

impl StorageError {
    pub fn is_unavailable(&self) -> bool {
        match self {
            StorageError::Http(e) => e.is_connect() || e.is_timeout(),
            StorageError::Database(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            StorageError::NotConfigured(_) => true,
            _ => false,
        }
    }
}

/// Build the configured storage backend. Neither backend touches the network
/// here: a down database or a missing `database_url` surfaces on the first
/// call, so the service still starts.
pub fn create_campaign_store(
    storage: &StorageConfig,
    identity: &SupabaseConfig,
) -> Result<Arc<dyn CampaignStore>, StorageError> {
    match storage.backend {
        StorageBackend::Rest => Ok(Arc::new(RestCampaignStore::new(identity, &storage.table)?)),
        StorageBackend::Postgres => {
            if storage.database_url.is_empty() {
                return Ok(Arc::new(UnconfiguredStore::new(
                    "postgres",
                    "storage.database_url is empty",
                )));
            }
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(storage.max_connections)
                .connect_lazy(&storage.database_url);
            match pool {
                Ok(pool) => Ok(Arc::new(PgCampaignStore::new(pool, &storage.table))),
                Err(e) => {
                    tracing::warn!(error = %e, "storage.database_url is invalid; campaign storage calls will fail");
                    Ok(Arc::new(UnconfiguredStore::new(
                        "postgres",
                        format!("storage.database_url is invalid: {}", e),
                    )))
                }
            }
        }
    }
}

// ============================================================================
// UnconfiguredStore
// ============================================================================

/// Stands in for a backend whose settings are missing; every call fails
/// with `StorageError::NotConfigured`.
#[derive(Debug, Clone)]
pub struct UnconfiguredStore {
    backend: &'static str,
    reason: String,
}

impl UnconfiguredStore {
    pub fn new(backend: &'static str, reason: impl Into<String>) -> Self {
        Self {
            backend,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CampaignStore for UnconfiguredStore {
    async fn insert(&self, _campaign: &NewCampaign) -> Result<CampaignRecord, StorageError> {
        Err(StorageError::NotConfigured(self.reason.clone()))
    }

    async fn list_for_user(&self, _user_id: &str) -> Result<Vec<CampaignRecord>, StorageError> {
        Err(StorageError::NotConfigured(self.reason.clone()))
    }

    fn name(&self) -> &str {
        self.backend
    }
}

// ============================================================================
// RestCampaignStore
// ============================================================================

#[derive(Debug, Clone)]
pub struct RestCampaignStore {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

#[derive(Debug, serde::Deserialize)]
struct PostgrestError {
    message: Option<String>,
}

impl RestCampaignStore {
    pub fn new(config: &SupabaseConfig, table: &str) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            table: table.to_string(),
        })
    }

    fn table_url(&self) -> Result<String, StorageError> {
        if self.base_url.is_empty() || self.api_key.is_empty() {
            return Err(StorageError::NotConfigured(
                "Supabase URL or key is empty".to_string(),
            ));
        }
        Ok(format!("{}/rest/v1/{}", self.base_url, self.table))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, StorageError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<PostgrestError>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or(body);
        tracing::error!(code = status.as_u16(), message = %message, table = %self.table, "Storage API error");
        Err(StorageError::Api {
            code: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CampaignStore for RestCampaignStore {
    async fn insert(&self, campaign: &NewCampaign) -> Result<CampaignRecord, StorageError> {
        let request = self
            .client
            .post(self.table_url()?)
            .header("Prefer", "return=representation")
            .json(campaign);

        let body = self.send(request).await?.text().await?;
        serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(first_row)
            .ok_or(StorageError::NothingWritten)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<CampaignRecord>, StorageError> {
        let owner_filter = format!("eq.{}", user_id);
        let request = self.client.get(self.table_url()?).query(&[
            ("select", "*"),
            ("user_id", owner_filter.as_str()),
            ("order", "created_at.desc"),
        ]);

        let rows: Vec<serde_json::Map<String, Value>> = self.send(request).await?.json().await?;
        Ok(rows.into_iter().map(CampaignRecord::from).collect())
    }

    fn name(&self) -> &str {
        "rest"
    }
}

/// The written row from a `return=representation` reply: an array of rows,
/// or a single object when the caller asked for one.
fn first_row(representation: Value) -> Option<CampaignRecord> {
    match representation {
        Value::Array(rows) => rows.into_iter().find_map(|row| match row {
            Value::Object(row) => Some(CampaignRecord::from(row)),
            _ => None,
        }),
        Value::Object(row) if !row.is_empty() => Some(CampaignRecord::from(row)),
        _ => None,
    }
}

// ============================================================================
// PgCampaignStore
// ============================================================================

#[derive(Debug, Clone)]
pub struct PgCampaignStore {
    pool: PgPool,
    insert_sql: String,
    list_sql: String,
}

impl PgCampaignStore {
    /// `table` comes from configuration, never from a request. Rows come back
    /// through `to_jsonb` so every column is relayed whatever its type.
    pub fn new(pool: PgPool, table: &str) -> Self {
        Self {
            insert_sql: format!(
                "WITH written AS (\
                 INSERT INTO {table} (user_id, business_name, campaign_type, story, posts) \
                 VALUES ($1::uuid, $2, $3, $4, $5) RETURNING *) \
                 SELECT to_jsonb(written) FROM written"
            ),
            list_sql: format!(
                "SELECT to_jsonb(c) FROM {table} c \
                 WHERE c.user_id::text = $1 ORDER BY c.created_at DESC"
            ),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CampaignStore for PgCampaignStore {
    async fn insert(&self, campaign: &NewCampaign) -> Result<CampaignRecord, StorageError> {
        let row = sqlx::query_scalar::<_, Json<serde_json::Map<String, Value>>>(&self.insert_sql)
            .bind(&campaign.user_id)
            .bind(&campaign.business_name)
            .bind(&campaign.campaign_type)
            .bind(&campaign.story)
            .bind(&campaign.posts)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|Json(row)| CampaignRecord::from(row))
            .ok_or(StorageError::NothingWritten)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<CampaignRecord>, StorageError> {
        let rows = sqlx::query_scalar::<_, Json<serde_json::Map<String, Value>>>(&self.list_sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|Json(row)| CampaignRecord::from(row)).collect())
    }

    fn name(&self) -> &str {
        "postgres"
    }
}
