use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::prompt::SYSTEM_ROLE;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LocalBoostConfig {
    pub service: ServiceConfig,
    pub http: HttpConfig,
    /// `[identity]`; `[supabase]` is read as well.
    #[serde(alias = "supabase")]
    pub identity: SupabaseConfig,
    pub storage: StorageConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
        }
    }
}

/// Supabase project shared by the identity provider and the REST storage backend.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Rest,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub table: String,
    pub database_url: String,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Rest,
            table: "campaigns".to_string(),
            database_url: String::new(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub timeout_seconds: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.8,
            max_tokens: 800,
            system_prompt: SYSTEM_ROLE.to_string(),
            timeout_seconds: 60,
        }
    }
}

impl LocalBoostConfig {
    /// Load defaults, then the optional TOML file at `path`, then
    /// `LOCALBOOST__SECTION__KEY` environment overrides. Provider secrets
    /// left empty are filled from `SUPABASE_URL`, `SUPABASE_KEY` and
    /// `OPENAI_API_KEY`.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("LOCALBOOST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Self = s.try_deserialize()?;
        Ok(config.with_env_fallbacks(|key| std::env::var(key).ok()))
    }

    /// Parse a TOML document without consulting the environment.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn with_env_fallbacks<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut String, key: &str| {
            if slot.is_empty() {
                if let Some(v) = lookup(key) {
                    *slot = v;
                }
            }
        };
        fill(&mut self.identity.url, "SUPABASE_URL");
        fill(&mut self.identity.api_key, "SUPABASE_KEY");
        fill(&mut self.generation.api_key, "OPENAI_API_KEY");
        fill(&mut self.storage.database_url, "DATABASE_URL");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_generation_parameters() {
        let config = LocalBoostConfig::default();
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert!((config.generation.temperature - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.generation.max_tokens, 800);
        assert_eq!(config.generation.system_prompt, SYSTEM_ROLE);
        assert_eq!(config.http.port, 5001);
        assert_eq!(config.storage.backend, StorageBackend::Rest);
        assert_eq!(config.storage.table, "campaigns");
    }

    #[test]
    fn toml_overrides_only_named_keys() {
        let config = LocalBoostConfig::from_toml(
            r#"
            [http]
            port = 8080

            [storage]
            backend = "postgres"
            database_url = "postgres://localhost/localboost"
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.http.port, 8080);
        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.storage.max_connections, 5);
        assert_eq!(config.generation.max_tokens, 800);
    }

    #[test]
    fn env_fallbacks_fill_only_empty_secrets() {
        let config = LocalBoostConfig::from_toml(
            r#"
            [identity]
            url = "https://from-file.supabase.co"
            "#,
        )
        .unwrap()
        .with_env_fallbacks(|key| match key {
            "SUPABASE_URL" => Some("https://from-env.supabase.co".to_string()),
            "SUPABASE_KEY" => Some("anon-key".to_string()),
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            _ => None,
        });

        assert_eq!(config.identity.url, "https://from-file.supabase.co");
        assert_eq!(config.identity.api_key, "anon-key");
        assert_eq!(config.generation.api_key, "sk-test");
        assert!(config.storage.database_url.is_empty());
    }

    #[test]
    fn identity_section_sets_provider_url_and_key() {
        let config = LocalBoostConfig::from_toml(
            r#"
            [identity]
            url = "https://x.supabase.co"
            api_key = "anon-key"
            "#,
        )
        .unwrap();
        assert_eq!(config.identity.url, "https://x.supabase.co");
        assert_eq!(config.identity.api_key, "anon-key");
    }

    #[test]
    fn supabase_section_name_is_still_read() {
        let config = LocalBoostConfig::from_toml(
            r#"
            [supabase]
            url = "https://x.supabase.co"
            "#,
        )
        .unwrap();
        assert_eq!(config.identity.url, "https://x.supabase.co");
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let config = LocalBoostConfig::load("does-not-exist-localboost");
        assert!(config.is_ok());
    }
}
