//! localboost-cli — command-line client for the LocalBoost campaign service
//!
//! # Subcommands
//! - `signup <email> <password>`  — create an account
//! - `login <email> <password>`   — sign in and print the session token
//! - `generate ...`               — generate and store campaign posts
//! - `campaigns --user-id <id>`   — list stored campaigns, newest first
//! - `status`                     — check that the server answers

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:5001";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "localboost-cli",
    version,
    about = "LocalBoost campaign service client"
)]
struct Cli {
    /// LocalBoost HTTP server URL (overrides LOCALBOOST_URL env var)
    #[arg(long, env = "LOCALBOOST_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new account
    Signup { email: String, password: String },

    /// Sign in with e-mail and password
    Login { email: String, password: String },

    /// Generate five social media posts for a campaign
    Generate {
        #[arg(long)]
        business_name: String,

        #[arg(long)]
        campaign_type: String,

        /// Campaign details and target audience
        #[arg(long, default_value = "")]
        story: String,

        #[arg(long)]
        user_id: String,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// List stored campaigns for a user
    Campaigns {
        #[arg(long)]
        user_id: String,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Show server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

/// Envelope shared by every LocalBoost route.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub success: bool,
    pub error: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl Envelope {
    /// A string field of the reply; `None` when absent or null.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.rest.get(name).and_then(|v| v.as_str())
    }
}

/// The columns the listing shows; anything else in the row is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CampaignSummary {
    pub business_name: String,
    pub campaign_type: String,
    pub posts: serde_json::Value,
    pub created_at: serde_json::Value,
}

/// Unwrap the stored `{"content": ...}` blob, held as text or as a json
/// column; raw text passes through.
pub fn post_content(posts: &serde_json::Value) -> String {
    let blob = match posts {
        serde_json::Value::String(text) => match serde_json::from_str(text) {
            Ok(parsed) => parsed,
            Err(_) => return text.clone(),
        },
        other => other.clone(),
    };
    match blob["content"].as_str() {
        Some(content) => content.to_string(),
        None => posts.as_str().unwrap_or_default().to_string(),
    }
}

/// One line per campaign: `YYYY-MM-DD  [type]  name — first line of posts`.
pub fn summary_line(c: &CampaignSummary) -> String {
    let date: String = c
        .created_at
        .as_str()
        .unwrap_or("")
        .chars()
        .take(10)
        .collect();
    let content = post_content(&c.posts);
    let first: String = content
        .lines()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .chars()
        .take(60)
        .collect();
    format!("{}  [{}]  {} — {}", date, c.campaign_type, c.business_name, first)
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()?)
}

/// Send a request and decode the envelope. Exits on transport failure or
/// on a `success: false` reply.
fn call(request: reqwest::blocking::RequestBuilder, url: &str) -> anyhow::Result<Envelope> {
    let resp = match request.send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("localboost-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    let status = resp.status();
    let envelope: Envelope = match resp.json() {
        Ok(env) => env,
        Err(e) => {
            eprintln!("localboost-cli: unreadable response (HTTP {}): {}", status, e);
            std::process::exit(1);
        }
    };

    if !envelope.success {
        eprintln!(
            "localboost-cli: server returned {}: {}",
            status,
            envelope.error.as_deref().unwrap_or("unknown error")
        );
        std::process::exit(1);
    }

    Ok(envelope)
}

fn do_auth(server: &str, route: &str, email: &str, password: &str) -> anyhow::Result<()> {
    let url = format!("{}/{}", server, route);
    let body = serde_json::json!({ "email": email, "password": password });
    let env = call(client()?.post(&url).json(&body), &url)?;

    println!("User:    {}", env.field("user").unwrap_or("-"));
    println!("Session: {}", env.field("session").unwrap_or("-"));
    Ok(())
}

fn do_generate(
    server: &str,
    business_name: &str,
    campaign_type: &str,
    story: &str,
    user_id: &str,
    json_output: bool,
) -> anyhow::Result<()> {
    let url = format!("{}/generate-campaign", server);
    let body = serde_json::json!({
        "business_name": business_name,
        "campaign_type": campaign_type,
        "story": story,
        "user_id": user_id,
    });
    let env = call(client()?.post(&url).json(&body), &url)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&env.rest)?);
    } else {
        println!("{}\n", env.field("business_name").unwrap_or(business_name));
        println!("{}", env.field("posts").unwrap_or(""));
    }
    Ok(())
}

fn do_campaigns(server: &str, user_id: &str, json_output: bool) -> anyhow::Result<()> {
    let url = format!("{}/campaigns", server);
    let env = call(client()?.get(&url).query(&[("user_id", user_id)]), &url)?;
    let campaigns = env
        .rest
        .get("campaigns")
        .cloned()
        .unwrap_or_else(|| serde_json::Value::Array(Vec::new()));

    if json_output {
        println!("{}", serde_json::to_string_pretty(&campaigns)?);
        return Ok(());
    }

    let summaries: Vec<CampaignSummary> = serde_json::from_value(campaigns)?;
    if summaries.is_empty() {
        eprintln!("No campaigns found for: {}", user_id);
        return Ok(());
    }
    for c in &summaries {
        println!("{}", summary_line(c));
    }
    Ok(())
}

/// Calls GET /test and GET /version.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = client()?;

    let url = format!("{}/test", server);
    match client.get(&url).send() {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("LocalBoost server: {}", body["message"].as_str().unwrap_or("ok"));
        }
        Ok(r) => {
            eprintln!("localboost-cli: server unhealthy (HTTP {})", r.status());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("localboost-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    let version: serde_json::Value = client
        .get(format!("{}/version", server))
        .send()
        .and_then(|r| r.json())
        .unwrap_or_default();
    println!("Version:           {}", version["version"].as_str().unwrap_or("?"));

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Signup { email, password } => do_auth(&server, "signup", &email, &password),
        Commands::Login { email, password } => do_auth(&server, "login", &email, &password),
        Commands::Generate {
            business_name,
            campaign_type,
            story,
            user_id,
            json,
        } => do_generate(&server, &business_name, &campaign_type, &story, &user_id, json),
        Commands::Campaigns { user_id, json } => do_campaigns(&server, &user_id, json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("localboost-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
