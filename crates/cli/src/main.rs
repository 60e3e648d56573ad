//! SEO Indexer CLI - operator commands against a running daemon

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tabled::{Table, Tabled};

const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "seo-indexer-cli")]
#[command(about = "SEO indexer operator CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Daemon HTTP URL
    #[arg(long, env = "INDEXER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Engine {
    Google,
    Bing,
}

impl Engine {
    fn as_str(&self) -> &'static str {
        match self {
            Engine::Google => "google",
            Engine::Bing => "bing",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Process one batch of the queue now
    Trigger,

    /// Check that the daemon is up
    Health,

    /// Queue URLs for submission
    Enqueue {
        /// Owning domain ID
        #[arg(short, long)]
        domain: String,

        /// Target search engine
        #[arg(short, long, value_enum)]
        engine: Engine,

        /// URLs to submit
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Show one queue item
    Show {
        /// Queue item ID
        item_id: String,
    },

    /// Queue counts per status
    Status,

    /// Domain registry
    #[command(subcommand)]
    Domain(DomainCommands),
}

#[derive(Subcommand)]
enum DomainCommands {
    /// List registered domains
    List,

    /// Create or replace a domain
    Set {
        /// Domain ID
        id: String,

        #[arg(long)]
        name: String,

        /// Site URL (e.g. https://example.com)
        #[arg(long)]
        url: String,

        /// Register the domain switched off
        #[arg(long)]
        disabled: bool,

        /// Keep queued URLs from being submitted automatically
        #[arg(long)]
        no_auto_index: bool,

        /// Bing Webmaster API key
        #[arg(long, env = "INDEXER_BING_API_KEY")]
        bing_key: Option<String>,

        /// Google service account key file (JSON)
        #[arg(long)]
        google_key_file: Option<PathBuf>,
    },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize, Tabled)]
struct RunSummary {
    fetched: u64,
    processed: u64,
    indexed: u64,
    requeued: u64,
    failed: u64,
    skipped: u64,
}

#[derive(Deserialize, Tabled)]
struct QueueStats {
    pending: i64,
    crawling: i64,
    indexed: i64,
    failed: i64,
}

#[derive(Deserialize, Tabled)]
struct DomainRow {
    id: String,
    name: String,
    url: String,
    enabled: bool,
    auto_index: bool,
    #[tabled(rename = "google")]
    has_google_credentials: bool,
    #[tabled(rename = "bing")]
    has_bing_credentials: bool,
}

#[derive(Tabled)]
struct Field {
    field: String,
    value: String,
}

struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request.send().await.context("Failed to connect to daemon")?;
        let status = response.status();
        let text = response.text().await.context("Failed to read response")?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            bail!("API error ({}): {}", status.as_u16(), message);
        }

        serde_json::from_str(&text).context("Failed to parse response")
    }

    async fn get(&self, path: &str) -> Result<Value> {
        self.send(self.client.get(format!("{}{}", self.base_url, path)))
            .await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.send(self.client.post(format!("{}{}", self.base_url, path)).json(&body))
            .await
    }

    async fn put(&self, path: &str, body: Value) -> Result<Value> {
        self.send(self.client.put(format!("{}{}", self.base_url, path)).json(&body))
            .await
    }
}

fn item_fields(item: &Value) -> Vec<Field> {
    [
        "id",
        "domain_id",
        "url",
        "search_engine",
        "status",
        "retry_count",
        "error_message",
        "created_at",
        "attempted_at",
        "indexed_at",
    ]
    .iter()
    .map(|key| Field {
        field: key.to_string(),
        value: match &item[*key] {
            Value::Null => "-".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    })
    .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.api_url);

    match cli.command {
        Commands::Trigger => {
            let result = api.post("/", json!({})).await?;
            let summary: RunSummary = serde_json::from_value(result["summary"].clone())
                .context("Unexpected trigger response")?;

            println!("{}", "✓ Indexing queue processed".green().bold());
            println!();
            println!("{}", Table::new(vec![summary]));
        }

        Commands::Health => match api.get("/").await {
            Ok(body) => {
                println!("  {} {}", "API URL:".bold(), cli.api_url);
                println!("  {} {}", "Status:".bold(), "ONLINE".green());
                if let Some(message) = body["message"].as_str() {
                    println!("  {} {}", "Message:".bold(), message);
                }
            }
            Err(e) => {
                println!("  {} {}", "Status:".bold(), "OFFLINE".red());
                println!("  {} {}", "Error:".bold(), e);
            }
        },

        Commands::Enqueue {
            domain,
            engine,
            urls,
        } => {
            let result = api
                .post(
                    "/queue",
                    json!({
                        "domain_id": domain,
                        "search_engine": engine.as_str(),
                        "urls": urls,
                    }),
                )
                .await?;

            let ids: Vec<String> = serde_json::from_value(result["ids"].clone())?;
            println!(
                "{}",
                format!("✓ {} URL(s) queued for {}", ids.len(), engine.as_str())
                    .green()
                    .bold()
            );
            for id in ids {
                println!("  {}", id);
            }
        }

        Commands::Show { item_id } => {
            let item = api.get(&format!("/queue/{}", item_id)).await?;
            println!("{}", Table::new(item_fields(&item)));
        }

        Commands::Status => {
            let stats: QueueStats = serde_json::from_value(api.get("/queue/stats").await?)?;
            println!("{}", "Queue Status".cyan().bold());
            println!();
            println!("{}", Table::new(vec![stats]));
        }

        Commands::Domain(DomainCommands::List) => {
            let domains: Vec<DomainRow> = serde_json::from_value(api.get("/domains").await?)?;
            if domains.is_empty() {
                println!("{}", "No domains registered".yellow());
            } else {
                println!("{}", Table::new(domains));
            }
        }

        Commands::Domain(DomainCommands::Set {
            id,
            name,
            url,
            disabled,
            no_auto_index,
            bing_key,
            google_key_file,
        }) => {
            let google_service_account = match google_key_file {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    let key: Value = serde_json::from_str(&raw)
                        .with_context(|| format!("{} is not valid JSON", path.display()))?;
                    Some(key)
                }
                None => None,
            };

            let result = api
                .put(
                    &format!("/domains/{}", id),
                    json!({
                        "name": name,
                        "url": url,
                        "enabled": !disabled,
                        "auto_index": !no_auto_index,
                        "credentials": {
                            "google_service_account": google_service_account,
                            "bing_api_key": bing_key,
                        },
                    }),
                )
                .await?;

            let domain: DomainRow = serde_json::from_value(result)?;
            println!("{}", format!("✓ Domain {} saved", domain.id).green().bold());
            println!();
            println!("{}", Table::new(vec![domain]));
        }
    }

    Ok(())
}
