#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client::{ContentClient, DataService, ImageEditor, ListEditor, ValueEditor};
use shared_types::{ContentKey, Record, Route};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "content-cli")]
#[command(about = "Edit the content of the company site")]
struct Cli {
    /// Base URL of the content server
    #[arg(long, env = "CONTENT_SERVER_URL", default_value = "http://localhost:3000")]
    server: String,

    /// Token sent with write requests
    #[arg(long, env = "CONTENT_ADMIN_TOKEN")]
    admin_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the value of a key
    Get {
        key: ContentKey,
        /// Skip the local cache
        #[arg(long)]
        fresh: bool,
    },

    /// Print several keys fetched in one request
    GetBatch {
        #[arg(required = true)]
        keys: Vec<ContentKey>,
    },

    /// Replace the value of a key. VALUE is parsed as JSON, falling back to a
    /// plain string.
    Set { key: ContentKey, value: String },

    /// Edit a list-valued key record by record
    #[command(subcommand)]
    Records(RecordsCommand),

    /// Upload an image, optionally storing it under an image key
    Upload {
        path: PathBuf,
        /// Store the uploaded image under this key
        #[arg(long)]
        key: Option<ContentKey>,
    },

    /// Check the server is reachable
    Health,
}

#[derive(Subcommand)]
enum RecordsCommand {
    /// List the records of a key
    List { key: ContentKey },

    /// Append a record
    Add {
        key: ContentKey,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Change fields of a record
    Update {
        key: ContentKey,
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Remove a record
    Remove {
        key: ContentKey,
        id: String,
        /// Records that must remain after the removal
        #[arg(long, default_value = "1")]
        min_records: usize,
    },

    /// Move a record to a new position
    Move {
        key: ContentKey,
        id: String,
        position: usize,
    },
}

#[derive(Args)]
struct FieldArgs {
    /// Field assignment NAME=VALUE (repeatable)
    #[arg(short, long = "field", value_parser = parse_field)]
    fields: Vec<(String, serde_json::Value)>,
}

fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

fn parse_field(raw: &str) -> Result<(String, serde_json::Value), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), parse_value(value))),
        _ => Err(format!("expected NAME=VALUE, got {raw:?}")),
    }
}

fn guess_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

fn id_prefix(key: ContentKey) -> &'static str {
    let name = key.as_str();
    name.strip_suffix("-data").unwrap_or(name)
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn records(service: DataService, command: RecordsCommand) -> Result<()> {
    match command {
        RecordsCommand::List { key } => {
            let mut editor = ListEditor::new(service, key, id_prefix(key));
            for record in editor.load().await? {
                print_json(&serde_json::to_value(record)?)?;
            }
        }
        RecordsCommand::Add { key, fields } => {
            let mut editor = ListEditor::new(service, key, id_prefix(key));
            editor.load().await?;
            let record = fields
                .fields
                .into_iter()
                .fold(Record::new(""), |record, (name, value)| {
                    record.with_field(name, value)
                });
            let id = editor.add(record).id.clone();
            editor.save().await?;
            info!(%key, %id, "Added record");
            println!("{id}");
        }
        RecordsCommand::Update { key, id, fields } => {
            let mut editor = ListEditor::new(service, key, id_prefix(key));
            editor.load().await?;
            editor.update(&id, |record| {
                for (name, value) in fields.fields {
                    record.set_field(name, value);
                }
            })?;
            editor.save().await?;
            info!(%key, %id, "Updated record");
        }
        RecordsCommand::Remove {
            key,
            id,
            min_records,
        } => {
            let mut editor =
                ListEditor::new(service, key, id_prefix(key)).with_min_records(min_records);
            editor.load().await?;
            editor.remove(&id)?;
            editor.save().await?;
            info!(%key, %id, "Removed record");
        }
        RecordsCommand::Move { key, id, position } => {
            let mut editor = ListEditor::new(service, key, id_prefix(key));
            editor.load().await?;
            editor.move_record(&id, position)?;
            editor.save().await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut content = ContentClient::new(&cli.server)?;
    if let Some(token) = cli.admin_token {
        content = content.with_admin_token(token);
    }
    let content = Arc::new(content);
    let service = DataService::new(content.clone());

    match cli.command {
        Command::Get { key, fresh } => {
            let value = service
                .get(key, fresh)
                .await
                .with_context(|| format!("Could not read {key}"))?;
            print_json(&value)?;
        }
        Command::GetBatch { keys } => {
            let values = service.get_batch(&keys).await;
            let mut output = serde_json::Map::new();
            for key in keys {
                if let Some(value) = values.get(&key) {
                    output.insert(key.to_string(), value.clone());
                }
            }
            print_json(&serde_json::Value::Object(output))?;
        }
        Command::Set { key, value } => {
            ValueEditor::<serde_json::Value>::new(service.clone(), key)
                .save(&parse_value(&value))
                .await?;
            info!(%key, "Saved");
        }
        Command::Records(command) => records(service.clone(), command).await?,
        Command::Upload { path, key } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Could not read {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("upload");

            let url = content.upload(file_name, guess_mime(&path), bytes).await?;
            if let Some(key) = key {
                anyhow::ensure!(
                    key.route() == Route::Image,
                    "{key} does not hold an image"
                );
                ImageEditor::new(service.clone(), key)
                    .save_reference(&url)
                    .await?;
                info!(%key, "Stored uploaded image");
            }
            println!("{url}");
        }
        Command::Health => {
            let healthy = content.health_check().await?;
            println!("{}", if healthy { "healthy" } else { "unhealthy" });
        }
    }

    // Anything still queued goes out before exit
    service.flush().await;

    Ok(())
}
