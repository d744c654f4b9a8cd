//! Key routing: maps each [`ContentKey`] onto the document layout of the store.
//!
//! Layout:
//!
//! ```text
//! images/<key>.json            {"key": "...", "image": "data:..."}
//! settings/site.json           {"heroSubtitle": ..., "stats": ..., ...}
//! team/team.json               {"leadership": [...], "members": [...]}
//! collections/<name>.json      [record, record, ...]
//! submissions/<form>/<id>.json lead capture submissions
//! ```
//!
//! Collections are stored as a single object so replacing one is a single
//! atomic put; readers never observe a half-written collection.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use shared_types::{ContentKey, Route};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::error::StorageError;
use super::traits::{ContentStorage, DocumentStore};

const SETTINGS_DOCUMENT: &str = "settings/site.json";
const TEAM_DOCUMENT: &str = "team/team.json";

#[async_trait]
trait KeyStrategy: Send + Sync {
    async fn read(&self, documents: &dyn DocumentStore) -> Result<Value>;
    async fn write(&self, documents: &dyn DocumentStore, data: &Value) -> Result<()>;
}

struct ImageStrategy {
    key: ContentKey,
}

impl ImageStrategy {
    fn location(&self) -> String {
        format!("images/{}.json", self.key)
    }
}

#[async_trait]
impl KeyStrategy for ImageStrategy {
    async fn read(&self, documents: &dyn DocumentStore) -> Result<Value> {
        match documents.load(&self.location()).await? {
            Some(Value::Object(mut fields)) => Ok(fields.remove("image").unwrap_or(Value::Null)),
            Some(_) => Err(StorageError::CorruptDocument(self.location()).into()),
            None => Ok(Value::Null),
        }
    }

    async fn write(&self, documents: &dyn DocumentStore, data: &Value) -> Result<()> {
        let document = json!({ "key": self.key.as_str(), "image": data });
        documents.save(&self.location(), &document).await
    }
}

/// One field inside a document shared by several keys.
struct DocumentFieldStrategy {
    document: &'static str,
    field: &'static str,
}

impl DocumentFieldStrategy {
    async fn load_fields(&self, documents: &dyn DocumentStore) -> Result<Map<String, Value>> {
        match documents.load(self.document).await? {
            None => Ok(Map::new()),
            Some(Value::Object(fields)) => Ok(fields),
            Some(_) => Err(StorageError::CorruptDocument(self.document.to_string()).into()),
        }
    }
}

#[async_trait]
impl KeyStrategy for DocumentFieldStrategy {
    async fn read(&self, documents: &dyn DocumentStore) -> Result<Value> {
        let mut fields = self.load_fields(documents).await?;
        Ok(fields.remove(self.field).unwrap_or(Value::Null))
    }

    async fn write(&self, documents: &dyn DocumentStore, data: &Value) -> Result<()> {
        let mut fields = self.load_fields(documents).await?;
        fields.insert(self.field.to_string(), data.clone());
        documents.save(self.document, &Value::Object(fields)).await
    }
}

struct CollectionStrategy {
    key: ContentKey,
    name: &'static str,
}

impl CollectionStrategy {
    fn location(&self) -> String {
        format!("collections/{}.json", self.name)
    }
}

#[async_trait]
impl KeyStrategy for CollectionStrategy {
    async fn read(&self, documents: &dyn DocumentStore) -> Result<Value> {
        match documents.load(&self.location()).await? {
            None => Ok(Value::Array(Vec::new())),
            Some(records @ Value::Array(_)) => Ok(records),
            Some(_) => Err(StorageError::CorruptDocument(self.location()).into()),
        }
    }

    async fn write(&self, documents: &dyn DocumentStore, data: &Value) -> Result<()> {
        if !data.is_array() {
            return Err(StorageError::InvalidShape {
                key: self.key,
                expected: "an array of records",
            }
            .into());
        }
        documents.save(&self.location(), data).await
    }
}

fn strategy_for(key: ContentKey) -> Box<dyn KeyStrategy> {
    match key.route() {
        Route::Image => Box::new(ImageStrategy { key }),
        Route::Settings(field) => Box::new(DocumentFieldStrategy {
            document: SETTINGS_DOCUMENT,
            field,
        }),
        Route::Team(field) => Box::new(DocumentFieldStrategy {
            document: TEAM_DOCUMENT,
            field,
        }),
        Route::Collection(name) => Box::new(CollectionStrategy { key, name }),
    }
}

/// [`ContentStorage`] over any [`DocumentStore`], dispatching on the key's route.
pub struct RoutedContentStore {
    documents: Arc<dyn DocumentStore>,
    // Serializes read-modify-write of the shared settings/team documents.
    shared_documents: Mutex<()>,
}

impl RoutedContentStore {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            documents,
            shared_documents: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ContentStorage for RoutedContentStore {
    async fn read(&self, key: ContentKey) -> Result<Value> {
        debug!(%key, route = ?key.route(), "Reading content");
        strategy_for(key).read(self.documents.as_ref()).await
    }

    async fn write(&self, key: ContentKey, data: &Value) -> Result<()> {
        debug!(%key, route = ?key.route(), "Writing content");
        let strategy = strategy_for(key);
        match key.route() {
            Route::Settings(_) | Route::Team(_) => {
                let _guard = self.shared_documents.lock().await;
                strategy.write(self.documents.as_ref(), data).await
            }
            Route::Image | Route::Collection(_) => {
                strategy.write(self.documents.as_ref(), data).await
            }
        }
    }

    async fn save_submission(&self, form: &str, id: &str, submission: &Value) -> Result<()> {
        let location = format!("submissions/{form}/{id}.json");
        self.documents.save(&location, submission).await
    }
}
