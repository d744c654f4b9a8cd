//! Editing surfaces over [`DataService`]: repeating record lists, single
//! values and images.
//!
//! Editors follow a read-whole, mutate-in-memory, write-whole discipline.
//! Nothing reaches the network until `save`.

use serde::{de::DeserializeOwned, Serialize};
use shared_types::{encode_data_uri, ContentKey, DataUri, Record};
use std::marker::PhantomData;
use thiserror::Error;
use tracing::{info, warn};

use crate::DataService;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Content for {0} is unavailable")]
    Unavailable(ContentKey),

    #[error("Content for {key} has an unexpected shape: {source}")]
    Malformed {
        key: ContentKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("{key} requires at least {min} record(s)")]
    MinimumRecords { key: ContentKey, min: usize },

    #[error("No record with id {0}")]
    NotFound(String),

    #[error("Not an image: {0}")]
    NotAnImage(String),

    #[error("Saving {0} failed")]
    SaveFailed(ContentKey),
}

async fn persist(
    service: &DataService,
    key: ContentKey,
    value: serde_json::Value,
) -> Result<(), EditorError> {
    if !service.set(key, value).await {
        return Err(EditorError::SaveFailed(key));
    }
    service.announce_change(key);
    Ok(())
}

fn encode<T: Serialize>(key: ContentKey, value: &T) -> Result<serde_json::Value, EditorError> {
    serde_json::to_value(value).map_err(|source| EditorError::Malformed { key, source })
}

/// Editor for a list-valued key (services, team members, news, ...).
pub struct ListEditor {
    service: DataService,
    key: ContentKey,
    id_prefix: String,
    min_records: usize,
    records: Vec<Record>,
}

impl ListEditor {
    pub fn new(service: DataService, key: ContentKey, id_prefix: impl Into<String>) -> Self {
        Self {
            service,
            key,
            id_prefix: id_prefix.into(),
            min_records: 0,
            records: Vec::new(),
        }
    }

    /// Refuse removals that would leave fewer than `min` records.
    #[must_use]
    pub fn with_min_records(mut self, min: usize) -> Self {
        self.min_records = min;
        self
    }

    pub fn key(&self) -> ContentKey {
        self.key
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Replace the working copy with the stored list. A key that was never
    /// written loads as an empty list.
    pub async fn load(&mut self) -> Result<&[Record], EditorError> {
        let value = self
            .service
            .get(self.key, false)
            .await
            .ok_or(EditorError::Unavailable(self.key))?;

        let records: Vec<Record> = if value.is_null() {
            Vec::new()
        } else {
            serde_json::from_value(value).map_err(|source| EditorError::Malformed {
                key: self.key,
                source,
            })?
        };

        self.replace_records(records);
        Ok(&self.records)
    }

    /// Like [`ListEditor::load`], but starts from `defaults` when the stored
    /// list cannot be read.
    pub async fn load_or_default(&mut self, defaults: Vec<Record>) -> &[Record] {
        let loaded = self.load().await.map(|records| records.len());
        if let Err(e) = loaded {
            warn!(key = %self.key, error = %e, "Falling back to default records");
            self.replace_records(defaults);
        }
        &self.records
    }

    /// Append `record`, giving it an id if it has none (or a taken one).
    pub fn add(&mut self, mut record: Record) -> &Record {
        record.lift_id_field();
        if record.id.is_empty() || self.position(&record.id).is_some() {
            record.id = self.next_id();
        }
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    pub fn update(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut Record),
    ) -> Result<&Record, EditorError> {
        let index = self
            .position(id)
            .ok_or_else(|| EditorError::NotFound(id.to_string()))?;

        let record = &mut self.records[index];
        edit(record);
        // The id is the record's identity
        record.fields.remove("id");
        record.id = id.to_string();
        Ok(record)
    }

    pub fn remove(&mut self, id: &str) -> Result<Record, EditorError> {
        let index = self
            .position(id)
            .ok_or_else(|| EditorError::NotFound(id.to_string()))?;

        if self.records.len() <= self.min_records {
            return Err(EditorError::MinimumRecords {
                key: self.key,
                min: self.min_records,
            });
        }
        Ok(self.records.remove(index))
    }

    /// Move the record `id` to position `to` (clamped to the end).
    pub fn move_record(&mut self, id: &str, to: usize) -> Result<(), EditorError> {
        let from = self
            .position(id)
            .ok_or_else(|| EditorError::NotFound(id.to_string()))?;

        let record = self.records.remove(from);
        let to = to.min(self.records.len());
        self.records.insert(to, record);
        Ok(())
    }

    /// Write the whole list back.
    pub async fn save(&self) -> Result<(), EditorError> {
        let value = encode(self.key, &self.records)?;
        persist(&self.service, self.key, value).await?;
        info!(key = %self.key, count = self.records.len(), "Saved records");
        Ok(())
    }

    /// Take `records` as stored. Ids are kept as they are, duplicates
    /// included; only records without one get a fresh id.
    fn replace_records(&mut self, records: Vec<Record>) {
        self.records = records;
        for index in 0..self.records.len() {
            self.records[index].lift_id_field();
            if self.records[index].id.is_empty() {
                let id = self.next_id();
                self.records[index].id = id;
            }
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|record| record.id == id)
    }

    fn next_id(&self) -> String {
        let base = format!("{}-{}", self.id_prefix, chrono::Utc::now().timestamp_millis());
        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.position(&candidate).is_some() {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        candidate
    }
}

/// Editor for a key holding a single value (hero text, stats, typewriter
/// texts, ...), typed as `T`.
pub struct ValueEditor<T> {
    service: DataService,
    key: ContentKey,
    _value: PhantomData<fn() -> T>,
}

impl<T> ValueEditor<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(service: DataService, key: ContentKey) -> Self {
        Self {
            service,
            key,
            _value: PhantomData,
        }
    }

    /// The stored value, `None` if the key was never written.
    pub async fn load(&self) -> Result<Option<T>, EditorError> {
        let value = self
            .service
            .get(self.key, false)
            .await
            .ok_or(EditorError::Unavailable(self.key))?;

        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| EditorError::Malformed {
                key: self.key,
                source,
            })
    }

    pub async fn load_or(&self, default: T) -> T {
        match self.load().await {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Falling back to default value");
                default
            }
        }
    }

    pub async fn save(&self, value: &T) -> Result<(), EditorError> {
        let value = encode(self.key, value)?;
        persist(&self.service, self.key, value).await
    }
}

/// Editor for image keys. Uploaded bytes are stored inline as a `data:` URI.
pub struct ImageEditor {
    service: DataService,
    key: ContentKey,
}

impl ImageEditor {
    pub fn new(service: DataService, key: ContentKey) -> Self {
        Self { service, key }
    }

    /// Current image reference (static path or `data:` URI).
    pub async fn load(&self) -> Option<String> {
        match self.service.get(self.key, false).await? {
            serde_json::Value::String(reference) => Some(reference),
            _ => None,
        }
    }

    /// Store `bytes` as the image and return the reference that was saved.
    pub async fn save_image(&self, mime: &str, bytes: &[u8]) -> Result<String, EditorError> {
        if !mime.starts_with("image/") {
            return Err(EditorError::NotAnImage(mime.to_string()));
        }
        let reference = encode_data_uri(mime, bytes);
        self.save_reference(&reference).await?;
        Ok(reference)
    }

    /// Store an existing reference, e.g. one returned by an upload.
    pub async fn save_reference(&self, reference: &str) -> Result<(), EditorError> {
        let is_image_uri = DataUri::parse(reference).is_some_and(|uri| uri.is_image());
        if reference.starts_with("data:") && !is_image_uri {
            return Err(EditorError::NotAnImage(reference.chars().take(32).collect()));
        }
        let value = serde_json::Value::String(reference.to_string());
        persist(&self.service, self.key, value).await
    }
}
