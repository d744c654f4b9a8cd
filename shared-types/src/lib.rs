#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod data_uri;
mod key;
mod wire;

pub use data_uri::{encode_data_uri, DataUri};
pub use key::{ContentKey, KeyParseError, Route};
pub use wire::{
    DataEnvelope, ErrorResponse, LeadResponse, PostDataRequest, PostDataResponse, UploadResponse,
};

use serde::{Deserialize, Serialize};

/// One entry of a list-valued content key (a service, a team member, ...).
///
/// Only `id` is known to the store; every other attribute is carried as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_field(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.set_field(name, value);
        self
    }

    /// Set an attribute. `id` is routed to the identifier, never into `fields`.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) {
        let name = name.into();
        let value = value.into();
        if name == "id" {
            self.id = match value {
                serde_json::Value::String(id) => id,
                other => other.to_string(),
            };
        } else {
            self.fields.insert(name, value);
        }
    }

    /// Move a stray `id` entry out of `fields`. It only becomes the
    /// identifier when the record has none; otherwise it is discarded.
    pub fn lift_id_field(&mut self) {
        if let Some(stray) = self.fields.remove("id") {
            if self.id.is_empty() {
                self.set_field("id", stray);
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_flattens_fields() {
        let record = Record::new("service-1")
            .with_field("title", "Groundworks")
            .with_field("featured", true);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"id": "service-1", "title": "Groundworks", "featured": true})
        );
    }

    #[test]
    fn test_id_field_never_lands_in_fields() {
        let record = Record::new("").with_field("id", "news-1").with_field("title", "Opening");
        assert_eq!(record.id, "news-1");
        assert!(record.field("id").is_none());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"id": "news-1", "title": "Opening"}));
    }

    #[test]
    fn test_lift_id_field() {
        let mut record = Record::new("n-1");
        record.fields.insert("id".into(), json!("n-2"));
        record.lift_id_field();
        assert_eq!(record.id, "n-1");
        assert!(record.fields.is_empty());

        let mut record = Record::new("");
        record.fields.insert("id".into(), json!(7));
        record.lift_id_field();
        assert_eq!(record.id, "7");
    }

    #[test]
    fn test_record_without_id_defaults_to_empty() {
        let record: Record = serde_json::from_value(json!({"title": "Roofing"})).unwrap();
        assert!(record.id.is_empty());
        assert_eq!(record.field("title"), Some(&json!("Roofing")));
    }
}
