//! JSON bodies exchanged between the gateway and its clients.

use serde::{Deserialize, Deserializer, Serialize};

/// `{ "data": ... }` wrapper used by every successful `GET /data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Body of `POST /data`.
///
/// Both fields are optional at the serde level so the handler can answer a
/// malformed write with a 400 of its own. `data: null` is a present value and
/// deserializes to `Some(Value::Null)`; only a missing field is `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostDataRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<serde_json::Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDataResponse {
    pub success: bool,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadResponse {
    pub success: bool,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
