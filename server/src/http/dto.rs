use serde::{Deserialize, Serialize};

pub use shared_types::{
    DataEnvelope, ErrorResponse, LeadResponse, PostDataRequest, PostDataResponse, UploadResponse,
};

/// Query string of `GET /data`: either `key=<K>` or `keys=<K1,K2,...>`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DataQuery {
    pub key: Option<String>,
    pub keys: Option<String>,
}
