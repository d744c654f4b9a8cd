use shared_types::ContentKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Content for {key} must be {expected}")]
    InvalidShape {
        key: ContentKey,
        expected: &'static str,
    },

    #[error("Document at {0} is not a JSON object")]
    CorruptDocument(String),
}
