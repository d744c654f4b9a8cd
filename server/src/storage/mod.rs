mod backend;
mod config;
mod error;
mod routes;
mod traits;

#[cfg(test)]
mod tests;

pub use backend::ObjectStoreBackend;
pub use config::StorageConfig;
pub use error::StorageError;
pub use routes::RoutedContentStore;
pub use traits::{ContentStorage, DocumentStore};
