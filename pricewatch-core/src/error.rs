use thiserror::Error;

use crate::catalog::CatalogError;
use crate::feed::FeedError;
use crate::models::UnknownPlatform;
use crate::session::SessionError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum PricewatchError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    UnknownPlatform(#[from] UnknownPlatform),

    #[error("IPC error: {0}")]
    Ipc(String),
}

impl PricewatchError {
    /// Caused by the caller's input rather than by the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PricewatchError::Session(SessionError::InvalidCredentials(_))
                | PricewatchError::Session(SessionError::NotLoggedIn)
                | PricewatchError::Catalog(_)
                | PricewatchError::UnknownPlatform(_)
        )
    }
}
