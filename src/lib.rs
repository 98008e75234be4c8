//! Ad hoc HTTP file sharing for a single directory tree.
//!
//! Exposes one directory (the server root) for browsing, downloading and
//! uploading. The root can be switched at runtime; every request path is
//! resolved against a snapshot of the root and confined to it.

pub mod config;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod pages;
pub mod resolve;
pub mod root;
pub mod routes;
pub mod transfer;

use std::sync::Arc;

pub use config::Config;
pub use error::ServeError;
pub use root::{RootState, ServerRoot};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The switchable server root
    pub root: Arc<RootState>,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState serving `root` with the default config.
    pub fn new(root: ServerRoot) -> Self {
        Self::with_config(root, Config::default())
    }

    /// Create a new AppState serving `root` with the given config.
    pub fn with_config(root: ServerRoot, config: Config) -> Self {
        Self {
            root: Arc::new(RootState::new(root)),
            config: Arc::new(config),
        }
    }
}
