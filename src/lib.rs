//! Bookshelf
//!
//! A small REST JSON API over an in-memory collection of book records:
//! list with filters, create, get, update and delete by ID.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Build state around a fresh, empty book collection
    pub fn new(config: AppConfig) -> Self {
        Self::with_repository(config, repository::Repository::new())
    }

    pub fn with_repository(config: AppConfig, repository: repository::Repository) -> Self {
        Self {
            config: Arc::new(config),
            services: Arc::new(services::Services::new(repository)),
        }
    }
}
