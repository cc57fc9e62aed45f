//! Repository layer holding the in-memory book collection

pub mod books;

use thiserror::Error;

/// Outcomes a store operation can fail with
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Book {0} not found")]
    NotFound(String),

    #[error("Book {0} missing or duplicated after insert")]
    Inconsistent(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Main repository struct holding every store
#[derive(Clone, Default)]
pub struct Repository {
    pub books: books::BooksRepository,
}

impl Repository {
    /// Create a repository with an empty collection
    pub fn new() -> Self {
        Self {
            books: books::BooksRepository::new(),
        }
    }
}
