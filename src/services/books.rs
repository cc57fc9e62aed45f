//! Book collection service

use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{
        payload::{self, ErrorReporting},
        Book, BookQuery, BookShort,
    },
    repository::{Repository, StoreError},
};

pub const CREATE_FAILED: &str = "Gagal menambahkan buku.";
pub const UPDATE_FAILED: &str = "Gagal memperbarui buku.";
pub const CREATED: &str = "Buku berhasil ditambahkan";
pub const UPDATED: &str = "Buku berhasil diperbarui";
pub const DELETED: &str = "Buku berhasil dihapus";
pub const NOT_FOUND: &str = "Buku tidak ditemukan";
pub const UPDATE_NOT_FOUND: &str = "Gagal memperbarui buku. Id tidak ditemukan";
pub const DELETE_NOT_FOUND: &str = "Buku gagal dihapus. Id tidak ditemukan";

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
}

impl BooksService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Validate a raw body and store it as a new book, returning its ID.
    /// Every violation in the body is reported.
    pub async fn create_book(&self, body: &Value) -> AppResult<String> {
        let payload = payload::validate(body, ErrorReporting::All).map_err(|errors| {
            tracing::debug!("Rejected book create: {} violation(s)", errors.len());
            AppError::Validation {
                action: CREATE_FAILED,
                errors,
            }
        })?;

        self.repository
            .books
            .create(payload)
            .await
            .map_err(|e| AppError::Internal {
                public: CREATE_FAILED.to_string(),
                detail: e.to_string(),
            })
    }

    /// List books matching the query filters
    pub async fn list_books(&self, query: &BookQuery) -> Vec<BookShort> {
        self.repository.books.list(query).await
    }

    /// Get book by ID with every field
    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        self.repository
            .books
            .get_by_id(id)
            .await
            .map_err(|e| not_found(e, NOT_FOUND))
    }

    /// Replace a book's mutable fields.
    /// The body is validated before the lookup and only the first violation is reported.
    pub async fn update_book(&self, id: &str, body: &Value) -> AppResult<Book> {
        let payload = payload::validate(body, ErrorReporting::First).map_err(|errors| {
            AppError::Validation {
                action: UPDATE_FAILED,
                errors,
            }
        })?;

        self.repository
            .books
            .update_by_id(id, payload)
            .await
            .map_err(|e| not_found(e, UPDATE_NOT_FOUND))
    }

    /// Delete a book
    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        self.repository
            .books
            .delete_by_id(id)
            .await
            .map_err(|e| not_found(e, DELETE_NOT_FOUND))
    }

    /// Number of stored books (for health reporting)
    pub async fn count(&self) -> usize {
        self.repository.books.len().await
    }
}

fn not_found(err: StoreError, message: &str) -> AppError {
    match err {
        StoreError::NotFound(id) => {
            tracing::debug!("Book {} not found", id);
            AppError::NotFound(message.to_string())
        }
        other => AppError::Internal {
            public: message.to_string(),
            detail: other.to_string(),
        },
    }
}
