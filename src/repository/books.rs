//! In-memory book store

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::models::{Book, BookPayload, BookQuery, BookShort};

type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Owns the ordered book collection.
///
/// Every mutation holds the write lock for its whole read-modify-write, so
/// concurrent handlers observe operations one at a time.
#[derive(Clone)]
pub struct BooksRepository {
    books: Arc<RwLock<Vec<Book>>>,
    next_id: IdGenerator,
}

impl Default for BooksRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl BooksRepository {
    pub fn new() -> Self {
        Self::with_id_generator(|| Uuid::new_v4().to_string())
    }

    /// Build a store that draws identifiers from `next_id`
    pub fn with_id_generator<F>(next_id: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            books: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(next_id),
        }
    }

    /// Append a new book and return its identifier.
    ///
    /// The insert is checked afterwards: exactly one record must carry the
    /// new id, otherwise the appended record is dropped again.
    pub async fn create(&self, payload: BookPayload) -> StoreResult<String> {
        let id = (self.next_id)();
        let book = Book::new(id.clone(), payload, Utc::now());

        let mut books = self.books.write().await;
        books.push(book);

        let stored = books.iter().filter(|b| b.id == id).count();
        if stored != 1 {
            books.pop();
            tracing::warn!("Book insert check failed for id={} ({} matches)", id, stored);
            return Err(StoreError::Inconsistent(id));
        }

        tracing::info!("Book created id={} (collection size {})", id, books.len());
        Ok(id)
    }

    /// List books passing every present filter, in insertion order
    pub async fn list(&self, query: &BookQuery) -> Vec<BookShort> {
        let books = self.books.read().await;
        let listed: Vec<BookShort> = books
            .iter()
            .filter(|b| query.matches(b))
            .map(BookShort::from)
            .collect();
        tracing::debug!("Listed {} of {} books", listed.len(), books.len());
        listed
    }

    /// Get a full book record by ID
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Book> {
        self.books
            .read()
            .await
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Replace the mutable fields of a book
    pub async fn update_by_id(&self, id: &str, payload: BookPayload) -> StoreResult<Book> {
        let mut books = self.books.write().await;
        let book = books
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        book.apply(payload, Utc::now());
        tracing::info!("Book updated id={}", id);
        Ok(book.clone())
    }

    /// Remove a book, keeping the order of the others
    pub async fn delete_by_id(&self, id: &str) -> StoreResult<()> {
        let mut books = self.books.write().await;
        let index = books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        books.remove(index);
        tracing::info!("Book deleted id={} (collection size {})", id, books.len());
        Ok(())
    }

    /// Number of stored books
    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.books.read().await.is_empty()
    }
}
