//! Book collection endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    error::{AppResult, MessageResponse},
    models::{
        book::{Book, BookQuery, BookShort},
        payload::BookPayload,
    },
    services::books::{CREATED, DELETED, UPDATED},
};

use super::ApiResponse;

#[derive(Serialize, ToSchema)]
pub struct BookListData {
    pub books: Vec<BookShort>,
}

#[derive(Serialize, ToSchema)]
pub struct BookDetailData {
    pub book: Book,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookCreatedData {
    pub book_id: String,
}

// A missing or malformed JSON body is validated like any non-object value.
fn body_value(payload: Option<Json<Value>>) -> Value {
    payload.map(|Json(value)| value).unwrap_or(Value::Null)
}

/// List books, optionally filtered
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Books projected to id, name and publisher", body = ApiResponse<BookListData>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> Json<ApiResponse<BookListData>> {
    let books = state.services.books.list_books(&query).await;
    Json(ApiResponse::success(BookListData { books }))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = ApiResponse<BookCreatedData>),
        (status = 400, description = "Invalid book payload", body = MessageResponse),
        (status = 500, description = "Book could not be stored", body = MessageResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    payload: Option<Json<Value>>,
) -> AppResult<(StatusCode, Json<ApiResponse<BookCreatedData>>)> {
    let book_id = state.services.books.create_book(&body_value(payload)).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(BookCreatedData { book_id }).with_message(CREATED)),
    ))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{bookId}",
    tag = "books",
    params(
        ("bookId" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = ApiResponse<BookDetailData>),
        (status = 404, description = "Book not found", body = MessageResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(book_id): Path<String>,
) -> AppResult<Json<ApiResponse<BookDetailData>>> {
    let book = state.services.books.get_book(&book_id).await?;
    Ok(Json(ApiResponse::success(BookDetailData { book })))
}

/// Replace an existing book
#[utoipa::path(
    put,
    path = "/books/{bookId}",
    tag = "books",
    params(
        ("bookId" = String, Path, description = "Book ID")
    ),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = MessageResponse),
        (status = 400, description = "Invalid book payload", body = MessageResponse),
        (status = 404, description = "Book not found", body = MessageResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(book_id): Path<String>,
    payload: Option<Json<Value>>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .books
        .update_book(&book_id, &body_value(payload))
        .await?;
    Ok(Json(MessageResponse::success(UPDATED)))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{bookId}",
    tag = "books",
    params(
        ("bookId" = String, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found", body = MessageResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(book_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.books.delete_book(&book_id).await?;
    Ok(Json(MessageResponse::success(DELETED)))
}
