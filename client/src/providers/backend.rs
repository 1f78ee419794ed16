//! Backend trait.

use crate::error::ApiError;
use crate::types::{Session, Todo, TodoFilter, TodoId};
use std::future::Future;

/// REST backend the stores synchronize against.
///
/// One method per endpoint. Authenticated calls take the session token
/// explicitly; implementations decide how it is attached to the request.
///
/// # Implementation Notes
///
/// - No retries: a failed call is reported once and left to the caller
/// - No timeouts beyond the transport's defaults
pub trait TodoBackend: Send + Sync {
    /// Create an account. `POST /user/create`
    ///
    /// # Errors
    ///
    /// - `ApiError::Conflict` if the email is already registered
    /// - Any other `ApiError` on transport or server failure
    fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send;

    /// Sign in. `POST /user/login`
    ///
    /// # Errors
    ///
    /// Returns error if the credentials are refused or the request fails.
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send;

    /// Tell the backend the token is no longer in use. `POST /user/logout`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn logout(&self, token: &str) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// List the user's todos, narrowed by `filter`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn fetch_todos(
        &self,
        token: &str,
        filter: TodoFilter,
    ) -> impl Future<Output = Result<Vec<Todo>, ApiError>> + Send;

    /// Fetch one todo. `GET /todo/get/{id}`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn fetch_todo(
        &self,
        token: &str,
        id: &TodoId,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send;

    /// Create a todo. `POST /todo/create`
    ///
    /// # Errors
    ///
    /// - `ApiError::Conflict` if the user already has a todo with this name
    /// - Any other `ApiError` on transport or server failure
    fn create_todo(
        &self,
        token: &str,
        name: &str,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send;

    /// Set the completion flag. `PUT /todo/toggle/{id}`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn toggle_todo(
        &self,
        token: &str,
        id: &TodoId,
        is_completed: bool,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send;

    /// Replace name and completion flag. `PATCH /todo/update/{id}`
    ///
    /// # Errors
    ///
    /// - `ApiError::Conflict` if the new name collides with another todo
    /// - Any other `ApiError` on transport or server failure
    fn update_todo(
        &self,
        token: &str,
        id: &TodoId,
        name: &str,
        is_completed: bool,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send;

    /// Delete a todo. `DELETE /todo/delete/{id}`
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    fn delete_todo(
        &self,
        token: &str,
        id: &TodoId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}
