//! Domain types shared by the session and todo stores.
//!
//! Field names follow the backend's JSON. The backend is a document store
//! and sometimes reports identifiers as `_id`, so those fields accept both.

use serde::{Deserialize, Serialize};

/// Authenticated user as reported by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identifier
    #[serde(alias = "_id")]
    pub id: String,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
}

/// Authenticated session: the backend token and the user it belongs to
///
/// Both fields are mandatory, so a partially populated session cannot be
/// represented. "Logged out" is `Option::<Session>::None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token sent with every authenticated request
    #[serde(alias = "access_token")]
    pub token: String,
    /// Owner of the token
    pub user: User,
}

impl Session {
    /// Creates a session
    #[must_use]
    pub const fn new(token: String, user: User) -> Self {
        Self { token, user }
    }
}

/// Server-assigned identifier of a todo item
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Wraps a raw identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TodoId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single todo item, as returned by the backend
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Server-assigned identifier, stable for the item's lifetime
    #[serde(alias = "_id")]
    pub id: TodoId,
    /// Display text
    pub name: String,
    /// Completion flag
    pub is_completed: bool,
    /// Owning user id; set by the server, never sent by the client
    #[serde(rename = "user", default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl Todo {
    /// Creates a todo without an owner
    #[must_use]
    pub fn new(id: impl Into<TodoId>, name: impl Into<String>, is_completed: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_completed,
            owner: None,
        }
    }
}

/// Which slice of the user's todos a fetch asks for
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TodoFilter {
    /// Every todo
    #[default]
    All,
    /// Only completed todos
    Completed,
    /// Only todos still open
    Incomplete,
}

impl TodoFilter {
    /// Backend path serving this filter
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::All => "/todo/find/all",
            Self::Completed => "/todo/completed/all",
            Self::Incomplete => "/todo/incompleted/all",
        }
    }
}

/// Password held only for the duration of a register or login call
///
/// `Debug` is redacted so actions can be logged safely.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Wraps a plaintext password
    #[must_use]
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Returns the plaintext
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn session_accepts_access_token_and_underscore_id() {
        let raw = r#"{"access_token":"t1","user":{"_id":"u1","name":"Ada","email":"ada@example.com"}}"#;
        let session: Session = serde_json::from_str(raw).unwrap();

        assert_eq!(session.token, "t1");
        assert_eq!(session.user.id, "u1");
    }

    #[test]
    fn session_serializes_canonical_names() {
        let session = Session::new(
            "t1".to_string(),
            User {
                id: "u1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
        );

        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["token"], "t1");
        assert_eq!(value["user"]["id"], "u1");

        let back: Session = serde_json::from_value(value).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn todo_reads_backend_row() {
        let raw = r#"{"_id":"2","name":"Buy milk","isCompleted":true,"user":"u1","__v":0}"#;
        let todo: Todo = serde_json::from_str(raw).unwrap();

        assert_eq!(todo.id, TodoId::from("2"));
        assert!(todo.is_completed);
        assert_eq!(todo.owner.as_deref(), Some("u1"));
    }

    #[test]
    fn todo_without_owner_omits_user_field() {
        let value = serde_json::to_value(Todo::new("1", "Buy milk", false)).unwrap();

        assert_eq!(
            value,
            serde_json::json!({"id": "1", "name": "Buy milk", "isCompleted": false})
        );
    }

    #[test]
    fn filter_paths() {
        assert_eq!(TodoFilter::All.path(), "/todo/find/all");
        assert_eq!(TodoFilter::Completed.path(), "/todo/completed/all");
        assert_eq!(TodoFilter::Incomplete.path(), "/todo/incompleted/all");
    }

    #[test]
    fn password_debug_is_redacted() {
        let password = Password::new("hunter2");
        assert_eq!(format!("{password:?}"), "Password(***)");
        assert_eq!(password.expose(), "hunter2");
    }
}
