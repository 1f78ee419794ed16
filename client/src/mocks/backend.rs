//! In-memory backend for testing.

use crate::error::ApiError;
use crate::providers::TodoBackend;
use crate::types::{Session, Todo, TodoFilter, TodoId, User};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Backend endpoint, for call counting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `POST /user/create`
    Register,
    /// `POST /user/login`
    Login,
    /// `POST /user/logout`
    Logout,
    /// `GET /todo/find/all`, `/todo/completed/all`, `/todo/incompleted/all`
    FetchTodos,
    /// `GET /todo/get/{id}`
    FetchTodo,
    /// `POST /todo/create`
    CreateTodo,
    /// `PUT /todo/toggle/{id}`
    ToggleTodo,
    /// `PATCH /todo/update/{id}`
    UpdateTodo,
    /// `DELETE /todo/delete/{id}`
    DeleteTodo,
}

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug, Default)]
struct Inner {
    /// Accounts by email
    accounts: HashMap<String, Account>,
    /// User id by token
    tokens: HashMap<String, String>,
    /// All users' todos, in creation order
    todos: Vec<Todo>,
    next_id: u64,
    calls: HashMap<Endpoint, usize>,
    failures: HashMap<Endpoint, (ApiError, bool)>,
    delays: HashMap<Endpoint, Duration>,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn issue_token(&mut self, user_id: &str) -> String {
        let token = format!("token-{}", self.next_id());
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }

    fn user_id(&self, token: &str) -> Result<String, ApiError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized {
                message: Some("Invalid token".to_string()),
            })
    }

    fn owned(&mut self, token: &str, id: &TodoId) -> Result<&mut Todo, ApiError> {
        let owner = self.user_id(token)?;
        self.todos
            .iter_mut()
            .find(|todo| todo.id == *id && todo.owner.as_deref() == Some(owner.as_str()))
            .ok_or_else(|| ApiError::Status {
                status: 404,
                message: Some("Todo not found".to_string()),
            })
    }

    fn name_taken(&self, owner: &str, name: &str, except: Option<&TodoId>) -> bool {
        self.todos.iter().any(|todo| {
            todo.owner.as_deref() == Some(owner)
                && todo.name == name
                && Some(&todo.id) != except
        })
    }

    fn take_failure(&mut self, endpoint: Endpoint) -> Option<ApiError> {
        let (error, once) = self.failures.get(&endpoint).cloned()?;
        if once {
            self.failures.remove(&endpoint);
        }
        Some(error)
    }
}

fn conflict(message: &str) -> ApiError {
    ApiError::Conflict {
        message: Some(message.to_string()),
    }
}

/// In-memory [`TodoBackend`].
///
/// Behaves like the real backend for the happy paths (accounts, tokens,
/// per-user todos, 409 on duplicates) and records how often each endpoint
/// was called. Failures and latency can be injected per endpoint.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MockBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account whose token is already issued.
    #[must_use]
    pub fn with_account(self, session: &Session, password: &str) -> Self {
        {
            let mut inner = self.state();
            inner.accounts.insert(
                session.user.email.clone(),
                Account {
                    user: session.user.clone(),
                    password: password.to_string(),
                },
            );
            inner
                .tokens
                .insert(session.token.clone(), session.user.id.clone());
        }
        self
    }

    /// Seed a todo owned by `user_id`. The stored row's `owner` is set to
    /// `user_id`, as the real backend reports it.
    #[must_use]
    pub fn with_todo(self, user_id: &str, todo: Todo) -> Self {
        self.state().todos.push(Todo {
            owner: Some(user_id.to_string()),
            ..todo
        });
        self
    }

    /// Fail every call to `endpoint` with `error`.
    pub fn fail(&self, endpoint: Endpoint, error: ApiError) {
        self.state().failures.insert(endpoint, (error, false));
    }

    /// Fail only the next call to `endpoint`.
    pub fn fail_once(&self, endpoint: Endpoint, error: ApiError) {
        self.state().failures.insert(endpoint, (error, true));
    }

    /// Stop injecting failures.
    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Hold every call to `endpoint` for `duration` before answering.
    pub fn delay(&self, endpoint: Endpoint, duration: Duration) {
        self.state().delays.insert(endpoint, duration);
    }

    /// Number of calls made to `endpoint`.
    #[must_use]
    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.state().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// Number of calls made to any endpoint.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }

    /// Server-side todos of `user_id`.
    #[must_use]
    pub fn todos_of(&self, user_id: &str) -> Vec<Todo> {
        self.state()
            .todos
            .iter()
            .filter(|todo| todo.owner.as_deref() == Some(user_id))
            .cloned()
            .collect()
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call, apply injected latency and failure, then run `handler`.
    fn respond<T, F>(&self, endpoint: Endpoint, handler: F) -> impl Future<Output = Result<T, ApiError>> + Send
    where
        T: Send,
        F: FnOnce(&mut Inner) -> Result<T, ApiError> + Send,
    {
        let inner = Arc::clone(&self.inner);

        async move {
            let (delay, failure) = {
                let mut state = inner.lock().unwrap_or_else(PoisonError::into_inner);
                *state.calls.entry(endpoint).or_insert(0) += 1;
                (state.delays.get(&endpoint).copied(), state.take_failure(endpoint))
            };

            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if let Some(error) = failure {
                return Err(error);
            }

            let mut state = inner.lock().unwrap_or_else(PoisonError::into_inner);
            handler(&mut state)
        }
    }
}

impl TodoBackend for MockBackend {
    fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send {
        let (name, email, password) = (name.to_string(), email.to_string(), password.to_string());

        self.respond(Endpoint::Register, move |inner| {
            if inner.accounts.contains_key(&email) {
                return Err(conflict("User already exists"));
            }

            let user = User {
                id: format!("user-{}", inner.next_id()),
                name,
                email: email.clone(),
            };
            let token = inner.issue_token(&user.id);
            inner.accounts.insert(
                email,
                Account {
                    user: user.clone(),
                    password,
                },
            );
            Ok(Session::new(token, user))
        })
    }

    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<Session, ApiError>> + Send {
        let (email, password) = (email.to_string(), password.to_string());

        self.respond(Endpoint::Login, move |inner| {
            let user = match inner.accounts.get(&email) {
                Some(account) if account.password == password => account.user.clone(),
                Some(_) => {
                    return Err(ApiError::Unauthorized {
                        message: Some("Invalid credentials".to_string()),
                    });
                },
                None => {
                    return Err(ApiError::Status {
                        status: 404,
                        message: Some("User not found".to_string()),
                    });
                },
            };
            let token = inner.issue_token(&user.id);
            Ok(Session::new(token, user))
        })
    }

    fn logout(&self, token: &str) -> impl Future<Output = Result<(), ApiError>> + Send {
        let token = token.to_string();

        self.respond(Endpoint::Logout, move |inner| {
            inner.user_id(&token)?;
            inner.tokens.remove(&token);
            Ok(())
        })
    }

    fn fetch_todos(
        &self,
        token: &str,
        filter: TodoFilter,
    ) -> impl Future<Output = Result<Vec<Todo>, ApiError>> + Send {
        let token = token.to_string();

        self.respond(Endpoint::FetchTodos, move |inner| {
            let owner = inner.user_id(&token)?;
            Ok(inner
                .todos
                .iter()
                .filter(|todo| todo.owner.as_deref() == Some(owner.as_str()))
                .filter(|todo| match filter {
                    TodoFilter::All => true,
                    TodoFilter::Completed => todo.is_completed,
                    TodoFilter::Incomplete => !todo.is_completed,
                })
                .cloned()
                .collect())
        })
    }

    fn fetch_todo(
        &self,
        token: &str,
        id: &TodoId,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send {
        let (token, id) = (token.to_string(), id.clone());

        self.respond(Endpoint::FetchTodo, move |inner| {
            Ok(inner.owned(&token, &id)?.clone())
        })
    }

    fn create_todo(
        &self,
        token: &str,
        name: &str,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send {
        let (token, name) = (token.to_string(), name.to_string());

        self.respond(Endpoint::CreateTodo, move |inner| {
            let owner = inner.user_id(&token)?;
            if inner.name_taken(&owner, &name, None) {
                return Err(conflict("Todo already exists"));
            }

            let todo = Todo {
                id: TodoId::new(format!("todo-{}", inner.next_id())),
                name,
                is_completed: false,
                owner: Some(owner),
            };
            inner.todos.push(todo.clone());
            Ok(todo)
        })
    }

    fn toggle_todo(
        &self,
        token: &str,
        id: &TodoId,
        is_completed: bool,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send {
        let (token, id) = (token.to_string(), id.clone());

        self.respond(Endpoint::ToggleTodo, move |inner| {
            let todo = inner.owned(&token, &id)?;
            todo.is_completed = is_completed;
            Ok(todo.clone())
        })
    }

    fn update_todo(
        &self,
        token: &str,
        id: &TodoId,
        name: &str,
        is_completed: bool,
    ) -> impl Future<Output = Result<Todo, ApiError>> + Send {
        let (token, id, name) = (token.to_string(), id.clone(), name.to_string());

        self.respond(Endpoint::UpdateTodo, move |inner| {
            let owner = inner.user_id(&token)?;
            if inner.name_taken(&owner, &name, Some(&id)) {
                return Err(conflict("Todo already exists"));
            }

            let todo = inner.owned(&token, &id)?;
            todo.name = name;
            todo.is_completed = is_completed;
            Ok(todo.clone())
        })
    }

    fn delete_todo(
        &self,
        token: &str,
        id: &TodoId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send {
        let (token, id) = (token.to_string(), id.clone());

        self.respond(Endpoint::DeleteTodo, move |inner| {
            inner.owned(&token, &id)?;
            inner.todos.retain(|todo| todo.id != id);
            Ok(())
        })
    }
}
