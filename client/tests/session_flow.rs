//! Session Store flows against the in-memory backend and storage.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;
use todo_sync::mocks::{Endpoint, MemoryStorage, MockBackend};
use todo_sync::session::SessionEnvironment;
use todo_sync::todos::TodoEnvironment;
use todo_sync::vault::DEFAULT_SESSION_KEY;
use todo_sync::{
    ApiError, FileStorage, NoticeKind, Session, SessionStore, SessionVault, Todo, TodoStore,
    User,
};
use todo_sync_testing::test_clock;

fn ada() -> Session {
    Session::new(
        "t1".to_string(),
        User {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        },
    )
}

fn store<K>(backend: MockBackend, storage: K) -> SessionStore<MockBackend, K>
where
    K: todo_sync::KeyValueStorage + Clone + 'static,
{
    SessionStore::new(SessionEnvironment::new(
        backend,
        SessionVault::new(storage),
        Arc::new(test_clock()),
    ))
}

#[tokio::test]
async fn login_round_trip_matches_persisted_session() {
    let backend = MockBackend::new().with_account(&ada(), "pw");
    let storage = MemoryStorage::new();
    let store = store(backend, storage.clone());

    assert!(store.login("ada@example.com", "pw").await);

    let held = store.session().await.unwrap();
    let persisted = SessionVault::new(storage).load().await.unwrap();
    assert_eq!(persisted, Some(held.clone()));
    assert_eq!(held.user, ada().user);
    assert!(!store.is_loading().await);
    assert!(store.notice().await.is_none());
}

#[tokio::test]
async fn login_round_trip_through_file_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("storage.json");
    let backend = MockBackend::new().with_account(&ada(), "pw");

    let first = store(backend.clone(), FileStorage::new(&path));
    assert!(first.login("ada@example.com", "pw").await);
    let held = first.session().await;

    let second = store(backend, FileStorage::new(&path));
    second.restore_session().await;

    assert!(held.is_some());
    assert_eq!(second.session().await, held);
}

#[tokio::test]
async fn restore_twice_is_idempotent() {
    let storage = MemoryStorage::new();
    SessionVault::new(storage.clone()).save(&ada()).await.unwrap();
    let store = store(MockBackend::new(), storage);

    store.restore_session().await;
    let first = store.snapshot().await;
    store.restore_session().await;
    let second = store.snapshot().await;

    assert_eq!(first.session, Some(ada()));
    assert_eq!(first.session, second.session);
    assert!(!second.is_restoring);
}

#[tokio::test]
async fn restore_without_entry_stays_logged_out() {
    let store = store(MockBackend::new(), MemoryStorage::new());

    store.restore_session().await;

    assert!(!store.is_logged_in().await);
    assert!(!store.is_restoring().await);
}

#[tokio::test]
async fn corrupt_entry_restores_as_logged_out_and_is_removed() {
    let storage = MemoryStorage::new();
    storage.insert(DEFAULT_SESSION_KEY, "{not json");
    let store = store(MockBackend::new(), storage.clone());

    store.restore_session().await;

    assert_eq!(store.session().await, None);
    assert!(!storage.contains(DEFAULT_SESSION_KEY));
}

#[tokio::test]
async fn register_signs_in_and_persists() {
    let storage = MemoryStorage::new();
    let store = store(MockBackend::new(), storage.clone());

    assert!(store.register("Grace", "grace@example.com", "pw").await);

    let user = store.user().await.unwrap();
    assert_eq!(user.email, "grace@example.com");
    assert!(storage.contains(DEFAULT_SESSION_KEY));
}

#[tokio::test]
async fn register_duplicate_email_reports_conflict() {
    let backend = MockBackend::new().with_account(&ada(), "pw");
    let storage = MemoryStorage::new();
    let store = store(backend, storage.clone());

    assert!(!store.register("Ada", "ada@example.com", "pw").await);

    let notice = store.notice().await.unwrap();
    assert_eq!(notice.kind, NoticeKind::Conflict);
    assert_eq!(notice.title, "Registration Failed");
    assert_eq!(notice.detail, "An account with this email already exists");
    assert!(!store.is_logged_in().await);
    assert!(!storage.contains(DEFAULT_SESSION_KEY));
}

#[tokio::test]
async fn register_generic_failure_is_distinct_from_conflict() {
    let backend = MockBackend::new();
    backend.fail(Endpoint::Register, ApiError::Transport("connection refused".to_string()));
    let store = store(backend, MemoryStorage::new());

    assert!(!store.register("Ada", "ada@example.com", "pw").await);

    let notice = store.notice().await.unwrap();
    assert_eq!(notice.kind, NoticeKind::Failure);
    assert_eq!(notice.title, "Registration Failed");
}

#[tokio::test]
async fn failed_login_keeps_prior_session() {
    let backend = MockBackend::new().with_account(&ada(), "pw");
    let storage = MemoryStorage::new();
    let store = store(backend, storage.clone());
    assert!(store.login("ada@example.com", "pw").await);
    let before = store.session().await;
    let persisted = storage.value(DEFAULT_SESSION_KEY);

    assert!(!store.login("ada@example.com", "wrong").await);

    assert_eq!(store.session().await, before);
    assert_eq!(storage.value(DEFAULT_SESSION_KEY), persisted);
    let notice = store.notice().await.unwrap();
    assert_eq!(notice.kind, NoticeKind::InvalidCredentials);
    assert_eq!(notice.title, "Login Failed");
}

#[tokio::test]
async fn login_unknown_email_reports_invalid_credentials() {
    let store = store(MockBackend::new(), MemoryStorage::new());

    assert!(!store.login("nobody@example.com", "pw").await);

    let notice = store.notice().await.unwrap();
    assert_eq!(notice.kind, NoticeKind::InvalidCredentials);
    assert_eq!(notice.detail, "User not found");
}

#[tokio::test]
async fn logout_clears_even_when_backend_is_down() {
    let backend = MockBackend::new().with_account(&ada(), "pw");
    let storage = MemoryStorage::new();
    let store = store(backend.clone(), storage.clone());
    assert!(store.login("ada@example.com", "pw").await);
    backend.fail(Endpoint::Logout, ApiError::Transport("timed out".to_string()));

    store.logout().await;

    assert_eq!(backend.calls(Endpoint::Logout), 1);
    assert!(!store.is_logged_in().await);
    assert!(!storage.contains(DEFAULT_SESSION_KEY));
    assert!(!store.is_loading().await);
}

#[tokio::test]
async fn logout_without_session_sends_nothing() {
    let backend = MockBackend::new();
    let store = store(backend.clone(), MemoryStorage::new());

    store.logout().await;

    assert_eq!(backend.calls(Endpoint::Logout), 0);
    assert!(!store.is_logged_in().await);
}

#[tokio::test]
async fn unsaved_session_is_not_adopted() {
    let backend = MockBackend::new().with_account(&ada(), "pw");
    let storage = MemoryStorage::new();
    storage.fail_writes(true);
    let store = store(backend, storage.clone());

    assert!(!store.login("ada@example.com", "pw").await);

    assert!(!store.is_logged_in().await);
    assert!(!store.is_loading().await);
    assert!(!storage.contains(DEFAULT_SESSION_KEY));
    let notice = store.notice().await.unwrap();
    assert_eq!(notice.kind, NoticeKind::Failure);
    assert_eq!(notice.title, "Login Failed");
    assert_eq!(notice.detail, "Could not save your session");
}

#[tokio::test]
async fn login_recovers_a_damaged_storage_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{\"userInfo\": ").unwrap();
    let backend = MockBackend::new()
        .with_account(&ada(), "pw")
        .with_todo("u1", Todo::new("1", "Buy milk", false));
    let sessions = store(backend.clone(), FileStorage::new(&path));

    sessions.restore_session().await;
    assert!(sessions.login("ada@example.com", "pw").await);

    let held = sessions.session().await;
    let persisted = SessionVault::new(FileStorage::new(&path)).load().await.unwrap();
    assert_eq!(persisted, held);

    let todos = TodoStore::new(TodoEnvironment::new(
        backend,
        SessionVault::new(FileStorage::new(&path)),
        Arc::new(test_clock()),
    ));
    let fetched = todos.fetch_all().await;
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].name, "Buy milk");
}

#[tokio::test]
async fn login_resolving_after_shutdown_reports_failure() {
    let backend = MockBackend::new().with_account(&ada(), "pw");
    backend.delay(Endpoint::Login, Duration::from_millis(50));
    let store = Arc::new(store(backend, MemoryStorage::new()));

    let pending = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.login("ada@example.com", "pw").await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    let _ = store.shutdown(Duration::from_millis(200)).await;

    assert!(!pending.await.unwrap());
    assert!(!store.is_logged_in().await);
}

#[tokio::test]
async fn concurrent_logins_report_their_own_outcome() {
    let backend = MockBackend::new().with_account(&ada(), "pw");
    backend.delay(Endpoint::Login, Duration::from_millis(10));
    let store = store(backend, MemoryStorage::new());

    let (right, wrong) = tokio::join!(
        store.login("ada@example.com", "pw"),
        store.login("ada@example.com", "wrong"),
    );

    assert!(right);
    assert!(!wrong);
}

#[tokio::test]
async fn dismiss_notice_hides_it() {
    let store = store(MockBackend::new(), MemoryStorage::new());
    assert!(!store.login("nobody@example.com", "pw").await);
    assert!(store.notice().await.is_some());

    store.dismiss_notice().await;

    assert!(store.notice().await.is_none());
}

#[tokio::test]
async fn results_are_broadcast() {
    let backend = MockBackend::new().with_account(&ada(), "pw");
    let store = store(backend, MemoryStorage::new());
    let mut actions = store.subscribe_actions();

    assert!(store.login("ada@example.com", "pw").await);

    let action = actions.recv().await.unwrap();
    assert!(matches!(
        action,
        todo_sync::SessionAction::LoggedIn { ref session } if session.user.id == "u1"
    ));
}
