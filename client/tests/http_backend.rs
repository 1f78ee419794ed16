//! `HttpBackend` against a mock HTTP server.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use todo_sync::{ApiError, HttpBackend, Todo, TodoBackend, TodoFilter, TodoId};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_body() -> serde_json::Value {
    json!({
        "token": "t1",
        "user": { "_id": "u1", "name": "Ada", "email": "ada@example.com" }
    })
}

fn todo_body(id: &str, name: &str, is_completed: bool) -> serde_json::Value {
    json!({ "_id": id, "name": name, "isCompleted": is_completed, "user": "u1" })
}

#[tokio::test]
async fn login_posts_credentials_and_decodes_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let session = backend.login("ada@example.com", "pw").await.unwrap();

    assert_eq!(session.token, "t1");
    assert_eq!(session.user.id, "u1");
    assert_eq!(session.user.name, "Ada");
}

#[tokio::test]
async fn register_posts_name_email_and_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/create"))
        .and(body_json(
            json!({ "name": "Ada", "email": "ada@example.com", "password": "pw" }),
        ))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_body()))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let session = backend.register("Ada", "ada@example.com", "pw").await.unwrap();

    assert_eq!(session.user.email, "ada@example.com");
}

#[tokio::test]
async fn register_conflict_maps_to_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/create"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "message": "Email taken" })),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let err = backend.register("Ada", "ada@example.com", "pw").await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Conflict {
            message: Some("Email taken".to_string())
        }
    );
}

#[tokio::test]
async fn bad_credentials_map_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let err = backend.login("ada@example.com", "wrong").await.unwrap_err();

    assert_eq!(err, ApiError::Unauthorized { message: None });
}

#[tokio::test]
async fn logout_sends_token_and_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/logout"))
        .and(header("authorization", "t1"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());

    backend.logout("t1").await.unwrap();
}

#[tokio::test]
async fn fetch_uses_filter_path_and_bare_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todo/completed/all"))
        .and(header("authorization", "t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([todo_body("2", "Walk dog", true)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let todos = backend.fetch_todos("t1", TodoFilter::Completed).await.unwrap();

    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0].id, TodoId::from("2"));
    assert!(todos[0].is_completed);
    assert_eq!(todos[0].owner.as_deref(), Some("u1"));
}

#[tokio::test]
async fn auth_scheme_prefixes_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todo/find/all"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri()).with_auth_scheme("Bearer");

    assert!(backend.fetch_todos("t1", TodoFilter::All).await.unwrap().is_empty());
}

#[tokio::test]
async fn create_toggle_update_send_expected_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/todo/create"))
        .and(body_json(json!({ "name": "Buy milk" })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(todo_body("1", "Buy milk", false)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/todo/toggle/1"))
        .and(body_json(json!({ "isCompleted": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(todo_body("1", "Buy milk", true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/todo/update/1"))
        .and(body_json(json!({ "name": "Buy oat milk", "isCompleted": false })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(todo_body("1", "Buy oat milk", false)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let id = TodoId::from("1");

    let created = backend.create_todo("t1", "Buy milk").await.unwrap();
    assert_eq!(created.id, id);

    let toggled = backend.toggle_todo("t1", &id, true).await.unwrap();
    assert!(toggled.is_completed);

    let updated = backend.update_todo("t1", &id, "Buy oat milk", false).await.unwrap();
    assert_eq!(updated.name, "Buy oat milk");
    assert!(!updated.is_completed);
}

#[tokio::test]
async fn fetch_one_and_delete_hit_id_paths() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todo/get/1"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(todo_body("1", "Buy milk", false)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/todo/delete/1"))
        .and(header("authorization", "t1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let id = TodoId::from("1");

    let fetched = backend.fetch_todo("t1", &id).await.unwrap();
    assert_eq!(
        Todo {
            owner: None,
            ..fetched
        },
        Todo::new("1", "Buy milk", false)
    );

    backend.delete_todo("t1", &id).await.unwrap();
}

#[tokio::test]
async fn update_conflict_keeps_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/todo/update/1"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "message": "Todo with this name already exists" })),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let err = backend
        .update_todo("t1", &TodoId::from("1"), "Walk dog", false)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert_eq!(err.server_message(), Some("Todo with this name already exists"));
}

#[tokio::test]
async fn server_error_without_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/todo/delete/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let err = backend.delete_todo("t1", &TodoId::from("1")).await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Status {
            status: 500,
            message: None
        }
    );
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/todo/find/all"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(server.uri());
    let err = backend.fetch_todos("t1", TodoFilter::All).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let backend = HttpBackend::new(uri);
    let err = backend.fetch_todos("t1", TodoFilter::All).await.unwrap_err();

    assert!(matches!(err, ApiError::Transport(_)));
}
