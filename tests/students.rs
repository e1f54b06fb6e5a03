//! Endpoint behavior, driven through the router in-process.

use std::sync::Arc;

use serde_json::{Value, json};
use students_api::api::{self, AppState};
use students_api::storage::{MemoryStore, SqliteStore, Storage};
use students_api::student::Student;
use students_api::validate::Validator;
use students_api::{Method, Request, Response, Router};

fn app_with(store: Arc<dyn Storage>) -> Router {
    api::routes(AppState::new(store, Validator::new()))
}

fn app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (app_with(store.clone()), store)
}

async fn call(app: &Router, method: Method, path: &str, body: &str) -> Response {
    app.handle(Request::new(method, path, body.to_owned())).await
}

fn body_json(res: &Response) -> Value {
    serde_json::from_slice(res.body()).expect("response body is JSON")
}

fn assert_error(res: &Response, status: u16) -> String {
    assert_eq!(res.status_code(), status, "body: {}", String::from_utf8_lossy(res.body()));
    let v = body_json(res);
    assert_eq!(v["status"], "Error");
    v["error"].as_str().expect("error message").to_owned()
}

const ANN: &str = r#"{"name":"Ann","email":"ann@x.com","age":21}"#;

// ── Create ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_returns_fresh_ids() {
    let (app, _) = app();

    let first = call(&app, Method::Post, "/api/students", ANN).await;
    assert_eq!(first.status_code(), 201);
    assert_eq!(first.header("location"), Some("/api/students/1"));
    assert_eq!(body_json(&first), json!({"id": 1}));

    let second = call(&app, Method::Post, "/api/students", r#"{"name":"Bob","email":"bob@x.com","age":30}"#).await;
    assert_eq!(second.header("location"), Some("/api/students/2"));
    assert_eq!(body_json(&second), json!({"id": 2}));
}

#[tokio::test]
async fn create_ignores_client_id() {
    let (app, store) = app();
    let res = call(&app, Method::Post, "/api/students", r#"{"id":99,"name":"Ann","email":"ann@x.com","age":21}"#).await;
    assert_eq!(body_json(&res), json!({"id": 1}));
    assert!(store.get_student_by_id(99).is_err());
}

#[tokio::test]
async fn create_rejects_empty_and_malformed_bodies() {
    let (app, store) = app();

    assert_eq!(assert_error(&call(&app, Method::Post, "/api/students", "").await, 400), "empty body");
    assert_eq!(assert_error(&call(&app, Method::Post, "/api/students", "  \n").await, 400), "empty body");
    assert_error(&call(&app, Method::Post, "/api/students", "{\"name\":").await, 400);
    assert_error(&call(&app, Method::Post, "/api/students", r#"{"name":"Ann","email":"ann@x.com","age":"old"}"#).await, 400);

    assert!(store.get_students().unwrap().is_empty());
}

#[tokio::test]
async fn create_enumerates_validation_failures() {
    let (app, store) = app();

    let msg = assert_error(&call(&app, Method::Post, "/api/students", r#"{"email":"nope","age":-1}"#).await, 400);
    assert_eq!(
        msg,
        "field name is a required field, field email is not a valid email address, \
         field age must be a positive integer"
    );

    let msg = assert_error(&call(&app, Method::Post, "/api/students", "{}").await, 400);
    assert!(msg.contains("field name"));
    assert!(msg.contains("field email"));
    assert!(msg.contains("field age"));

    assert!(store.get_students().unwrap().is_empty());
}

// ── Read ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_of_empty_store_is_empty_array() {
    let (app, _) = app();
    let res = call(&app, Method::Get, "/api/students", "").await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(body_json(&res), json!([]));
}

#[tokio::test]
async fn get_by_id_rejects_non_integer_ids() {
    let (app, _) = app();
    let msg = assert_error(&call(&app, Method::Get, "/api/students/abc", "").await, 400);
    assert!(msg.starts_with("invalid id \"abc\""), "{msg}");
}

#[tokio::test]
async fn get_by_id_of_missing_record_is_404() {
    let (app, _) = app();
    let msg = assert_error(&call(&app, Method::Get, "/api/students/42", "").await, 404);
    assert_eq!(msg, "no student with id 42");
}

// ── Update ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_rejects_mismatched_body_id() {
    let (app, store) = app();
    call(&app, Method::Post, "/api/students", ANN).await;

    let res = call(&app, Method::Put, "/api/students/1", r#"{"id":2,"name":"Eve","email":"eve@x.com","age":40}"#).await;
    assert_eq!(assert_error(&res, 400), "body id 2 does not match path id 1");
    assert_eq!(store.get_student_by_id(1).unwrap().name, "Ann");
}

#[tokio::test]
async fn update_accepts_matching_body_id() {
    let (app, _) = app();
    call(&app, Method::Post, "/api/students", ANN).await;

    let res = call(&app, Method::Put, "/api/students/1", r#"{"id":1,"name":"Ann","email":"ann@x.com","age":30}"#).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(body_json(&res)["age"], 30);
}

#[tokio::test]
async fn update_rejects_unknown_fields_and_bad_input() {
    let (app, store) = app();
    call(&app, Method::Post, "/api/students", ANN).await;

    let unknown = r#"{"name":"Ann","email":"ann@x.com","age":21,"grade":"A"}"#;
    let msg = assert_error(&call(&app, Method::Put, "/api/students/1", unknown).await, 400);
    assert!(msg.contains("unknown field `grade`"), "{msg}");

    assert_eq!(assert_error(&call(&app, Method::Put, "/api/students/1", "").await, 400), "empty body");
    assert_error(&call(&app, Method::Put, "/api/students/1", "[").await, 400);
    assert_error(&call(&app, Method::Put, "/api/students/x", ANN).await, 400);

    let msg = assert_error(&call(&app, Method::Put, "/api/students/1", r#"{"name":"","email":"ann@x.com","age":21}"#).await, 400);
    assert_eq!(msg, "field name is a required field");

    assert_eq!(store.get_student_by_id(1).unwrap().age, 21);
}

#[tokio::test]
async fn update_enumerates_every_failing_field() {
    let (app, store) = app();
    call(&app, Method::Post, "/api/students", ANN).await;

    let msg = assert_error(&call(&app, Method::Put, "/api/students/1", r#"{"name":"","email":"x","age":-1}"#).await, 400);
    assert_eq!(
        msg,
        "field name is a required field, field email is not a valid email address, \
         field age must be a positive integer"
    );

    let msg = assert_error(&call(&app, Method::Put, "/api/students/1", "{}").await, 400);
    assert_eq!(
        msg,
        "field name is a required field, field email is a required field, \
         field age is a required field"
    );

    assert_eq!(
        store.get_student_by_id(1).unwrap(),
        Student { id: 1, name: "Ann".into(), email: "ann@x.com".into(), age: 21 }
    );
}

#[tokio::test]
async fn update_of_missing_record_is_404() {
    let (app, _) = app();
    assert_error(&call(&app, Method::Put, "/api/students/7", ANN).await, 404);
}

#[tokio::test]
async fn update_is_idempotent() {
    let (app, store) = app();
    call(&app, Method::Post, "/api/students", ANN).await;

    let payload = r#"{"name":"Ann B","email":"ann@x.com","age":22}"#;
    let first = call(&app, Method::Put, "/api/students/1", payload).await;
    let after_first = store.get_students().unwrap();
    let second = call(&app, Method::Put, "/api/students/1", payload).await;

    assert_eq!(first.body(), second.body());
    assert_eq!(store.get_students().unwrap(), after_first);
}

// ── Delete ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_the_record() {
    let (app, _) = app();
    call(&app, Method::Post, "/api/students", ANN).await;

    let res = call(&app, Method::Delete, "/api/students/1", "").await;
    assert_eq!(res.status_code(), 204);
    assert!(res.body().is_empty());

    assert_error(&call(&app, Method::Get, "/api/students/1", "").await, 404);
    assert_error(&call(&app, Method::Delete, "/api/students/1", "").await, 404);
}

// ── Routing and health ────────────────────────────────────────────────────────

#[tokio::test]
async fn unrouted_requests_get_json_errors() {
    let (app, _) = app();
    assert_error(&call(&app, Method::Patch, "/api/students/1", "").await, 405);
    assert_error(&call(&app, Method::Get, "/api/courses", "").await, 404);
}

#[tokio::test]
async fn health_endpoints() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let app = app_with(store.clone());

    assert_eq!(call(&app, Method::Get, "/healthz", "").await.body(), b"ok");
    assert_eq!(call(&app, Method::Get, "/readyz", "").await.body(), b"ready");

    store.close().unwrap();
    assert_error(&call(&app, Method::Get, "/readyz", "").await, 503);
    assert_eq!(call(&app, Method::Get, "/healthz", "").await.status_code(), 200);
}

#[tokio::test]
async fn storage_failures_are_500() {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let app = app_with(store.clone());
    store.close().unwrap();

    assert_eq!(assert_error(&call(&app, Method::Get, "/api/students", "").await, 500), "store is closed");
    assert_error(&call(&app, Method::Post, "/api/students", ANN).await, 500);
}

// ── Full scenario ─────────────────────────────────────────────────────────────

async fn scenario(app: &Router) {
    let res = call(app, Method::Post, "/api/students", ANN).await;
    assert_eq!(res.status_code(), 201);
    assert_eq!(body_json(&res), json!({"id": 1}));

    let res = call(app, Method::Get, "/api/students/1", "").await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(body_json(&res), json!({"id": 1, "name": "Ann", "email": "ann@x.com", "age": 21}));

    let res = call(app, Method::Put, "/api/students/1", r#"{"name":"Ann B","email":"ann@x.com","age":22}"#).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(body_json(&res), json!({"id": 1, "name": "Ann B", "email": "ann@x.com", "age": 22}));

    let res = call(app, Method::Get, "/api/students", "").await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(body_json(&res), json!([{"id": 1, "name": "Ann B", "email": "ann@x.com", "age": 22}]));
}

#[tokio::test]
async fn scenario_against_memory_store() {
    let (app, _) = app();
    scenario(&app).await;
}

#[tokio::test]
async fn scenario_against_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::open(dir.path().join("storage.db")).unwrap());
    scenario(&app_with(store)).await;
}
