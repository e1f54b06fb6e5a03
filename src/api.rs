//! Student endpoints.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | `POST` | `/api/students` | [`create`] |
//! | `GET` | `/api/students` | [`get_list`] |
//! | `GET` | `/api/students/{id}` | [`get_by_id`] |
//! | `PUT` | `/api/students/{id}` | [`update_by_id`] |
//! | `DELETE` | `/api/students/{id}` | [`delete_by_id`] |
//!
//! Each handler decodes and validates its input, makes exactly one storage
//! call and encodes the result. Failures are [`ApiError`]s, rendered as error
//! envelopes.

use std::future::Future;
use std::num::ParseIntError;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::envelope;
use crate::handler::Handler;
use crate::health;
use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;
use crate::status::Status;
use crate::storage::{Storage, StorageError};
use crate::student::{NewStudent, StudentUpdate};
use crate::validate::{ValidationErrors, Validator};

/// Everything a handler needs, built once in `main`.
pub struct AppState {
    pub store: Arc<dyn Storage>,
    pub validator: Validator,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>, validator: Validator) -> Self {
        Self { store, validator }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// A request-scoped failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("empty body")]
    EmptyBody,

    #[error("invalid request body: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("invalid id {raw:?}: {source}")]
    InvalidId { raw: String, source: ParseIntError },

    #[error("body id {body} does not match path id {path}")]
    IdMismatch { path: i64, body: i64 },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            Self::EmptyBody
            | Self::MalformedJson(_)
            | Self::InvalidId { .. }
            | Self::IdMismatch { .. }
            | Self::Validation(_) => Status::BadRequest,
            Self::Storage(StorageError::NotFound(_)) => Status::NotFound,
            Self::Storage(_) | Self::Task(_) => Status::InternalServerError,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == Status::InternalServerError {
            error!("request failed: {self}");
        } else {
            warn!("request rejected: {self}");
        }
        envelope::error(status, self)
    }
}

// ── Routes ────────────────────────────────────────────────────────────────────

/// The full application: student endpoints plus health checks.
pub fn routes(state: AppState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .on(Method::Post,   "/api/students",      with_state(&state, create))
        .on(Method::Get,    "/api/students",      with_state(&state, get_list))
        .on(Method::Get,    "/api/students/{id}", with_state(&state, get_by_id))
        .on(Method::Put,    "/api/students/{id}", with_state(&state, update_by_id))
        .on(Method::Delete, "/api/students/{id}", with_state(&state, delete_by_id))
        .on(Method::Get,    "/healthz",           health::liveness)
        .on(Method::Get,    "/readyz",            with_state(&state, health::readiness))
}

/// Binds `state` into a `Handler`.
fn with_state<F, Fut, R>(state: &Arc<AppState>, f: F) -> impl Handler
where
    F: Fn(Arc<AppState>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    let state = Arc::clone(state);
    move |req: Request| f(Arc::clone(&state), req)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `POST /api/students` → `201 {"id": N}`
pub async fn create(state: Arc<AppState>, req: Request) -> Result<Response, ApiError> {
    info!("creating a student");
    let student: NewStudent = decode(req.body())?;
    state.validator.validate(&student)?;

    let id = blocking(&state, move |store| {
        store.create_student(&student.name, &student.email, student.age)
    })
    .await?;

    info!(id, "student created");
    Ok(envelope::created(&format!("/api/students/{id}"), &json!({ "id": id })))
}

/// `GET /api/students/{id}` → `200 Student`
pub async fn get_by_id(state: Arc<AppState>, req: Request) -> Result<Response, ApiError> {
    let id = path_id(&req)?;
    info!(id, "getting a student");
    let student = blocking(&state, move |store| store.get_student_by_id(id)).await?;
    Ok(envelope::json(Status::Ok, &student))
}

/// `GET /api/students` → `200 [Student]`
pub async fn get_list(state: Arc<AppState>, _req: Request) -> Result<Response, ApiError> {
    info!("getting all students");
    let students = blocking(&state, |store| store.get_students()).await?;
    Ok(envelope::json(Status::Ok, &students))
}

/// `PUT /api/students/{id}` → `200 Student`
///
/// A full replacement. The body may repeat the id; if it does it must match
/// the path.
pub async fn update_by_id(state: Arc<AppState>, req: Request) -> Result<Response, ApiError> {
    let id = path_id(&req)?;
    info!(id, "updating a student");

    let update: StudentUpdate = decode(req.body())?;
    if update.id != 0 && update.id != id {
        return Err(ApiError::IdMismatch { path: id, body: update.id });
    }
    let student = update.into_student(id);
    state.validator.validate(&student)?;

    let updated = blocking(&state, move |store| store.update_student(&student)).await?;
    info!(id, "student updated");
    Ok(envelope::json(Status::Ok, &updated))
}

/// `DELETE /api/students/{id}` → `204`
pub async fn delete_by_id(state: Arc<AppState>, req: Request) -> Result<Status, ApiError> {
    let id = path_id(&req)?;
    info!(id, "deleting a student");
    blocking(&state, move |store| store.delete_student(id)).await?;
    Ok(Status::NoContent)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn path_id(req: &Request) -> Result<i64, ApiError> {
    let raw = req.param("id").unwrap_or_default();
    raw.parse().map_err(|source| ApiError::InvalidId { raw: raw.to_owned(), source })
}

/// Empty and whitespace-only bodies are reported as such, not as JSON errors.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.trim_ascii().is_empty() {
        return Err(ApiError::EmptyBody);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Runs one storage call on the blocking pool.
pub(crate) async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&dyn Storage) -> Result<T, StorageError> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    Ok(tokio::task::spawn_blocking(move || f(store.as_ref())).await??)
}
