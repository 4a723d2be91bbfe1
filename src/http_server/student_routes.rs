//! Student HTTP Routes
//!
//! CRUD endpoints under `/api/students` plus the read-only major catalog.
//!
//! Create and update run the registration-number check before the email
//! check and stop at the first conflict. These checks only exist to return a
//! friendly message; the store's unique indexes still reject a racing
//! duplicate, which then surfaces as a plain validation error.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, info};

use super::errors::{ApiError, ApiResult};
use crate::model::{Major, MajorInfo, StudentDraft, StudentPatch, StudentRecord, UniqueField};
use crate::store::StudentStore;

// ==================
// Shared State
// ==================

/// State shared across handlers
pub struct AppState {
    pub store: Arc<dyn StudentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn StudentStore>) -> Self {
        Self { store }
    }
}

// ==================
// Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ==================
// Routes
// ==================

/// Student routes, to be nested under `/api`
pub fn student_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/students", get(list_handler).post(create_handler))
        .route(
            "/students/:id",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/majors", get(majors_handler))
        .with_state(state)
}

/// Fail with `DuplicateField` if another record already holds `value`
fn ensure_unused(
    store: &dyn StudentStore,
    field: UniqueField,
    value: &str,
    exclude_id: Option<&str>,
) -> ApiResult<()> {
    match store.find_by_field(field, value, exclude_id)? {
        Some(_) => Err(ApiError::DuplicateField(field)),
        None => Ok(()),
    }
}

/// Run store work on the blocking pool; file-backed writes fsync under a lock.
pub(crate) async fn with_store<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&dyn StudentStore) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| ApiError::StoreUnavailable(format!("store task failed: {}", e)))?
}

// ==================
// Handlers
// ==================

async fn list_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<StudentRecord>>> {
    let records = with_store(&state, |store| Ok(store.list_all()?)).await?;
    Ok(Json(records))
}

async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StudentRecord>> {
    with_store(&state, move |store| {
        store.get_by_id(&id)?.map(Json).ok_or(ApiError::NotFound)
    })
    .await
}

async fn create_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StudentDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StudentRecord>)> {
    let Json(draft) = payload?;
    let student = draft.validate()?;

    if Major::from_code(&student.major).is_none() {
        debug!(major = %student.major, "major outside the catalog");
    }

    let record = with_store(&state, move |store| {
        for field in UniqueField::ALL {
            ensure_unused(store, field, student.unique_value(field), None)?;
        }
        Ok(store.create(student)?)
    })
    .await?;
    info!(id = %record.id, registration_number = %record.registration_number, "student created");
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<StudentPatch>, JsonRejection>,
) -> ApiResult<Json<StudentRecord>> {
    let Json(patch) = payload?;
    patch.validate()?;

    let record = with_store(&state, move |store| {
        for field in UniqueField::ALL {
            if let Some(value) = patch.unique_value(field) {
                ensure_unused(store, field, value, Some(&id))?;
            }
        }
        store.update_by_id(&id, patch)?.ok_or(ApiError::NotFound)
    })
    .await?;
    info!(id = %record.id, "student updated");
    Ok(Json(record))
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let deleted = id.clone();
    with_store(&state, move |store| Ok(store.delete_by_id(&deleted)?)).await?;
    info!(id = %id, "student deleted");
    Ok(Json(MessageResponse {
        message: "record deleted".to_string(),
    }))
}

async fn majors_handler() -> Json<Vec<MajorInfo>> {
    Json(Major::ALL.iter().map(Major::info).collect())
}
