use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    applications::{
        dto::{
            AnalyticsResponse, CreateApplicationRequest, DeleteResponse, ListQuery, StatusCounts,
            UpdateApplicationRequest,
        },
        repo::{ApplicationStatus, JobApplication},
        services::{apply_patch, search_pattern, validate_create, validate_patch, STATUS_MESSAGE},
    },
    auth::AuthUser,
    error::{ApiError, FieldErrors},
    state::AppState,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/applications", get(list_applications))
        .route("/applications/analytics", get(analytics))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/applications", post(create_application))
        .route(
            "/applications/:id",
            patch(update_application).delete(delete_application),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_application(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<JobApplication>), ApiError> {
    let fields = validate_create(payload).map_err(ApiError::Validation)?;
    let app = JobApplication::create(&state.db, user_id, &fields).await?;
    info!(user_id = %user_id, application_id = %app.id, "application created");
    Ok((StatusCode::CREATED, Json(app)))
}

#[instrument(skip(state))]
pub async fn list_applications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<JobApplication>>, ApiError> {
    // Empty query values mean "no filter", matching form submissions that
    // send the parameter with no value.
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => Some(raw.parse::<ApplicationStatus>().map_err(|()| {
            let mut fields = FieldErrors::new();
            fields.insert("status", vec![STATUS_MESSAGE.into()]);
            ApiError::Validation(fields)
        })?),
    };
    let pattern = query
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(search_pattern);

    let apps = JobApplication::list_by_user(&state.db, user_id, status, pattern).await?;
    Ok(Json(apps))
}

#[instrument(skip(state))]
pub async fn analytics(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let counts = JobApplication::status_counts(&state.db, user_id).await?;
    let (total, last_updated) = JobApplication::totals(&state.db, user_id).await?;
    Ok(Json(AnalyticsResponse {
        total,
        last_updated,
        by_status: StatusCounts::from_rows(&counts),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_application(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationRequest>,
) -> Result<Json<JobApplication>, ApiError> {
    let patch = validate_patch(payload).map_err(ApiError::Validation)?;

    let existing = JobApplication::find_owned(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Application"))?;

    let fields = apply_patch(&existing, patch);
    let updated = JobApplication::update(&state.db, user_id, id, &fields)
        .await?
        .ok_or(ApiError::NotFound("Application"))?;

    info!(user_id = %user_id, application_id = %id, "application updated");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn delete_application(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    if !JobApplication::delete_owned(&state.db, user_id, id).await? {
        return Err(ApiError::NotFound("Application"));
    }
    info!(user_id = %user_id, application_id = %id, "application deleted");
    Ok(Json(DeleteResponse { success: true }))
}
