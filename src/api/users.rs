use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::info;

use super::observability::{count_user_operation, record_user_operation};
use super::validation::{parse_user_id, validate_new_user, validate_patch, validate_search};
use super::{
    ApiError, AppState, MessageResponse, SearchUsernameRequest, SearchUsernameResponse,
};
use crate::models::{NewUser, User, UserPatch};

pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<User>>, ApiError> {
    let result = state.users.list_all().await;
    record_user_operation("list", &result);
    Ok(Json(result?))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = parse_user_id(&id)?;
    let result = state.users.get(id).await;
    record_user_operation("get", &result);
    Ok(Json(result?))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(new_user) = payload?;
    validate_new_user(&new_user)?;

    let taken = state
        .users
        .username_exists(&new_user.username)
        .await
        .map_err(|e| {
            count_user_operation("create", e.kind());
            ApiError::database("Database error while checking username", e)
        })?;

    if taken {
        count_user_operation("create", "username_taken");
        return Err(ApiError::conflict("Username already exists"));
    }

    let result = state.users.create(new_user).await;
    record_user_operation("create", &result);

    Ok((StatusCode::CREATED, Json(result?)))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Result<Json<UserPatch>, ApiError> {
    let Json(patch) = payload?;
    validate_patch(&patch)?;
    let id = parse_user_id(&id)?;

    let result = state.users.update(id, patch.clone()).await;
    record_user_operation("update", &result);
    result?;

    Ok(Json(patch))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_user_id(&id)?;

    let result = state.users.delete(id).await;
    record_user_operation("delete", &result);
    result?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

pub async fn search_username(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchUsernameRequest>, JsonRejection>,
) -> Result<Json<SearchUsernameResponse>, ApiError> {
    let Json(request) = payload?;
    validate_search(&request)?;

    let taken = state.users.username_exists(&request.username).await;
    record_user_operation("search", &taken);
    if !taken.map_err(|e| ApiError::database("Database error", e))? {
        return Ok(Json(SearchUsernameResponse::available()));
    }

    let suggestions = state
        .users
        .suggest_usernames(&request.first_name, &request.last_name)
        .await;
    record_user_operation("suggest", &suggestions);
    let suggestions =
        suggestions.map_err(|e| ApiError::database("Error generating suggestions", e))?;

    info!(
        username = %request.username,
        suggestions = suggestions.len(),
        "Username taken, offering suggestions"
    );

    Ok(Json(SearchUsernameResponse::taken(suggestions)))
}
