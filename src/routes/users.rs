//! User route handlers
//!
//! List, create, update and delete users. Uniqueness of email and username is
//! checked before the insert; the store's unique indexes only back it up.

use crate::error::{
    conflict_error, internal_error, invalid_json, not_found_error, validation_error, ApiResult,
};
use crate::models::{
    CreateUserRequest, DeleteUserQuery, Envelope, NewUser, UpdateUserRequest, User, UserChanges,
};
use crate::repository::{EntityKey, EntityKind, UniqueField};
use crate::state::SharedState;
use crate::validation::{required, Preconditions};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};
use validator::Validate;

/// GET /api/users
pub async fn list_users(State(state): State<SharedState>) -> ApiResult<Json<Envelope<Vec<User>>>> {
    debug!("Listing users");

    let users = state
        .store
        .list_users()
        .await
        .map_err(|e| internal_error("fetching users", e))?;

    debug!("Found {} users", users.len());
    Ok(Json(Envelope::with_data("users", users)))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<SharedState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<User>>)> {
    let Json(payload) = payload.map_err(|rejection| invalid_json(&rejection))?;
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    // Email is checked before username; absent values skip their check
    Preconditions::new(&state.repository)
        .vacant_if_present(
            payload.email.as_deref(),
            |email| EntityKey::Unique(UniqueField::Email, email),
            conflict_error("Email already exists"),
        )
        .vacant_if_present(
            payload.username.as_deref(),
            |username| EntityKey::Unique(UniqueField::Username, username),
            conflict_error("Username already exists"),
        )
        .verify()
        .await?;

    let user = state
        .store
        .create_user(NewUser::from(payload))
        .await
        .map_err(|e| internal_error("creating user", e))?;

    info!("User created (id: {})", user.id);

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message("User has been created!", "newUser", user)),
    ))
}

/// PATCH /api/users
///
/// `id` selects the user and `username` must be supplied; the supplied
/// username is written as the new value.
pub async fn update_user(
    State(state): State<SharedState>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<Envelope<User>>> {
    let Json(payload) = payload.map_err(|rejection| invalid_json(&rejection))?;

    let missing = || validation_error("Id or username not found");
    let id = required(payload.id.as_deref(), missing)?.to_string();
    required(payload.username.as_deref(), missing)?;
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let UpdateUserRequest {
        email,
        username,
        name,
        password,
        ..
    } = payload;
    let id = id.as_str();

    debug!("Updating user: {}", id);

    Preconditions::new(&state.repository)
        .exists(EntityKey::Id(EntityKind::User, id), not_found_error("User not found"))
        .verify()
        .await?;

    let changes = UserChanges {
        email,
        username,
        name,
        password,
    };

    let user = state
        .store
        .update_user(id, changes)
        .await
        .map_err(|e| internal_error("updating user", e))?;

    info!("User updated (id: {})", user.id);

    Ok(Json(Envelope::with_message(
        "User has been updated!",
        "updatedUser",
        user,
    )))
}

/// DELETE /api/users?id=...
pub async fn delete_user(
    State(state): State<SharedState>,
    Query(query): Query<DeleteUserQuery>,
) -> ApiResult<Json<Envelope<User>>> {
    let id = required(query.id.as_deref(), || validation_error("Id not found"))?;

    debug!("Deleting user: {}", id);

    Preconditions::new(&state.repository)
        .exists(EntityKey::Id(EntityKind::User, id), not_found_error("User not found"))
        .verify()
        .await?;

    let user = state
        .store
        .delete_user(id)
        .await
        .map_err(|e| internal_error("deleting user", e))?;

    info!("User deleted (id: {})", user.id);

    Ok(Json(Envelope::with_message(
        "User has been deleted!",
        "deletedUser",
        user,
    )))
}
