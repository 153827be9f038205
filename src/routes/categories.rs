//! Category route handlers
//!
//! Categories belong to one user. The acting user is passed as `?userId=`.

use crate::error::{
    internal_error, invalid_json, not_found_error, validation_error, ApiResult, AppError,
};
use crate::models::{Category, CategoryChanges, CategoryRequest, Envelope, NewCategory, UserScopeQuery};
use crate::repository::{EntityKey, EntityKind, OwnedKind};
use crate::state::SharedState;
use crate::validation::{required, Preconditions};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use tracing::{debug, info};
use validator::Validate;

fn missing_user_id() -> AppError {
    validation_error("Invalid or missing userId")
}

fn user_not_found() -> AppError {
    not_found_error("User not found in the database")
}

/// GET /api/categories?userId=...
pub async fn list_categories(
    State(state): State<SharedState>,
    Query(query): Query<UserScopeQuery>,
) -> ApiResult<Json<Envelope<Vec<Category>>>> {
    let user_id = required(query.user_id.as_deref(), missing_user_id)?;

    debug!("Listing categories for user: {}", user_id);

    Preconditions::new(&state.repository)
        .exists(EntityKey::Id(EntityKind::User, user_id), user_not_found())
        .verify()
        .await?;

    let categories = state
        .store
        .categories_for_user(user_id)
        .await
        .map_err(|e| internal_error("getting categories", e))?;

    if categories.is_empty() {
        return Ok(Json(Envelope::with_message(
            "No categories found",
            "categories",
            categories,
        )));
    }

    Ok(Json(Envelope::with_data("categories", categories)))
}

/// POST /api/categories?userId=...
pub async fn create_category(
    State(state): State<SharedState>,
    Query(query): Query<UserScopeQuery>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<Json<Envelope<Category>>> {
    let user_id = required(query.user_id.as_deref(), missing_user_id)?;

    let Json(payload) = payload.map_err(|rejection| invalid_json(&rejection))?;
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    Preconditions::new(&state.repository)
        .exists(EntityKey::Id(EntityKind::User, user_id), user_not_found())
        .verify()
        .await?;

    let category = state
        .store
        .create_category(NewCategory {
            user_id: user_id.to_string(),
            title: payload.title,
            description: payload.description,
        })
        .await
        .map_err(|e| internal_error("creating category", e))?;

    info!("Category created (id: {}, user: {})", category.id, category.user_id);

    Ok(Json(Envelope::with_message(
        "Category has been created!",
        "newCategory",
        category,
    )))
}

/// PATCH /api/categories/{category}?userId=...
///
/// The category must be owned by the acting user.
pub async fn update_category(
    State(state): State<SharedState>,
    Path(category_id): Path<String>,
    Query(query): Query<UserScopeQuery>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<Json<Envelope<Category>>> {
    let user_id = required(query.user_id.as_deref(), missing_user_id)?;
    let category_id = required(Some(category_id.as_str()), || not_found_error("Category not found"))?;

    let Json(payload) = payload.map_err(|rejection| invalid_json(&rejection))?;
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    debug!("Updating category {} for user {}", category_id, user_id);

    Preconditions::new(&state.repository)
        .exists(EntityKey::Id(EntityKind::User, user_id), user_not_found())
        .exists(
            EntityKey::Owned {
                kind: OwnedKind::Category,
                id: category_id,
                user_id,
            },
            not_found_error("Category not found in the database"),
        )
        .verify()
        .await?;

    let category = state
        .store
        .update_category(category_id, CategoryChanges::from(payload))
        .await
        .map_err(|e| internal_error("updating category", e))?;

    info!("Category updated (id: {})", category.id);

    Ok(Json(Envelope::with_message(
        "Category has been updated!",
        "updatedCategory",
        category,
    )))
}
