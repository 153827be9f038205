//! Blog route handlers
//!
//! Blogs are filed by a user under a category. Listing and creation are scoped
//! by `?userId=&categoryId=`; single-blog routes take the blog id from the path.

use crate::error::{
    conflict_error, internal_error, invalid_json, not_found_error, validation_error, ApiResult,
    AppError,
};
use crate::ids::generate_blog_id;
use crate::models::{Blog, BlogChanges, BlogRequest, BlogScopeQuery, Envelope, NewBlog, UserScopeQuery};
use crate::repository::{Entity, EntityKey, EntityKind, OwnedKind};
use crate::state::SharedState;
use crate::validation::{required, Preconditions};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info, warn};
use validator::Validate;

fn missing_user_id() -> AppError {
    validation_error("Invalid or missing userId")
}

fn missing_category_id() -> AppError {
    validation_error("Invalid or missing categoryId")
}

fn missing_blog_id() -> AppError {
    validation_error("Invalid or missing blogId")
}

fn blog_not_found() -> AppError {
    not_found_error("Blog not found in the database")
}

/// Existence checks for the user and category named in the query
fn parents_exist<'r, 'a>(
    chain: Preconditions<'r, 'a>,
    user_id: &'a str,
    category_id: &'a str,
) -> Preconditions<'r, 'a> {
    chain
        .exists(
            EntityKey::Id(EntityKind::User, user_id),
            not_found_error("User not found in the database"),
        )
        .exists(
            EntityKey::Id(EntityKind::Category, category_id),
            not_found_error("Category not found in the database"),
        )
}

/// GET /api/blogs?userId=...&categoryId=...
pub async fn list_blogs(
    State(state): State<SharedState>,
    Query(query): Query<BlogScopeQuery>,
) -> ApiResult<Json<Envelope<Vec<Blog>>>> {
    let user_id = required(query.user_id.as_deref(), missing_user_id)?;
    let category_id = required(query.category_id.as_deref(), missing_category_id)?;

    debug!("Listing blogs for user {} in category {}", user_id, category_id);

    parents_exist(Preconditions::new(&state.repository), user_id, category_id)
        .verify()
        .await?;

    let blogs = state
        .store
        .blogs_in(user_id, category_id)
        .await
        .map_err(|e| internal_error("getting blogs", e))?;

    Ok(Json(Envelope::with_data("blogs", blogs)))
}

/// POST /api/blogs?userId=...&categoryId=...
///
/// A store-level uniqueness conflict on the generated id is reported as a
/// retryable 400; every other store failure is a 500.
pub async fn create_blog(
    State(state): State<SharedState>,
    Query(query): Query<BlogScopeQuery>,
    payload: Result<Json<BlogRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Envelope<Blog>>)> {
    let user_id = required(query.user_id.as_deref(), missing_user_id)?;
    let category_id = required(query.category_id.as_deref(), missing_category_id)?;

    let Json(payload) = payload.map_err(|rejection| invalid_json(&rejection))?;
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    parents_exist(Preconditions::new(&state.repository), user_id, category_id)
        .verify()
        .await?;

    let new_blog = NewBlog {
        id: generate_blog_id(),
        user_id: user_id.to_string(),
        category_id: category_id.to_string(),
        title: payload.title,
        description: payload.description,
        content: payload.content,
    };

    let blog = state.store.create_blog(new_blog).await.map_err(|e| {
        if e.is_conflict() {
            warn!("Blog id collision on create: {}", e);
            conflict_error("failed to create blog, please try again.")
        } else {
            internal_error("creating blog", e)
        }
    })?;

    info!("Blog created (id: {}, category: {})", blog.id, blog.category_id);

    Ok((StatusCode::CREATED, Json(Envelope::with_data("newBlog", blog))))
}

/// GET /api/blogs/{blog}?userId=...&categoryId=...
///
/// Requires both some blog of the user in the category and the blog named by
/// the path to exist; the two are checked independently.
pub async fn get_blog(
    State(state): State<SharedState>,
    Path(blog_id): Path<String>,
    Query(query): Query<BlogScopeQuery>,
) -> ApiResult<Json<Envelope<Blog>>> {
    let user_id = required(query.user_id.as_deref(), missing_user_id)?;
    let category_id = required(query.category_id.as_deref(), missing_category_id)?;
    let blog_id = required(Some(blog_id.as_str()), missing_blog_id)?;

    debug!("Getting blog {} for user {}", blog_id, user_id);

    let found = parents_exist(Preconditions::new(&state.repository), user_id, category_id)
        .exists(EntityKey::BlogIn { user_id, category_id }, blog_not_found())
        .fetch(EntityKey::Id(EntityKind::Blog, blog_id), blog_not_found())
        .await?;

    match found {
        Entity::Blog(blog) => Ok(Json(Envelope::with_data("blog", blog))),
        _ => Err(blog_not_found()),
    }
}

/// PATCH /api/blogs/{blog}?userId=...
pub async fn update_blog(
    State(state): State<SharedState>,
    Path(blog_id): Path<String>,
    Query(query): Query<UserScopeQuery>,
    payload: Result<Json<BlogRequest>, JsonRejection>,
) -> ApiResult<Json<Envelope<Blog>>> {
    let user_id = required(query.user_id.as_deref(), missing_user_id)?;
    let blog_id = required(Some(blog_id.as_str()), missing_blog_id)?;

    let Json(payload) = payload.map_err(|rejection| invalid_json(&rejection))?;
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    debug!("Updating blog {} for user {}", blog_id, user_id);

    Preconditions::new(&state.repository)
        .exists(
            EntityKey::Id(EntityKind::User, user_id),
            not_found_error("User not found in the database"),
        )
        .exists(
            EntityKey::Owned {
                kind: OwnedKind::Blog,
                id: blog_id,
                user_id,
            },
            blog_not_found(),
        )
        .verify()
        .await?;

    let blog = state
        .store
        .update_blog(blog_id, BlogChanges::from(payload))
        .await
        .map_err(|e| internal_error("updating blog", e))?;

    info!("Blog updated (id: {})", blog.id);

    Ok(Json(Envelope::with_message("Blog updated", "updatedBlog", blog)))
}

/// DELETE /api/blogs/{blog}?userId=...
pub async fn delete_blog(
    State(state): State<SharedState>,
    Path(blog_id): Path<String>,
    Query(query): Query<UserScopeQuery>,
) -> ApiResult<Json<Envelope<()>>> {
    let user_id = required(query.user_id.as_deref(), missing_user_id)?;
    let blog_id = required(Some(blog_id.as_str()), missing_blog_id)?;

    debug!("Deleting blog {} for user {}", blog_id, user_id);

    Preconditions::new(&state.repository)
        .exists(
            EntityKey::Id(EntityKind::User, user_id),
            not_found_error("User not found in the database"),
        )
        .exists(
            EntityKey::Owned {
                kind: OwnedKind::Blog,
                id: blog_id,
                user_id,
            },
            blog_not_found(),
        )
        .verify()
        .await?;

    let blog = state
        .store
        .delete_blog(blog_id)
        .await
        .map_err(|e| internal_error("deleting blog", e))?;

    info!("Blog deleted (id: {})", blog.id);

    Ok(Json(Envelope::message_only("Blog deleted")))
}
