//! Storage boundary
//!
//! Every handler talks to persistence through the [`Store`] trait. Adapters
//! translate their provider-specific failures into [`StoreError`] so that the
//! rest of the crate never inspects driver error codes.

pub mod memory;
pub mod postgres;
pub mod queries;

use crate::models::{
    Blog, BlogChanges, Category, CategoryChanges, NewBlog, NewCategory, NewUser, User,
    UserChanges,
};
use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Storage failures, independent of the backing provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("unique constraint violated: {message}")]
    Conflict { message: String },

    /// The record targeted by an update or delete does not exist
    #[error("record not found: {message}")]
    Missing { message: String },

    /// No connection could be obtained
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    #[error("query failed: {message}")]
    Query { message: String },
}

impl StoreError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict { message: message.into() }
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self::Missing { message: message.into() }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable { message: message.into() }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query { message: message.into() }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations for users, categories and blogs.
///
/// Lookups return `Ok(None)` for absent rows; `Err` is reserved for failures.
#[async_trait]
pub trait Store: Send + Sync {
    // Users
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn user_by_id(&self, id: &str) -> StoreResult<Option<User>>;
    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn update_user(&self, id: &str, changes: UserChanges) -> StoreResult<User>;
    /// Deletes the user together with their categories and blogs
    async fn delete_user(&self, id: &str) -> StoreResult<User>;

    // Categories
    async fn category_by_id(&self, id: &str) -> StoreResult<Option<Category>>;
    async fn category_owned_by(&self, id: &str, user_id: &str) -> StoreResult<Option<Category>>;
    async fn categories_for_user(&self, user_id: &str) -> StoreResult<Vec<Category>>;
    async fn create_category(&self, category: NewCategory) -> StoreResult<Category>;
    async fn update_category(&self, id: &str, changes: CategoryChanges) -> StoreResult<Category>;

    // Blogs
    async fn blog_by_id(&self, id: &str) -> StoreResult<Option<Blog>>;
    async fn blog_owned_by(&self, id: &str, user_id: &str) -> StoreResult<Option<Blog>>;
    /// First blog filed by `user_id` under `category_id`, if any
    async fn first_blog_in(&self, user_id: &str, category_id: &str) -> StoreResult<Option<Blog>>;
    async fn blogs_in(&self, user_id: &str, category_id: &str) -> StoreResult<Vec<Blog>>;
    async fn create_blog(&self, blog: NewBlog) -> StoreResult<Blog>;
    async fn update_blog(&self, id: &str, changes: BlogChanges) -> StoreResult<Blog>;
    async fn delete_blog(&self, id: &str) -> StoreResult<Blog>;
}
