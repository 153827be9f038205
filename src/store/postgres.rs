//! PostgreSQL store
//!
//! Handles connection pooling and translates driver errors into [`StoreError`].

use super::queries::{self, SqlBuilder, BLOG_COLUMNS, CATEGORY_COLUMNS, USER_COLUMNS};
use super::{Store, StoreError, StoreResult};
use crate::config::DatabaseConfig;
use crate::error::AppError;
use crate::models::{
    Blog, BlogChanges, Category, CategoryChanges, NewBlog, NewCategory, NewUser, User,
    UserChanges,
};
use async_trait::async_trait;
use deadpool_postgres::{Config, ManagerConfig, Object, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Store backed by a deadpool-managed Postgres pool
pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    /// Build the pool and verify that a connection can be established
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = Self::create_pool(config)?;

        let client = pool
            .get()
            .await
            .map_err(|e| AppError::Config(format!("Failed to get pool connection: {}", e)))?;
        client
            .query_one("SELECT 1 as ok", &[])
            .await
            .map_err(|e| AppError::Config(format!("Failed to verify database connection: {}", e)))?;
        drop(client);

        info!(
            "Database connection successful ({}:{}/{}, TLS: {})",
            config.host, config.port, config.database, config.use_tls
        );
        Ok(Self { pool })
    }

    fn create_pool(config: &DatabaseConfig) -> Result<Pool, AppError> {
        let mut cfg = Config::new();
        cfg.host = Some(config.host.clone());
        cfg.port = Some(config.port);
        cfg.user = Some(config.user.clone());
        cfg.password = Some(config.password.clone());
        cfg.dbname = Some(config.database.clone());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig::new(config.max_pool_size));

        if config.use_tls {
            let certs = rustls_native_certs::load_native_certs();
            let mut root_store = rustls::RootCertStore::empty();
            for cert in certs.certs {
                root_store.add(cert).ok();
            }

            let tls_config = rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth();

            let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);
            cfg.create_pool(Some(Runtime::Tokio1), tls)
                .map_err(|e| AppError::Config(format!("Failed to create TLS pool: {}", e)))
        } else {
            cfg.create_pool(Some(Runtime::Tokio1), NoTls)
                .map_err(|e| AppError::Config(format!("Failed to create pool: {}", e)))
        }
    }

    /// Create the users, categories and blogs tables if they don't exist
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        let client = self.client().await?;
        for statement in queries::CREATE_TABLES {
            client.execute(statement, &[]).await.map_err(map_db_error)?;
        }
        info!("Database tables initialized");
        Ok(())
    }

    async fn client(&self) -> StoreResult<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::unavailable(format!("Database pool error: {}", e)))
    }

    async fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> StoreResult<Option<Row>> {
        let client = self.client().await?;
        client.query_opt(sql, params).await.map_err(map_db_error)
    }

    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>> {
        let client = self.client().await?;
        client.query(sql, params).await.map_err(map_db_error)
    }

    /// Run a write that returns the affected row; no row means the target was absent
    async fn write_one(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
        target: impl FnOnce() -> String,
    ) -> StoreResult<Row> {
        self.query_opt(sql, params)
            .await?
            .ok_or_else(|| StoreError::missing(target()))
    }
}

/// Map driver errors to store errors; unique violations become conflicts
fn map_db_error(e: tokio_postgres::Error) -> StoreError {
    debug!("database operation failed: {:?}", e);
    match e.code() {
        Some(code) if *code == SqlState::UNIQUE_VIOLATION => StoreError::conflict(
            e.as_db_error()
                .and_then(|db| db.constraint())
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string()),
        ),
        _ if e.is_closed() => StoreError::unavailable(e.to_string()),
        _ => StoreError::query(e.to_string()),
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        name: row.get("name"),
        password: row.get("password"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn category_from_row(row: &Row) -> Category {
    Category {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn blog_from_row(row: &Row) -> Blog {
    Blog {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        content: row.get("content"),
        user_id: row.get("user_id"),
        category_id: row.get("category_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = self.query(queries::LIST_USERS, &[]).await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let sql = SqlBuilder::select_one("users", USER_COLUMNS, &["id"]);
        Ok(self.query_opt(&sql, &[&id]).await?.as_ref().map(user_from_row))
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = SqlBuilder::select_one("users", USER_COLUMNS, &["email"]);
        Ok(self.query_opt(&sql, &[&email]).await?.as_ref().map(user_from_row))
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let sql = SqlBuilder::select_one("users", USER_COLUMNS, &["username"]);
        Ok(self.query_opt(&sql, &[&username]).await?.as_ref().map(user_from_row))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let id = Uuid::new_v4().to_string();
        let row = self
            .write_one(
                queries::INSERT_USER,
                &[&id, &user.email, &user.username, &user.name, &user.password],
                || "users insert returned no row".to_string(),
            )
            .await?;
        Ok(user_from_row(&row))
    }

    async fn update_user(&self, id: &str, changes: UserChanges) -> StoreResult<User> {
        let row = self
            .write_one(
                queries::UPDATE_USER,
                &[&id, &changes.email, &changes.username, &changes.name, &changes.password],
                || format!("user {}", id),
            )
            .await?;
        Ok(user_from_row(&row))
    }

    async fn delete_user(&self, id: &str) -> StoreResult<User> {
        let row = self
            .write_one(queries::DELETE_USER, &[&id], || format!("user {}", id))
            .await?;
        Ok(user_from_row(&row))
    }

    async fn category_by_id(&self, id: &str) -> StoreResult<Option<Category>> {
        let sql = SqlBuilder::select_one("categories", CATEGORY_COLUMNS, &["id"]);
        Ok(self.query_opt(&sql, &[&id]).await?.as_ref().map(category_from_row))
    }

    async fn category_owned_by(&self, id: &str, user_id: &str) -> StoreResult<Option<Category>> {
        let sql = SqlBuilder::select_one("categories", CATEGORY_COLUMNS, &["id", "user_id"]);
        Ok(self
            .query_opt(&sql, &[&id, &user_id])
            .await?
            .as_ref()
            .map(category_from_row))
    }

    async fn categories_for_user(&self, user_id: &str) -> StoreResult<Vec<Category>> {
        let rows = self.query(queries::LIST_CATEGORIES_FOR_USER, &[&user_id]).await?;
        Ok(rows.iter().map(category_from_row).collect())
    }

    async fn create_category(&self, category: NewCategory) -> StoreResult<Category> {
        let id = Uuid::new_v4().to_string();
        let row = self
            .write_one(
                queries::INSERT_CATEGORY,
                &[&id, &category.title, &category.description, &category.user_id],
                || "categories insert returned no row".to_string(),
            )
            .await?;
        Ok(category_from_row(&row))
    }

    async fn update_category(&self, id: &str, changes: CategoryChanges) -> StoreResult<Category> {
        let row = self
            .write_one(
                queries::UPDATE_CATEGORY,
                &[&id, &changes.title, &changes.description],
                || format!("category {}", id),
            )
            .await?;
        Ok(category_from_row(&row))
    }

    async fn blog_by_id(&self, id: &str) -> StoreResult<Option<Blog>> {
        let sql = SqlBuilder::select_one("blogs", BLOG_COLUMNS, &["id"]);
        Ok(self.query_opt(&sql, &[&id]).await?.as_ref().map(blog_from_row))
    }

    async fn blog_owned_by(&self, id: &str, user_id: &str) -> StoreResult<Option<Blog>> {
        let sql = SqlBuilder::select_one("blogs", BLOG_COLUMNS, &["id", "user_id"]);
        Ok(self
            .query_opt(&sql, &[&id, &user_id])
            .await?
            .as_ref()
            .map(blog_from_row))
    }

    async fn first_blog_in(&self, user_id: &str, category_id: &str) -> StoreResult<Option<Blog>> {
        let sql = SqlBuilder::select_one("blogs", BLOG_COLUMNS, &["user_id", "category_id"]);
        Ok(self
            .query_opt(&sql, &[&user_id, &category_id])
            .await?
            .as_ref()
            .map(blog_from_row))
    }

    async fn blogs_in(&self, user_id: &str, category_id: &str) -> StoreResult<Vec<Blog>> {
        let rows = self
            .query(queries::LIST_BLOGS_IN, &[&user_id, &category_id])
            .await?;
        Ok(rows.iter().map(blog_from_row).collect())
    }

    async fn create_blog(&self, blog: NewBlog) -> StoreResult<Blog> {
        let row = self
            .write_one(
                queries::INSERT_BLOG,
                &[
                    &blog.id,
                    &blog.title,
                    &blog.description,
                    &blog.content,
                    &blog.user_id,
                    &blog.category_id,
                ],
                || "blogs insert returned no row".to_string(),
            )
            .await?;
        Ok(blog_from_row(&row))
    }

    async fn update_blog(&self, id: &str, changes: BlogChanges) -> StoreResult<Blog> {
        let row = self
            .write_one(
                queries::UPDATE_BLOG,
                &[&id, &changes.title, &changes.description, &changes.content],
                || format!("blog {}", id),
            )
            .await?;
        Ok(blog_from_row(&row))
    }

    async fn delete_blog(&self, id: &str) -> StoreResult<Blog> {
        let row = self
            .write_one(queries::DELETE_BLOG, &[&id], || format!("blog {}", id))
            .await?;
        Ok(blog_from_row(&row))
    }
}
