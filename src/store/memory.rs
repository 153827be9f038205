//! In-memory store
//!
//! Backs the router in tests and runs the server when no database is configured.
//! Enforces the same unique constraints and cascades as the Postgres schema.
//! Test builds add call counters and failure injection.

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Blog, BlogChanges, Category, CategoryChanges, NewBlog, NewCategory, NewUser, User,
    UserChanges,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
#[cfg(test)]
use std::sync::Mutex;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    categories: Vec<Category>,
    blogs: Vec<Blog>,
}

/// Thread-safe store keeping every table in insertion order
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    #[cfg(test)]
    faults: Faults,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin_read(&self) -> StoreResult<()> {
        #[cfg(test)]
        self.faults.on_read()?;
        Ok(())
    }

    fn begin_write(&self) -> StoreResult<()> {
        #[cfg(test)]
        self.faults.on_write()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn set_offline(&self, offline: bool) {
        self.faults.offline.store(offline, Ordering::SeqCst);
    }

    /// Lookups issued so far, failed ones included
    #[cfg(test)]
    pub fn read_count(&self) -> usize {
        self.faults.reads.load(Ordering::SeqCst)
    }

    /// Writes attempted so far, failed ones included
    #[cfg(test)]
    pub fn write_count(&self) -> usize {
        self.faults.writes.load(Ordering::SeqCst)
    }

    /// Let `reads` more lookups succeed, then fail every later one
    #[cfg(test)]
    pub fn fail_reads_after(&self, reads: usize) {
        if let Ok(mut budget) = self.faults.read_budget.lock() {
            *budget = Some(reads);
        }
    }

    #[cfg(test)]
    pub fn fail_next_write(&self, err: StoreError) {
        if let Ok(mut slot) = self.faults.next_write_failure.lock() {
            *slot = Some(err);
        }
    }
}

/// Call counters and failure injection for tests
#[cfg(test)]
#[derive(Default)]
struct Faults {
    /// When set, every call fails as if the database were down
    offline: AtomicBool,
    /// Failure returned by the next write, then cleared
    next_write_failure: Mutex<Option<StoreError>>,
    /// Lookups left before reads start failing
    read_budget: Mutex<Option<usize>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

#[cfg(test)]
impl Faults {
    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("in-memory store is offline"));
        }
        Ok(())
    }

    fn on_read(&self) -> StoreResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        let mut budget = self
            .read_budget
            .lock()
            .map_err(|_| StoreError::query("fault injection lock poisoned"))?;
        match budget.as_mut() {
            Some(0) => Err(StoreError::unavailable("read budget exhausted")),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn on_write(&self) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.ensure_online()?;
        let injected = self
            .next_write_failure
            .lock()
            .map_err(|_| StoreError::query("fault injection lock poisoned"))?
            .take();
        match injected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn taken<'a>(
    users: &'a [User],
    skip_id: Option<&str>,
    field: impl Fn(&'a User) -> Option<&'a String>,
    value: Option<&String>,
) -> bool {
    match value {
        Some(value) => users
            .iter()
            .filter(|u| Some(u.id.as_str()) != skip_id)
            .any(|u| field(u) == Some(value)),
        None => false,
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.begin_read()?;
        Ok(self.tables.read().await.users.clone())
    }

    async fn user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;

        if taken(&tables.users, None, |u| u.email.as_ref(), user.email.as_ref()) {
            return Err(StoreError::conflict("users.email"));
        }
        if taken(&tables.users, None, |u| u.username.as_ref(), user.username.as_ref()) {
            return Err(StoreError::conflict("users.username"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: user.email,
            username: user.username,
            name: user.name,
            password: user.password,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: &str, changes: UserChanges) -> StoreResult<User> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;

        if taken(&tables.users, Some(id), |u| u.email.as_ref(), changes.email.as_ref()) {
            return Err(StoreError::conflict("users.email"));
        }
        if taken(&tables.users, Some(id), |u| u.username.as_ref(), changes.username.as_ref()) {
            return Err(StoreError::conflict("users.username"));
        }

        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| StoreError::missing(format!("user {}", id)))?;
        user.apply(changes);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> StoreResult<User> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;

        let index = tables
            .users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| StoreError::missing(format!("user {}", id)))?;
        let user = tables.users.remove(index);

        // Blogs go with their author and with any category being removed
        let removed: HashSet<String> = tables
            .categories
            .iter()
            .filter(|c| c.user_id == id)
            .map(|c| c.id.clone())
            .collect();
        tables.categories.retain(|c| c.user_id != id);
        tables
            .blogs
            .retain(|b| b.user_id != id && !removed.contains(&b.category_id));
        Ok(user)
    }

    async fn category_by_id(&self, id: &str) -> StoreResult<Option<Category>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn category_owned_by(&self, id: &str, user_id: &str) -> StoreResult<Option<Category>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn categories_for_user(&self, user_id: &str) -> StoreResult<Vec<Category>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables
            .categories
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_category(&self, category: NewCategory) -> StoreResult<Category> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;

        if !tables.users.iter().any(|u| u.id == category.user_id) {
            return Err(StoreError::query("categories.user_id references a missing user"));
        }

        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            title: category.title,
            description: category.description,
            user_id: category.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: &str, changes: CategoryChanges) -> StoreResult<Category> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;

        let category = tables
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::missing(format!("category {}", id)))?;
        category.apply(changes);
        Ok(category.clone())
    }

    async fn blog_by_id(&self, id: &str) -> StoreResult<Option<Blog>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables.blogs.iter().find(|b| b.id == id).cloned())
    }

    async fn blog_owned_by(&self, id: &str, user_id: &str) -> StoreResult<Option<Blog>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables
            .blogs
            .iter()
            .find(|b| b.id == id && b.user_id == user_id)
            .cloned())
    }

    async fn first_blog_in(&self, user_id: &str, category_id: &str) -> StoreResult<Option<Blog>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables
            .blogs
            .iter()
            .find(|b| b.user_id == user_id && b.category_id == category_id)
            .cloned())
    }

    async fn blogs_in(&self, user_id: &str, category_id: &str) -> StoreResult<Vec<Blog>> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        Ok(tables
            .blogs
            .iter()
            .filter(|b| b.user_id == user_id && b.category_id == category_id)
            .cloned()
            .collect())
    }

    async fn create_blog(&self, blog: NewBlog) -> StoreResult<Blog> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;

        if tables.blogs.iter().any(|b| b.id == blog.id) {
            return Err(StoreError::conflict("blogs.id"));
        }
        if !tables.users.iter().any(|u| u.id == blog.user_id) {
            return Err(StoreError::query("blogs.user_id references a missing user"));
        }
        if !tables.categories.iter().any(|c| c.id == blog.category_id) {
            return Err(StoreError::query("blogs.category_id references a missing category"));
        }

        let now = Utc::now();
        let blog = Blog {
            id: blog.id,
            title: blog.title,
            description: blog.description,
            content: blog.content,
            user_id: blog.user_id,
            category_id: blog.category_id,
            created_at: now,
            updated_at: now,
        };
        tables.blogs.push(blog.clone());
        Ok(blog)
    }

    async fn update_blog(&self, id: &str, changes: BlogChanges) -> StoreResult<Blog> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;

        let blog = tables
            .blogs
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::missing(format!("blog {}", id)))?;
        blog.apply(changes);
        Ok(blog.clone())
    }

    async fn delete_blog(&self, id: &str) -> StoreResult<Blog> {
        self.begin_write()?;
        let mut tables = self.tables.write().await;

        let index = tables
            .blogs
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| StoreError::missing(format!("blog {}", id)))?;
        Ok(tables.blogs.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: Some(email.to_string()),
            username: Some(username.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unique_email_and_username() {
        let store = InMemoryStore::new();
        store.create_user(new_user("a@x.io", "alice")).await.unwrap();

        let err = store.create_user(new_user("a@x.io", "other")).await.unwrap_err();
        assert!(err.is_conflict());
        let err = store.create_user(new_user("b@x.io", "alice")).await.unwrap_err();
        assert!(err.is_conflict());

        // Users without email or username never collide
        store.create_user(NewUser::default()).await.unwrap();
        store.create_user(NewUser::default()).await.unwrap();
        assert_eq!(store.list_users().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_user_keeps_absent_fields() {
        let store = InMemoryStore::new();
        let user = store.create_user(new_user("a@x.io", "alice")).await.unwrap();

        let updated = store
            .update_user(
                &user.id,
                UserChanges {
                    username: Some("alice2".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email.as_deref(), Some("a@x.io"));
        assert_eq!(updated.username.as_deref(), Some("alice2"));
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = InMemoryStore::new();
        let user = store.create_user(new_user("a@x.io", "alice")).await.unwrap();
        let category = store
            .create_category(NewCategory {
                user_id: user.id.clone(),
                title: Some("Tech".to_string()),
                description: None,
            })
            .await
            .unwrap();
        store
            .create_blog(NewBlog {
                id: "blog_aaaaaaaaaaaa".to_string(),
                user_id: user.id.clone(),
                category_id: category.id.clone(),
                title: None,
                description: None,
                content: None,
            })
            .await
            .unwrap();

        // Another user's blog filed under the doomed category
        let other = store.create_user(new_user("b@x.io", "bob")).await.unwrap();
        store
            .create_blog(NewBlog {
                id: "blog_bbbbbbbbbbbb".to_string(),
                user_id: other.id.clone(),
                category_id: category.id.clone(),
                title: None,
                description: None,
                content: None,
            })
            .await
            .unwrap();

        store.delete_user(&user.id).await.unwrap();

        assert!(store.category_by_id(&category.id).await.unwrap().is_none());
        assert!(store.blog_by_id("blog_aaaaaaaaaaaa").await.unwrap().is_none());
        assert!(store.blog_by_id("blog_bbbbbbbbbbbb").await.unwrap().is_none());
        assert!(store.user_by_id(&other.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_offline_store_fails_every_call() {
        let store = InMemoryStore::new();
        store.set_offline(true);
        let err = store.user_by_id("u1").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_injected_write_failure_is_consumed_once() {
        let store = InMemoryStore::new();
        store.fail_next_write(StoreError::conflict("blogs.id"));

        assert!(store.create_user(NewUser::default()).await.unwrap_err().is_conflict());
        assert!(store.create_user(NewUser::default()).await.is_ok());
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.read_count(), 0);
    }
}
