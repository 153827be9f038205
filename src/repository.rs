//! Entity repository
//!
//! Single-record lookups used as precondition checks. [`Repository::find`]
//! keeps "missing" and "failed" apart; [`Repository::find_or_none`] collapses a
//! failed lookup into `None`, so its callers cannot tell an outage from absence.

use crate::models::{Blog, Category, User};
use crate::store::{Store, StoreError};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Category,
    Blog,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "user",
            EntityKind::Category => "category",
            EntityKind::Blog => "blog",
        };
        f.write_str(name)
    }
}

/// Unique user columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

/// Entities that belong to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnedKind {
    Category,
    Blog,
}

impl From<OwnedKind> for EntityKind {
    fn from(kind: OwnedKind) -> Self {
        match kind {
            OwnedKind::Category => EntityKind::Category,
            OwnedKind::Blog => EntityKind::Blog,
        }
    }
}

/// What a lookup is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKey<'a> {
    /// Primary key of any entity
    Id(EntityKind, &'a str),
    /// Unique user field
    Unique(UniqueField, &'a str),
    /// Category or blog `id` whose owner is `user_id`
    Owned {
        kind: OwnedKind,
        id: &'a str,
        user_id: &'a str,
    },
    /// Any blog filed by `user_id` under `category_id`
    BlogIn {
        user_id: &'a str,
        category_id: &'a str,
    },
}

impl EntityKey<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityKey::Id(kind, _) => *kind,
            EntityKey::Owned { kind, .. } => (*kind).into(),
            EntityKey::Unique(..) => EntityKind::User,
            EntityKey::BlogIn { .. } => EntityKind::Blog,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    User(User),
    Category(Category),
    Blog(Blog),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::User(user) => &user.id,
            Entity::Category(category) => &category.id,
            Entity::Blog(blog) => &blog.id,
        }
    }
}

/// Outcome of a lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Missing,
    Failed(StoreError),
}

impl<T> Lookup<T> {
    fn from_result(result: Result<Option<T>, StoreError>) -> Self {
        match result {
            Ok(Some(value)) => Lookup::Found(value),
            Ok(None) => Lookup::Missing,
            Err(err) => Lookup::Failed(err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::Missing => Lookup::Missing,
            Lookup::Failed(err) => Lookup::Failed(err),
        }
    }
}

/// What a failed lookup means to a precondition chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// A lookup that errored counts as "not found"
    #[default]
    TreatAsMissing,
    /// A lookup that errored aborts the chain with a 500
    Escalate,
}

/// Read-only accessor over the injected store
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn Store>,
    policy: FailurePolicy,
}

impl Repository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Generic lookup keyed by id, unique field, ownership or blog placement
    pub async fn find(&self, key: EntityKey<'_>) -> Lookup<Entity> {
        let store = &self.store;
        match key {
            EntityKey::Id(EntityKind::User, id) => {
                Lookup::from_result(store.user_by_id(id).await).map(Entity::User)
            }
            EntityKey::Id(EntityKind::Category, id) => {
                Lookup::from_result(store.category_by_id(id).await).map(Entity::Category)
            }
            EntityKey::Id(EntityKind::Blog, id) => {
                Lookup::from_result(store.blog_by_id(id).await).map(Entity::Blog)
            }
            EntityKey::Unique(UniqueField::Email, email) => {
                Lookup::from_result(store.user_by_email(email).await).map(Entity::User)
            }
            EntityKey::Unique(UniqueField::Username, username) => {
                Lookup::from_result(store.user_by_username(username).await).map(Entity::User)
            }
            EntityKey::Owned { kind: OwnedKind::Category, id, user_id } => {
                Lookup::from_result(store.category_owned_by(id, user_id).await)
                    .map(Entity::Category)
            }
            EntityKey::Owned { kind: OwnedKind::Blog, id, user_id } => {
                Lookup::from_result(store.blog_owned_by(id, user_id).await).map(Entity::Blog)
            }
            EntityKey::BlogIn { user_id, category_id } => {
                Lookup::from_result(store.first_blog_in(user_id, category_id).await)
                    .map(Entity::Blog)
            }
        }
    }

    /// Lookup where a failed lookup reads as not found
    pub async fn find_or_none(&self, key: EntityKey<'_>) -> Option<Entity> {
        match self.find(key).await {
            Lookup::Found(entity) => Some(entity),
            Lookup::Missing => None,
            Lookup::Failed(err) => {
                warn!("Lookup of {} failed, treating as not found: {}", key.kind(), err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewCategory, NewUser};
    use crate::store::InMemoryStore;

    async fn seeded() -> (Arc<InMemoryStore>, Repository, User, Category) {
        let store = Arc::new(InMemoryStore::new());
        let user = store
            .create_user(NewUser {
                email: Some("ada@example.com".to_string()),
                username: Some("ada".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let category = store
            .create_category(NewCategory {
                user_id: user.id.clone(),
                title: Some("Tech".to_string()),
                description: None,
            })
            .await
            .unwrap();
        let repo = Repository::new(store.clone());
        (store, repo, user, category)
    }

    #[tokio::test]
    async fn test_find_by_unique_field() {
        let (_, repo, user, _) = seeded().await;

        let found = repo.find(EntityKey::Unique(UniqueField::Email, "ada@example.com")).await;
        assert_eq!(found, Lookup::Found(Entity::User(user)));
        let missing = repo.find(EntityKey::Unique(UniqueField::Username, "grace")).await;
        assert_eq!(missing, Lookup::Missing);
    }

    #[tokio::test]
    async fn test_owned_lookup_requires_matching_owner() {
        let (_, repo, user, category) = seeded().await;

        let owned = EntityKey::Owned {
            kind: OwnedKind::Category,
            id: &category.id,
            user_id: &user.id,
        };
        assert!(matches!(repo.find(owned).await, Lookup::Found(Entity::Category(_))));

        let foreign = EntityKey::Owned {
            kind: OwnedKind::Category,
            id: &category.id,
            user_id: "someone-else",
        };
        assert_eq!(repo.find(foreign).await, Lookup::Missing);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_distinct_but_accessors_swallow_it() {
        let (store, repo, user, category) = seeded().await;
        store.set_offline(true);

        assert!(matches!(
            repo.find(EntityKey::Id(EntityKind::User, &user.id)).await,
            Lookup::Failed(StoreError::Unavailable { .. })
        ));
        assert_eq!(repo.find_or_none(EntityKey::Id(EntityKind::User, &user.id)).await, None);
        assert!(matches!(
            repo.find(EntityKey::Id(EntityKind::Category, &category.id)).await,
            Lookup::Failed(_)
        ));
    }

    #[test]
    fn test_key_kind() {
        assert_eq!(EntityKey::Unique(UniqueField::Username, "x").kind(), EntityKind::User);
        assert_eq!(
            EntityKey::BlogIn { user_id: "u", category_id: "c" }.kind(),
            EntityKind::Blog
        );
        let owned = EntityKey::Owned { kind: OwnedKind::Category, id: "c", user_id: "u" };
        assert_eq!(owned.kind(), EntityKind::Category);
    }
}
