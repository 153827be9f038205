//! Precondition chain
//!
//! Every mutating route runs its checks in a fixed order before touching the
//! store: required fields, referenced entities, uniqueness, then ownership of
//! the targeted record. The first failing check decides the response and no
//! later check is evaluated.

use crate::error::{internal_error, ApiResult, AppError};
use crate::models::non_empty;
use crate::repository::{Entity, EntityKey, FailurePolicy, Lookup, Repository};
use tracing::debug;

/// Return the value of a required field, or `failure` when it is absent or empty
pub fn required<'a>(value: Option<&'a str>, failure: impl FnOnce() -> AppError) -> ApiResult<&'a str> {
    non_empty(value).ok_or_else(failure)
}

#[derive(Debug)]
enum Check<'a> {
    /// Passes when the key resolves
    Exists(EntityKey<'a>),
    /// Passes when the key does not resolve
    Vacant(EntityKey<'a>),
}

#[derive(Debug)]
struct Step<'a> {
    check: Check<'a>,
    failure: AppError,
}

/// Ordered list of precondition checks against the repository
pub struct Preconditions<'r, 'a> {
    repo: &'r Repository,
    steps: Vec<Step<'a>>,
    policy: FailurePolicy,
}

impl<'r, 'a> Preconditions<'r, 'a> {
    /// Start an empty chain using the repository's failure policy
    pub fn new(repo: &'r Repository) -> Self {
        Self {
            repo,
            steps: Vec::new(),
            policy: repo.failure_policy(),
        }
    }

    /// Require `key` to resolve to a record
    pub fn exists(mut self, key: EntityKey<'a>, failure: AppError) -> Self {
        self.steps.push(Step {
            check: Check::Exists(key),
            failure,
        });
        self
    }

    /// Require `key` not to resolve to a record
    pub fn vacant(mut self, key: EntityKey<'a>, failure: AppError) -> Self {
        self.steps.push(Step {
            check: Check::Vacant(key),
            failure,
        });
        self
    }

    /// Like [`Self::vacant`], skipped entirely when `value` is absent or empty
    pub fn vacant_if_present(
        self,
        value: Option<&'a str>,
        key: impl FnOnce(&'a str) -> EntityKey<'a>,
        failure: AppError,
    ) -> Self {
        match non_empty(value) {
            Some(value) => self.vacant(key(value), failure),
            None => self,
        }
    }

    /// Run the checks in order, stopping at the first that fails
    pub async fn verify(mut self) -> ApiResult<()> {
        self.run_steps().await
    }

    /// Run the checks, then load the record behind `key`, failing with
    /// `failure` when it does not resolve
    pub async fn fetch(mut self, key: EntityKey<'_>, failure: AppError) -> ApiResult<Entity> {
        self.run_steps().await?;
        self.resolve(key).await?.ok_or(failure)
    }

    async fn run_steps(&mut self) -> ApiResult<()> {
        for step in std::mem::take(&mut self.steps) {
            let (key, want_found) = match step.check {
                Check::Exists(key) => (key, true),
                Check::Vacant(key) => (key, false),
            };

            if self.resolve(key).await?.is_some() != want_found {
                return Err(step.failure);
            }
        }
        Ok(())
    }

    /// Look up `key`, applying the failure policy to an errored lookup
    async fn resolve(&self, key: EntityKey<'_>) -> ApiResult<Option<Entity>> {
        let entity = match self.policy {
            FailurePolicy::TreatAsMissing => self.repo.find_or_none(key).await,
            FailurePolicy::Escalate => match self.repo.find(key).await {
                Lookup::Found(entity) => Some(entity),
                Lookup::Missing => None,
                Lookup::Failed(err) => {
                    return Err(internal_error(&format!("looking up {}", key.kind()), err));
                }
            },
        };

        if let Some(entity) = &entity {
            debug!("Precondition lookup resolved {} {}", key.kind(), entity.id());
        }
        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{conflict_error, not_found_error, validation_error};
    use crate::models::NewUser;
    use crate::repository::{EntityKind, UniqueField};
    use crate::store::{InMemoryStore, Store};
    use std::sync::Arc;

    async fn repo_with_user() -> (Arc<InMemoryStore>, Repository, String) {
        let store = Arc::new(InMemoryStore::new());
        let user = store
            .create_user(NewUser {
                email: Some("ada@example.com".to_string()),
                username: Some("ada".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        (store.clone(), Repository::new(store), user.id)
    }

    #[test]
    fn test_required_rejects_missing_and_empty() {
        let missing = || validation_error("Invalid or missing userId");
        assert!(matches!(required(None, missing), Err(AppError::Validation(_))));
        assert!(matches!(required(Some(""), missing), Err(AppError::Validation(_))));
        assert_eq!(required(Some("u1"), missing).unwrap(), "u1");
    }

    #[tokio::test]
    async fn test_all_checks_pass() {
        let (_, repo, user_id) = repo_with_user().await;

        let result = Preconditions::new(&repo)
            .exists(EntityKey::Id(EntityKind::User, &user_id), not_found_error("User not found"))
            .vacant(
                EntityKey::Unique(UniqueField::Email, "grace@example.com"),
                conflict_error("Email already exists"),
            )
            .verify()
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_first_failure_short_circuits() {
        let (store, repo, user_id) = repo_with_user().await;
        let reads_before = store.read_count();

        let result = Preconditions::new(&repo)
            .exists(EntityKey::Id(EntityKind::User, "nobody"), not_found_error("User not found"))
            .exists(EntityKey::Id(EntityKind::User, &user_id), not_found_error("unreachable"))
            .verify()
            .await;

        match result {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "User not found"),
            other => panic!("expected not found, got {:?}", other),
        }
        assert_eq!(store.read_count() - reads_before, 1);
    }

    #[tokio::test]
    async fn test_vacant_if_present_skips_absent_values() {
        let (store, repo, _) = repo_with_user().await;
        let reads_before = store.read_count();

        let result = Preconditions::new(&repo)
            .vacant_if_present(
                None,
                |v| EntityKey::Unique(UniqueField::Email, v),
                conflict_error("Email already exists"),
            )
            .vacant_if_present(
                Some(""),
                |v| EntityKey::Unique(UniqueField::Username, v),
                conflict_error("Username already exists"),
            )
            .verify()
            .await;

        assert!(result.is_ok());
        assert_eq!(store.read_count(), reads_before);
    }

    #[tokio::test]
    async fn test_vacant_fails_on_existing_value() {
        let (_, repo, _) = repo_with_user().await;

        let result = Preconditions::new(&repo)
            .vacant_if_present(
                Some("ada"),
                |v| EntityKey::Unique(UniqueField::Username, v),
                conflict_error("Username already exists"),
            )
            .verify()
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_failed_lookup_reads_as_missing_by_default() {
        let (store, repo, user_id) = repo_with_user().await;
        store.set_offline(true);

        let result = Preconditions::new(&repo)
            .exists(EntityKey::Id(EntityKind::User, &user_id), not_found_error("User not found"))
            .verify()
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));

        // A uniqueness check against an unreachable store passes
        let result = Preconditions::new(&repo)
            .vacant(
                EntityKey::Unique(UniqueField::Email, "ada@example.com"),
                conflict_error("Email already exists"),
            )
            .verify()
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_loads_record_after_checks() {
        let (_, repo, user_id) = repo_with_user().await;

        let entity = Preconditions::new(&repo)
            .vacant(
                EntityKey::Unique(UniqueField::Email, "grace@example.com"),
                conflict_error("Email already exists"),
            )
            .fetch(EntityKey::Id(EntityKind::User, &user_id), not_found_error("User not found"))
            .await
            .unwrap();
        assert_eq!(entity.id(), user_id);

        let missing = Preconditions::new(&repo)
            .fetch(EntityKey::Id(EntityKind::User, "nobody"), not_found_error("User not found"))
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_escalated_failure_is_internal() {
        let (store, repo, user_id) = repo_with_user().await;
        let repo = repo.with_failure_policy(FailurePolicy::Escalate);
        store.set_offline(true);

        let result = Preconditions::new(&repo)
            .exists(EntityKey::Id(EntityKind::User, &user_id), not_found_error("User not found"))
            .verify()
            .await;

        match result {
            Err(AppError::Internal(msg)) => assert!(msg.starts_with("Error in looking up user:")),
            other => panic!("expected internal error, got {:?}", other),
        }
    }
}
