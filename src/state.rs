//! Application state management
//!
//! Contains shared state accessible across all handlers. The store is injected
//! here once at startup; handlers never reach for a global connection.

use crate::repository::{FailurePolicy, Repository};
use crate::store::Store;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Backing store, used for the single mutation each handler performs
    pub store: Arc<dyn Store>,

    /// Read-only lookups over the same store, used for precondition checks
    pub repository: Repository,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, lookup_failures: FailurePolicy) -> Self {
        let repository = Repository::new(store.clone()).with_failure_policy(lookup_failures);
        Self { store, repository }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
