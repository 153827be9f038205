//! Category models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Category groups a user's blogs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a category insert
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub user_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Category {
    pub fn apply(&mut self, changes: CategoryChanges) {
        if let Some(title) = changes.title {
            self.title = Some(title);
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        self.updated_at = Utc::now();
    }
}

/// Request body for POST /api/categories and PATCH /api/categories/{category}
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

impl From<CategoryRequest> for CategoryChanges {
    fn from(req: CategoryRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
        }
    }
}

/// Query carrying the acting user
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScopeQuery {
    pub user_id: Option<String>,
}
