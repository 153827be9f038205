//! Blog models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Blog post, owned by a user and filed under one of that user's categories
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub user_id: String,
    pub category_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a blog insert. The id is generated by the caller.
#[derive(Debug, Clone)]
pub struct NewBlog {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

impl Blog {
    pub fn apply(&mut self, changes: BlogChanges) {
        if let Some(title) = changes.title {
            self.title = Some(title);
        }
        if let Some(description) = changes.description {
            self.description = Some(description);
        }
        if let Some(content) = changes.content {
            self.content = Some(content);
        }
        self.updated_at = Utc::now();
    }
}

/// Request body for POST /api/blogs and PATCH /api/blogs/{blog}
#[derive(Debug, Default, Deserialize, Validate)]
pub struct BlogRequest {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub content: Option<String>,
}

impl From<BlogRequest> for BlogChanges {
    fn from(req: BlogRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            content: req.content,
        }
    }
}

/// Query carrying both the acting user and the category
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogScopeQuery {
    pub user_id: Option<String>,
    pub category_id: Option<String>,
}
