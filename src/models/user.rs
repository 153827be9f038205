//! User models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// User represents a registered account. Every profile field is optional.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    #[serde(skip_serializing)] // Never send the password back to the client
    pub password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a user insert
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Column updates for a user. `None` leaves the stored value as it is.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

impl User {
    pub fn apply(&mut self, changes: UserChanges) {
        if let Some(email) = changes.email {
            self.email = Some(email);
        }
        if let Some(username) = changes.username {
            self.username = Some(username);
        }
        if let Some(name) = changes.name {
            self.name = Some(name);
        }
        if let Some(password) = changes.password {
            self.password = Some(password);
        }
        self.updated_at = Utc::now();
    }
}

/// Request body for POST /api/users
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: Option<String>,
    #[validate(length(max = 255, message = "Username must be at most 255 characters"))]
    pub username: Option<String>,
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 1024, message = "Password must be at most 1024 characters"))]
    pub password: Option<String>,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            email: req.email,
            username: req.username,
            name: req.name,
            password: req.password,
        }
    }
}

/// Request body for PATCH /api/users
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    pub id: Option<String>,
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: Option<String>,
    #[validate(length(max = 255, message = "Username must be at most 255 characters"))]
    pub username: Option<String>,
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 1024, message = "Password must be at most 1024 characters"))]
    pub password: Option<String>,
}

/// Query for DELETE /api/users
#[derive(Debug, Default, Deserialize)]
pub struct DeleteUserQuery {
    pub id: Option<String>,
}
