use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::validation::{ValidationErrors, Validator, string_at};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public identity attached to diagrams and auth responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Emails are compared case-insensitively, so they are stored lowercase.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl RegisterRequest {
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        Validator::new(body)
            .required_string("name", 255)
            .required_string("email", 255)
            .email("email")
            .required_string("password", 255)
            .min_length("password", 8)
            .confirmed("password")
            .finish()?;

        Ok(Self {
            name: string_at(body, "name").unwrap_or_default().trim().to_string(),
            email: normalize_email(&string_at(body, "email").unwrap_or_default()),
            password: string_at(body, "password").unwrap_or_default(),
            password_confirmation: string_at(body, "password_confirmation").unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        Validator::new(body)
            .required_string("email", 255)
            .email("email")
            .required_string("password", 255)
            .finish()?;

        Ok(Self {
            email: normalize_email(&string_at(body, "email").unwrap_or_default()),
            password: string_at(body, "password").unwrap_or_default(),
        })
    }
}

/// Returned by register, login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthPayload {
    pub user: UserSummary,
    pub token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_at: i64,
}
