//! User DTOs

use serde::{Deserialize, Serialize};

use crate::domain::identity::User;

/// Login credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginDto {
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResultDto {
    /// User ID; send it back as `X-User-Id`.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Role name.
    pub role: String,
    /// Human-readable outcome.
    pub message: String,
}

/// Self-registration request. New accounts always get the Viewer role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    /// Login email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Administrative user edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserDto {
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New role name (`Admin`, `Operator` or `Viewer`).
    pub role: Option<String>,
}

/// DTO representing a user. Never carries the password digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDto {
    /// User ID.
    pub id: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Login email.
    pub email: String,
    /// Role name.
    pub role: String,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
            email: user.email().to_string(),
            role: user.role().to_string(),
        }
    }
}
