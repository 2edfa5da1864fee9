//! User account.

use super::{PasswordDigest, Role};
use crate::domain::shared::{DomainError, UserId};

/// Registration command for a new account.
#[derive(Debug, Clone)]
pub struct UserRegistration {
    /// Login email.
    pub email: String,
    /// Plain-text password; hashed on registration.
    pub password: String,
    /// First name. Defaults to the local part of the email.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Role granted to the account.
    pub role: Role,
}

/// Administrative edit of an account; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New role.
    pub role: Option<Role>,
}

/// A user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    first_name: String,
    last_name: String,
    email: String,
    password: PasswordDigest,
    role: Role,
}

impl User {
    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` for a malformed email or a blank
    /// password.
    pub fn register(id: UserId, registration: UserRegistration) -> Result<Self, DomainError> {
        let email = validate_email(&registration.email)?;
        if registration.password.trim().is_empty() {
            return Err(DomainError::invalid("password", "password is required"));
        }
        let first_name = registration
            .first_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());
        let last_name = registration
            .last_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "Usuario".to_string());

        Ok(Self {
            id,
            first_name,
            last_name,
            email,
            password: PasswordDigest::hash(&registration.password),
            role: registration.role,
        })
    }

    /// Rebuild from storage without validation.
    #[must_use]
    pub const fn reconstitute(
        id: UserId,
        first_name: String,
        last_name: String,
        email: String,
        password: PasswordDigest,
        role: Role,
    ) -> Self {
        Self {
            id,
            first_name,
            last_name,
            email,
            password,
            role,
        }
    }

    /// Apply an administrative edit. The user is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidValue` for a malformed email or a blank
    /// name.
    pub fn apply(&mut self, patch: UserPatch) -> Result<(), DomainError> {
        let email = patch.email.as_deref().map(validate_email).transpose()?;
        let first_name = patch.first_name.map(|n| non_blank("first_name", n)).transpose()?;
        let last_name = patch.last_name.map(|n| non_blank("last_name", n)).transpose()?;

        if let Some(email) = email {
            self.email = email;
        }
        if let Some(first_name) = first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            self.last_name = last_name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        Ok(())
    }

    /// User identifier.
    #[must_use]
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// First name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Last name.
    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Login email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Stored password digest.
    #[must_use]
    pub const fn password(&self) -> &PasswordDigest {
        &self.password
    }

    /// Granted role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }
}

fn validate_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_string()),
        _ => Err(DomainError::invalid("email", "a valid email is required")),
    }
}

fn non_blank(field: &str, value: String) -> Result<String, DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::invalid(field, "is required"));
    }
    Ok(value)
}
