//! User Accounts Use Case
//!
//! Login, self-registration, administrative edits and caller resolution for
//! the `X-User-Id` header.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::dto::{LoginDto, LoginResultDto, RegisterUserDto, UpdateUserDto, UserDto};
use crate::application::ports::{Store, StoreTx};
use crate::domain::identity::{Capability, Role, User, UserPatch, UserRegistration};
use crate::domain::shared::UserId;
use crate::error::ServiceError;

/// Authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    user_id: UserId,
    role: Role,
}

impl Caller {
    /// Create a caller.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Caller's user ID.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Caller's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Fail with `Forbidden` unless the role grants `capability`.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` when the capability is missing.
    pub fn require(&self, capability: Capability) -> Result<(), ServiceError> {
        if self.role.allows(capability) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "Role {} may not perform this operation",
                self.role
            )))
        }
    }
}

fn user_not_found(id: &UserId) -> ServiceError {
    ServiceError::not_found(format!("User not found: {id}"))
}

/// Use case for user accounts.
pub struct UserAccountsUseCase<S>
where
    S: Store,
{
    store: Arc<S>,
}

impl<S> UserAccountsUseCase<S>
where
    S: Store,
{
    /// Create a new `UserAccountsUseCase`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Check credentials.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for an unknown email or a wrong password. The
    /// message does not tell the two apart.
    pub async fn login(&self, credentials: LoginDto) -> Result<LoginResultDto, ServiceError> {
        let mut tx = self.store.read().await?;
        let user = tx
            .user_by_email(credentials.email.trim())
            .await?
            .filter(|user| user.password().verify(&credentials.password));

        let Some(user) = user else {
            warn!(email = %credentials.email, "Rejected login");
            return Err(ServiceError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        };

        info!(user_id = %user.id(), "User logged in");
        Ok(LoginResultDto {
            id: user.id().to_string(),
            email: user.email().to_string(),
            role: user.role().to_string(),
            message: "Login successful".to_string(),
        })
    }

    /// Create an account with the Viewer role.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed email, a blank password or an
    /// email that is already registered.
    pub async fn register(&self, request: RegisterUserDto) -> Result<UserDto, ServiceError> {
        let user = User::register(
            UserId::generate(),
            UserRegistration {
                email: request.email,
                password: request.password,
                first_name: request.first_name,
                last_name: request.last_name,
                role: Role::Viewer,
            },
        )?;

        let mut tx = self.store.begin().await?;
        if tx.user_by_email(user.email()).await?.is_some() {
            return Err(ServiceError::validation(format!(
                "Email already registered: {}",
                user.email()
            )));
        }
        tx.insert_user(&user).await?;
        tx.commit().await?;

        info!(user_id = %user.id(), "User registered");
        Ok(UserDto::from(&user))
    }

    /// All users, ordered by email.
    ///
    /// # Errors
    ///
    /// Returns `Internal` on store failure.
    pub async fn list(&self) -> Result<Vec<UserDto>, ServiceError> {
        let mut tx = self.store.read().await?;
        Ok(tx.users().await?.iter().map(UserDto::from).collect())
    }

    /// One user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown user.
    pub async fn get(&self, id: &UserId) -> Result<UserDto, ServiceError> {
        let mut tx = self.store.read().await?;
        tx.user(id)
            .await?
            .map(|user| UserDto::from(&user))
            .ok_or_else(|| user_not_found(id))
    }

    /// Edit names, email or role.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown user
    /// - `Validation` for an unknown role, a bad email or one taken by
    ///   another account
    pub async fn update(&self, id: &UserId, request: UpdateUserDto) -> Result<UserDto, ServiceError> {
        let role = request
            .role
            .as_deref()
            .map(str::parse::<Role>)
            .transpose()?;

        let mut tx = self.store.begin().await?;
        let mut user = tx.user(id).await?.ok_or_else(|| user_not_found(id))?;
        user.apply(UserPatch {
            first_name: request.first_name,
            last_name: request.last_name,
            email: request.email,
            role,
        })?;

        if let Some(owner) = tx.user_by_email(user.email()).await? {
            if owner.id() != id {
                return Err(ServiceError::validation(format!(
                    "Email already registered: {}",
                    user.email()
                )));
            }
        }
        tx.update_user(&user).await?;
        tx.commit().await?;

        info!(user_id = %id, role = %user.role(), "User updated");
        Ok(UserDto::from(&user))
    }

    /// Delete a user without orders.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown user
    /// - `Validation` when the user has placed orders
    pub async fn delete(&self, id: &UserId) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        if tx.user(id).await?.is_none() {
            return Err(user_not_found(id));
        }
        if tx.user_has_orders(id).await? {
            return Err(ServiceError::validation(
                "User has orders and cannot be deleted",
            ));
        }
        tx.delete_user(id).await?;
        tx.commit().await?;

        info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Resolve the `X-User-Id` header value to a caller.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for a missing, blank or unknown ID.
    pub async fn resolve_caller(&self, header: Option<&str>) -> Result<Caller, ServiceError> {
        let Some(raw) = header.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Err(ServiceError::Unauthorized(
                "Missing X-User-Id header".to_string(),
            ));
        };
        let id = UserId::new(raw);
        let mut tx = self.store.read().await?;
        let user = tx.user(&id).await?.ok_or_else(|| {
            ServiceError::Unauthorized(format!("Unknown user: {id}"))
        })?;
        Ok(Caller::new(id, user.role()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::{OrderLineRequestDto, PlaceOrderDto};
    use crate::application::test_support::{ADMIN, GUITAR, OPERATOR, PASSWORD, VIEWER, fixture};
    use crate::application::use_cases::OrderWorkflowUseCase;
    use crate::error::ErrorCode;
    use crate::infrastructure::persistence::InMemoryStore;
    use test_case::test_case;

    async fn setup() -> (Arc<InMemoryStore>, UserAccountsUseCase<InMemoryStore>) {
        let store = Arc::new(fixture().await);
        (Arc::clone(&store), UserAccountsUseCase::new(store))
    }

    fn registration(email: &str) -> RegisterUserDto {
        RegisterUserDto {
            email: email.to_string(),
            password: "hunter2".to_string(),
            first_name: None,
            last_name: None,
        }
    }

    #[tokio::test]
    async fn login_accepts_valid_credentials() {
        let (_, accounts) = setup().await;

        let result = accounts
            .login(LoginDto {
                email: format!("{ADMIN}@example.com"),
                password: PASSWORD.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.id, ADMIN);
        assert_eq!(result.role, "Admin");
    }

    #[test_case("user-admin@example.com", "wrong" ; "wrong password")]
    #[test_case("nobody@example.com", "secret" ; "unknown email")]
    #[tokio::test]
    async fn login_rejects_bad_credentials(email: &str, password: &str) {
        let (_, accounts) = setup().await;

        let err = accounts
            .login(LoginDto {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, ServiceError::Unauthorized("Invalid email or password".to_string()));
    }

    #[tokio::test]
    async fn register_grants_viewer_and_defaults_names() {
        let (_, accounts) = setup().await;

        let user = accounts.register(registration("ana@example.com")).await.unwrap();

        assert_eq!(user.role, "Viewer");
        assert_eq!(user.first_name, "ana");
        assert_eq!(user.last_name, "Usuario");

        let login = accounts
            .login(LoginDto {
                email: "ana@example.com".to_string(),
                password: "hunter2".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(login.id, user.id);
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_bad_input() {
        let (_, accounts) = setup().await;

        let duplicate = accounts.register(registration("user-viewer@example.com")).await;
        let malformed = accounts.register(registration("not-an-email")).await;

        assert_eq!(duplicate.unwrap_err().code(), ErrorCode::Validation);
        assert_eq!(malformed.unwrap_err().code(), ErrorCode::Validation);
    }

    #[tokio::test]
    async fn update_changes_role_and_rejects_unknown_roles() {
        let (_, accounts) = setup().await;
        let viewer = UserId::new(VIEWER);

        let promoted = accounts
            .update(
                &viewer,
                UpdateUserDto {
                    role: Some("Operator".to_string()),
                    ..UpdateUserDto::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(promoted.role, "Operator");

        let bogus = accounts
            .update(
                &viewer,
                UpdateUserDto {
                    role: Some("Root".to_string()),
                    ..UpdateUserDto::default()
                },
            )
            .await;
        assert_eq!(bogus.unwrap_err().code(), ErrorCode::Validation);

        let taken = accounts
            .update(
                &viewer,
                UpdateUserDto {
                    email: Some(format!("{OPERATOR}@example.com")),
                    ..UpdateUserDto::default()
                },
            )
            .await;
        assert_eq!(taken.unwrap_err().code(), ErrorCode::Validation);
    }

    #[tokio::test]
    async fn delete_is_blocked_by_orders() {
        let (store, accounts) = setup().await;
        OrderWorkflowUseCase::new(Arc::clone(&store))
            .create_order(
                &UserId::new(VIEWER),
                PlaceOrderDto {
                    lines: vec![OrderLineRequestDto {
                        instrument_id: GUITAR.to_string(),
                        quantity: 1,
                    }],
                },
            )
            .await
            .unwrap();

        let blocked = accounts.delete(&UserId::new(VIEWER)).await;
        assert_eq!(blocked.unwrap_err().code(), ErrorCode::Validation);

        accounts.delete(&UserId::new(OPERATOR)).await.unwrap();
        let gone = accounts.get(&UserId::new(OPERATOR)).await;
        assert_eq!(gone.unwrap_err().code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn resolve_caller_requires_known_user() {
        let (_, accounts) = setup().await;

        let caller = accounts.resolve_caller(Some(OPERATOR)).await.unwrap();
        assert_eq!(caller.role(), Role::Operator);
        assert!(caller.require(Capability::ManageOrders).is_ok());
        assert_eq!(
            caller.require(Capability::ManageCatalog).unwrap_err().code(),
            ErrorCode::Forbidden
        );

        for header in [None, Some(""), Some("ghost")] {
            let err = accounts.resolve_caller(header).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::Unauthorized);
        }
    }
}
