//! Roles and capabilities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// Something a caller may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Administer user accounts.
    ManageUsers,
    /// Create, edit and delete instruments and categories.
    ManageCatalog,
    /// Place orders and read one's own orders.
    PlaceOrders,
    /// Read every user's orders.
    ViewAllOrders,
    /// Change order status and delete orders.
    ManageOrders,
}

/// A user role. Roles are fixed seeded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full access.
    Admin,
    /// Store staff handling orders.
    Operator,
    /// Customer.
    Viewer,
}

impl Role {
    /// Every role, in seeding order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Operator, Self::Viewer];

    /// Role name as stored and serialized.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Operator => "Operator",
            Self::Viewer => "Viewer",
        }
    }

    /// Whether this role grants `capability`.
    #[must_use]
    pub const fn allows(&self, capability: Capability) -> bool {
        match self {
            Self::Admin => true,
            Self::Operator => matches!(
                capability,
                Capability::PlaceOrders | Capability::ViewAllOrders | Capability::ManageOrders
            ),
            Self::Viewer => matches!(capability, Capability::PlaceOrders),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.name() == s)
            .ok_or_else(|| DomainError::invalid("role", format!("unknown role: {s}")))
    }
}
