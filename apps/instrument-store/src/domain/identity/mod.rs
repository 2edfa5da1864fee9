//! Identity Bounded Context
//!
//! User accounts, their roles and the capabilities each role grants.

mod password;
mod role;
mod user;

pub use password::PasswordDigest;
pub use role::{Capability, Role};
pub use user::{User, UserPatch, UserRegistration};
