//! `stockroom-auth`: users, roles, tokens and the RBAC policy.
//!
//! This crate is intentionally decoupled from HTTP and storage. Token signing and
//! password hashing sit behind small types so either can be swapped.

pub mod authorize;
pub mod claims;
pub mod login_log;
pub mod password;
pub mod permissions;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{AuthzError, Principal, authorize};
pub use claims::{AccessClaims, RegistrationClaims, TokenValidationError, validate_window};
pub use login_log::{LoginLog, LoginStatus};
pub use password::{DEFAULT_ROUNDS, PasswordHasher, Pbkdf2PasswordHasher};
pub use permissions::{Permission, permissions_for};
pub use roles::UserRole;
pub use token::{TokenError, TokenIssuer};
pub use user::{NewUser, User, UserChanges, normalize_email};
