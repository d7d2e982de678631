use std::collections::HashSet;

use thiserror::Error;

use stockroom_core::UserId;

use crate::{Permission, UserRole, permissions_for};

/// A fully resolved principal for authorization decisions.
///
/// Built by the transport layer from verified access-token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: UserRole,
    pub permissions: Vec<Permission>,
}

impl Principal {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self {
            user_id,
            role,
            permissions: permissions_for(role),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Pure policy check; no IO.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let perms: HashSet<&str> = principal.permissions.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_wildcard_grants_user_management() {
        let admin = Principal::new(UserId::new(), UserRole::Admin);
        assert!(authorize(&admin, &Permission::USERS_MANAGE).is_ok());
    }

    #[test]
    fn staff_can_write_inventory_but_not_manage_users() {
        let staff = Principal::new(UserId::new(), UserRole::Staff);
        assert!(authorize(&staff, &Permission::INVENTORY_WRITE).is_ok());
        assert_eq!(
            authorize(&staff, &Permission::USERS_MANAGE),
            Err(AuthzError::Forbidden("users.manage".to_string()))
        );
    }

    #[test]
    fn customers_have_no_back_office_permissions() {
        let customer = Principal::new(UserId::new(), UserRole::Customer);
        assert!(authorize(&customer, &Permission::CATALOG_READ).is_err());
    }
}
