use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::UserRole;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "inventory.write").
/// The wildcard permission `"*"` grants everything and is reserved for admins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission::from_static("*");

    pub const CATALOG_READ: Permission = Permission::from_static("catalog.read");
    pub const CATALOG_WRITE: Permission = Permission::from_static("catalog.write");
    pub const SUPPLIERS_READ: Permission = Permission::from_static("suppliers.read");
    pub const SUPPLIERS_WRITE: Permission = Permission::from_static("suppliers.write");
    pub const PURCHASES_READ: Permission = Permission::from_static("purchases.read");
    pub const PURCHASES_WRITE: Permission = Permission::from_static("purchases.write");
    pub const INVENTORY_READ: Permission = Permission::from_static("inventory.read");
    pub const INVENTORY_WRITE: Permission = Permission::from_static("inventory.write");
    pub const ORDERS_READ: Permission = Permission::from_static("orders.read");
    pub const ORDERS_WRITE: Permission = Permission::from_static("orders.write");
    pub const SEARCH: Permission = Permission::from_static("search");
    pub const USERS_MANAGE: Permission = Permission::from_static("users.manage");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static role → permission mapping.
pub fn permissions_for(role: UserRole) -> Vec<Permission> {
    match role {
        UserRole::Admin => vec![Permission::WILDCARD],
        UserRole::Staff => vec![
            Permission::CATALOG_READ,
            Permission::CATALOG_WRITE,
            Permission::SUPPLIERS_READ,
            Permission::SUPPLIERS_WRITE,
            Permission::PURCHASES_READ,
            Permission::PURCHASES_WRITE,
            Permission::INVENTORY_READ,
            Permission::INVENTORY_WRITE,
            Permission::ORDERS_READ,
            Permission::ORDERS_WRITE,
            Permission::SEARCH,
        ],
        UserRole::Customer => Vec::new(),
    }
}
