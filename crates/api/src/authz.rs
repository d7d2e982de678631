//! Per-route permission guard.
//!
//! Handlers call [`require`] before touching any service so that a forbidden
//! request never reaches the store.

use axum::http::StatusCode;
use axum::response::Response;

use stockroom_auth::{Permission, authorize};

use crate::app::errors;
use crate::context::PrincipalContext;

pub fn require(principal: &PrincipalContext, permission: &Permission) -> Result<(), Response> {
    authorize(&principal.principal(), permission)
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}

#[cfg(test)]
mod tests {
    use stockroom_auth::UserRole;
    use stockroom_core::UserId;

    use super::*;

    #[test]
    fn staff_cannot_manage_users() {
        let staff = PrincipalContext::new(UserId::new(), UserRole::Staff);
        assert!(require(&staff, &Permission::PURCHASES_WRITE).is_ok());

        let denied = require(&staff, &Permission::USERS_MANAGE).unwrap_err();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn customers_get_nothing() {
        let customer = PrincipalContext::new(UserId::new(), UserRole::Customer);
        assert!(require(&customer, &Permission::CATALOG_READ).is_err());
    }
}
