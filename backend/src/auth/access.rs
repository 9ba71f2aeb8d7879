//! Access decisions for destructive operations
//!
//! A principal may act on a resource only if it owns it. There is no admin
//! override for ownership; admin rights only gate session management.

use crate::error::ApiError;
use yoga_studio_shared::Principal;

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    #[inline]
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Allow iff the principal is the owner of the resource
pub fn authorize(principal: &Principal, resource_owner_id: i64) -> Decision {
    if principal.id == resource_owner_id {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// [`authorize`], mapped to a forbidden error on deny
pub fn ensure_owner(principal: &Principal, resource_owner_id: i64) -> Result<(), ApiError> {
    match authorize(principal, resource_owner_id) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::info!(
                principal_id = principal.id,
                resource_owner_id,
                "Access denied: not the resource owner"
            );
            Err(ApiError::Forbidden(
                "You can only perform this action on your own account".to_string(),
            ))
        }
    }
}

/// Reject principals without the admin role
pub fn require_admin(principal: &Principal) -> Result<(), ApiError> {
    if principal.is_admin() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Administrator rights required".to_string()))
    }
}
