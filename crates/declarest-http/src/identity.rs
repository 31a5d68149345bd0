//! Identity contract for authenticated callers.
//!
//! Authentication itself is out of scope: upstream middleware attaches an
//! identity to the request (`user` or `auth` slot), and the permission layer
//! asks it the two questions the pipeline supports: which roles it carries,
//! and whether it grants a named permission directly.

use std::collections::HashSet;

use async_trait::async_trait;

/// An authenticated caller attached to a request by upstream middleware.
///
/// Both capabilities are optional. [`Identity::roles`] returning `None`
/// means the identity carries no role list (relevant when a role map is
/// configured); [`Identity::has_permission`] returning `None` means the
/// identity cannot answer permission queries at all, which the permission
/// layer treats as a denial.
#[async_trait]
pub trait Identity: Send + Sync {
    /// Roles granted to this identity, if any.
    fn roles(&self) -> Option<Vec<String>> {
        None
    }

    /// Direct permission check. `None` means the capability is absent.
    async fn has_permission(&self, _permission: &str) -> Option<bool> {
        None
    }
}

/// A plain value-type identity backed by an in-memory permission set and an
/// optional role list.
///
/// # Examples
///
/// ```
/// use declarest_http::{Identity, SimpleIdentity};
///
/// let identity = SimpleIdentity::new()
///     .with_permission("users:list")
///     .with_roles(vec!["admin".to_string()]);
/// assert_eq!(identity.roles(), Some(vec!["admin".to_string()]));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SimpleIdentity {
    permissions: HashSet<String>,
    roles: Option<Vec<String>>,
}

impl SimpleIdentity {
    /// Creates an identity with no permissions and no roles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a named permission.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Sets the role list.
    #[must_use]
    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = Some(roles);
        self
    }
}

#[async_trait]
impl Identity for SimpleIdentity {
    fn roles(&self) -> Option<Vec<String>> {
        self.roles.clone()
    }

    async fn has_permission(&self, permission: &str) -> Option<bool> {
        Some(self.permissions.contains(permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Opaque;

    #[async_trait]
    impl Identity for Opaque {}

    #[tokio::test]
    async fn test_default_capabilities_absent() {
        let identity = Opaque;
        assert!(identity.roles().is_none());
        assert!(identity.has_permission("anything").await.is_none());
    }

    #[tokio::test]
    async fn test_simple_identity_permissions() {
        let identity = SimpleIdentity::new().with_permission("a").with_permission("b");
        assert_eq!(identity.has_permission("a").await, Some(true));
        assert_eq!(identity.has_permission("b").await, Some(true));
        assert_eq!(identity.has_permission("c").await, Some(false));
    }

    #[tokio::test]
    async fn test_simple_identity_roles() {
        let identity = SimpleIdentity::new();
        assert!(identity.roles().is_none());

        let identity = identity.with_roles(vec!["test".to_string()]);
        assert_eq!(identity.roles(), Some(vec!["test".to_string()]));
    }
}
