use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::evaluator::{AccessQuery, Authorization};
use crate::config::SECTION;
use crate::errors::{Error, Result};

#[derive(Debug, Default, Deserialize)]
struct RbacSection {
    #[serde(default)]
    roles: HashMap<String, Vec<String>>,
    #[serde(default)]
    permissions: HashMap<String, Vec<String>>,
}

/// In-memory role based evaluator.
///
/// Roles form a hierarchy where a parent inherits every permission of its
/// children (`"editor": ["admin"]` makes `admin` inherit from `editor`). A
/// permission is either `resource`, granting every privilege, or
/// `resource:privilege`.
///
/// Evaluation order:
/// 1. missing role or resource -> deny
/// 2. unknown role -> deny
/// 3. permission held by the role or any descendant -> allow
/// 4. deny
#[derive(Debug, Clone, Default)]
pub struct RbacAuthorization {
    children: HashMap<String, Vec<String>>,
    permissions: HashMap<String, HashSet<String>>,
}

impl RbacAuthorization {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `authorization` section of a configuration document.
    /// A missing section yields an evaluator that denies everything.
    pub fn from_config(config: &Value) -> Result<Self> {
        let section = match config.get(SECTION) {
            Some(section) if !section.is_null() => section.clone(),
            _ => return Ok(Self::new()),
        };

        let parsed: RbacSection = serde_path_to_error::deserialize(section).map_err(|err| {
            Error::invalid_config(format!("{SECTION}.{}: {}", err.path(), err.inner()))
        })?;

        let mut rbac = Self::new();
        for (role, parents) in parsed.roles {
            rbac.add_role(&role);
            for parent in parents {
                rbac = rbac.with_parent(&role, parent);
            }
        }
        for (role, permissions) in parsed.permissions {
            for permission in permissions {
                rbac = rbac.grant(&role, permission);
            }
        }
        Ok(rbac)
    }

    /// Declare `parent` as a parent of `role`.
    pub fn with_parent(mut self, role: &str, parent: impl Into<String>) -> Self {
        let parent = parent.into();
        self.add_role(role);
        self.add_role(&parent);
        self.children.entry(parent).or_default().push(role.to_string());
        self
    }

    pub fn grant(mut self, role: &str, permission: impl Into<String>) -> Self {
        self.add_role(role);
        self.permissions
            .entry(role.to_string())
            .or_default()
            .insert(permission.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.children.contains_key(role)
    }

    fn add_role(&mut self, role: &str) {
        self.children.entry(role.to_string()).or_default();
    }

    fn holds(&self, role: &str, resource: &str, privilege: Option<&str>) -> bool {
        let Some(permissions) = self.permissions.get(role) else {
            return false;
        };
        if permissions.contains(resource) {
            return true;
        }
        privilege
            .map(|p| permissions.contains(&format!("{resource}:{p}")))
            .unwrap_or(false)
    }
}

#[async_trait]
impl Authorization for RbacAuthorization {
    async fn is_granted(&self, query: AccessQuery<'_>) -> bool {
        let (Some(role), Some(resource)) = (query.role, query.resource) else {
            tracing::debug!(role = ?query.role, resource = ?query.resource, "rbac denied: incomplete query");
            return false;
        };

        if !self.has_role(role) {
            tracing::debug!(role = %role, "rbac denied: unknown role");
            return false;
        }

        let mut visited = HashSet::new();
        let mut pending = vec![role];
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            if self.holds(current, resource, query.privilege) {
                tracing::debug!(
                    role = %role,
                    via = %current,
                    resource = %resource,
                    privilege = ?query.privilege,
                    "rbac permission match"
                );
                return true;
            }
            if let Some(children) = self.children.get(current) {
                pending.extend(children.iter().map(String::as_str));
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query<'a>(role: &'a str, resource: &'a str, privilege: Option<&'a str>) -> AccessQuery<'a> {
        AccessQuery::new()
            .role(Some(role))
            .resource(Some(resource))
            .privilege(privilege)
    }

    #[tokio::test]
    async fn test_parent_inherits_child_permissions() {
        let rbac = RbacAuthorization::from_config(&json!({
            "authorization": {
                "roles": { "viewer": ["editor"], "editor": ["admin"], "admin": [] },
                "permissions": {
                    "viewer": ["pages.view"],
                    "editor": ["pages.edit"],
                    "admin": ["admin.pages"]
                }
            }
        }))
        .unwrap();

        assert!(rbac.is_granted(query("admin", "pages.view", None)).await);
        assert!(rbac.is_granted(query("editor", "pages.view", None)).await);
        assert!(!rbac.is_granted(query("viewer", "pages.edit", None)).await);
        assert!(!rbac.is_granted(query("editor", "admin.pages", None)).await);
    }

    #[tokio::test]
    async fn test_privilege_qualified_permission() {
        let rbac = RbacAuthorization::new().grant("editor", "pages.edit:write");

        assert!(rbac.is_granted(query("editor", "pages.edit", Some("write"))).await);
        assert!(!rbac.is_granted(query("editor", "pages.edit", Some("delete"))).await);
        assert!(!rbac.is_granted(query("editor", "pages.edit", None)).await);
    }

    #[tokio::test]
    async fn test_unqualified_permission_grants_every_privilege() {
        let rbac = RbacAuthorization::new().grant("viewer", "pages.view");

        assert!(rbac.is_granted(query("viewer", "pages.view", Some("read"))).await);
        assert!(rbac.is_granted(query("viewer", "pages.view", None)).await);
    }

    #[tokio::test]
    async fn test_unknown_role_and_incomplete_queries_deny() {
        let rbac = RbacAuthorization::new().grant("viewer", "pages.view");

        assert!(!rbac.is_granted(query("ghost", "pages.view", None)).await);
        assert!(!rbac.is_granted(AccessQuery::new().resource(Some("pages.view"))).await);
        assert!(!rbac.is_granted(AccessQuery::new().role(Some("viewer"))).await);
    }

    #[tokio::test]
    async fn test_cyclic_hierarchy_terminates() {
        let rbac = RbacAuthorization::new()
            .with_parent("a", "b")
            .with_parent("b", "a")
            .grant("a", "x");

        assert!(rbac.is_granted(query("b", "x", None)).await);
        assert!(!rbac.is_granted(query("a", "y", None)).await);
    }

    #[test]
    fn test_missing_section_denies_everything() {
        let rbac = RbacAuthorization::from_config(&json!({})).unwrap();
        assert!(!rbac.has_role("admin"));
    }

    #[test]
    fn test_malformed_section_reports_path() {
        let err = RbacAuthorization::from_config(&json!({
            "authorization": { "permissions": { "admin": "pages.edit" } }
        }))
        .unwrap_err();

        assert!(err.is_configuration());
        assert!(err.to_string().contains("authorization.permissions.admin"), "{err}");
    }
}
