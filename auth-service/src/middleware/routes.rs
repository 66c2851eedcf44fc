use crate::models::Role;

/// How the gate treats a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected { required_role: Option<Role> },
}

/// Prefix-based route classification. Anything that matches no public prefix
/// is protected (default-deny); role-scoped prefixes additionally pin a role.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    public_prefixes: Vec<&'static str>,
    admin_prefixes: Vec<&'static str>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            public_prefixes: vec![
                "/login",
                "/register",
                "/api/auth/login",
                "/api/auth/register",
                "/api/auth/csrf",
                "/api/auth/logout",
                "/api/auth/validate",
                "/health",
                "/.well-known",
            ],
            admin_prefixes: vec!["/admin", "/api/admin"],
        }
    }
}

impl RoutePolicy {
    pub fn classify(&self, path: &str) -> RouteClass {
        if self
            .public_prefixes
            .iter()
            .any(|prefix| Self::matches(path, prefix))
        {
            return RouteClass::Public;
        }

        if self
            .admin_prefixes
            .iter()
            .any(|prefix| Self::matches(path, prefix))
        {
            return RouteClass::Protected {
                required_role: Some(Role::Admin),
            };
        }

        RouteClass::Protected {
            required_role: None,
        }
    }

    /// API paths get JSON errors; everything else gets page redirects.
    pub fn is_api(path: &str) -> bool {
        path == "/api" || path.starts_with("/api/")
    }

    // Prefix match on whole path segments, so "/admin" covers "/admin/users"
    // but not "/administrivia".
    fn matches(path: &str, prefix: &str) -> bool {
        path == prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }
}
