use crate::state::{AuthState, Role};

/// What a protected view should do for the current auth snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// An auth operation is still resolving; show the placeholder, do not
    /// redirect yet.
    Loading,
    /// Not signed in; go to the login page, remembering where the visitor
    /// was headed.
    RedirectToLogin { redirect: String },
    /// Signed in but lacking the required role; show the access-denied view
    /// (with a way back), no redirect.
    AccessDenied,
    /// Render the protected content.
    Render,
}

/// Pure decision over an `AuthState` snapshot.
pub fn decide(state: &AuthState, required_role: Option<Role>, current_path: &str) -> RouteDecision {
    if state.is_loading {
        return RouteDecision::Loading;
    }

    if !state.is_authenticated {
        return RouteDecision::RedirectToLogin {
            redirect: current_path.to_string(),
        };
    }

    if let Some(required) = required_role {
        match &state.user {
            Some(user) if user.role == required => {}
            _ => return RouteDecision::AccessDenied,
        }
    }

    RouteDecision::Render
}
