//! Services layer: credential exchange, session validation, CSRF issuance,
//! identity storage, and session revocation.

mod auth;
mod csrf;
pub mod error;
mod policy;
mod revocation;
mod session;
mod users;

pub use auth::{AuthService, LoginOutcome};
pub use csrf::CsrfService;
pub use error::ServiceError;
pub use policy::PolicyService;
pub use revocation::{MemoryRevocationList, SessionRevocation};
pub use session::{IssuedSession, SessionClaims, SessionService};
pub use users::{MemoryUserStore, UserStore};
