//! service-core: shared infrastructure for the auth platform services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
