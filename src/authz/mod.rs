//! Authorization module - decision port and reference backend
//!
//! The gating middleware only ever talks to [`Authorization`]. Backends are
//! swapped behind it without touching the middleware:
//! - [`RbacAuthorization`] - role hierarchy with inherited permissions
//! - anything else implementing the trait (ACL engines, remote policy services)

mod evaluator;
mod principal;
pub mod rbac;

pub use evaluator::{AccessQuery, Authorization};
pub use principal::AuthenticatedUser;
pub use rbac::RbacAuthorization;
