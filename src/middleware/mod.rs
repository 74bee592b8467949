/// Middleware module
///
/// Request counting for the file server and access token authentication
/// for protected routes.

mod authentication;
mod metrics;

pub use authentication::AuthenticatedUser;
pub use metrics::{CountHits, HitCounter};
