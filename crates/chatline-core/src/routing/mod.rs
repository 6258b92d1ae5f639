//! Navigation routes and the authentication guard.

mod guard;
mod route;

pub use guard::{NavigationDecision, RouteGuard};
pub use route::Route;
