//! HTTP surface: routes, downstream proxy and middleware.

pub mod middleware;
pub mod proxy;
pub mod routes;
pub mod status;

pub use routes::*;
