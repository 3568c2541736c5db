//! Portfolio site server.
//!
//! Serves the pre-built site (or proxies to its renderer), routes the
//! `resume.*` subdomain to the resume asset, and hardens every response with
//! a nonce-scoped Content-Security-Policy and a fixed set of security headers.

pub mod app;
pub mod cli;
pub mod config;
pub mod edge;
pub mod logging;
pub mod state;
pub mod utils;
pub mod web;
