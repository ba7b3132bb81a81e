//! API routes module
//!
//! The blog's domain routers (posts, categories, auth) are mounted here as
//! opaque groups under fixed prefixes; this crate only owns health and info.

pub mod health;
pub mod info;

use axum::Router;

pub const POSTS_PREFIX: &str = "/api/posts";
pub const CATEGORIES_PREFIX: &str = "/api/categories";
pub const AUTH_PREFIX: &str = "/api/auth";

/// Domain routers keyed by mount prefix. Each router has its state applied.
pub type DomainRoutes = Vec<(&'static str, Router)>;

/// Routers mounted by this binary.
///
/// The domain handlers are supplied by their own crates; none are linked into
/// this build, so requests under their prefixes fall through to the API 404.
pub fn domain_routes() -> DomainRoutes {
    Vec::new()
}
