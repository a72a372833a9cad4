// # Routes Module
//
// - HTTP route handlers, grouped by API area.
// - Each module exposes a `create_*_routes()` function merged in `server.rs`.

/// Liveness, readiness and root endpoints
pub mod health;

/// Administrator login and identity
pub mod auth;

/// Category and course CRUD
pub mod courses;

/// Extractors rendering rejections as `AppError`
pub mod extract;
