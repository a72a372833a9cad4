//! # Authentication Module
//!
//! Credential check for the single administrator, JWT issuance and validation,
//! and the middleware that guards the protected API surface.

pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod models;
