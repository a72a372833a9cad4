//! # Services Module
//!
//! Business logic sitting between the HTTP handlers and storage.

pub mod catalog;

pub use catalog::CatalogService;
