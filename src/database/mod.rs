//! # Database Module
//!
//! Catalog persistence behind the [`CatalogStore`] trait: a PostgreSQL backend
//! using tokio-postgres with deadpool pooling, and an in-process backend.

pub mod connection;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

pub use connection::{DatabaseConfig, DatabaseConnection};
pub use memory::MemoryCatalogStore;
pub use models::*;
pub use postgres::PgCatalogStore;

/// Failures surfaced by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness or integrity constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Transactional store for categories and their courses.
///
/// Every mutation commits on its own and returns the row as stored. `None`
/// (or `false` for deletes) means the addressed row does not exist.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self, page: Page) -> StoreResult<Vec<CourseCategory>>;

    async fn create_category(&self, input: &CategoryInput) -> StoreResult<CourseCategory>;

    async fn get_category(&self, id: i32) -> StoreResult<Option<CourseCategory>>;

    async fn update_category(&self, id: i32, input: &CategoryInput) -> StoreResult<Option<CourseCategory>>;

    /// Removes the category together with all of its courses.
    async fn delete_category(&self, id: i32) -> StoreResult<bool>;

    async fn list_courses(&self, page: Page) -> StoreResult<Vec<Course>>;

    /// Returns `None` without writing anything when the category is absent.
    async fn create_course(&self, category_id: i32, input: &CourseInput) -> StoreResult<Option<Course>>;

    async fn get_course(&self, id: i32) -> StoreResult<Option<Course>>;

    async fn update_course(&self, id: i32, input: &CourseInput) -> StoreResult<Option<Course>>;

    async fn delete_course(&self, id: i32) -> StoreResult<bool>;

    async fn categories_with_courses(&self) -> StoreResult<Vec<CategoryWithCourses>>;

    /// Cheap liveness check of the backend
    async fn ping(&self) -> StoreResult<()>;
}
