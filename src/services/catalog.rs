//! Catalog Service
//!
//! CRUD over categories and courses. Enforces existence and ownership rules on
//! top of a [`CatalogStore`] and maps storage outcomes onto request errors.

use std::sync::Arc;

use crate::database::{
    CatalogStore, CategoryInput, CategoryWithCourses, Course, CourseCategory, CourseInput, Page,
};
use crate::error::AppError;

const CATEGORY_NOT_FOUND: &str = "Category not found";
const COURSE_NOT_FOUND: &str = "Course not found";

pub type CatalogResult<T> = Result<T, AppError>;

/// Entry point for every catalog operation
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Build a page window, rejecting negative offsets and sizes
    pub fn page(skip: Option<i64>, limit: Option<i64>) -> CatalogResult<Page> {
        let defaults = Page::default();
        let page = Page {
            skip: skip.unwrap_or(defaults.skip),
            limit: limit.unwrap_or(defaults.limit),
        };
        if page.skip < 0 {
            return Err(AppError::BadRequest("skip must not be negative".to_string()));
        }
        if page.limit < 0 {
            return Err(AppError::BadRequest("limit must not be negative".to_string()));
        }
        Ok(page)
    }

    pub async fn list_categories(&self, page: Page) -> CatalogResult<Vec<CourseCategory>> {
        Ok(self.store.list_categories(page).await?)
    }

    pub async fn create_category(&self, input: CategoryInput) -> CatalogResult<CourseCategory> {
        let category = self.store.create_category(&input).await.inspect_err(|e| {
            tracing::warn!("Category {:?} rejected: {}", input.title, e);
        })?;
        tracing::info!("Created category {} ({})", category.id, category.title);
        Ok(category)
    }

    pub async fn get_category(&self, id: i32) -> CatalogResult<CourseCategory> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| AppError::NotFound(CATEGORY_NOT_FOUND.to_string()))
    }

    /// Replace every writable field of the category
    pub async fn update_category(&self, id: i32, input: CategoryInput) -> CatalogResult<CourseCategory> {
        let category = self
            .store
            .update_category(id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound(CATEGORY_NOT_FOUND.to_string()))?;
        tracing::info!("Updated category {}", id);
        Ok(category)
    }

    /// Delete the category and every course it owns
    pub async fn delete_category(&self, id: i32) -> CatalogResult<()> {
        if !self.store.delete_category(id).await? {
            return Err(AppError::NotFound(CATEGORY_NOT_FOUND.to_string()));
        }
        tracing::info!("Deleted category {} and its courses", id);
        Ok(())
    }

    pub async fn list_courses(&self, page: Page) -> CatalogResult<Vec<Course>> {
        Ok(self.store.list_courses(page).await?)
    }

    /// Create a course under an existing category
    pub async fn create_course(&self, category_id: i32, input: CourseInput) -> CatalogResult<Course> {
        let course = self
            .store
            .create_course(category_id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound(CATEGORY_NOT_FOUND.to_string()))?;
        tracing::info!("Created course {} in category {}", course.id, category_id);
        Ok(course)
    }

    pub async fn get_course(&self, id: i32) -> CatalogResult<Course> {
        self.store
            .get_course(id)
            .await?
            .ok_or_else(|| AppError::NotFound(COURSE_NOT_FOUND.to_string()))
    }

    /// Replace every writable field of the course; ownership never changes
    pub async fn update_course(&self, id: i32, input: CourseInput) -> CatalogResult<Course> {
        let course = self
            .store
            .update_course(id, &input)
            .await?
            .ok_or_else(|| AppError::NotFound(COURSE_NOT_FOUND.to_string()))?;
        tracing::info!("Updated course {}", id);
        Ok(course)
    }

    pub async fn delete_course(&self, id: i32) -> CatalogResult<()> {
        if !self.store.delete_course(id).await? {
            return Err(AppError::NotFound(COURSE_NOT_FOUND.to_string()));
        }
        tracing::info!("Deleted course {}", id);
        Ok(())
    }

    pub async fn categories_with_courses(&self) -> CatalogResult<Vec<CategoryWithCourses>> {
        Ok(self.store.categories_with_courses().await?)
    }

    /// Readiness of the storage backend
    pub async fn is_ready(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Storage ping failed: {}", e);
                false
            }
        }
    }
}
