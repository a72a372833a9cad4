// In-process catalog store
//
// Same contract as the PostgreSQL store: sequential ids starting at 1, unique
// category titles, cascade on category delete. Each call holds the lock for its
// whole mutation, which makes it a single transaction.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::database::models::{
    CategoryInput, CategoryWithCourses, Course, CourseCategory, CourseInput, Page,
};
use crate::database::{CatalogStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    categories: BTreeMap<i32, CourseCategory>,
    courses: BTreeMap<i32, Course>,
    category_seq: i32,
    course_seq: i32,
}

impl Tables {
    fn title_taken(&self, title: &str, except: Option<i32>) -> bool {
        self.categories
            .values()
            .any(|c| c.title == title && Some(c.id) != except)
    }
}

fn unique_violation(title: &str) -> StoreError {
    StoreError::Conflict(format!(
        "duplicate key value violates unique constraint \"course_categories_title_key\" (title={title})"
    ))
}

fn window<T>(values: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    values
        .skip(page.skip.max(0) as usize)
        .take(page.limit.max(0) as usize)
        .collect()
}

/// Catalog store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    tables: Mutex<Tables>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn list_categories(&self, page: Page) -> StoreResult<Vec<CourseCategory>> {
        let tables = self.tables.lock();
        Ok(window(tables.categories.values().cloned(), page))
    }

    async fn create_category(&self, input: &CategoryInput) -> StoreResult<CourseCategory> {
        let mut tables = self.tables.lock();
        if tables.title_taken(&input.title, None) {
            return Err(unique_violation(&input.title));
        }
        tables.category_seq += 1;
        let category = CourseCategory {
            id: tables.category_seq,
            title: input.title.clone(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: i32) -> StoreResult<Option<CourseCategory>> {
        Ok(self.tables.lock().categories.get(&id).cloned())
    }

    async fn update_category(&self, id: i32, input: &CategoryInput) -> StoreResult<Option<CourseCategory>> {
        let mut tables = self.tables.lock();
        if !tables.categories.contains_key(&id) {
            return Ok(None);
        }
        if tables.title_taken(&input.title, Some(id)) {
            return Err(unique_violation(&input.title));
        }
        let category = CourseCategory {
            id,
            title: input.title.clone(),
        };
        tables.categories.insert(id, category.clone());
        Ok(Some(category))
    }

    async fn delete_category(&self, id: i32) -> StoreResult<bool> {
        let mut tables = self.tables.lock();
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        tables.courses.retain(|_, course| course.category_id != id);
        Ok(true)
    }

    async fn list_courses(&self, page: Page) -> StoreResult<Vec<Course>> {
        let tables = self.tables.lock();
        Ok(window(tables.courses.values().cloned(), page))
    }

    async fn create_course(&self, category_id: i32, input: &CourseInput) -> StoreResult<Option<Course>> {
        let mut tables = self.tables.lock();
        if !tables.categories.contains_key(&category_id) {
            return Ok(None);
        }
        tables.course_seq += 1;
        let course = input.clone().into_course(tables.course_seq, category_id);
        tables.courses.insert(course.id, course.clone());
        Ok(Some(course))
    }

    async fn get_course(&self, id: i32) -> StoreResult<Option<Course>> {
        Ok(self.tables.lock().courses.get(&id).cloned())
    }

    async fn update_course(&self, id: i32, input: &CourseInput) -> StoreResult<Option<Course>> {
        let mut tables = self.tables.lock();
        let Some(existing) = tables.courses.get_mut(&id) else {
            return Ok(None);
        };
        *existing = input.clone().into_course(id, existing.category_id);
        Ok(Some(existing.clone()))
    }

    async fn delete_course(&self, id: i32) -> StoreResult<bool> {
        Ok(self.tables.lock().courses.remove(&id).is_some())
    }

    async fn categories_with_courses(&self) -> StoreResult<Vec<CategoryWithCourses>> {
        let tables = self.tables.lock();
        Ok(tables
            .categories
            .values()
            .map(|category| CategoryWithCourses {
                id: category.id,
                title: category.title.clone(),
                courses: tables
                    .courses
                    .values()
                    .filter(|course| course.category_id == category.id)
                    .cloned()
                    .collect(),
            })
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
