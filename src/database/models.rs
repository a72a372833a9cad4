// Database Models
//
// Row types for the two catalog tables plus the typed inputs used to write them.

use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

/// Trait for converting from tokio-postgres Row
pub trait FromRow {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error>
    where
        Self: Sized;
}

/// Course category, unique by title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCategory {
    pub id: i32,
    pub title: String,
}

impl FromRow for CourseCategory {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
        })
    }
}

/// Course owned by exactly one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: i32,
    pub name: String,
    pub link: String,
    pub description: String,
    pub image: Option<String>,
    pub category_id: i32,
}

impl FromRow for Course {
    fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            link: row.try_get("link")?,
            description: row.try_get("description")?,
            image: row.try_get("image")?,
            category_id: row.try_get("category_id")?,
        })
    }
}

/// Category with its courses eagerly loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryWithCourses {
    pub id: i32,
    pub title: String,
    pub courses: Vec<Course>,
}

/// Full set of writable category fields, used for create and replace
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub title: String,
}

/// Full set of writable course fields, used for create and replace.
///
/// An omitted `image` clears the stored one on update.
#[derive(Debug, Clone, Deserialize)]
pub struct CourseInput {
    pub name: String,
    pub link: String,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CourseInput {
    pub(crate) fn into_course(self, id: i32, category_id: i32) -> Course {
        Course {
            id,
            name: self.name,
            link: self.link,
            description: self.description,
            image: self.image,
            category_id,
        }
    }
}

/// Offset/limit window over a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}
