// PostgreSQL catalog store
//
// One pooled connection per call; every mutation runs inside its own transaction
// and returns the row via RETURNING.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};
use std::collections::HashMap;
use tokio_postgres::error::SqlState;

use crate::database::models::{
    CategoryInput, CategoryWithCourses, Course, CourseCategory, CourseInput, FromRow, Page,
};
use crate::database::{CatalogStore, DatabaseConnection, StoreError, StoreResult};

/// Catalog store backed by the `course_categories` and `courses` tables
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: Pool,
}

impl PgCatalogStore {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    async fn client(&self) -> StoreResult<Object> {
        Ok(self.pool.get().await.context("Failed to get DB connection")?)
    }
}

/// Unique and foreign key violations become conflicts carrying the database's
/// own message.
fn map_pg_error(err: tokio_postgres::Error, action: &'static str) -> StoreError {
    let code = err.code();
    if code == Some(&SqlState::UNIQUE_VIOLATION) || code == Some(&SqlState::FOREIGN_KEY_VIOLATION) {
        let message = err
            .as_db_error()
            .map(|db| db.message().to_string())
            .unwrap_or_else(|| err.to_string());
        return StoreError::Conflict(message);
    }
    StoreError::Backend(anyhow!(err).context(action))
}

fn decode<T: FromRow>(row: &tokio_postgres::Row) -> StoreResult<T> {
    Ok(T::from_row(row).context("Failed to decode row")?)
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn list_categories(&self, page: Page) -> StoreResult<Vec<CourseCategory>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT id, title FROM course_categories ORDER BY id OFFSET $1 LIMIT $2",
                &[&page.skip, &page.limit],
            )
            .await
            .map_err(|e| map_pg_error(e, "Failed to list categories"))?;
        rows.iter().map(decode::<CourseCategory>).collect()
    }

    async fn create_category(&self, input: &CategoryInput) -> StoreResult<CourseCategory> {
        let mut client = self.client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| map_pg_error(e, "Failed to begin transaction"))?;
        let row = tx
            .query_one(
                "INSERT INTO course_categories (title) VALUES ($1) RETURNING id, title",
                &[&input.title],
            )
            .await
            .map_err(|e| map_pg_error(e, "Failed to insert category"))?;
        tx.commit()
            .await
            .map_err(|e| map_pg_error(e, "Failed to commit category"))?;
        decode(&row)
    }

    async fn get_category(&self, id: i32) -> StoreResult<Option<CourseCategory>> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT id, title FROM course_categories WHERE id = $1", &[&id])
            .await
            .map_err(|e| map_pg_error(e, "Failed to query category"))?;
        row.as_ref().map(decode::<CourseCategory>).transpose()
    }

    async fn update_category(&self, id: i32, input: &CategoryInput) -> StoreResult<Option<CourseCategory>> {
        let mut client = self.client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| map_pg_error(e, "Failed to begin transaction"))?;
        let row = tx
            .query_opt(
                "UPDATE course_categories SET title = $2 WHERE id = $1 RETURNING id, title",
                &[&id, &input.title],
            )
            .await
            .map_err(|e| map_pg_error(e, "Failed to update category"))?;
        tx.commit()
            .await
            .map_err(|e| map_pg_error(e, "Failed to commit category"))?;
        row.as_ref().map(decode::<CourseCategory>).transpose()
    }

    async fn delete_category(&self, id: i32) -> StoreResult<bool> {
        let mut client = self.client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| map_pg_error(e, "Failed to begin transaction"))?;

        // Lock the parent first: inserts holding FOR KEY SHARE finish before
        // the child delete runs, later ones find no parent.
        let parent = tx
            .query_opt(
                "SELECT id FROM course_categories WHERE id = $1 FOR UPDATE",
                &[&id],
            )
            .await
            .map_err(|e| map_pg_error(e, "Failed to lock category"))?;
        if parent.is_none() {
            // Dropping the transaction rolls it back
            return Ok(false);
        }

        let courses = tx
            .execute("DELETE FROM courses WHERE category_id = $1", &[&id])
            .await
            .map_err(|e| map_pg_error(e, "Failed to delete category courses"))?;
        tx.execute("DELETE FROM course_categories WHERE id = $1", &[&id])
            .await
            .map_err(|e| map_pg_error(e, "Failed to delete category"))?;

        tx.commit()
            .await
            .map_err(|e| map_pg_error(e, "Failed to commit category deletion"))?;
        tracing::debug!("Category {} removed with {} course(s)", id, courses);
        Ok(true)
    }

    async fn list_courses(&self, page: Page) -> StoreResult<Vec<Course>> {
        let client = self.client().await?;
        let rows = client
            .query(
                "SELECT id, name, link, description, image, category_id FROM courses ORDER BY id OFFSET $1 LIMIT $2",
                &[&page.skip, &page.limit],
            )
            .await
            .map_err(|e| map_pg_error(e, "Failed to list courses"))?;
        rows.iter().map(decode::<Course>).collect()
    }

    async fn create_course(&self, category_id: i32, input: &CourseInput) -> StoreResult<Option<Course>> {
        let mut client = self.client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| map_pg_error(e, "Failed to begin transaction"))?;

        // Holding the parent row keeps a concurrent delete from orphaning the insert
        let parent = tx
            .query_opt(
                "SELECT id FROM course_categories WHERE id = $1 FOR KEY SHARE",
                &[&category_id],
            )
            .await
            .map_err(|e| map_pg_error(e, "Failed to query category"))?;
        if parent.is_none() {
            return Ok(None);
        }

        let row = tx
            .query_one(
                "INSERT INTO courses (name, link, description, image, category_id) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, name, link, description, image, category_id",
                &[&input.name, &input.link, &input.description, &input.image, &category_id],
            )
            .await
            .map_err(|e| map_pg_error(e, "Failed to insert course"))?;
        tx.commit()
            .await
            .map_err(|e| map_pg_error(e, "Failed to commit course"))?;
        decode::<Course>(&row).map(Some)
    }

    async fn get_course(&self, id: i32) -> StoreResult<Option<Course>> {
        let client = self.client().await?;
        let row = client
            .query_opt("SELECT id, name, link, description, image, category_id FROM courses WHERE id = $1", &[&id])
            .await
            .map_err(|e| map_pg_error(e, "Failed to query course"))?;
        row.as_ref().map(decode::<Course>).transpose()
    }

    async fn update_course(&self, id: i32, input: &CourseInput) -> StoreResult<Option<Course>> {
        let mut client = self.client().await?;
        let tx = client
            .transaction()
            .await
            .map_err(|e| map_pg_error(e, "Failed to begin transaction"))?;
        let row = tx
            .query_opt(
                "UPDATE courses SET name = $2, link = $3, description = $4, image = $5 \
                 WHERE id = $1 \
                 RETURNING id, name, link, description, image, category_id",
                &[&id, &input.name, &input.link, &input.description, &input.image],
            )
            .await
            .map_err(|e| map_pg_error(e, "Failed to update course"))?;
        tx.commit()
            .await
            .map_err(|e| map_pg_error(e, "Failed to commit course"))?;
        row.as_ref().map(decode::<Course>).transpose()
    }

    async fn delete_course(&self, id: i32) -> StoreResult<bool> {
        let client = self.client().await?;
        let deleted = client
            .execute("DELETE FROM courses WHERE id = $1", &[&id])
            .await
            .map_err(|e| map_pg_error(e, "Failed to delete course"))?;
        Ok(deleted > 0)
    }

    async fn categories_with_courses(&self) -> StoreResult<Vec<CategoryWithCourses>> {
        let mut client = self.client().await?;
        // One snapshot for both reads so the tree is consistent
        let tx = client
            .build_transaction()
            .isolation_level(tokio_postgres::IsolationLevel::RepeatableRead)
            .read_only(true)
            .start()
            .await
            .map_err(|e| map_pg_error(e, "Failed to begin transaction"))?;

        let category_rows = tx
            .query("SELECT id, title FROM course_categories ORDER BY id", &[])
            .await
            .map_err(|e| map_pg_error(e, "Failed to list categories"))?;
        let course_rows = tx
            .query("SELECT id, name, link, description, image, category_id FROM courses ORDER BY id", &[])
            .await
            .map_err(|e| map_pg_error(e, "Failed to list courses"))?;
        tx.commit()
            .await
            .map_err(|e| map_pg_error(e, "Failed to finish read"))?;

        let mut by_category: HashMap<i32, Vec<Course>> = HashMap::new();
        for row in &course_rows {
            let course: Course = decode(row)?;
            by_category.entry(course.category_id).or_default().push(course);
        }

        category_rows
            .iter()
            .map(|row| {
                let category: CourseCategory = decode(row)?;
                Ok(CategoryWithCourses {
                    courses: by_category.remove(&category.id).unwrap_or_default(),
                    id: category.id,
                    title: category.title,
                })
            })
            .collect()
    }

    async fn ping(&self) -> StoreResult<()> {
        let client = self.client().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| map_pg_error(e, "Database health check failed"))?;
        Ok(())
    }
}

// These run against a real server and are skipped unless TEST_DATABASE_URL is set.
// Titles carry a per-test suffix so parallel tests never share rows.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseConfig;
    use std::sync::LazyLock;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;
    use tokio::sync::OnceCell;

    static MIGRATED: LazyLock<OnceCell<()>> = LazyLock::new(OnceCell::new);
    static SEQ: AtomicU64 = AtomicU64::new(0);

    async fn connect() -> Option<(PgCatalogStore, DatabaseConnection)> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set, skipping");
            return None;
        };
        let db = DatabaseConnection::new(DatabaseConfig::from_url(&url, 4).unwrap())
            .await
            .unwrap();
        MIGRATED
            .get_or_init(|| async { db.migrate().await.unwrap() })
            .await;
        Some((PgCatalogStore::new(&db), db))
    }

    fn unique(prefix: &str) -> CategoryInput {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        CategoryInput {
            title: format!("{prefix}-{nanos}-{}", SEQ.fetch_add(1, Ordering::Relaxed)),
        }
    }

    fn course(name: &str) -> CourseInput {
        CourseInput {
            name: name.to_string(),
            link: format!("https://courses.example/{name}"),
            description: format!("{name} description"),
            image: Some(format!("{name}.png")),
        }
    }

    async fn count(db: &DatabaseConnection, sql: &str, id: i32) -> i64 {
        let client = db.pool().get().await.unwrap();
        client.query_one(sql, &[&id]).await.unwrap().get(0)
    }

    #[tokio::test]
    async fn test_duplicate_title_is_conflict() {
        let Some((store, _db)) = connect().await else { return };
        let input = unique("dup");
        let first = store.create_category(&input).await.unwrap();

        let err = store.create_category(&input).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{err:?}");

        let second = store.create_category(&unique("dup")).await.unwrap();
        let err = store.update_category(second.id, &input).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{err:?}");

        assert_eq!(store.get_category(first.id).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_course_needs_existing_category() {
        let Some((store, db)) = connect().await else { return };
        let missing = i32::MAX;
        assert!(store.create_course(missing, &course("orphan")).await.unwrap().is_none());
        assert_eq!(count(&db, "SELECT COUNT(*) FROM courses WHERE category_id = $1", missing).await, 0);
    }

    #[tokio::test]
    async fn test_delete_category_removes_its_courses() {
        let Some((store, db)) = connect().await else { return };
        let category = store.create_category(&unique("cascade")).await.unwrap();
        let a = store.create_course(category.id, &course("go")).await.unwrap().unwrap();
        let b = store.create_course(category.id, &course("rust")).await.unwrap().unwrap();

        assert!(store.delete_category(category.id).await.unwrap());
        assert!(store.get_course(a.id).await.unwrap().is_none());
        assert!(store.get_course(b.id).await.unwrap().is_none());
        assert_eq!(count(&db, "SELECT COUNT(*) FROM courses WHERE category_id = $1", category.id).await, 0);
        assert!(!store.delete_category(category.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_course_replaces_fields() {
        let Some((store, _db)) = connect().await else { return };
        let category = store.create_category(&unique("update")).await.unwrap();
        let created = store.create_course(category.id, &course("go")).await.unwrap().unwrap();

        let mut replacement = course("go2");
        replacement.image = None;
        let updated = store.update_course(created.id, &replacement).await.unwrap().unwrap();
        assert_eq!(updated, replacement.into_course(created.id, category.id));
        assert!(store.update_course(i32::MAX, &course("x")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_waits_for_in_flight_course_insert() {
        let Some((store, db)) = connect().await else { return };
        let category = store.create_category(&unique("race")).await.unwrap();
        let id = category.id;

        // Another writer holds the parent the way create_course does.
        let mut holder = db.pool().get().await.unwrap();
        let tx = holder.transaction().await.unwrap();
        tx.query_one("SELECT id FROM course_categories WHERE id = $1 FOR KEY SHARE", &[&id])
            .await
            .unwrap();

        let deleter = {
            let store = store.clone();
            tokio::spawn(async move { store.delete_category(id).await })
        };
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!deleter.is_finished());

        tx.execute(
            "INSERT INTO courses (name, link, description, category_id) VALUES ('late', 'l', 'd', $1)",
            &[&id],
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();

        assert!(deleter.await.unwrap().unwrap());
        assert!(store.get_category(id).await.unwrap().is_none());
        assert_eq!(count(&db, "SELECT COUNT(*) FROM courses WHERE category_id = $1", id).await, 0);

        // Inserts arriving after the delete see no parent.
        assert!(store.create_course(id, &course("after")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tree_and_ping() {
        let Some((store, _db)) = connect().await else { return };
        store.ping().await.unwrap();
        let category = store.create_category(&unique("tree")).await.unwrap();
        store.create_course(category.id, &course("go")).await.unwrap();

        let tree = store.categories_with_courses().await.unwrap();
        let node = tree.iter().find(|c| c.id == category.id).unwrap();
        assert_eq!(node.courses.len(), 1);
        assert_eq!(node.courses[0].name, "go");
    }
}
