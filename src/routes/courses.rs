//! Catalog routes: course categories and courses.
//!
//! Every route here requires the administrator bearer token.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::get,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::jwt::JwtService;
use crate::auth::middleware::AuthMiddleware;
use crate::database::{CategoryInput, CategoryWithCourses, Course, CourseCategory, CourseInput};
use crate::error::AppError;
use crate::routes::extract::{ApiJson, ApiPath, ApiQuery};
use crate::server::AppState;
use crate::services::CatalogService;

/// `?skip=&limit=` on list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// `?category_id=` on course creation
#[derive(Debug, Deserialize)]
pub struct CourseParentQuery {
    pub category_id: i32,
}

// ---- categories ----

pub async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Vec<CourseCategory>>, AppError> {
    let page = CatalogService::page(query.skip, query.limit)?;
    Ok(Json(state.catalog.list_categories(page).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<(StatusCode, Json<CourseCategory>), AppError> {
    let category = state.catalog.create_category(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<CourseCategory>, AppError> {
    Ok(Json(state.catalog.get_category(id).await?))
}

pub async fn update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> Result<Json<CourseCategory>, AppError> {
    Ok(Json(state.catalog.update_category(id, input).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn categories_with_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryWithCourses>>, AppError> {
    Ok(Json(state.catalog.categories_with_courses().await?))
}

// ---- courses ----

pub async fn list_courses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> Result<Json<Vec<Course>>, AppError> {
    let page = CatalogService::page(query.skip, query.limit)?;
    Ok(Json(state.catalog.list_courses(page).await?))
}

pub async fn create_course(
    State(state): State<AppState>,
    ApiQuery(parent): ApiQuery<CourseParentQuery>,
    ApiJson(input): ApiJson<CourseInput>,
) -> Result<(StatusCode, Json<Course>), AppError> {
    let course = state.catalog.create_course(parent.category_id, input).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn get_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(state.catalog.get_course(id).await?))
}

pub async fn update_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(input): ApiJson<CourseInput>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(state.catalog.update_course(id, input).await?))
}

pub async fn delete_course(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_course(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn create_course_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    Router::new()
        .route("/api/courses/categories", get(list_categories).post(create_category))
        .route("/api/courses/categories/", get(list_categories).post(create_category))
        .route(
            "/api/courses/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/api/courses/with-courses", get(categories_with_courses))
        .route("/api/courses/with-courses/", get(categories_with_courses))
        .route("/api/courses", get(list_courses).post(create_course))
        .route("/api/courses/", get(list_courses).post(create_course))
        .route(
            "/api/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route_layer(middleware::from_fn_with_state(jwt_service, AuthMiddleware::validate_token))
}
