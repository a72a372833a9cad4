//! Auth routes for administrator login and identity lookup

use axum::{
    Extension, Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::auth::jwt::JwtService;
use crate::auth::middleware::AuthMiddleware;
use crate::auth::models::{AuthUser, LoginForm, TokenResponse};
use crate::error::AppError;
use crate::routes::extract::ApiForm;
use crate::server::AppState;

/// OAuth2 password-flow login against the configured administrator.
///
/// An absent or empty `grant_type` is accepted; any other value than
/// `password` is a 400.
pub async fn login(
    State(app_state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    if let Some(grant_type) = form.grant_type.as_deref().filter(|g| !g.is_empty()) {
        if grant_type != "password" {
            return Err(AppError::BadRequest("Grant type must be password".to_string()));
        }
    }

    let user = match app_state.credentials.authenticate(&form.username, &form.password) {
        Some(user) => user,
        None => {
            tracing::warn!("Failed login attempt");
            return Err(AppError::Unauthenticated("Incorrect email or password"));
        }
    };

    let access_token = app_state.jwt_service.create_token(&user.email)?;
    tracing::info!("Administrator {} logged in", user.email);

    Ok(Json(TokenResponse::new(access_token, user)))
}

/// Identity behind the presented bearer token
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<AuthUser> {
    Json(user)
}

pub fn create_auth_routes(jwt_service: Arc<JwtService>) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(jwt_service, AuthMiddleware::validate_token));

    Router::new()
        .route("/api/auth/login", post(login))
        .merge(protected)
}
