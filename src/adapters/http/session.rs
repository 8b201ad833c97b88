use axum::http::{HeaderMap, header::AUTHORIZATION};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Identity taken from a verified session token. The only ownership anchor.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: Option<String>,
}

/// Bearer header first, then the `access_token` cookie.
pub fn current_user(
    headers: &HeaderMap,
    cookies: &CookieJar,
    app_state: &AppState,
) -> AppResult<SessionUser> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let token = match bearer {
        Some(t) => t.to_string(),
        None => cookies
            .get(ACCESS_TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(AppError::InvalidCredentials)?,
    };

    let claims = jwt::verify(&token, &app_state.config.jwt_secret)?;
    Ok(SessionUser {
        user_id: claims.user_id()?,
        email: claims.email,
    })
}
