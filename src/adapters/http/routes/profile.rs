use axum::{Json, Router, extract::State, http::HeaderMap, response::IntoResponse, routing::get};
use axum_extra::extract::cookie::CookieJar;
use billing_types::ProfileResponse;
use chrono::Utc;

use crate::{
    adapters::http::{app_state::AppState, session::current_user},
    app_error::AppResult,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_profile))
}

async fn get_profile(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    cookies: CookieJar,
) -> AppResult<impl IntoResponse> {
    let session = current_user(&headers, &cookies, &app_state)?;
    let profile = app_state
        .billing_use_cases
        .get_profile(session.user_id)
        .await?;

    Ok(Json(ProfileResponse {
        user_id: profile.user_id.to_string(),
        membership_status: profile.effective_status(Utc::now()).as_str().to_string(),
        membership_plan: profile.membership_plan,
        membership_expires: profile.membership_expires.map(|t| t.to_rfc3339()),
    }))
}
