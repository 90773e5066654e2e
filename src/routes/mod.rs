use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use chrono::NaiveDateTime;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::{AppError, AppResult};
use crate::{auth::AuthenticatedUser, state::AppState};

pub mod admin;
pub mod auth;
pub mod basic_infos;
pub mod educations;
pub mod experiences;
pub mod health;
pub mod languages;
pub mod resumes;
pub mod skills;
pub mod summaries;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        let allow_origin = AllowOrigin::list(headers);

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/register/invite", post(auth::register_with_invite_code))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    let basic_infos_routes = Router::new()
        .route(
            "/",
            get(basic_infos::list_basic_infos).post(basic_infos::create_basic_info),
        )
        .route(
            "/:id",
            get(basic_infos::get_basic_info)
                .patch(basic_infos::update_basic_info)
                .delete(basic_infos::delete_basic_info),
        );

    let summaries_routes = Router::new()
        .route(
            "/",
            get(summaries::list_summaries).post(summaries::create_summary),
        )
        .route(
            "/:id",
            get(summaries::get_summary)
                .patch(summaries::update_summary)
                .delete(summaries::delete_summary),
        );

    let experiences_routes = Router::new()
        .route(
            "/",
            get(experiences::list_experiences).post(experiences::create_experience),
        )
        .route(
            "/:id",
            get(experiences::get_experience)
                .patch(experiences::update_experience)
                .delete(experiences::delete_experience),
        );

    let educations_routes = Router::new()
        .route(
            "/",
            get(educations::list_educations).post(educations::create_education),
        )
        .route(
            "/:id",
            get(educations::get_education)
                .patch(educations::update_education)
                .delete(educations::delete_education),
        );

    let skills_routes = Router::new()
        .route("/", get(skills::list_skills).post(skills::create_skill))
        .route(
            "/:id",
            get(skills::get_skill)
                .patch(skills::update_skill)
                .delete(skills::delete_skill),
        );

    let languages_routes = Router::new()
        .route(
            "/",
            get(languages::list_languages).post(languages::create_language),
        )
        .route(
            "/:id",
            get(languages::get_language)
                .patch(languages::update_language)
                .delete(languages::delete_language),
        );

    let resumes_routes = Router::new()
        .route("/", get(resumes::list_resumes).post(resumes::build_resume))
        .route("/choices", get(resumes::composer_choices))
        .route(
            "/:id",
            get(resumes::get_resume)
                .patch(resumes::update_resume)
                .delete(resumes::delete_resume),
        )
        .route("/:id/download", get(resumes::download_resume));

    let admin_routes = Router::new()
        .route("/themes", get(admin::list_themes).post(admin::create_theme))
        .route(
            "/themes/:id",
            get(admin::get_theme)
                .patch(admin::update_theme)
                .delete(admin::delete_theme),
        )
        .route(
            "/invite-codes",
            get(admin::list_invite_codes).post(admin::create_invite_code),
        )
        .route("/invite-codes/:id", axum::routing::delete(admin::delete_invite_code))
        .route("/users", get(admin::list_users))
        .route("/users/:id/active", axum::routing::patch(admin::set_user_active));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/basic_infos", basic_infos_routes)
        .nest("/api/summaries", summaries_routes)
        .nest("/api/experiences", experiences_routes)
        .nest("/api/educations", educations_routes)
        .nest("/api/skills", skills_routes)
        .nest("/api/languages", languages_routes)
        .nest("/api/resumes", resumes_routes)
        .nest("/api/admin", admin_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 2))
}

pub(crate) fn to_iso(timestamp: NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Trims and rejects empty required text fields.
pub(crate) fn require_field(value: &str, name: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{name} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Required field with an upper length bound. Over-long input is a 400, not
/// a database truncation error.
pub(crate) fn bounded_field(value: &str, name: &str, max: usize) -> AppResult<String> {
    let trimmed = require_field(value, name)?;
    check_max_length(&trimmed, name, max)?;
    Ok(trimmed)
}

/// Trims an optional field, collapsing empty input to None.
pub(crate) fn optional_field(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Optional field with an upper length bound.
pub(crate) fn optional_bounded_field(
    value: Option<String>,
    name: &str,
    max: usize,
) -> AppResult<Option<String>> {
    match optional_field(value) {
        Some(trimmed) => {
            check_max_length(&trimmed, name, max)?;
            Ok(Some(trimmed))
        }
        None => Ok(None),
    }
}

pub(crate) fn check_max_length(value: &str, name: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::bad_request(format!(
            "{name} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Shallow shape check, not RFC validation: one '@' with text on both
/// sides and a dot somewhere after it.
pub(crate) fn looks_like_email(value: &str) -> bool {
    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
