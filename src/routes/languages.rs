use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{Language, NewLanguage};
use crate::schema::languages;
use crate::state::AppState;

use super::to_iso;

#[derive(Deserialize)]
pub struct LanguageRequest {
    pub entry_title: String,
    pub name: String,
    pub proficiency: String,
}

#[derive(Serialize)]
pub struct LanguageResponse {
    pub id: Uuid,
    pub entry_title: String,
    pub name: String,
    pub proficiency: String,
    pub created_at: String,
    pub updated_at: String,
}

pub async fn list_languages(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<LanguageResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<Language> = languages::table
        .filter(languages::user_id.eq(user.user_id))
        .order(languages::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn create_language(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<LanguageRequest>,
) -> AppResult<(StatusCode, Json<LanguageResponse>)> {
    let entry_title = super::bounded_field(&payload.entry_title, "entry_title", 50)?;
    let name = super::bounded_field(&payload.name, "name", 30)?;
    let proficiency = super::bounded_field(&payload.proficiency, "proficiency", 30)?;
    let mut conn = state.db()?;

    ensure_unique_title(&mut conn, user.user_id, &entry_title, None)?;

    let new_row = NewLanguage {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        entry_title,
        name,
        proficiency,
    };

    diesel::insert_into(languages::table)
        .values(&new_row)
        .execute(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => AppError::conflict("entry title already in use"),
            other => AppError::from(other),
        })?;

    let row: Language = languages::table.find(new_row.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn get_language(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<LanguageResponse>> {
    let mut conn = state.db()?;
    let row = find_owned(&mut conn, user.user_id, entry_id)?;
    Ok(Json(to_response(row)))
}

pub async fn update_language(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<LanguageRequest>,
) -> AppResult<Json<LanguageResponse>> {
    let entry_title = super::bounded_field(&payload.entry_title, "entry_title", 50)?;
    let name = super::bounded_field(&payload.name, "name", 30)?;
    let proficiency = super::bounded_field(&payload.proficiency, "proficiency", 30)?;
    let mut conn = state.db()?;

    find_owned(&mut conn, user.user_id, entry_id)?;
    ensure_unique_title(&mut conn, user.user_id, &entry_title, Some(entry_id))?;

    diesel::update(languages::table.find(entry_id))
        .set((
            languages::entry_title.eq(&entry_title),
            languages::name.eq(&name),
            languages::proficiency.eq(&proficiency),
            languages::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let row: Language = languages::table.find(entry_id).first(&mut conn)?;
    Ok(Json(to_response(row)))
}

pub async fn delete_language(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    find_owned(&mut conn, user.user_id, entry_id)?;
    diesel::delete(languages::table.find(entry_id)).execute(&mut conn)?;
    Ok(StatusCode::NO_CONTENT)
}

fn find_owned(conn: &mut PgConnection, user_id: Uuid, entry_id: Uuid) -> AppResult<Language> {
    languages::table
        .find(entry_id)
        .filter(languages::user_id.eq(user_id))
        .first(conn)
        .optional()?
        .ok_or_else(AppError::not_found)
}

fn ensure_unique_title(
    conn: &mut PgConnection,
    user_id: Uuid,
    entry_title: &str,
    exclude: Option<Uuid>,
) -> AppResult<()> {
    let mut query = languages::table
        .filter(languages::user_id.eq(user_id))
        .filter(languages::entry_title.eq(entry_title))
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(languages::id.ne(id));
    }
    let duplicate: Option<Uuid> = query.select(languages::id).first(conn).optional()?;
    if duplicate.is_some() {
        return Err(AppError::conflict("entry title already in use"));
    }
    Ok(())
}

fn to_response(row: Language) -> LanguageResponse {
    LanguageResponse {
        id: row.id,
        entry_title: row.entry_title,
        name: row.name,
        proficiency: row.proficiency,
        created_at: to_iso(row.created_at),
        updated_at: to_iso(row.updated_at),
    }
}
