use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{Education, NewEducation};
use crate::schema::educations;
use crate::state::AppState;

use super::to_iso;

#[derive(Deserialize)]
pub struct EducationRequest {
    pub entry_title: String,
    pub degree_name: String,
    pub school_name: String,
    pub date_started: NaiveDate,
    pub date_finished: Option<NaiveDate>,
}

#[derive(Serialize)]
pub struct EducationResponse {
    pub id: Uuid,
    pub entry_title: String,
    pub degree_name: String,
    pub school_name: String,
    pub date_started: NaiveDate,
    pub date_finished: Option<NaiveDate>,
    pub created_at: String,
    pub updated_at: String,
}

pub async fn list_educations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<EducationResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<Education> = educations::table
        .filter(educations::user_id.eq(user.user_id))
        .order(educations::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn create_education(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<EducationRequest>,
) -> AppResult<(StatusCode, Json<EducationResponse>)> {
    let (entry_title, degree_name, school_name) = validate(&payload)?;
    let mut conn = state.db()?;

    ensure_unique_title(&mut conn, user.user_id, &entry_title, None)?;

    let new_row = NewEducation {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        entry_title,
        degree_name,
        school_name,
        date_started: payload.date_started,
        date_finished: payload.date_finished,
    };

    diesel::insert_into(educations::table)
        .values(&new_row)
        .execute(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => AppError::conflict("entry title already in use"),
            other => AppError::from(other),
        })?;

    let row: Education = educations::table.find(new_row.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn get_education(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<EducationResponse>> {
    let mut conn = state.db()?;
    let row = find_owned(&mut conn, user.user_id, entry_id)?;
    Ok(Json(to_response(row)))
}

pub async fn update_education(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<EducationRequest>,
) -> AppResult<Json<EducationResponse>> {
    let (entry_title, degree_name, school_name) = validate(&payload)?;
    let mut conn = state.db()?;

    find_owned(&mut conn, user.user_id, entry_id)?;
    ensure_unique_title(&mut conn, user.user_id, &entry_title, Some(entry_id))?;

    diesel::update(educations::table.find(entry_id))
        .set((
            educations::entry_title.eq(&entry_title),
            educations::degree_name.eq(&degree_name),
            educations::school_name.eq(&school_name),
            educations::date_started.eq(payload.date_started),
            educations::date_finished.eq(payload.date_finished),
            educations::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let row: Education = educations::table.find(entry_id).first(&mut conn)?;
    Ok(Json(to_response(row)))
}

pub async fn delete_education(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    find_owned(&mut conn, user.user_id, entry_id)?;
    diesel::delete(educations::table.find(entry_id)).execute(&mut conn)?;
    Ok(StatusCode::NO_CONTENT)
}

fn find_owned(conn: &mut PgConnection, user_id: Uuid, entry_id: Uuid) -> AppResult<Education> {
    educations::table
        .find(entry_id)
        .filter(educations::user_id.eq(user_id))
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
    let mut query = educations::table
        .filter(educations::user_id.eq(user_id))
        .filter(educations::entry_title.eq(entry_title))
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(educations::id.ne(id));
    }
    let duplicate: Option<Uuid> = query.select(educations::id).first(conn).optional()?;
    if duplicate.is_some() {
        return Err(AppError::conflict("entry title already in use"));
    }
    Ok(())
}

fn validate(payload: &EducationRequest) -> AppResult<(String, String, String)> {
    let entry_title = super::bounded_field(&payload.entry_title, "entry_title", 50)?;
    let degree_name = super::bounded_field(&payload.degree_name, "degree_name", 50)?;
    let school_name = super::bounded_field(&payload.school_name, "school_name", 50)?;

    if let Some(finished) = payload.date_finished {
        if finished < payload.date_started {
            return Err(AppError::bad_request(
                "date_finished must not precede date_started",
            ));
        }
    }

    Ok((entry_title, degree_name, school_name))
}

fn to_response(row: Education) -> EducationResponse {
    EducationResponse {
        id: row.id,
        entry_title: row.entry_title,
        degree_name: row.degree_name,
        school_name: row.school_name,
        date_started: row.date_started,
        date_finished: row.date_finished,
        created_at: to_iso(row.created_at),
        updated_at: to_iso(row.updated_at),
    }
}
