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
use crate::markdown::render_markdown;
use crate::models::{Experience, NewExperience};
use crate::schema::experiences;
use crate::state::AppState;

use super::to_iso;

#[derive(Deserialize)]
pub struct ExperienceRequest {
    pub entry_title: String,
    pub job_title: String,
    pub company_name: String,
    pub date_started: NaiveDate,
    pub date_finished: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize)]
pub struct ExperienceResponse {
    pub id: Uuid,
    pub entry_title: String,
    pub job_title: String,
    pub company_name: String,
    pub date_started: NaiveDate,
    pub date_finished: Option<NaiveDate>,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

struct ValidatedExperience {
    entry_title: String,
    job_title: String,
    company_name: String,
    date_started: NaiveDate,
    date_finished: Option<NaiveDate>,
    description: String,
}

pub async fn list_experiences(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<ExperienceResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<Experience> = experiences::table
        .filter(experiences::user_id.eq(user.user_id))
        .order(experiences::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn create_experience(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<ExperienceRequest>,
) -> AppResult<(StatusCode, Json<ExperienceResponse>)> {
    let fields = validate(payload)?;
    let mut conn = state.db()?;

    ensure_unique_title(&mut conn, user.user_id, &fields.entry_title, None)?;

    let new_row = NewExperience {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        entry_title: fields.entry_title,
        job_title: fields.job_title,
        company_name: fields.company_name,
        date_started: fields.date_started,
        date_finished: fields.date_finished,
        description: fields.description,
    };

    diesel::insert_into(experiences::table)
        .values(&new_row)
        .execute(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => AppError::conflict("entry title already in use"),
            other => AppError::from(other),
        })?;

    let row: Experience = experiences::table.find(new_row.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn get_experience(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<ExperienceResponse>> {
    let mut conn = state.db()?;
    let row = find_owned(&mut conn, user.user_id, entry_id)?;
    Ok(Json(to_response(row)))
}

pub async fn update_experience(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<ExperienceRequest>,
) -> AppResult<Json<ExperienceResponse>> {
    let fields = validate(payload)?;
    let mut conn = state.db()?;

    find_owned(&mut conn, user.user_id, entry_id)?;
    ensure_unique_title(&mut conn, user.user_id, &fields.entry_title, Some(entry_id))?;

    diesel::update(experiences::table.find(entry_id))
        .set((
            experiences::entry_title.eq(&fields.entry_title),
            experiences::job_title.eq(&fields.job_title),
            experiences::company_name.eq(&fields.company_name),
            experiences::date_started.eq(fields.date_started),
            experiences::date_finished.eq(fields.date_finished),
            experiences::description.eq(&fields.description),
            experiences::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let row: Experience = experiences::table.find(entry_id).first(&mut conn)?;
    Ok(Json(to_response(row)))
}

pub async fn delete_experience(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    find_owned(&mut conn, user.user_id, entry_id)?;

    // Association rows in resume_experiences go with it (ON DELETE CASCADE);
    // referencing built resumes stay behind and simply lose the entry.
    diesel::delete(experiences::table.find(entry_id)).execute(&mut conn)?;
    Ok(StatusCode::NO_CONTENT)
}

fn find_owned(conn: &mut PgConnection, user_id: Uuid, entry_id: Uuid) -> AppResult<Experience> {
    experiences::table
        .find(entry_id)
        .filter(experiences::user_id.eq(user_id))
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
    let mut query = experiences::table
        .filter(experiences::user_id.eq(user_id))
        .filter(experiences::entry_title.eq(entry_title))
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(experiences::id.ne(id));
    }
    let duplicate: Option<Uuid> = query.select(experiences::id).first(conn).optional()?;
    if duplicate.is_some() {
        return Err(AppError::conflict("entry title already in use"));
    }
    Ok(())
}

fn validate(payload: ExperienceRequest) -> AppResult<ValidatedExperience> {
    let entry_title = super::bounded_field(&payload.entry_title, "entry_title", 50)?;
    let job_title = super::bounded_field(&payload.job_title, "job_title", 50)?;
    let company_name = super::bounded_field(&payload.company_name, "company_name", 50)?;

    if let Some(finished) = payload.date_finished {
        if finished < payload.date_started {
            return Err(AppError::bad_request(
                "date_finished must not precede date_started",
            ));
        }
    }

    // The limit applies to the submitted markdown, not the expanded HTML.
    super::check_max_length(payload.description.trim(), "description", 2000)?;

    // Markdown is converted and sanitized once, at write time; the stored
    // description is the HTML the renderer will embed verbatim.
    let description = render_markdown(payload.description.trim());

    Ok(ValidatedExperience {
        entry_title,
        job_title,
        company_name,
        date_started: payload.date_started,
        date_finished: payload.date_finished,
        description,
    })
}

fn to_response(row: Experience) -> ExperienceResponse {
    ExperienceResponse {
        id: row.id,
        entry_title: row.entry_title,
        job_title: row.job_title,
        company_name: row.company_name,
        date_started: row.date_started,
        date_finished: row.date_finished,
        description: row.description,
        created_at: to_iso(row.created_at),
        updated_at: to_iso(row.updated_at),
    }
}
