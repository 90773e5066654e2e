use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::{dsl::exists, prelude::*, select, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{NewSummary, Summary};
use crate::schema::{built_resumes, summaries};
use crate::state::AppState;

use super::to_iso;

#[derive(Deserialize)]
pub struct SummaryRequest {
    pub entry_title: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub id: Uuid,
    pub entry_title: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

pub async fn list_summaries(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<SummaryResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<Summary> = summaries::table
        .filter(summaries::user_id.eq(user.user_id))
        .order(summaries::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn create_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<SummaryRequest>,
) -> AppResult<(StatusCode, Json<SummaryResponse>)> {
    let entry_title = super::bounded_field(&payload.entry_title, "entry_title", 50)?;
    let content = super::bounded_field(&payload.content, "content", 500)?;
    let mut conn = state.db()?;

    ensure_unique_title(&mut conn, user.user_id, &entry_title, None)?;

    let new_row = NewSummary {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        entry_title,
        content,
    };

    diesel::insert_into(summaries::table)
        .values(&new_row)
        .execute(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => AppError::conflict("entry title already in use"),
            other => AppError::from(other),
        })?;

    let row: Summary = summaries::table.find(new_row.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<SummaryResponse>> {
    let mut conn = state.db()?;
    let row = find_owned(&mut conn, user.user_id, entry_id)?;
    Ok(Json(to_response(row)))
}

pub async fn update_summary(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<SummaryRequest>,
) -> AppResult<Json<SummaryResponse>> {
    let entry_title = super::bounded_field(&payload.entry_title, "entry_title", 50)?;
    let content = super::bounded_field(&payload.content, "content", 500)?;
    let mut conn = state.db()?;

    find_owned(&mut conn, user.user_id, entry_id)?;
    ensure_unique_title(&mut conn, user.user_id, &entry_title, Some(entry_id))?;

    diesel::update(summaries::table.find(entry_id))
        .set((
            summaries::entry_title.eq(&entry_title),
            summaries::content.eq(&content),
            summaries::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let row: Summary = summaries::table.find(entry_id).first(&mut conn)?;
    Ok(Json(to_response(row)))
}

pub async fn delete_summary(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    // Check and delete run in one transaction; a concurrent build that
    // grabs the reference anyway surfaces as the same conflict through
    // the RESTRICT constraint.
    conn.transaction::<(), AppError, _>(|conn| {
        find_owned(conn, user.user_id, entry_id)?;

        let referenced: bool = select(exists(
            built_resumes::table.filter(built_resumes::summary_id.eq(entry_id)),
        ))
        .get_result(conn)?;
        if referenced {
            return Err(AppError::conflict(
                "summary is referenced by a built resume",
            ));
        }

        diesel::delete(summaries::table.find(entry_id))
            .execute(conn)
            .map_err(|err| match err {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                    _,
                ) => AppError::conflict("summary is referenced by a built resume"),
                other => AppError::from(other),
            })?;
        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

fn find_owned(conn: &mut PgConnection, user_id: Uuid, entry_id: Uuid) -> AppResult<Summary> {
    summaries::table
        .find(entry_id)
        .filter(summaries::user_id.eq(user_id))
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
    let mut query = summaries::table
        .filter(summaries::user_id.eq(user_id))
        .filter(summaries::entry_title.eq(entry_title))
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(summaries::id.ne(id));
    }
    let duplicate: Option<Uuid> = query.select(summaries::id).first(conn).optional()?;
    if duplicate.is_some() {
        return Err(AppError::conflict("entry title already in use"));
    }
    Ok(())
}

fn to_response(row: Summary) -> SummaryResponse {
    SummaryResponse {
        id: row.id,
        entry_title: row.entry_title,
        content: row.content,
        created_at: to_iso(row.created_at),
        updated_at: to_iso(row.updated_at),
    }
}
