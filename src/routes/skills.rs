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
use crate::models::{NewSkill, Skill};
use crate::schema::skills;
use crate::state::AppState;

use super::to_iso;

#[derive(Deserialize)]
pub struct SkillRequest {
    pub entry_title: String,
    pub skill_group_title: String,
    pub description: String,
}

#[derive(Serialize)]
pub struct SkillResponse {
    pub id: Uuid,
    pub entry_title: String,
    pub skill_group_title: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

pub async fn list_skills(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<SkillResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<Skill> = skills::table
        .filter(skills::user_id.eq(user.user_id))
        .order(skills::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn create_skill(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<SkillRequest>,
) -> AppResult<(StatusCode, Json<SkillResponse>)> {
    let entry_title = super::bounded_field(&payload.entry_title, "entry_title", 50)?;
    let skill_group_title = super::bounded_field(&payload.skill_group_title, "skill_group_title", 50)?;
    let description = super::bounded_field(&payload.description, "description", 500)?;
    let mut conn = state.db()?;

    ensure_unique_title(&mut conn, user.user_id, &entry_title, None)?;

    let new_row = NewSkill {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        entry_title,
        skill_group_title,
        description,
    };

    diesel::insert_into(skills::table)
        .values(&new_row)
        .execute(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => AppError::conflict("entry title already in use"),
            other => AppError::from(other),
        })?;

    let row: Skill = skills::table.find(new_row.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn get_skill(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<SkillResponse>> {
    let mut conn = state.db()?;
    let row = find_owned(&mut conn, user.user_id, entry_id)?;
    Ok(Json(to_response(row)))
}

pub async fn update_skill(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<SkillRequest>,
) -> AppResult<Json<SkillResponse>> {
    let entry_title = super::bounded_field(&payload.entry_title, "entry_title", 50)?;
    let skill_group_title = super::bounded_field(&payload.skill_group_title, "skill_group_title", 50)?;
    let description = super::bounded_field(&payload.description, "description", 500)?;
    let mut conn = state.db()?;

    find_owned(&mut conn, user.user_id, entry_id)?;
    ensure_unique_title(&mut conn, user.user_id, &entry_title, Some(entry_id))?;

    diesel::update(skills::table.find(entry_id))
        .set((
            skills::entry_title.eq(&entry_title),
            skills::skill_group_title.eq(&skill_group_title),
            skills::description.eq(&description),
            skills::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let row: Skill = skills::table.find(entry_id).first(&mut conn)?;
    Ok(Json(to_response(row)))
}

pub async fn delete_skill(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    find_owned(&mut conn, user.user_id, entry_id)?;
    diesel::delete(skills::table.find(entry_id)).execute(&mut conn)?;
    Ok(StatusCode::NO_CONTENT)
}

fn find_owned(conn: &mut PgConnection, user_id: Uuid, entry_id: Uuid) -> AppResult<Skill> {
    skills::table
        .find(entry_id)
        .filter(skills::user_id.eq(user_id))
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
    let mut query = skills::table
        .filter(skills::user_id.eq(user_id))
        .filter(skills::entry_title.eq(entry_title))
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(skills::id.ne(id));
    }
    let duplicate: Option<Uuid> = query.select(skills::id).first(conn).optional()?;
    if duplicate.is_some() {
        return Err(AppError::conflict("entry title already in use"));
    }
    Ok(())
}

fn to_response(row: Skill) -> SkillResponse {
    SkillResponse {
        id: row.id,
        entry_title: row.entry_title,
        skill_group_title: row.skill_group_title,
        description: row.description,
        created_at: to_iso(row.created_at),
        updated_at: to_iso(row.updated_at),
    }
}
