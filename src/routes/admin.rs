use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::{prelude::*, PgConnection};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::error::{AppError, AppResult};
use crate::models::{InviteCode, NewInviteCode, NewResumeTheme, ResumeTheme, User};
use crate::schema::{built_resumes, invite_codes, resume_themes, users};
use crate::state::AppState;

use super::to_iso;

const INVITE_CODE_LENGTH: usize = 20;

#[derive(Deserialize)]
pub struct ThemeRequest {
    pub name: String,
    pub description: Option<String>,
    pub styles: String,
}

#[derive(Serialize)]
pub struct ThemeResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub styles: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Deserialize)]
pub struct InviteCodeRequest {
    pub description: String,
}

#[derive(Serialize)]
pub struct InviteCodeResponse {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub redeemed: bool,
    pub redeemed_by: Option<Uuid>,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct AdminUserResponse {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub resume_count: i64,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

pub async fn list_themes(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<ThemeResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<ResumeTheme> = resume_themes::table
        .order(resume_themes::name.asc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(theme_response).collect()))
}

pub async fn create_theme(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<ThemeRequest>,
) -> AppResult<(StatusCode, Json<ThemeResponse>)> {
    let name = super::bounded_field(&payload.name, "name", 50)?;
    let styles = super::require_field(&payload.styles, "styles")?;
    let description = super::optional_bounded_field(payload.description, "description", 200)?;
    let mut conn = state.db()?;

    ensure_unique_name(&mut conn, &name, None)?;

    let new_theme = NewResumeTheme {
        id: Uuid::new_v4(),
        name,
        description,
        styles,
    };

    diesel::insert_into(resume_themes::table)
        .values(&new_theme)
        .execute(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => AppError::conflict("theme name already in use"),
            other => AppError::from(other),
        })?;

    let row: ResumeTheme = resume_themes::table.find(new_theme.id).first(&mut conn)?;
    tracing::info!(theme_id = %row.id, name = %row.name, "created theme");
    Ok((StatusCode::CREATED, Json(theme_response(row))))
}

pub async fn get_theme(
    State(state): State<AppState>,
    Path(theme_id): Path<Uuid>,
    _admin: AdminUser,
) -> AppResult<Json<ThemeResponse>> {
    let mut conn = state.db()?;
    let row: ResumeTheme = resume_themes::table
        .find(theme_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;
    Ok(Json(theme_response(row)))
}

pub async fn update_theme(
    State(state): State<AppState>,
    Path(theme_id): Path<Uuid>,
    _admin: AdminUser,
    Json(payload): Json<ThemeRequest>,
) -> AppResult<Json<ThemeResponse>> {
    let name = super::bounded_field(&payload.name, "name", 50)?;
    let styles = super::require_field(&payload.styles, "styles")?;
    let description = super::optional_bounded_field(payload.description, "description", 200)?;
    let mut conn = state.db()?;

    let existing: Option<Uuid> = resume_themes::table
        .find(theme_id)
        .select(resume_themes::id)
        .first(&mut conn)
        .optional()?;
    if existing.is_none() {
        return Err(AppError::not_found());
    }
    ensure_unique_name(&mut conn, &name, Some(theme_id))?;

    diesel::update(resume_themes::table.find(theme_id))
        .set((
            resume_themes::name.eq(&name),
            resume_themes::description.eq(&description),
            resume_themes::styles.eq(&styles),
            resume_themes::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let row: ResumeTheme = resume_themes::table.find(theme_id).first(&mut conn)?;
    Ok(Json(theme_response(row)))
}

pub async fn delete_theme(
    State(state): State<AppState>,
    Path(theme_id): Path<Uuid>,
    _admin: AdminUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    // A theme in use by any built resume stays; deleting it would orphan
    // every resume that renders with it. Check and delete share a
    // transaction; a build racing past the check lands on the same
    // conflict via the RESTRICT constraint.
    conn.transaction::<(), AppError, _>(|conn| {
        let existing: Option<Uuid> = resume_themes::table
            .find(theme_id)
            .select(resume_themes::id)
            .first(conn)
            .optional()?;
        if existing.is_none() {
            return Err(AppError::not_found());
        }

        let in_use: i64 = built_resumes::table
            .filter(built_resumes::theme_id.eq(theme_id))
            .count()
            .get_result(conn)?;
        if in_use > 0 {
            return Err(AppError::conflict("theme is referenced by a built resume"));
        }

        diesel::delete(resume_themes::table.find(theme_id))
            .execute(conn)
            .map_err(|err| match err {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                    _,
                ) => AppError::conflict("theme is referenced by a built resume"),
                other => AppError::from(other),
            })?;
        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_invite_codes(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<InviteCodeResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<InviteCode> = invite_codes::table
        .order(invite_codes::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(invite_code_response).collect()))
}

pub async fn create_invite_code(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(payload): Json<InviteCodeRequest>,
) -> AppResult<(StatusCode, Json<InviteCodeResponse>)> {
    let description = super::bounded_field(&payload.description, "description", 200)?;
    let mut conn = state.db()?;

    let new_code = NewInviteCode {
        id: Uuid::new_v4(),
        code: generate_code(),
        description,
    };

    diesel::insert_into(invite_codes::table)
        .values(&new_code)
        .execute(&mut conn)?;

    let row: InviteCode = invite_codes::table.find(new_code.id).first(&mut conn)?;
    tracing::info!(invite_id = %row.id, "created invite code");
    Ok((StatusCode::CREATED, Json(invite_code_response(row))))
}

pub async fn delete_invite_code(
    State(state): State<AppState>,
    Path(invite_id): Path<Uuid>,
    _admin: AdminUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    let row: InviteCode = invite_codes::table
        .find(invite_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    // A redeemed code is part of the registration audit trail.
    if row.redeemed {
        return Err(AppError::conflict("invite code has been redeemed"));
    }

    diesel::delete(invite_codes::table.find(invite_id)).execute(&mut conn)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> AppResult<Json<Vec<AdminUserResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<User> = users::table.order(users::created_at.asc()).load(&mut conn)?;
    let counts: Vec<(Uuid, i64)> = built_resumes::table
        .group_by(built_resumes::user_id)
        .select((built_resumes::user_id, diesel::dsl::count_star()))
        .load(&mut conn)?;

    let responses = rows
        .into_iter()
        .map(|user| {
            let resume_count = counts
                .iter()
                .find(|(id, _)| *id == user.id)
                .map(|(_, count)| *count)
                .unwrap_or(0);
            AdminUserResponse {
                id: user.id,
                username: user.username,
                is_admin: user.is_admin,
                is_active: user.is_active,
                resume_count,
                created_at: to_iso(user.created_at),
            }
        })
        .collect();

    Ok(Json(responses))
}

pub async fn set_user_active(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    admin: AdminUser,
    Json(payload): Json<SetActiveRequest>,
) -> AppResult<Json<AdminUserResponse>> {
    let mut conn = state.db()?;

    // An admin locking themselves out is unrecoverable without direct
    // database access.
    if user_id == admin.0.user_id && !payload.is_active {
        return Err(AppError::conflict("cannot deactivate your own account"));
    }

    let existing: Option<Uuid> = users::table
        .find(user_id)
        .select(users::id)
        .first(&mut conn)
        .optional()?;
    if existing.is_none() {
        return Err(AppError::not_found());
    }

    diesel::update(users::table.find(user_id))
        .set((
            users::is_active.eq(payload.is_active),
            users::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let user: User = users::table.find(user_id).first(&mut conn)?;
    let resume_count: i64 = built_resumes::table
        .filter(built_resumes::user_id.eq(user.id))
        .count()
        .get_result(&mut conn)?;

    tracing::info!(target_user = %user.id, is_active = user.is_active, "updated account status");

    Ok(Json(AdminUserResponse {
        id: user.id,
        username: user.username,
        is_admin: user.is_admin,
        is_active: user.is_active,
        resume_count,
        created_at: to_iso(user.created_at),
    }))
}

fn ensure_unique_name(conn: &mut PgConnection, name: &str, exclude: Option<Uuid>) -> AppResult<()> {
    let mut query = resume_themes::table
        .filter(resume_themes::name.eq(name))
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(resume_themes::id.ne(id));
    }
    let duplicate: Option<Uuid> = query.select(resume_themes::id).first(conn).optional()?;
    if duplicate.is_some() {
        return Err(AppError::conflict("theme name already in use"));
    }
    Ok(())
}

fn generate_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(INVITE_CODE_LENGTH)
        .map(char::from)
        .collect()
}

fn theme_response(row: ResumeTheme) -> ThemeResponse {
    ThemeResponse {
        id: row.id,
        name: row.name,
        description: row.description,
        styles: row.styles,
        created_at: to_iso(row.created_at),
        updated_at: to_iso(row.updated_at),
    }
}

fn invite_code_response(row: InviteCode) -> InviteCodeResponse {
    InviteCodeResponse {
        id: row.id,
        code: row.code,
        description: row.description,
        redeemed: row.redeemed,
        redeemed_by: row.user_id,
        created_at: to_iso(row.created_at),
    }
}
