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
use crate::models::{BasicInfo, NewBasicInfo};
use crate::schema::{basic_infos, built_resumes};
use crate::state::AppState;

use super::to_iso;

#[derive(Deserialize)]
pub struct BasicInfoRequest {
    pub entry_title: String,
    pub full_name: String,
    pub job_title: String,
    pub address: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
}

#[derive(Serialize)]
pub struct BasicInfoResponse {
    pub id: Uuid,
    pub entry_title: String,
    pub full_name: String,
    pub job_title: String,
    pub address: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

struct ValidatedBasicInfo {
    entry_title: String,
    full_name: String,
    job_title: String,
    address: String,
    contact_email: String,
    contact_phone: String,
    linkedin_url: Option<String>,
    github_url: Option<String>,
}

pub async fn list_basic_infos(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<BasicInfoResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<BasicInfo> = basic_infos::table
        .filter(basic_infos::user_id.eq(user.user_id))
        .order(basic_infos::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(rows.into_iter().map(to_response).collect()))
}

pub async fn create_basic_info(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<BasicInfoRequest>,
) -> AppResult<(StatusCode, Json<BasicInfoResponse>)> {
    let fields = validate(payload)?;
    let mut conn = state.db()?;

    ensure_unique_title(&mut conn, user.user_id, &fields.entry_title, None)?;

    let new_row = NewBasicInfo {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        entry_title: fields.entry_title,
        full_name: fields.full_name,
        job_title: fields.job_title,
        address: fields.address,
        contact_email: fields.contact_email,
        contact_phone: fields.contact_phone,
        linkedin_url: fields.linkedin_url,
        github_url: fields.github_url,
    };

    insert_checked(&mut conn, &new_row)?;

    let row: BasicInfo = basic_infos::table.find(new_row.id).first(&mut conn)?;
    Ok((StatusCode::CREATED, Json(to_response(row))))
}

pub async fn get_basic_info(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<BasicInfoResponse>> {
    let mut conn = state.db()?;
    let row = find_owned(&mut conn, user.user_id, entry_id)?;
    Ok(Json(to_response(row)))
}

pub async fn update_basic_info(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<BasicInfoRequest>,
) -> AppResult<Json<BasicInfoResponse>> {
    let fields = validate(payload)?;
    let mut conn = state.db()?;

    find_owned(&mut conn, user.user_id, entry_id)?;
    ensure_unique_title(&mut conn, user.user_id, &fields.entry_title, Some(entry_id))?;

    diesel::update(basic_infos::table.find(entry_id))
        .set((
            basic_infos::entry_title.eq(&fields.entry_title),
            basic_infos::full_name.eq(&fields.full_name),
            basic_infos::job_title.eq(&fields.job_title),
            basic_infos::address.eq(&fields.address),
            basic_infos::contact_email.eq(&fields.contact_email),
            basic_infos::contact_phone.eq(&fields.contact_phone),
            basic_infos::linkedin_url.eq(&fields.linkedin_url),
            basic_infos::github_url.eq(&fields.github_url),
            basic_infos::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut conn)?;

    let row: BasicInfo = basic_infos::table.find(entry_id).first(&mut conn)?;
    Ok(Json(to_response(row)))
}

pub async fn delete_basic_info(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    // Singular reference from built resumes is RESTRICT: refuse while any
    // resume still points here instead of surfacing a raw FK violation.
    // The check and the delete share a transaction, and a build that
    // slips in between still lands on the same conflict via the FK error.
    conn.transaction::<(), AppError, _>(|conn| {
        find_owned(conn, user.user_id, entry_id)?;

        let referenced: bool = select(exists(
            built_resumes::table.filter(built_resumes::basic_info_id.eq(entry_id)),
        ))
        .get_result(conn)?;
        if referenced {
            return Err(AppError::conflict(
                "basic info is referenced by a built resume",
            ));
        }

        diesel::delete(basic_infos::table.find(entry_id))
            .execute(conn)
            .map_err(|err| match err {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::ForeignKeyViolation,
                    _,
                ) => AppError::conflict("basic info is referenced by a built resume"),
                other => AppError::from(other),
            })?;
        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

fn find_owned(conn: &mut PgConnection, user_id: Uuid, entry_id: Uuid) -> AppResult<BasicInfo> {
    // Ownership scoping: the query itself filters by owner, so another
    // user's entry is indistinguishable from a missing one.
    basic_infos::table
        .find(entry_id)
        .filter(basic_infos::user_id.eq(user_id))
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
    let mut query = basic_infos::table
        .filter(basic_infos::user_id.eq(user_id))
        .filter(basic_infos::entry_title.eq(entry_title))
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(basic_infos::id.ne(id));
    }
    let duplicate: Option<Uuid> = query.select(basic_infos::id).first(conn).optional()?;
    if duplicate.is_some() {
        return Err(AppError::conflict("entry title already in use"));
    }
    Ok(())
}

fn insert_checked(conn: &mut PgConnection, new_row: &NewBasicInfo) -> AppResult<()> {
    diesel::insert_into(basic_infos::table)
        .values(new_row)
        .execute(conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => AppError::conflict("entry title already in use"),
            other => AppError::from(other),
        })?;
    Ok(())
}

fn validate(payload: BasicInfoRequest) -> AppResult<ValidatedBasicInfo> {
    let entry_title = super::bounded_field(&payload.entry_title, "entry_title", 50)?;
    let full_name = super::bounded_field(&payload.full_name, "full_name", 50)?;
    let job_title = super::bounded_field(&payload.job_title, "job_title", 50)?;
    let address = super::bounded_field(&payload.address, "address", 50)?;
    let contact_email = super::bounded_field(&payload.contact_email, "contact_email", 30)?;
    let contact_phone = super::bounded_field(&payload.contact_phone, "contact_phone", 30)?;

    if !super::looks_like_email(&contact_email) {
        return Err(AppError::bad_request(
            "contact_email must be a valid email address",
        ));
    }

    Ok(ValidatedBasicInfo {
        entry_title,
        full_name,
        job_title,
        address,
        contact_email,
        contact_phone,
        linkedin_url: super::optional_bounded_field(payload.linkedin_url, "linkedin_url", 100)?,
        github_url: super::optional_bounded_field(payload.github_url, "github_url", 100)?,
    })
}

fn to_response(row: BasicInfo) -> BasicInfoResponse {
    BasicInfoResponse {
        id: row.id,
        entry_title: row.entry_title,
        full_name: row.full_name,
        job_title: row.job_title,
        address: row.address,
        contact_email: row.contact_email,
        contact_phone: row.contact_phone,
        linkedin_url: row.linkedin_url,
        github_url: row.github_url,
        created_at: to_iso(row.created_at),
        updated_at: to_iso(row.updated_at),
    }
}
