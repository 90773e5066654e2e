use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{
    BasicInfo, BuiltResume, Education, Experience, Language, NewBuiltResume, ResumeEducation,
    ResumeExperience, ResumeLanguage, ResumeSkill, ResumeTheme, Skill, Summary,
};
use crate::render::{attachment_filename, render_resume};
use crate::schema::{
    basic_infos, built_resumes, educations, experiences, languages, resume_educations,
    resume_experiences, resume_languages, resume_skills, resume_themes, skills, summaries,
};
use crate::state::AppState;

use super::to_iso;

#[derive(Deserialize)]
pub struct BuildResumeRequest {
    pub entry_title: String,
    pub basic_info_id: Uuid,
    pub summary_id: Uuid,
    pub theme_id: Uuid,
    #[serde(default)]
    pub experience_ids: Vec<Uuid>,
    #[serde(default)]
    pub education_ids: Vec<Uuid>,
    #[serde(default)]
    pub skill_ids: Vec<Uuid>,
    #[serde(default)]
    pub language_ids: Vec<Uuid>,
}

#[derive(Serialize)]
pub struct ResumeSummaryResponse {
    pub id: Uuid,
    pub entry_title: String,
    pub theme_id: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct SelectionEntry {
    pub id: Uuid,
    pub entry_title: String,
}

#[derive(Serialize)]
pub struct ResumeDetailResponse {
    pub id: Uuid,
    pub entry_title: String,
    pub basic_info: SelectionEntry,
    pub summary: SelectionEntry,
    pub theme: ThemeEntry,
    pub experiences: Vec<SelectionEntry>,
    pub educations: Vec<SelectionEntry>,
    pub skills: Vec<SelectionEntry>,
    pub languages: Vec<SelectionEntry>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Serialize)]
pub struct ThemeEntry {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize)]
pub struct ComposerChoicesResponse {
    pub basic_infos: Vec<SelectionEntry>,
    pub summaries: Vec<SelectionEntry>,
    pub experiences: Vec<SelectionEntry>,
    pub educations: Vec<SelectionEntry>,
    pub skills: Vec<SelectionEntry>,
    pub languages: Vec<SelectionEntry>,
    pub themes: Vec<ThemeEntry>,
}

/// Validated form of a build/update payload: every id has been resolved
/// against the caller's own collections, plural lists deduplicated.
struct ResolvedSelections {
    entry_title: String,
    basic_info_id: Uuid,
    summary_id: Uuid,
    theme_id: Uuid,
    experience_ids: Vec<Uuid>,
    education_ids: Vec<Uuid>,
    skill_ids: Vec<Uuid>,
    language_ids: Vec<Uuid>,
}

pub async fn list_resumes(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<ResumeSummaryResponse>>> {
    let mut conn = state.db()?;

    let rows: Vec<BuiltResume> = built_resumes::table
        .filter(built_resumes::user_id.eq(user.user_id))
        .order(built_resumes::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(
        rows.into_iter()
            .map(|row| ResumeSummaryResponse {
                id: row.id,
                entry_title: row.entry_title,
                theme_id: row.theme_id,
                created_at: to_iso(row.created_at),
                updated_at: to_iso(row.updated_at),
            })
            .collect(),
    ))
}

pub async fn build_resume(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<BuildResumeRequest>,
) -> AppResult<(StatusCode, Json<ResumeDetailResponse>)> {
    let mut conn = state.db()?;
    let user_id = user.user_id;

    // The resume row and all four association tables are written in one
    // transaction; any unresolvable reference rolls the whole build back.
    let resume_id = conn.transaction::<Uuid, AppError, _>(|conn| {
        let selections = resolve_selections(conn, user_id, payload)?;
        ensure_unique_title(conn, user_id, &selections.entry_title, None)?;

        let new_resume = NewBuiltResume {
            id: Uuid::new_v4(),
            user_id,
            entry_title: selections.entry_title.clone(),
            basic_info_id: selections.basic_info_id,
            summary_id: selections.summary_id,
            theme_id: selections.theme_id,
        };

        diesel::insert_into(built_resumes::table)
            .values(&new_resume)
            .execute(conn)
            .map_err(|err| match err {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                ) => AppError::conflict("resume title already in use"),
                other => AppError::from(other),
            })?;

        insert_associations(conn, new_resume.id, &selections)?;
        Ok(new_resume.id)
    })?;

    tracing::info!(%resume_id, "built resume");

    let detail = load_detail(&mut conn, user_id, resume_id)?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn get_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<Json<ResumeDetailResponse>> {
    let mut conn = state.db()?;
    let detail = load_detail(&mut conn, user.user_id, resume_id)?;
    Ok(Json(detail))
}

pub async fn update_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    user: AuthenticatedUser,
    Json(payload): Json<BuildResumeRequest>,
) -> AppResult<Json<ResumeDetailResponse>> {
    let mut conn = state.db()?;
    let user_id = user.user_id;

    // Full replace, not a merge: every association row is rewritten from
    // the submitted lists, so an omitted id drops out of the resume.
    conn.transaction::<(), AppError, _>(|conn| {
        find_owned(conn, user_id, resume_id)?;
        let selections = resolve_selections(conn, user_id, payload)?;
        ensure_unique_title(conn, user_id, &selections.entry_title, Some(resume_id))?;

        diesel::update(built_resumes::table.find(resume_id))
            .set((
                built_resumes::entry_title.eq(&selections.entry_title),
                built_resumes::basic_info_id.eq(selections.basic_info_id),
                built_resumes::summary_id.eq(selections.summary_id),
                built_resumes::theme_id.eq(selections.theme_id),
                built_resumes::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(conn)?;

        delete_associations(conn, resume_id)?;
        insert_associations(conn, resume_id, &selections)?;
        Ok(())
    })?;

    let detail = load_detail(&mut conn, user_id, resume_id)?;
    Ok(Json(detail))
}

pub async fn delete_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    let mut conn = state.db()?;

    conn.transaction::<(), AppError, _>(|conn| {
        find_owned(conn, user.user_id, resume_id)?;
        // Association rows cascade; the referenced entries and theme are
        // untouched.
        diesel::delete(built_resumes::table.find(resume_id)).execute(conn)?;
        Ok(())
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Renders the resume into a downloadable document. Every reference is
/// resolved live at this point; edits to the underlying entries show up in
/// the next download of an existing resume.
pub async fn download_resume(
    State(state): State<AppState>,
    Path(resume_id): Path<Uuid>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let mut conn = state.db()?;

    let resume = find_owned(&mut conn, user.user_id, resume_id)?;

    let basic_info: BasicInfo = basic_infos::table
        .find(resume.basic_info_id)
        .first(&mut conn)?;
    let summary: Summary = summaries::table.find(resume.summary_id).first(&mut conn)?;
    let theme: ResumeTheme = resume_themes::table.find(resume.theme_id).first(&mut conn)?;

    let experience_rows: Vec<Experience> = resume_experiences::table
        .inner_join(experiences::table)
        .filter(resume_experiences::built_resume_id.eq(resume.id))
        .select(experiences::all_columns)
        .order(experiences::date_started.desc())
        .load(&mut conn)?;

    let education_rows: Vec<Education> = resume_educations::table
        .inner_join(educations::table)
        .filter(resume_educations::built_resume_id.eq(resume.id))
        .select(educations::all_columns)
        .order(educations::date_started.desc())
        .load(&mut conn)?;

    let skill_rows: Vec<Skill> = resume_skills::table
        .inner_join(skills::table)
        .filter(resume_skills::built_resume_id.eq(resume.id))
        .select(skills::all_columns)
        .order(skills::created_at.asc())
        .load(&mut conn)?;

    let language_rows: Vec<Language> = resume_languages::table
        .inner_join(languages::table)
        .filter(resume_languages::built_resume_id.eq(resume.id))
        .select(languages::all_columns)
        .order(languages::created_at.asc())
        .load(&mut conn)?;

    let document = render_resume(
        &resume.entry_title,
        &theme,
        &basic_info,
        &summary,
        &experience_rows,
        &education_rows,
        &skill_rows,
        &language_rows,
    )?;

    let filename = attachment_filename(&resume.entry_title);
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .map_err(AppError::internal)?,
    );

    Ok((headers, document))
}

/// Everything the composer form can select from: the caller's own entries
/// of each kind plus the theme catalog. Never a global list.
pub async fn composer_choices(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<ComposerChoicesResponse>> {
    let mut conn = state.db()?;
    let user_id = user.user_id;

    let basic_info_rows: Vec<(Uuid, String)> = basic_infos::table
        .filter(basic_infos::user_id.eq(user_id))
        .select((basic_infos::id, basic_infos::entry_title))
        .order(basic_infos::entry_title.asc())
        .load(&mut conn)?;
    let summary_rows: Vec<(Uuid, String)> = summaries::table
        .filter(summaries::user_id.eq(user_id))
        .select((summaries::id, summaries::entry_title))
        .order(summaries::entry_title.asc())
        .load(&mut conn)?;
    let experience_rows: Vec<(Uuid, String)> = experiences::table
        .filter(experiences::user_id.eq(user_id))
        .select((experiences::id, experiences::entry_title))
        .order(experiences::entry_title.asc())
        .load(&mut conn)?;
    let education_rows: Vec<(Uuid, String)> = educations::table
        .filter(educations::user_id.eq(user_id))
        .select((educations::id, educations::entry_title))
        .order(educations::entry_title.asc())
        .load(&mut conn)?;
    let skill_rows: Vec<(Uuid, String)> = skills::table
        .filter(skills::user_id.eq(user_id))
        .select((skills::id, skills::entry_title))
        .order(skills::entry_title.asc())
        .load(&mut conn)?;
    let language_rows: Vec<(Uuid, String)> = languages::table
        .filter(languages::user_id.eq(user_id))
        .select((languages::id, languages::entry_title))
        .order(languages::entry_title.asc())
        .load(&mut conn)?;
    let theme_rows: Vec<(Uuid, String)> = resume_themes::table
        .select((resume_themes::id, resume_themes::name))
        .order(resume_themes::name.asc())
        .load(&mut conn)?;

    Ok(Json(ComposerChoicesResponse {
        basic_infos: to_selection_entries(basic_info_rows),
        summaries: to_selection_entries(summary_rows),
        experiences: to_selection_entries(experience_rows),
        educations: to_selection_entries(education_rows),
        skills: to_selection_entries(skill_rows),
        languages: to_selection_entries(language_rows),
        themes: theme_rows
            .into_iter()
            .map(|(id, name)| ThemeEntry { id, name })
            .collect(),
    }))
}

fn to_selection_entries(rows: Vec<(Uuid, String)>) -> Vec<SelectionEntry> {
    rows.into_iter()
        .map(|(id, entry_title)| SelectionEntry { id, entry_title })
        .collect()
}

fn find_owned(conn: &mut PgConnection, user_id: Uuid, resume_id: Uuid) -> AppResult<BuiltResume> {
    built_resumes::table
        .find(resume_id)
        .filter(built_resumes::user_id.eq(user_id))
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
    let mut query = built_resumes::table
        .filter(built_resumes::user_id.eq(user_id))
        .filter(built_resumes::entry_title.eq(entry_title))
        .into_boxed();
    if let Some(id) = exclude {
        query = query.filter(built_resumes::id.ne(id));
    }
    let duplicate: Option<Uuid> = query.select(built_resumes::id).first(conn).optional()?;
    if duplicate.is_some() {
        return Err(AppError::conflict("resume title already in use"));
    }
    Ok(())
}

/// Resolves every submitted id against the caller's own collections. A
/// reference to an entry the caller does not own fails the whole request
/// with not-found rather than being silently dropped; guessing another
/// user's ids must never attach their entries.
fn resolve_selections(
    conn: &mut PgConnection,
    user_id: Uuid,
    payload: BuildResumeRequest,
) -> AppResult<ResolvedSelections> {
    let entry_title = super::bounded_field(&payload.entry_title, "entry_title", 50)?;

    let basic_info_owned: Option<Uuid> = basic_infos::table
        .find(payload.basic_info_id)
        .filter(basic_infos::user_id.eq(user_id))
        .select(basic_infos::id)
        .first(conn)
        .optional()?;
    if basic_info_owned.is_none() {
        return Err(AppError::not_found());
    }

    let summary_owned: Option<Uuid> = summaries::table
        .find(payload.summary_id)
        .filter(summaries::user_id.eq(user_id))
        .select(summaries::id)
        .first(conn)
        .optional()?;
    if summary_owned.is_none() {
        return Err(AppError::not_found());
    }

    let theme_exists: Option<Uuid> = resume_themes::table
        .find(payload.theme_id)
        .select(resume_themes::id)
        .first(conn)
        .optional()?;
    if theme_exists.is_none() {
        return Err(AppError::not_found());
    }

    let experience_ids = resolve_owned_ids(conn, user_id, payload.experience_ids, Kind::Experience)?;
    let education_ids = resolve_owned_ids(conn, user_id, payload.education_ids, Kind::Education)?;
    let skill_ids = resolve_owned_ids(conn, user_id, payload.skill_ids, Kind::Skill)?;
    let language_ids = resolve_owned_ids(conn, user_id, payload.language_ids, Kind::Language)?;

    Ok(ResolvedSelections {
        entry_title,
        basic_info_id: payload.basic_info_id,
        summary_id: payload.summary_id,
        theme_id: payload.theme_id,
        experience_ids,
        education_ids,
        skill_ids,
        language_ids,
    })
}

enum Kind {
    Experience,
    Education,
    Skill,
    Language,
}

fn resolve_owned_ids(
    conn: &mut PgConnection,
    user_id: Uuid,
    mut ids: Vec<Uuid>,
    kind: Kind,
) -> AppResult<Vec<Uuid>> {
    ids.sort();
    ids.dedup();
    if ids.is_empty() {
        return Ok(ids);
    }

    let owned: Vec<Uuid> = match kind {
        Kind::Experience => experiences::table
            .filter(experiences::user_id.eq(user_id))
            .filter(experiences::id.eq_any(&ids))
            .select(experiences::id)
            .load(conn)?,
        Kind::Education => educations::table
            .filter(educations::user_id.eq(user_id))
            .filter(educations::id.eq_any(&ids))
            .select(educations::id)
            .load(conn)?,
        Kind::Skill => skills::table
            .filter(skills::user_id.eq(user_id))
            .filter(skills::id.eq_any(&ids))
            .select(skills::id)
            .load(conn)?,
        Kind::Language => languages::table
            .filter(languages::user_id.eq(user_id))
            .filter(languages::id.eq_any(&ids))
            .select(languages::id)
            .load(conn)?,
    };

    if owned.len() != ids.len() {
        return Err(AppError::not_found());
    }
    Ok(ids)
}

fn insert_associations(
    conn: &mut PgConnection,
    resume_id: Uuid,
    selections: &ResolvedSelections,
) -> AppResult<()> {
    if !selections.experience_ids.is_empty() {
        let rows: Vec<ResumeExperience> = selections
            .experience_ids
            .iter()
            .map(|id| ResumeExperience {
                built_resume_id: resume_id,
                experience_id: *id,
            })
            .collect();
        diesel::insert_into(resume_experiences::table)
            .values(&rows)
            .execute(conn)?;
    }

    if !selections.education_ids.is_empty() {
        let rows: Vec<ResumeEducation> = selections
            .education_ids
            .iter()
            .map(|id| ResumeEducation {
                built_resume_id: resume_id,
                education_id: *id,
            })
            .collect();
        diesel::insert_into(resume_educations::table)
            .values(&rows)
            .execute(conn)?;
    }

    if !selections.skill_ids.is_empty() {
        let rows: Vec<ResumeSkill> = selections
            .skill_ids
            .iter()
            .map(|id| ResumeSkill {
                built_resume_id: resume_id,
                skill_id: *id,
            })
            .collect();
        diesel::insert_into(resume_skills::table)
            .values(&rows)
            .execute(conn)?;
    }

    if !selections.language_ids.is_empty() {
        let rows: Vec<ResumeLanguage> = selections
            .language_ids
            .iter()
            .map(|id| ResumeLanguage {
                built_resume_id: resume_id,
                language_id: *id,
            })
            .collect();
        diesel::insert_into(resume_languages::table)
            .values(&rows)
            .execute(conn)?;
    }

    Ok(())
}

fn delete_associations(conn: &mut PgConnection, resume_id: Uuid) -> AppResult<()> {
    diesel::delete(
        resume_experiences::table.filter(resume_experiences::built_resume_id.eq(resume_id)),
    )
    .execute(conn)?;
    diesel::delete(
        resume_educations::table.filter(resume_educations::built_resume_id.eq(resume_id)),
    )
    .execute(conn)?;
    diesel::delete(resume_skills::table.filter(resume_skills::built_resume_id.eq(resume_id)))
        .execute(conn)?;
    diesel::delete(resume_languages::table.filter(resume_languages::built_resume_id.eq(resume_id)))
        .execute(conn)?;
    Ok(())
}

fn load_detail(
    conn: &mut PgConnection,
    user_id: Uuid,
    resume_id: Uuid,
) -> AppResult<ResumeDetailResponse> {
    let resume = find_owned(conn, user_id, resume_id)?;

    let (basic_info_id, basic_info_title): (Uuid, String) = basic_infos::table
        .find(resume.basic_info_id)
        .select((basic_infos::id, basic_infos::entry_title))
        .first(conn)?;
    let (summary_id, summary_title): (Uuid, String) = summaries::table
        .find(resume.summary_id)
        .select((summaries::id, summaries::entry_title))
        .first(conn)?;
    let (theme_id, theme_name): (Uuid, String) = resume_themes::table
        .find(resume.theme_id)
        .select((resume_themes::id, resume_themes::name))
        .first(conn)?;

    let experience_rows: Vec<(Uuid, String)> = resume_experiences::table
        .inner_join(experiences::table)
        .filter(resume_experiences::built_resume_id.eq(resume.id))
        .select((experiences::id, experiences::entry_title))
        .order(experiences::entry_title.asc())
        .load(conn)?;
    let education_rows: Vec<(Uuid, String)> = resume_educations::table
        .inner_join(educations::table)
        .filter(resume_educations::built_resume_id.eq(resume.id))
        .select((educations::id, educations::entry_title))
        .order(educations::entry_title.asc())
        .load(conn)?;
    let skill_rows: Vec<(Uuid, String)> = resume_skills::table
        .inner_join(skills::table)
        .filter(resume_skills::built_resume_id.eq(resume.id))
        .select((skills::id, skills::entry_title))
        .order(skills::entry_title.asc())
        .load(conn)?;
    let language_rows: Vec<(Uuid, String)> = resume_languages::table
        .inner_join(languages::table)
        .filter(resume_languages::built_resume_id.eq(resume.id))
        .select((languages::id, languages::entry_title))
        .order(languages::entry_title.asc())
        .load(conn)?;

    Ok(ResumeDetailResponse {
        id: resume.id,
        entry_title: resume.entry_title,
        basic_info: SelectionEntry {
            id: basic_info_id,
            entry_title: basic_info_title,
        },
        summary: SelectionEntry {
            id: summary_id,
            entry_title: summary_title,
        },
        theme: ThemeEntry {
            id: theme_id,
            name: theme_name,
        },
        experiences: to_selection_entries(experience_rows),
        educations: to_selection_entries(education_rows),
        skills: to_selection_entries(skill_rows),
        languages: to_selection_entries(language_rows),
        created_at: to_iso(resume.created_at),
        updated_at: to_iso(resume.updated_at),
    })
}
