use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = invite_codes)]
#[diesel(belongs_to(User))]
pub struct InviteCode {
    pub id: Uuid,
    pub code: String,
    pub description: String,
    pub redeemed: bool,
    pub user_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = invite_codes)]
pub struct NewInviteCode {
    pub id: Uuid,
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = basic_infos)]
#[diesel(belongs_to(User))]
pub struct BasicInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub full_name: String,
    pub job_title: String,
    pub address: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = basic_infos)]
pub struct NewBasicInfo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub full_name: String,
    pub job_title: String,
    pub address: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = summaries)]
#[diesel(belongs_to(User))]
pub struct Summary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = summaries)]
pub struct NewSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub content: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = experiences)]
#[diesel(belongs_to(User))]
pub struct Experience {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub job_title: String,
    pub company_name: String,
    pub date_started: NaiveDate,
    pub date_finished: Option<NaiveDate>,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = experiences)]
pub struct NewExperience {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub job_title: String,
    pub company_name: String,
    pub date_started: NaiveDate,
    pub date_finished: Option<NaiveDate>,
    pub description: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = educations)]
#[diesel(belongs_to(User))]
pub struct Education {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub degree_name: String,
    pub school_name: String,
    pub date_started: NaiveDate,
    pub date_finished: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = educations)]
pub struct NewEducation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub degree_name: String,
    pub school_name: String,
    pub date_started: NaiveDate,
    pub date_finished: Option<NaiveDate>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = skills)]
#[diesel(belongs_to(User))]
pub struct Skill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub skill_group_title: String,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = skills)]
pub struct NewSkill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub skill_group_title: String,
    pub description: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = languages)]
#[diesel(belongs_to(User))]
pub struct Language {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub name: String,
    pub proficiency: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = languages)]
pub struct NewLanguage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub name: String,
    pub proficiency: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = resume_themes)]
pub struct ResumeTheme {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub styles: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = resume_themes)]
pub struct NewResumeTheme {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub styles: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = built_resumes)]
#[diesel(belongs_to(User))]
pub struct BuiltResume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub basic_info_id: Uuid,
    pub summary_id: Uuid,
    pub theme_id: Uuid,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = built_resumes)]
pub struct NewBuiltResume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_title: String,
    pub basic_info_id: Uuid,
    pub summary_id: Uuid,
    pub theme_id: Uuid,
}

#[derive(Debug, Insertable, Queryable)]
#[diesel(table_name = resume_experiences)]
pub struct ResumeExperience {
    pub built_resume_id: Uuid,
    pub experience_id: Uuid,
}

#[derive(Debug, Insertable, Queryable)]
#[diesel(table_name = resume_educations)]
pub struct ResumeEducation {
    pub built_resume_id: Uuid,
    pub education_id: Uuid,
}

#[derive(Debug, Insertable, Queryable)]
#[diesel(table_name = resume_skills)]
pub struct ResumeSkill {
    pub built_resume_id: Uuid,
    pub skill_id: Uuid,
}

#[derive(Debug, Insertable, Queryable)]
#[diesel(table_name = resume_languages)]
pub struct ResumeLanguage {
    pub built_resume_id: Uuid,
    pub language_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = refresh_tokens)]
#[diesel(belongs_to(User))]
pub struct RefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = refresh_tokens)]
pub struct NewRefreshToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
