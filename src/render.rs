use askama::Template;

use crate::error::AppResult;
use crate::models::{BasicInfo, Education, Experience, Language, ResumeTheme, Skill, Summary};

/// Self-contained HTML document for a built resume. Everything is resolved
/// from the live rows at render time; the theme stylesheet is inlined so
/// the downloaded file has no external dependencies.
#[derive(Template)]
#[template(path = "resume.html")]
pub struct ResumeDocument {
    pub title: String,
    pub styles: String,
    pub full_name: String,
    pub job_title: String,
    pub address: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub summary: String,
    pub experiences: Vec<ExperienceView>,
    pub educations: Vec<EducationView>,
    pub skills: Vec<SkillView>,
    pub languages: Vec<LanguageView>,
}

pub struct ExperienceView {
    pub job_title: String,
    pub company_name: String,
    pub period: String,
    /// Already sanitized at write time; rendered unescaped.
    pub description_html: String,
}

pub struct EducationView {
    pub degree_name: String,
    pub school_name: String,
    pub period: String,
}

pub struct SkillView {
    pub group_title: String,
    pub description: String,
}

pub struct LanguageView {
    pub name: String,
    pub proficiency: String,
}

pub fn render_resume(
    title: &str,
    theme: &ResumeTheme,
    basic_info: &BasicInfo,
    summary: &Summary,
    experiences: &[Experience],
    educations: &[Education],
    skills: &[Skill],
    languages: &[Language],
) -> AppResult<String> {
    let document = ResumeDocument {
        title: title.to_string(),
        styles: theme.styles.clone(),
        full_name: basic_info.full_name.clone(),
        job_title: basic_info.job_title.clone(),
        address: basic_info.address.clone(),
        contact_email: basic_info.contact_email.clone(),
        contact_phone: basic_info.contact_phone.clone(),
        linkedin_url: basic_info.linkedin_url.clone(),
        github_url: basic_info.github_url.clone(),
        summary: summary.content.clone(),
        experiences: experiences
            .iter()
            .map(|exp| ExperienceView {
                job_title: exp.job_title.clone(),
                company_name: exp.company_name.clone(),
                period: format_period(exp.date_started, exp.date_finished),
                description_html: exp.description.clone(),
            })
            .collect(),
        educations: educations
            .iter()
            .map(|edu| EducationView {
                degree_name: edu.degree_name.clone(),
                school_name: edu.school_name.clone(),
                period: format_period(edu.date_started, edu.date_finished),
            })
            .collect(),
        skills: skills
            .iter()
            .map(|skill| SkillView {
                group_title: skill.skill_group_title.clone(),
                description: skill.description.clone(),
            })
            .collect(),
        languages: languages
            .iter()
            .map(|lang| LanguageView {
                name: lang.name.clone(),
                proficiency: lang.proficiency.clone(),
            })
            .collect(),
    };

    Ok(document.render()?)
}

/// Attachment filename for a downloaded resume: the title with whitespace
/// collapsed to underscores, quotes dropped, plus the document extension.
pub fn attachment_filename(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .filter(|ch| *ch != '"' && *ch != '\\')
        .map(|ch| if ch.is_whitespace() { '_' } else { ch })
        .collect();
    format!("{stem}.html")
}

fn format_period(started: chrono::NaiveDate, finished: Option<chrono::NaiveDate>) -> String {
    let start = started.format("%b %Y");
    match finished {
        Some(end) => format!("{start} - {}", end.format("%b %Y")),
        None => format!("{start} - present"),
    }
}

#[cfg(test)]
mod tests {
    use super::{attachment_filename, format_period};
    use chrono::NaiveDate;

    #[test]
    fn filename_replaces_spaces_with_underscores() {
        assert_eq!(attachment_filename("My Resume"), "My_Resume.html");
    }

    #[test]
    fn filename_drops_quote_characters() {
        assert_eq!(attachment_filename("a \"b\" c"), "a_b_c.html");
    }

    #[test]
    fn open_ended_period_reads_as_present() {
        let started = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        assert_eq!(format_period(started, None), "Mar 2020 - present");
    }

    #[test]
    fn closed_period_shows_both_ends() {
        let started = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let finished = NaiveDate::from_ymd_opt(2021, 11, 30).unwrap();
        assert_eq!(format_period(started, Some(finished)), "Mar 2020 - Nov 2021");
    }
}
