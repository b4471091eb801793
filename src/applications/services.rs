use url::Url;

use crate::applications::dto::{CreateApplicationRequest, UpdateApplicationRequest};
use crate::applications::repo::{ApplicationFields, ApplicationStatus, JobApplication};
use crate::error::FieldErrors;

pub(crate) const STATUS_MESSAGE: &str =
    "status must be one of APPLIED, INTERVIEW, OFFER, REJECTED";
const LINK_MESSAGE: &str = "link must be a valid URL";

/// Validated partial update. `link` is tri-state: absent, cleared (sent
/// empty), or replaced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplicationPatch {
    pub company: Option<String>,
    pub role: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub link: Option<Option<String>>,
    pub notes: Option<String>,
}

fn push_error(fields: &mut FieldErrors, field: &'static str, message: impl Into<String>) {
    fields.entry(field).or_default().push(message.into());
}

fn check_status(raw: &str, fields: &mut FieldErrors) -> Option<ApplicationStatus> {
    match raw.parse::<ApplicationStatus>() {
        Ok(status) => Some(status),
        Err(()) => {
            push_error(fields, "status", STATUS_MESSAGE);
            None
        }
    }
}

fn check_link(raw: &str, fields: &mut FieldErrors) -> Option<String> {
    if Url::parse(raw).is_ok() {
        Some(raw.to_string())
    } else {
        push_error(fields, "link", LINK_MESSAGE);
        None
    }
}

pub fn validate_create(req: CreateApplicationRequest) -> Result<ApplicationFields, FieldErrors> {
    let mut fields = FieldErrors::new();

    if req.company.is_empty() {
        push_error(&mut fields, "company", "company must not be empty");
    }
    if req.role.is_empty() {
        push_error(&mut fields, "role", "role must not be empty");
    }

    let status = match req.status.as_deref() {
        None => ApplicationStatus::Applied,
        Some(raw) => check_status(raw, &mut fields).unwrap_or(ApplicationStatus::Applied),
    };

    let link = match req.link.as_deref() {
        None | Some("") => None,
        Some(raw) => check_link(raw, &mut fields),
    };

    if !fields.is_empty() {
        return Err(fields);
    }

    Ok(ApplicationFields {
        company: req.company,
        role: req.role,
        status,
        link,
        notes: req.notes,
    })
}

pub fn validate_patch(req: UpdateApplicationRequest) -> Result<ApplicationPatch, FieldErrors> {
    let mut fields = FieldErrors::new();

    if matches!(req.company.as_deref(), Some("")) {
        push_error(&mut fields, "company", "company must not be empty");
    }
    if matches!(req.role.as_deref(), Some("")) {
        push_error(&mut fields, "role", "role must not be empty");
    }

    let status = match req.status.as_deref() {
        None => None,
        Some(raw) => check_status(raw, &mut fields),
    };

    let link = match req.link.as_deref() {
        None => None,
        Some("") => Some(None),
        Some(raw) => check_link(raw, &mut fields).map(Some),
    };

    if !fields.is_empty() {
        return Err(fields);
    }

    Ok(ApplicationPatch {
        company: req.company,
        role: req.role,
        status,
        link,
        notes: req.notes,
    })
}

/// Merge a validated patch over an existing record. Fields absent from the
/// patch keep their stored value.
pub fn apply_patch(existing: &JobApplication, patch: ApplicationPatch) -> ApplicationFields {
    ApplicationFields {
        company: patch.company.unwrap_or_else(|| existing.company.clone()),
        role: patch.role.unwrap_or_else(|| existing.role.clone()),
        status: patch.status.unwrap_or(existing.status),
        link: patch.link.unwrap_or_else(|| existing.link.clone()),
        notes: patch.notes.or_else(|| existing.notes.clone()),
    }
}

/// ILIKE pattern for a substring search, with LIKE metacharacters escaped
/// so user input matches literally.
pub fn search_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if c == '%' || c == '_' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
