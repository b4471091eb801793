use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// Application lifecycle state. Closed set, mirrored by the
/// `application_status` Postgres enum; no other value is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "application_status", rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Interview,
        ApplicationStatus::Offer,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "APPLIED",
            ApplicationStatus::Interview => "INTERVIEW",
            ApplicationStatus::Offer => "OFFER",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPLIED" => Ok(ApplicationStatus::Applied),
            "INTERVIEW" => Ok(ApplicationStatus::Interview),
            "OFFER" => Ok(ApplicationStatus::Offer),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            _ => Err(()),
        }
    }
}

/// Job-application record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company: String,
    pub role: String,
    pub status: ApplicationStatus,
    pub link: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated field set persisted on create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationFields {
    pub company: String,
    pub role: String,
    pub status: ApplicationStatus,
    pub link: Option<String>,
    pub notes: Option<String>,
}

const COLUMNS: &str = "id, user_id, company, role, status, link, notes, created_at, updated_at";

impl JobApplication {
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        fields: &ApplicationFields,
    ) -> anyhow::Result<JobApplication> {
        let app = sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            INSERT INTO applications (user_id, company, role, status, link, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(user_id)
        .bind(&fields.company)
        .bind(&fields.role)
        .bind(fields.status)
        .bind(&fields.link)
        .bind(&fields.notes)
        .fetch_one(db)
        .await?;
        Ok(app)
    }

    /// Caller's records, newest-created first, optionally narrowed by exact
    /// status and/or a case-insensitive ILIKE pattern over company OR role.
    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        status: Option<ApplicationStatus>,
        search_pattern: Option<String>,
    ) -> anyhow::Result<Vec<JobApplication>> {
        let rows = sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM applications
            WHERE user_id = $1
              AND ($2::application_status IS NULL OR status = $2)
              AND ($3::text IS NULL OR company ILIKE $3 OR role ILIKE $3)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .bind(status)
        .bind(search_pattern)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Guarded fetch: id and owner checked together, so a missing record and
    /// a foreign-owned record are indistinguishable to the caller.
    pub async fn find_owned(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> anyhow::Result<Option<JobApplication>> {
        let app = sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM applications
            WHERE id = $1 AND user_id = $2
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(app)
    }

    pub async fn update(
        db: &PgPool,
        user_id: Uuid,
        id: Uuid,
        fields: &ApplicationFields,
    ) -> anyhow::Result<Option<JobApplication>> {
        let app = sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            UPDATE applications
            SET company = $3, role = $4, status = $5, link = $6, notes = $7,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .bind(&fields.company)
        .bind(&fields.role)
        .bind(fields.status)
        .bind(&fields.link)
        .bind(&fields.notes)
        .fetch_optional(db)
        .await?;
        Ok(app)
    }

    pub async fn delete_owned(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM applications
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn status_counts(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Vec<(ApplicationStatus, i64)>> {
        let rows = sqlx::query_as::<_, (ApplicationStatus, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM applications
            WHERE user_id = $1
            GROUP BY status
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn totals(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<(i64, Option<OffsetDateTime>)> {
        let row = sqlx::query_as::<_, (i64, Option<OffsetDateTime>)>(
            r#"
            SELECT COUNT(*), MAX(updated_at)
            FROM applications
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(db)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_exact_uppercase_only() {
        assert_eq!("APPLIED".parse::<ApplicationStatus>(), Ok(ApplicationStatus::Applied));
        assert_eq!("REJECTED".parse::<ApplicationStatus>(), Ok(ApplicationStatus::Rejected));
        assert!("applied".parse::<ApplicationStatus>().is_err());
        assert!("HIRED".parse::<ApplicationStatus>().is_err());
        assert!("".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn status_display_roundtrips_through_from_str() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.to_string().parse::<ApplicationStatus>(), Ok(status));
        }
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&ApplicationStatus::Interview).unwrap();
        assert_eq!(json, "\"INTERVIEW\"");
    }

    #[test]
    fn record_json_uses_camel_case_and_rfc3339() {
        let now = OffsetDateTime::now_utc();
        let app = JobApplication {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            company: "Acme".into(),
            role: "Engineer".into(),
            status: ApplicationStatus::Applied,
            link: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&app).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["status"], "APPLIED");
    }
}
