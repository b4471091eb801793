use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::applications::repo::ApplicationStatus;

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial update body. A field left out of the JSON stays untouched;
/// a field that is present (even empty) is validated and applied.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateApplicationRequest {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Per-status tallies; every status is always present, zero when absent.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    #[serde(rename = "APPLIED")]
    pub applied: i64,
    #[serde(rename = "INTERVIEW")]
    pub interview: i64,
    #[serde(rename = "OFFER")]
    pub offer: i64,
    #[serde(rename = "REJECTED")]
    pub rejected: i64,
}

impl StatusCounts {
    pub fn from_rows(rows: &[(ApplicationStatus, i64)]) -> Self {
        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            match status {
                ApplicationStatus::Applied => counts.applied = *count,
                ApplicationStatus::Interview => counts.interview = *count,
                ApplicationStatus::Offer => counts.offer = *count,
                ApplicationStatus::Rejected => counts.rejected = *count,
            }
        }
        counts
    }

    pub fn total(&self) -> i64 {
        self.applied + self.interview + self.offer + self.rejected
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub total: i64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated: Option<OffsetDateTime>,
    pub by_status: StatusCounts,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_default_to_zero_for_missing_statuses() {
        let counts = StatusCounts::from_rows(&[(ApplicationStatus::Offer, 3)]);
        assert_eq!(
            counts,
            StatusCounts {
                offer: 3,
                ..Default::default()
            }
        );
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn analytics_json_shape() {
        let resp = AnalyticsResponse {
            total: 2,
            last_updated: None,
            by_status: StatusCounts::from_rows(&[
                (ApplicationStatus::Applied, 1),
                (ApplicationStatus::Rejected, 1),
            ]),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["total"], 2);
        assert!(json["lastUpdated"].is_null());
        assert_eq!(json["byStatus"]["APPLIED"], 1);
        assert_eq!(json["byStatus"]["INTERVIEW"], 0);
        assert_eq!(json["byStatus"]["OFFER"], 0);
        assert_eq!(json["byStatus"]["REJECTED"], 1);
    }

    #[test]
    fn update_body_distinguishes_absent_from_present() {
        let body: UpdateApplicationRequest = serde_json::from_str(r#"{"notes":"x"}"#).unwrap();
        assert_eq!(body.notes.as_deref(), Some("x"));
        assert!(body.company.is_none());
        assert!(body.link.is_none());

        let body: UpdateApplicationRequest = serde_json::from_str(r#"{"link":""}"#).unwrap();
        assert_eq!(body.link.as_deref(), Some(""));
    }
}
