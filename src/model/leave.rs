use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum LeaveType {
    Annual,
    Sick,
    Maternity,
    Casual,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    AsRefStr,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

/// A decision an approver can record. `Pending` is deliberately absent so a
/// decided leave can never be re-opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LeaveDecision {
    Approved,
    Rejected,
}

impl From<LeaveDecision> for LeaveStatus {
    fn from(decision: LeaveDecision) -> Self {
        match decision {
            LeaveDecision::Approved => LeaveStatus::Approved,
            LeaveDecision::Rejected => LeaveStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "applicant_name": "Jane Doe",
    "leave_type": "Annual",
    "start_date": "2024-01-10",
    "end_date": "2024-01-12",
    "duration_days": 3,
    "resumption_date": "2024-01-15",
    "reason": "Family trip",
    "attachment_ref": null,
    "status": "Pending",
    "created_at": "2024-01-01T09:00:00Z",
    "updated_at": "2024-01-01T09:00:00Z"
}))]
pub struct LeaveRecord {
    pub id: u64,
    pub employee_id: u64,
    pub applicant_name: String,
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub duration_days: u32,
    #[schema(value_type = String, format = "date")]
    pub resumption_date: NaiveDate,
    pub reason: String,
    /// Opaque handle from the upload service; never interpreted here.
    #[schema(nullable = true)]
    pub attachment_ref: Option<String>,
    pub status: LeaveStatus,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

/// Fields of a leave application that has passed boundary validation but has
/// not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeave {
    pub employee_id: u64,
    pub applicant_name: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: u32,
    pub resumption_date: NaiveDate,
    pub reason: String,
    pub attachment_ref: Option<String>,
}

/// Inclusive day count between two dates, `None` when `end` precedes `start`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    let span = end.signed_duration_since(start).num_days();
    if span < 0 {
        return None;
    }
    u32::try_from(span + 1).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn inclusive_days_counts_both_ends() {
        assert_eq!(inclusive_days(date("2024-01-10"), date("2024-01-12")), Some(3));
        assert_eq!(inclusive_days(date("2024-01-10"), date("2024-01-10")), Some(1));
        assert_eq!(inclusive_days(date("2024-02-28"), date("2024-03-01")), Some(3));
    }

    #[test]
    fn inclusive_days_rejects_reversed_range() {
        assert_eq!(inclusive_days(date("2024-01-12"), date("2024-01-10")), None);
    }

    #[test]
    fn leave_type_uses_title_case_names() {
        assert_eq!(LeaveType::Maternity.as_ref(), "Maternity");
        assert_eq!(LeaveType::from_str("Casual").unwrap(), LeaveType::Casual);
        assert!(LeaveType::from_str("casual").is_err());
        assert_eq!(serde_json::to_value(LeaveType::Sick).unwrap(), "Sick");
    }

    #[test]
    fn decision_maps_onto_status() {
        assert_eq!(LeaveStatus::from(LeaveDecision::Approved), LeaveStatus::Approved);
        assert_eq!(LeaveStatus::from(LeaveDecision::Rejected), LeaveStatus::Rejected);
        assert!(serde_json::from_str::<LeaveDecision>("\"Pending\"").is_err());
    }
}
