use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::leave::LeaveType;

/// Derived per-employee, per-type entitlement snapshot. Always rebuilt from
/// the approved leave records, never adjusted in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalanceEntry {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub total_days: i64,
    pub used_days: i64,
}

impl LeaveBalanceEntry {
    /// Can go negative when HR approves beyond the entitlement.
    pub fn available(&self) -> i64 {
        self.total_days - self.used_days
    }

    pub fn view(&self) -> BalanceView {
        BalanceView {
            leave_type: self.leave_type,
            available: self.available(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "type": "Annual", "available": 57 }))]
pub struct BalanceView {
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    pub available: i64,
}
