use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::LeaveError;
use crate::model::{
    balance::BalanceView,
    leave::{LeaveDecision, LeaveRecord, LeaveStatus, LeaveType, NewLeave, inclusive_days},
    notification::NewNotification,
};
use crate::service::events::{EventPublisher, LeaveEvent};
use crate::service::reconcile::Reconciler;
use crate::store::{BalanceRepository, LeaveChanges, LeaveQuery, LeaveRepository, NotificationRepository};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({
    "employee_id": 1000,
    "applicant_name": "Jane Doe",
    "leave_type": "Annual",
    "start_date": "2024-01-10",
    "end_date": "2024-01-12",
    "resumption_date": "2024-01-15",
    "reason": "Family trip",
    "attachment_ref": "uploads/handover-1000.pdf"
}))]
pub struct SubmitLeave {
    pub employee_id: u64,
    pub applicant_name: String,
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub resumption_date: NaiveDate,
    pub reason: String,
    #[serde(default)]
    pub attachment_ref: Option<String>,
}

impl SubmitLeave {
    /// Boundary checks: required text present, dates in order, duration
    /// derived from the inclusive span.
    pub fn validate(self) -> Result<NewLeave, LeaveError> {
        if self.employee_id == 0 {
            return Err(LeaveError::validation("employee_id is required"));
        }
        let applicant_name = required("applicant_name", self.applicant_name)?;
        let reason = required("reason", self.reason)?;
        let duration_days = inclusive_days(self.start_date, self.end_date)
            .ok_or_else(|| LeaveError::validation("end date before start date"))?;

        Ok(NewLeave {
            employee_id: self.employee_id,
            applicant_name,
            leave_type: self.leave_type,
            start_date: self.start_date,
            end_date: self.end_date,
            duration_days,
            resumption_date: self.resumption_date,
            reason,
            attachment_ref: self
                .attachment_ref
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        })
    }
}

fn required(field: &str, value: String) -> Result<String, LeaveError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LeaveError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Owner edits to a pending leave. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[schema(example = json!({ "end_date": "2024-01-13", "reason": "Extended trip" }))]
pub struct EditLeave {
    pub applicant_name: Option<String>,
    pub leave_type: Option<LeaveType>,
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub resumption_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub attachment_ref: Option<String>,
}

impl EditLeave {
    fn merge_onto(self, current: &LeaveRecord) -> SubmitLeave {
        SubmitLeave {
            employee_id: current.employee_id,
            applicant_name: self.applicant_name.unwrap_or_else(|| current.applicant_name.clone()),
            leave_type: self.leave_type.unwrap_or(current.leave_type),
            start_date: self.start_date.unwrap_or(current.start_date),
            end_date: self.end_date.unwrap_or(current.end_date),
            resumption_date: self.resumption_date.unwrap_or(current.resumption_date),
            reason: self.reason.unwrap_or_else(|| current.reason.clone()),
            attachment_ref: self.attachment_ref.or_else(|| current.attachment_ref.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[schema(example = json!({ "status": "Approved" }))]
pub struct StatusUpdate {
    pub status: LeaveDecision,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee ID
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    /// Filter by leave type
    pub leave_type: Option<LeaveType>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

impl LeaveFilter {
    fn to_query(&self) -> LeaveQuery {
        LeaveQuery {
            employee_id: self.employee_id,
            status: self.status,
            leave_type: self.leave_type,
            page: self.page.unwrap_or(1).max(1),
            per_page: self.per_page.unwrap_or(10).clamp(1, 100),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRecord>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({ "id": 1 }))]
pub struct DeletedLeave {
    pub id: u64,
}

/// Leave lifecycle: submission, edits, decisions, deletion and the balance
/// read. Every mutation reconciles the affected ledger entry before returning.
#[derive(Clone)]
pub struct LeaveService {
    leaves: Arc<dyn LeaveRepository>,
    balances: Arc<dyn BalanceRepository>,
    notifications: Arc<dyn NotificationRepository>,
    events: Arc<dyn EventPublisher>,
    reconciler: Reconciler,
}

impl LeaveService {
    pub fn new(
        leaves: Arc<dyn LeaveRepository>,
        balances: Arc<dyn BalanceRepository>,
        notifications: Arc<dyn NotificationRepository>,
        events: Arc<dyn EventPublisher>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            leaves,
            balances,
            notifications,
            events,
            reconciler,
        }
    }

    #[instrument(skip(self, caller, request), fields(user_id = caller.user_id, employee_id = request.employee_id))]
    pub async fn submit(&self, caller: &AuthUser, request: SubmitLeave) -> Result<LeaveRecord, LeaveError> {
        caller.require_owner_or_approver(request.employee_id)?;
        let leave = request.validate()?;

        let record = self.leaves.insert(leave).await?;
        info!(leave_id = record.id, leave_type = %record.leave_type, "Leave submitted");

        // Pending leave does not count yet; the ledger entry is created now
        // so the balance query lists the type straight away.
        self.reconcile_logged(record.employee_id, record.leave_type).await;
        self.notify_logged(NewNotification::broadcast(format!(
            "{} applied for {} leave",
            record.applicant_name, record.leave_type
        )))
        .await;
        self.publish_logged(LeaveEvent::LeaveAdded(record.clone()));

        Ok(record)
    }

    #[instrument(skip(self, caller, edit), fields(user_id = caller.user_id))]
    pub async fn edit(&self, caller: &AuthUser, leave_id: u64, edit: EditLeave) -> Result<LeaveRecord, LeaveError> {
        let current = self.find_visible(caller, leave_id).await?;
        if current.status != LeaveStatus::Pending {
            return Err(LeaveError::validation("only pending leave can be edited"));
        }

        let merged = edit.merge_onto(&current).validate()?;
        let changes = LeaveChanges {
            applicant_name: merged.applicant_name,
            leave_type: merged.leave_type,
            start_date: merged.start_date,
            end_date: merged.end_date,
            duration_days: merged.duration_days,
            resumption_date: merged.resumption_date,
            reason: merged.reason,
            attachment_ref: merged.attachment_ref,
        };

        let updated = self
            .leaves
            .update_fields(leave_id, changes)
            .await?
            .ok_or_else(|| leave_not_found(leave_id))?;
        info!(leave_id, "Leave edited");

        self.reconcile_logged(updated.employee_id, updated.leave_type).await;
        if updated.leave_type != current.leave_type {
            self.reconcile_logged(current.employee_id, current.leave_type).await;
        }
        self.publish_logged(LeaveEvent::LeaveUpdated(updated.clone()));

        Ok(updated)
    }

    /// Records an approver's decision. Earlier decisions may be overwritten;
    /// only re-opening to Pending is impossible.
    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn update_status(
        &self,
        caller: &AuthUser,
        leave_id: u64,
        decision: LeaveDecision,
    ) -> Result<LeaveRecord, LeaveError> {
        caller.require_hr_or_admin()?;

        let status = LeaveStatus::from(decision);
        let record = self
            .leaves
            .update_status(leave_id, status)
            .await?
            .ok_or_else(|| leave_not_found(leave_id))?;
        info!(leave_id, %status, employee_id = record.employee_id, "Leave status updated");

        // Rejections reconcile too so an overwritten approval stops counting.
        self.reconcile_logged(record.employee_id, record.leave_type).await;
        self.notify_logged(NewNotification::to_user(
            record.employee_id,
            format!("Your leave was {status}"),
        ))
        .await;
        self.publish_logged(LeaveEvent::LeaveUpdated(record.clone()));

        Ok(record)
    }

    #[instrument(skip(self, caller), fields(user_id = caller.user_id))]
    pub async fn delete(&self, caller: &AuthUser, leave_id: u64) -> Result<DeletedLeave, LeaveError> {
        self.find_visible(caller, leave_id).await?;

        let removed = self
            .leaves
            .delete(leave_id)
            .await?
            .ok_or_else(|| leave_not_found(leave_id))?;
        info!(leave_id, employee_id = removed.employee_id, "Leave deleted");

        self.reconcile_logged(removed.employee_id, removed.leave_type).await;
        self.publish_logged(LeaveEvent::LeaveDeleted { id: leave_id });

        Ok(DeletedLeave { id: leave_id })
    }

    pub async fn get(&self, caller: &AuthUser, leave_id: u64) -> Result<LeaveRecord, LeaveError> {
        self.find_visible(caller, leave_id).await
    }

    pub async fn list_for_employee(&self, caller: &AuthUser, employee_id: u64) -> Result<Vec<LeaveRecord>, LeaveError> {
        caller.require_owner_or_approver(employee_id)?;
        Ok(self.leaves.list_by_employee(employee_id).await?)
    }

    pub async fn list(&self, caller: &AuthUser, filter: &LeaveFilter) -> Result<LeaveListResponse, LeaveError> {
        caller.require_hr_or_admin()?;
        let query = filter.to_query();
        let (data, total) = self.leaves.list(&query).await?;
        Ok(LeaveListResponse {
            data,
            page: query.page,
            per_page: query.per_page,
            total,
        })
    }

    /// Pure read of the ledger; no entries yet is an empty list.
    pub async fn balance(&self, caller: &AuthUser, employee_id: u64) -> Result<Vec<BalanceView>, LeaveError> {
        caller.require_owner_or_approver(employee_id)?;
        let entries = self.balances.list_by_employee(employee_id).await?;
        Ok(entries.iter().map(|e| e.view()).collect())
    }

    async fn find_visible(&self, caller: &AuthUser, leave_id: u64) -> Result<LeaveRecord, LeaveError> {
        let record = self
            .leaves
            .find(leave_id)
            .await?
            .ok_or_else(|| leave_not_found(leave_id))?;
        caller.require_owner_or_approver(record.employee_id)?;
        Ok(record)
    }

    // The primary mutation is already committed when these run, so failures
    // are logged and the ledger heals on the next trigger.
    async fn reconcile_logged(&self, employee_id: u64, leave_type: LeaveType) {
        if let Err(e) = self.reconciler.reconcile(employee_id, leave_type).await {
            warn!(error = %e, employee_id, %leave_type, "Leave balance reconciliation failed");
        }
    }

    async fn notify_logged(&self, notification: NewNotification) {
        if let Err(e) = self.notifications.insert(notification).await {
            warn!(error = %e, "Failed to store leave notification");
        }
    }

    fn publish_logged(&self, event: LeaveEvent) {
        let name = event.name();
        if let Err(e) = self.events.publish(event) {
            warn!(error = %e, event = name, "Failed to publish leave event");
        }
    }
}

fn leave_not_found(leave_id: u64) -> LeaveError {
    LeaveError::NotFound(format!("Leave request {leave_id} not found"))
}
