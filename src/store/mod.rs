//! Persistence seams for the leave lifecycle.
//!
//! The service talks to three collections (leave records, the balance ledger
//! and notifications) through the traits below. [`mysql::MySqlStore`] is the
//! production backend; [`memory::MemoryStore`] keeps everything in process and
//! backs the tests and the `STORE_BACKEND=memory` mode.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::{
    balance::LeaveBalanceEntry,
    leave::{LeaveRecord, LeaveStatus, LeaveType, NewLeave},
    notification::{NewNotification, Notification},
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("duplicate entry: {0}")]
    Duplicate(String),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            // MySQL integrity constraint violation
            if db_err.code().as_deref() == Some("23000") {
                return StoreError::Duplicate(db_err.message().to_string());
            }
        }
        StoreError::Unavailable(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Editable fields of a pending leave, already validated and merged.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveChanges {
    pub applicant_name: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: u32,
    pub resumption_date: NaiveDate,
    pub reason: String,
    pub attachment_ref: Option<String>,
}

/// Filter for the HR-wide listing. `page` is 1-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveQuery {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub leave_type: Option<LeaveType>,
    pub page: u64,
    pub per_page: u64,
}

impl LeaveQuery {
    /// Saturates instead of overflowing; a page past the end is just empty.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn matches(&self, record: &LeaveRecord) -> bool {
        self.employee_id.is_none_or(|id| record.employee_id == id)
            && self.status.is_none_or(|s| record.status == s)
            && self.leave_type.is_none_or(|t| record.leave_type == t)
    }
}

#[async_trait]
pub trait LeaveRepository: Send + Sync {
    async fn insert(&self, leave: NewLeave) -> StoreResult<LeaveRecord>;
    async fn find(&self, id: u64) -> StoreResult<Option<LeaveRecord>>;
    /// Newest first.
    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<LeaveRecord>>;
    /// One page of matches, newest first, plus the total match count.
    async fn list(&self, query: &LeaveQuery) -> StoreResult<(Vec<LeaveRecord>, i64)>;
    async fn update_fields(&self, id: u64, changes: LeaveChanges) -> StoreResult<Option<LeaveRecord>>;
    async fn update_status(&self, id: u64, status: LeaveStatus) -> StoreResult<Option<LeaveRecord>>;
    /// Returns the removed record, `None` if it did not exist.
    async fn delete(&self, id: u64) -> StoreResult<Option<LeaveRecord>>;
    /// Sum of `duration_days` over the employee's approved leave of one type.
    async fn approved_days(&self, employee_id: u64, leave_type: LeaveType) -> StoreResult<i64>;
}

#[async_trait]
pub trait BalanceRepository: Send + Sync {
    /// Create-or-overwrite keyed on (employee_id, leave_type).
    async fn upsert(&self, entry: &LeaveBalanceEntry) -> StoreResult<()>;
    async fn find(&self, employee_id: u64, leave_type: LeaveType) -> StoreResult<Option<LeaveBalanceEntry>>;
    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<LeaveBalanceEntry>>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: NewNotification) -> StoreResult<Notification>;
    /// Newest first. `None` lists every notification.
    async fn list(&self, target_user_id: Option<u64>) -> StoreResult<Vec<Notification>>;
    async fn find(&self, id: u64) -> StoreResult<Option<Notification>>;
    async fn mark_read(&self, id: u64) -> StoreResult<Option<Notification>>;
    /// Flags every unread broadcast notice as read, returning how many changed.
    async fn mark_broadcast_read(&self) -> StoreResult<u64>;
}
