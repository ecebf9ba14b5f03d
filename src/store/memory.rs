use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{
    BalanceRepository, LeaveChanges, LeaveQuery, LeaveRepository, NotificationRepository,
    StoreError, StoreResult,
};
use crate::model::{
    balance::LeaveBalanceEntry,
    leave::{LeaveRecord, LeaveStatus, LeaveType, NewLeave},
    notification::{NewNotification, Notification},
};

#[derive(Default)]
struct State {
    next_leave_id: u64,
    next_notification_id: u64,
    leaves: BTreeMap<u64, LeaveRecord>,
    balances: BTreeMap<(u64, LeaveType), LeaveBalanceEntry>,
    notifications: BTreeMap<u64, Notification>,
}

/// In-process store. Ids are handed out sequentially from 1, so a higher id
/// always means a newer row.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl LeaveRepository for MemoryStore {
    async fn insert(&self, leave: NewLeave) -> StoreResult<LeaveRecord> {
        let mut state = self.write()?;
        state.next_leave_id += 1;
        let now = Utc::now();
        let record = LeaveRecord {
            id: state.next_leave_id,
            employee_id: leave.employee_id,
            applicant_name: leave.applicant_name,
            leave_type: leave.leave_type,
            start_date: leave.start_date,
            end_date: leave.end_date,
            duration_days: leave.duration_days,
            resumption_date: leave.resumption_date,
            reason: leave.reason,
            attachment_ref: leave.attachment_ref,
            status: LeaveStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.leaves.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(&self, id: u64) -> StoreResult<Option<LeaveRecord>> {
        Ok(self.read()?.leaves.get(&id).cloned())
    }

    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<LeaveRecord>> {
        Ok(self
            .read()?
            .leaves
            .values()
            .rev()
            .filter(|l| l.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn list(&self, query: &LeaveQuery) -> StoreResult<(Vec<LeaveRecord>, i64)> {
        let state = self.read()?;
        let matching: Vec<&LeaveRecord> =
            state.leaves.values().rev().filter(|l| query.matches(l)).collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(query.per_page).unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn update_fields(&self, id: u64, changes: LeaveChanges) -> StoreResult<Option<LeaveRecord>> {
        let mut state = self.write()?;
        let Some(record) = state.leaves.get_mut(&id) else {
            return Ok(None);
        };
        record.applicant_name = changes.applicant_name;
        record.leave_type = changes.leave_type;
        record.start_date = changes.start_date;
        record.end_date = changes.end_date;
        record.duration_days = changes.duration_days;
        record.resumption_date = changes.resumption_date;
        record.reason = changes.reason;
        record.attachment_ref = changes.attachment_ref;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn update_status(&self, id: u64, status: LeaveStatus) -> StoreResult<Option<LeaveRecord>> {
        let mut state = self.write()?;
        Ok(state.leaves.get_mut(&id).map(|record| {
            record.status = status;
            record.updated_at = Utc::now();
            record.clone()
        }))
    }

    async fn delete(&self, id: u64) -> StoreResult<Option<LeaveRecord>> {
        Ok(self.write()?.leaves.remove(&id))
    }

    async fn approved_days(&self, employee_id: u64, leave_type: LeaveType) -> StoreResult<i64> {
        Ok(self
            .read()?
            .leaves
            .values()
            .filter(|l| {
                l.employee_id == employee_id
                    && l.leave_type == leave_type
                    && l.status == LeaveStatus::Approved
            })
            .map(|l| i64::from(l.duration_days))
            .sum())
    }
}

#[async_trait]
impl BalanceRepository for MemoryStore {
    async fn upsert(&self, entry: &LeaveBalanceEntry) -> StoreResult<()> {
        self.write()?
            .balances
            .insert((entry.employee_id, entry.leave_type), entry.clone());
        Ok(())
    }

    async fn find(&self, employee_id: u64, leave_type: LeaveType) -> StoreResult<Option<LeaveBalanceEntry>> {
        Ok(self.read()?.balances.get(&(employee_id, leave_type)).cloned())
    }

    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<LeaveBalanceEntry>> {
        Ok(self
            .read()?
            .balances
            .range((employee_id, LeaveType::Annual)..=(employee_id, LeaveType::Casual))
            .map(|(_, entry)| entry.clone())
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert(&self, notification: NewNotification) -> StoreResult<Notification> {
        let mut state = self.write()?;
        state.next_notification_id += 1;
        let stored = Notification {
            id: state.next_notification_id,
            target_user_id: notification.target_user_id,
            message: notification.message,
            is_read: false,
            created_at: Utc::now(),
        };
        state.notifications.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list(&self, target_user_id: Option<u64>) -> StoreResult<Vec<Notification>> {
        Ok(self
            .read()?
            .notifications
            .values()
            .rev()
            .filter(|n| target_user_id.is_none() || n.target_user_id == target_user_id)
            .cloned()
            .collect())
    }

    async fn find(&self, id: u64) -> StoreResult<Option<Notification>> {
        Ok(self.read()?.notifications.get(&id).cloned())
    }

    async fn mark_read(&self, id: u64) -> StoreResult<Option<Notification>> {
        let mut state = self.write()?;
        Ok(state.notifications.get_mut(&id).map(|n| {
            n.is_read = true;
            n.clone()
        }))
    }

    async fn mark_broadcast_read(&self) -> StoreResult<u64> {
        let mut state = self.write()?;
        let mut changed = 0;
        for n in state
            .notifications
            .values_mut()
            .filter(|n| n.target_user_id.is_none() && !n.is_read)
        {
            n.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }
}
