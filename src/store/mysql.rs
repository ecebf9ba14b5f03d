use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::{
    BalanceRepository, LeaveChanges, LeaveQuery, LeaveRepository, NotificationRepository,
    StoreError, StoreResult,
};
use crate::model::{
    balance::LeaveBalanceEntry,
    leave::{LeaveRecord, LeaveStatus, LeaveType, NewLeave},
    notification::{NewNotification, Notification},
};

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, applicant_name, leave_type, start_date, end_date,
    duration_days, resumption_date, reason, attachment_ref, status,
    created_at, updated_at
"#;

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    applicant_name: String,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration_days: u32,
    resumption_date: NaiveDate,
    reason: String,
    attachment_ref: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRecord {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        Ok(LeaveRecord {
            id: row.id,
            employee_id: row.employee_id,
            applicant_name: row.applicant_name,
            leave_type: parse_leave_type(&row.leave_type)?,
            start_date: row.start_date,
            end_date: row.end_date,
            duration_days: row.duration_days,
            resumption_date: row.resumption_date,
            reason: row.reason,
            attachment_ref: row.attachment_ref,
            status: LeaveStatus::from_str(&row.status)
                .map_err(|_| StoreError::Corrupt(format!("unknown leave status '{}'", row.status)))?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct BalanceRow {
    employee_id: u64,
    leave_type: String,
    total_days: i64,
    used_days: i64,
}

impl TryFrom<BalanceRow> for LeaveBalanceEntry {
    type Error = StoreError;

    fn try_from(row: BalanceRow) -> Result<Self, Self::Error> {
        Ok(LeaveBalanceEntry {
            employee_id: row.employee_id,
            leave_type: parse_leave_type(&row.leave_type)?,
            total_days: row.total_days,
            used_days: row.used_days,
        })
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: u64,
    target_user_id: Option<u64>,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            target_user_id: row.target_user_id,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

fn parse_leave_type(value: &str) -> StoreResult<LeaveType> {
    LeaveType::from_str(value).map_err(|_| StoreError::Corrupt(format!("unknown leave type '{value}'")))
}

fn into_records(rows: Vec<LeaveRow>) -> StoreResult<Vec<LeaveRecord>> {
    rows.into_iter().map(LeaveRecord::try_from).collect()
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(&'static str),
}

/// MySQL-backed implementation of every repository trait, sharing one pool.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_leave(&self, id: u64) -> StoreResult<Option<LeaveRecord>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_records WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRecord::try_from)
            .transpose()
    }

    async fn fetch_notification(&self, id: u64) -> StoreResult<Option<Notification>> {
        let row = sqlx::query_as::<_, NotificationRow>(
            "SELECT id, target_user_id, message, is_read, created_at FROM notifications WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Notification::from))
    }
}

#[async_trait]
impl LeaveRepository for MySqlStore {
    async fn insert(&self, leave: NewLeave) -> StoreResult<LeaveRecord> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO leave_records
                (employee_id, applicant_name, leave_type, start_date, end_date,
                 duration_days, resumption_date, reason, attachment_ref, status,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave.employee_id)
        .bind(&leave.applicant_name)
        .bind(leave.leave_type.as_ref())
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.duration_days)
        .bind(leave.resumption_date)
        .bind(&leave.reason)
        .bind(&leave.attachment_ref)
        .bind(LeaveStatus::Pending.as_ref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(LeaveRecord {
            id: result.last_insert_id(),
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
        })
    }

    async fn find(&self, id: u64) -> StoreResult<Option<LeaveRecord>> {
        self.fetch_leave(id).await
    }

    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<LeaveRecord>> {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_records WHERE employee_id = ? ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        into_records(rows)
    }

    async fn list(&self, query: &LeaveQuery) -> StoreResult<(Vec<LeaveRecord>, i64)> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(employee_id) = query.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }
        if let Some(status) = query.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.into()));
        }
        if let Some(leave_type) = query.leave_type {
            where_sql.push_str(" AND leave_type = ?");
            args.push(FilterValue::Str(leave_type.into()));
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_records{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_records{where_sql} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        debug!(sql = %data_sql, page = query.page, per_page = query.per_page, "Fetching leave page");

        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }
        let rows = data_q
            .bind(query.per_page)
            .bind(query.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((into_records(rows)?, total))
    }

    async fn update_fields(&self, id: u64, changes: LeaveChanges) -> StoreResult<Option<LeaveRecord>> {
        let result = sqlx::query(
            r#"
            UPDATE leave_records
            SET applicant_name = ?, leave_type = ?, start_date = ?, end_date = ?,
                duration_days = ?, resumption_date = ?, reason = ?, attachment_ref = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&changes.applicant_name)
        .bind(changes.leave_type.as_ref())
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(changes.duration_days)
        .bind(changes.resumption_date)
        .bind(&changes.reason)
        .bind(&changes.attachment_ref)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_leave(id).await
    }

    async fn update_status(&self, id: u64, status: LeaveStatus) -> StoreResult<Option<LeaveRecord>> {
        // rows_affected is 0 for an unchanged row on MySQL, so existence is
        // decided by re-reading instead.
        sqlx::query("UPDATE leave_records SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_ref())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.fetch_leave(id).await
    }

    async fn delete(&self, id: u64) -> StoreResult<Option<LeaveRecord>> {
        let Some(existing) = self.fetch_leave(id).await? else {
            return Ok(None);
        };
        let result = sqlx::query("DELETE FROM leave_records WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok((result.rows_affected() > 0).then_some(existing))
    }

    async fn approved_days(&self, employee_id: u64, leave_type: LeaveType) -> StoreResult<i64> {
        let used = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT CAST(COALESCE(SUM(duration_days), 0) AS SIGNED)
            FROM leave_records
            WHERE employee_id = ? AND leave_type = ? AND status = ?
            "#,
        )
        .bind(employee_id)
        .bind(leave_type.as_ref())
        .bind(LeaveStatus::Approved.as_ref())
        .fetch_one(&self.pool)
        .await?;
        Ok(used)
    }
}

#[async_trait]
impl BalanceRepository for MySqlStore {
    async fn upsert(&self, entry: &LeaveBalanceEntry) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO leave_balances (employee_id, leave_type, total_days, used_days)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                total_days = VALUES(total_days),
                used_days = VALUES(used_days)
            "#,
        )
        .bind(entry.employee_id)
        .bind(entry.leave_type.as_ref())
        .bind(entry.total_days)
        .bind(entry.used_days)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, employee_id: u64, leave_type: LeaveType) -> StoreResult<Option<LeaveBalanceEntry>> {
        sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT employee_id, leave_type, total_days, used_days
            FROM leave_balances
            WHERE employee_id = ? AND leave_type = ?
            "#,
        )
        .bind(employee_id)
        .bind(leave_type.as_ref())
        .fetch_optional(&self.pool)
        .await?
        .map(LeaveBalanceEntry::try_from)
        .transpose()
    }

    async fn list_by_employee(&self, employee_id: u64) -> StoreResult<Vec<LeaveBalanceEntry>> {
        let rows = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT employee_id, leave_type, total_days, used_days
            FROM leave_balances
            WHERE employee_id = ?
            ORDER BY leave_type
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(LeaveBalanceEntry::try_from).collect()
    }
}

#[async_trait]
impl NotificationRepository for MySqlStore {
    async fn insert(&self, notification: NewNotification) -> StoreResult<Notification> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO notifications (target_user_id, message, is_read, created_at) VALUES (?, ?, FALSE, ?)",
        )
        .bind(notification.target_user_id)
        .bind(&notification.message)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Notification {
            id: result.last_insert_id(),
            target_user_id: notification.target_user_id,
            message: notification.message,
            is_read: false,
            created_at: now,
        })
    }

    async fn list(&self, target_user_id: Option<u64>) -> StoreResult<Vec<Notification>> {
        let rows = match target_user_id {
            Some(user_id) => {
                sqlx::query_as::<_, NotificationRow>(
                    r#"
                    SELECT id, target_user_id, message, is_read, created_at
                    FROM notifications
                    WHERE target_user_id = ?
                    ORDER BY created_at DESC, id DESC
                    "#,
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, NotificationRow>(
                    r#"
                    SELECT id, target_user_id, message, is_read, created_at
                    FROM notifications
                    ORDER BY created_at DESC, id DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn find(&self, id: u64) -> StoreResult<Option<Notification>> {
        self.fetch_notification(id).await
    }

    async fn mark_read(&self, id: u64) -> StoreResult<Option<Notification>> {
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        self.fetch_notification(id).await
    }

    async fn mark_broadcast_read(&self) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE target_user_id IS NULL AND is_read = FALSE",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
