use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use tokio::sync::Mutex;
use tracing::debug;

use crate::model::{balance::LeaveBalanceEntry, leave::LeaveType};
use crate::store::{BalanceRepository, LeaveRepository, StoreResult};

/// Entitlement used for any leave type missing from the configured table.
pub const FALLBACK_ENTITLEMENT: i64 = 12;

/// Days each leave type grants per employee. Policy configuration, not
/// something the service derives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementPolicy {
    totals: HashMap<LeaveType, i64>,
}

impl Default for EntitlementPolicy {
    fn default() -> Self {
        Self {
            totals: HashMap::from([
                (LeaveType::Annual, 60),
                (LeaveType::Sick, 15),
                (LeaveType::Casual, 10),
                (LeaveType::Maternity, 60),
            ]),
        }
    }
}

impl EntitlementPolicy {
    #[cfg(test)]
    pub fn from_totals(totals: HashMap<LeaveType, i64>) -> Self {
        Self { totals }
    }

    pub fn total_for(&self, leave_type: LeaveType) -> i64 {
        self.totals
            .get(&leave_type)
            .copied()
            .unwrap_or(FALLBACK_ENTITLEMENT)
    }

    /// Parses `Annual=60,Sick=20` style overrides on top of the defaults.
    pub fn with_overrides(mut self, overrides: &str) -> anyhow::Result<Self> {
        for pair in overrides.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, days) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("entitlement '{pair}' must look like Type=days"))?;
            let leave_type = LeaveType::from_str(name.trim())
                .map_err(|_| anyhow!("unknown leave type '{}' in entitlements", name.trim()))?;
            let days: i64 = days
                .trim()
                .parse()
                .with_context(|| format!("entitlement for {leave_type} is not a number"))?;
            if days < 0 {
                return Err(anyhow!("entitlement for {leave_type} cannot be negative"));
            }
            self.totals.insert(leave_type, days);
        }
        Ok(self)
    }
}

type PairKey = (u64, LeaveType);

/// Rebuilds ledger entries from the authoritative leave records.
///
/// Runs for the same (employee, leave type) pair are serialised, so the sum
/// read and the upsert of one run never interleave with another run's.
#[derive(Clone)]
pub struct Reconciler {
    leaves: Arc<dyn LeaveRepository>,
    balances: Arc<dyn BalanceRepository>,
    policy: EntitlementPolicy,
    pair_locks: Arc<Mutex<HashMap<PairKey, Arc<Mutex<()>>>>>,
}

impl Reconciler {
    pub fn new(
        leaves: Arc<dyn LeaveRepository>,
        balances: Arc<dyn BalanceRepository>,
        policy: EntitlementPolicy,
    ) -> Self {
        Self {
            leaves,
            balances,
            policy,
            pair_locks: Arc::default(),
        }
    }

    async fn pair_lock(&self, key: PairKey) -> Arc<Mutex<()>> {
        self.pair_locks.lock().await.entry(key).or_default().clone()
    }

    /// Recomputes the entry for one (employee, leave type) pair from scratch.
    /// Running it again without record changes writes the same entry.
    pub async fn reconcile(&self, employee_id: u64, leave_type: LeaveType) -> StoreResult<LeaveBalanceEntry> {
        let lock = self.pair_lock((employee_id, leave_type)).await;
        let _guard = lock.lock().await;

        let used_days = self.leaves.approved_days(employee_id, leave_type).await?;
        let entry = LeaveBalanceEntry {
            employee_id,
            leave_type,
            total_days: self.policy.total_for(leave_type),
            used_days,
        };
        self.balances.upsert(&entry).await?;
        debug!(employee_id, %leave_type, used_days, total_days = entry.total_days, "Leave balance reconciled");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave::{LeaveStatus, NewLeave};
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn new_leave(employee_id: u64, leave_type: LeaveType, days: u32) -> NewLeave {
        let start = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        NewLeave {
            employee_id,
            applicant_name: "Ola".into(),
            leave_type,
            start_date: start,
            end_date: start + chrono::Duration::days(i64::from(days) - 1),
            duration_days: days,
            resumption_date: start + chrono::Duration::days(i64::from(days)),
            reason: "appointment".into(),
            attachment_ref: None,
        }
    }

    fn reconciler(store: &Arc<MemoryStore>) -> Reconciler {
        Reconciler::new(store.clone(), store.clone(), EntitlementPolicy::default())
    }

    #[test]
    fn default_table_and_fallback() {
        let policy = EntitlementPolicy::default();
        assert_eq!(policy.total_for(LeaveType::Annual), 60);
        assert_eq!(policy.total_for(LeaveType::Sick), 15);
        assert_eq!(policy.total_for(LeaveType::Casual), 10);

        let sparse = EntitlementPolicy::from_totals(HashMap::from([(LeaveType::Annual, 20)]));
        assert_eq!(sparse.total_for(LeaveType::Maternity), FALLBACK_ENTITLEMENT);
    }

    #[test]
    fn overrides_replace_only_named_types() {
        let policy = EntitlementPolicy::default()
            .with_overrides("Sick=20, Casual=30")
            .unwrap();
        assert_eq!(policy.total_for(LeaveType::Sick), 20);
        assert_eq!(policy.total_for(LeaveType::Casual), 30);
        assert_eq!(policy.total_for(LeaveType::Annual), 60);
    }

    #[test]
    fn overrides_reject_garbage() {
        assert!(EntitlementPolicy::default().with_overrides("Sick").is_err());
        assert!(EntitlementPolicy::default().with_overrides("Holiday=3").is_err());
        assert!(EntitlementPolicy::default().with_overrides("Sick=lots").is_err());
        assert!(EntitlementPolicy::default().with_overrides("Sick=-1").is_err());
        assert!(EntitlementPolicy::default().with_overrides("").is_ok());
    }

    #[actix_web::test]
    async fn reconcile_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let leave = LeaveRepository::insert(store.as_ref(), new_leave(4, LeaveType::Annual, 3))
            .await
            .unwrap();
        store.update_status(leave.id, LeaveStatus::Approved).await.unwrap();

        let reconciler = reconciler(&store);
        let first = reconciler.reconcile(4, LeaveType::Annual).await.unwrap();
        let second = reconciler.reconcile(4, LeaveType::Annual).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            BalanceRepository::find(store.as_ref(), 4, LeaveType::Annual).await.unwrap(),
            Some(second)
        );
    }

    #[actix_web::test]
    async fn used_days_sum_only_approved_records() {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for days in [1, 2, 4, 8] {
            let leave = LeaveRepository::insert(store.as_ref(), new_leave(9, LeaveType::Sick, days))
                .await
                .unwrap();
            ids.push(leave.id);
        }
        store.update_status(ids[0], LeaveStatus::Approved).await.unwrap();
        store.update_status(ids[2], LeaveStatus::Approved).await.unwrap();
        store.update_status(ids[3], LeaveStatus::Rejected).await.unwrap();

        let entry = reconciler(&store).reconcile(9, LeaveType::Sick).await.unwrap();
        assert_eq!(entry.used_days, 5);
        assert_eq!(entry.total_days, 15);
        assert_eq!(entry.available(), 10);
    }

    #[actix_web::test]
    async fn reconcile_creates_entry_with_zero_usage() {
        let store = Arc::new(MemoryStore::new());
        let entry = reconciler(&store).reconcile(1, LeaveType::Casual).await.unwrap();
        assert_eq!(entry.used_days, 0);
        assert_eq!(entry.total_days, 10);
    }
}
