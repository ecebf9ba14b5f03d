use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::LeaveError;
use crate::model::notification::Notification;
use crate::store::NotificationRepository;

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({ "message": "Admin notifications marked as read", "updated": 3 }))]
pub struct MarkedRead {
    pub message: String,
    pub updated: u64,
}

/// Read side of the notices the leave lifecycle emits.
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    /// HR and admins see everything, including broadcast notices; anyone
    /// else sees what is addressed to their employee record.
    pub async fn list(&self, caller: &AuthUser) -> Result<Vec<Notification>, LeaveError> {
        if caller.is_approver() {
            return Ok(self.notifications.list(None).await?);
        }
        match caller.employee_id {
            Some(employee_id) => Ok(self.notifications.list(Some(employee_id)).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn mark_read(&self, caller: &AuthUser, id: u64) -> Result<Notification, LeaveError> {
        let not_found = || LeaveError::NotFound(format!("Notification {id} not found"));
        let notification = self.notifications.find(id).await?.ok_or_else(not_found)?;

        let allowed = match notification.target_user_id {
            None => caller.is_approver(),
            Some(target) => caller.owns(target) || caller.is_approver(),
        };
        if !allowed {
            return Err(LeaveError::Forbidden("Notification belongs to another user".into()));
        }

        self.notifications.mark_read(id).await?.ok_or_else(not_found)
    }

    pub async fn mark_broadcast_read(&self, caller: &AuthUser) -> Result<MarkedRead, LeaveError> {
        caller.require_hr_or_admin()?;
        let updated = self.notifications.mark_broadcast_read().await?;
        info!(updated, user_id = caller.user_id, "Admin notifications marked as read");
        Ok(MarkedRead {
            message: "Admin notifications marked as read".into(),
            updated,
        })
    }
}
