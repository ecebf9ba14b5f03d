use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 12,
    "target_user_id": null,
    "message": "Jane Doe applied for Annual leave",
    "is_read": false,
    "created_at": "2024-01-01T09:00:00Z"
}))]
pub struct Notification {
    pub id: u64,
    /// `None` addresses every HR/admin user.
    #[schema(nullable = true)]
    pub target_user_id: Option<u64>,
    pub message: String,
    pub is_read: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub target_user_id: Option<u64>,
    pub message: String,
}

impl NewNotification {
    pub fn broadcast(message: impl Into<String>) -> Self {
        Self {
            target_user_id: None,
            message: message.into(),
        }
    }

    pub fn to_user(user_id: u64, message: impl Into<String>) -> Self {
        Self {
            target_user_id: Some(user_id),
            message: message.into(),
        }
    }
}
