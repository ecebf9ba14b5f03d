use crate::error::ErrorBody;
use crate::model::balance::{BalanceView, LeaveBalanceEntry};
use crate::model::leave::{LeaveDecision, LeaveRecord, LeaveStatus, LeaveType};
use crate::model::notification::Notification;
use crate::service::leave::{
    DeletedLeave, EditLeave, LeaveFilter, LeaveListResponse, StatusUpdate, SubmitLeave,
};
use crate::service::notification::MarkedRead;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave API",
        version = "1.0.0",
        description = r#"
## Leave lifecycle

Employees apply for leave, HR/Admin approve or reject it, and every change
keeps the per-employee leave balance ledger in step.

### 🔹 Key Features
- **Leave applications**
  - Apply, edit while pending, delete, list and view history
- **Decisions**
  - Approve or reject (HR/Admin only); the employee is notified
- **Balances**
  - Available days per leave type, recomputed on every change
- **Notifications**
  - Admin feed for new applications, per-employee decision notices

### 🔐 Security
Every endpoint expects a **JWT Bearer** access token.

### 📦 Response Format
- JSON responses; failures carry `{ "message", "kind" }`
- Pagination supported for the leave list

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::submit_leave,
        crate::api::leave::edit_leave,
        crate::api::leave::update_status,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::delete_leave,
        crate::api::leave::get_leave,
        crate::api::leave::leave_list,
        crate::api::leave::employee_leave,
        crate::api::leave::leave_balance,

        crate::api::notification::list_notifications,
        crate::api::notification::mark_read,
        crate::api::notification::mark_admin_read
    ),
    components(
        schemas(
            LeaveType,
            LeaveStatus,
            LeaveDecision,
            LeaveRecord,
            SubmitLeave,
            EditLeave,
            StatusUpdate,
            LeaveFilter,
            LeaveListResponse,
            DeletedLeave,
            BalanceView,
            LeaveBalanceEntry,
            Notification,
            MarkedRead,
            ErrorBody
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Leave", description = "Leave management APIs"),
        (name = "Notification", description = "Leave notification APIs"),
    )
)]
pub struct ApiDoc;

/// Prefix the `#[utoipa::path]` annotations are written against.
const DOCUMENTED_PREFIX: &str = "/api/v1";

/// The OpenAPI document with paths moved under the prefix the server
/// actually mounts (`API_PREFIX`).
pub fn openapi_for_prefix(api_prefix: &str) -> openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let api_prefix = api_prefix.trim_end_matches('/');
    if api_prefix != DOCUMENTED_PREFIX {
        let paths = std::mem::take(&mut doc.paths.paths);
        doc.paths.paths = paths
            .into_iter()
            .map(|(path, item)| {
                let rest = path.strip_prefix(DOCUMENTED_PREFIX).unwrap_or(path.as_str());
                (format!("{api_prefix}{rest}"), item)
            })
            .collect();
    }
    doc
}

/// Registers the `bearer_auth` scheme the handlers' `security(...)` refers to.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
