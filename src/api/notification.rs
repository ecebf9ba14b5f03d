use crate::auth::auth::AuthUser;
use crate::error::{ErrorBody, LeaveError};
use crate::model::notification::Notification;
use crate::service::notification::{MarkedRead, NotificationService};
use actix_web::{HttpResponse, web};

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses(
        (status = 200, description = "Notifications visible to the caller, newest first", body = [Notification]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn list_notifications(
    auth: AuthUser,
    service: web::Data<NotificationService>,
) -> Result<HttpResponse, LeaveError> {
    let notifications = service.list(&auth).await?;
    Ok(HttpResponse::Ok().json(notifications))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/{notification_id}/read",
    params(
        ("notification_id" = u64, Path, description = "Notification to mark as read")
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 403, description = "Addressed to someone else", body = ErrorBody),
        (status = 404, description = "Notification not found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn mark_read(
    auth: AuthUser,
    service: web::Data<NotificationService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, LeaveError> {
    let notification = service.mark_read(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(notification))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/read-admin",
    responses(
        (status = 200, description = "Broadcast notifications marked as read", body = MarkedRead),
        (status = 403, description = "HR/Admin only", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn mark_admin_read(
    auth: AuthUser,
    service: web::Data<NotificationService>,
) -> Result<HttpResponse, LeaveError> {
    let marked = service.mark_broadcast_read(&auth).await?;
    Ok(HttpResponse::Ok().json(marked))
}
