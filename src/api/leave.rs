use crate::auth::auth::AuthUser;
use crate::error::{ErrorBody, LeaveError};
use crate::model::{
    balance::BalanceView,
    leave::{LeaveDecision, LeaveRecord},
};
use crate::service::leave::{
    DeletedLeave, EditLeave, LeaveFilter, LeaveListResponse, LeaveService, StatusUpdate, SubmitLeave,
};
use actix_web::{HttpResponse, web};

type HandlerResult = Result<HttpResponse, LeaveError>;

/* =========================
Submit leave
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = SubmitLeave,
        description = "Leave application payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave submitted, pending approval", body = LeaveRecord),
        (status = 400, description = "Missing fields or end date before start date", body = ErrorBody),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Submitting for another employee", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn submit_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<SubmitLeave>,
) -> HandlerResult {
    let record = service.submit(&auth, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(record))
}

/* =========================
Edit pending leave
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to edit")
    ),
    request_body = EditLeave,
    responses(
        (status = 200, description = "Leave updated", body = LeaveRecord),
        (status = 400, description = "Leave already decided or invalid dates", body = ErrorBody),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 404, description = "Leave request not found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn edit_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<EditLeave>,
) -> HandlerResult {
    let record = service
        .edit(&auth, path.into_inner(), payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/* =========================
Approve / reject (HR/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/status",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to decide")
    ),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Leave status updated", body = LeaveRecord),
        (status = 400, description = "Unknown status", body = ErrorBody),
        (status = 403, description = "HR/Admin only", body = ErrorBody),
        (status = 404, description = "Leave request not found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_status(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<StatusUpdate>,
) -> HandlerResult {
    let record = service
        .update_status(&auth, path.into_inner(), payload.status)
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = LeaveRecord),
        (status = 403, description = "HR/Admin only", body = ErrorBody),
        (status = 404, description = "Leave request not found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> HandlerResult {
    let record = service
        .update_status(&auth, path.into_inner(), LeaveDecision::Approved)
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRecord),
        (status = 403, description = "HR/Admin only", body = ErrorBody),
        (status = 404, description = "Leave request not found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> HandlerResult {
    let record = service
        .update_status(&auth, path.into_inner(), LeaveDecision::Rejected)
        .await?;
    Ok(HttpResponse::Ok().json(record))
}

/* =========================
Delete leave
========================= */
#[utoipa::path(
    delete,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to delete")
    ),
    responses(
        (status = 200, description = "Leave deleted", body = DeletedLeave),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 404, description = "Leave request not found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> HandlerResult {
    let deleted = service.delete(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(deleted))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden", body = ErrorBody),
        (status = 404, description = "Leave request not found", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> HandlerResult {
    let record = service.get(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<LeaveFilter>,
) -> HandlerResult {
    let page = service.list(&auth, &query).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/leave/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose leave to list")
    ),
    responses(
        (status = 200, description = "Leave applications, newest first", body = [LeaveRecord]),
        (status = 403, description = "Forbidden", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn employee_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> HandlerResult {
    let leaves = service.list_for_employee(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leaves))
}

#[utoipa::path(
    get,
    path = "/api/v1/leave/balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee whose balance to read")
    ),
    responses(
        (status = 200, description = "Available days per leave type", body = [BalanceView]),
        (status = 403, description = "Forbidden", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_balance(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> HandlerResult {
    let balance = service.balance(&auth, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(balance))
}
