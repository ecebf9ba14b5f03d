use std::sync::Arc;

use actix_web::{App, http::StatusCode, middleware::from_fn, test, web};
use serde_json::{Value, json};

use crate::auth::{jwt::generate_access_token, middleware::auth_middleware};
use crate::config::Config;
use crate::routes;
use crate::service::events::BroadcastPublisher;
use crate::service::leave::LeaveService;
use crate::service::notification::NotificationService;
use crate::service::reconcile::{EntitlementPolicy, Reconciler};
use crate::store::memory::MemoryStore;

const SECRET: &str = "leave-api-test-secret";

fn config() -> Config {
    Config::from_lookup(|key: &str| match key {
        "SERVER_ADDR" => Some("127.0.0.1:0".to_string()),
        "JWT_SECRET" => Some(SECRET.to_string()),
        "STORE_BACKEND" => Some("memory".to_string()),
        _ => None,
    })
    .unwrap()
}

fn services() -> (LeaveService, NotificationService) {
    let store = Arc::new(MemoryStore::new());
    let reconciler = Reconciler::new(store.clone(), store.clone(), EntitlementPolicy::default());
    let leaves = LeaveService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(BroadcastPublisher::new(16)),
        reconciler,
    );
    (leaves, NotificationService::new(store))
}

// The rate limiter keys on the peer address, which test requests lack, so
// the protected scope is mounted with auth only.
macro_rules! test_app {
    () => {{
        let (leaves, notifications) = services();
        test::init_service(
            App::new()
                .app_data(web::Data::new(config()))
                .app_data(web::Data::new(leaves))
                .app_data(web::Data::new(notifications))
                .service(
                    web::scope("/api/v1")
                        .wrap(from_fn(auth_middleware))
                        .configure(routes::api_routes),
                ),
        )
        .await
    }};
}

fn bearer(role: u8, employee_id: Option<u64>) -> (&'static str, String) {
    let token = generate_access_token(
        employee_id.unwrap_or(1) + 9_000,
        "tester".to_string(),
        role,
        employee_id,
        SECRET,
        3600,
    )
    .unwrap();
    ("Authorization", format!("Bearer {token}"))
}

fn hr() -> (&'static str, String) {
    bearer(2, None)
}

fn employee(employee_id: u64) -> (&'static str, String) {
    bearer(3, Some(employee_id))
}

fn annual_leave(employee_id: u64) -> Value {
    json!({
        "employee_id": employee_id,
        "applicant_name": "Jane Doe",
        "leave_type": "Annual",
        "start_date": "2024-01-10",
        "end_date": "2024-01-12",
        "resumption_date": "2024-01-15",
        "reason": "Family trip"
    })
}

#[actix_web::test]
async fn requests_without_token_are_unauthorized() {
    let app = test_app!();
    let req = test::TestRequest::get().uri("/api/v1/leave/balance/1000").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "UnauthorizedError");
}

#[actix_web::test]
async fn submit_approve_and_read_balance() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .insert_header(employee(1000))
        .set_json(annual_leave(1000))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "Pending");
    assert_eq!(created["duration_days"], 3);
    let id = created["id"].as_u64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{id}/approve"))
        .insert_header(hr())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let approved: Value = test::read_body_json(resp).await;
    assert_eq!(approved["status"], "Approved");

    let req = test::TestRequest::get()
        .uri("/api/v1/leave/balance/1000")
        .insert_header(employee(1000))
        .to_request();
    let balance: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(balance, json!([{ "type": "Annual", "available": 57 }]));
}

#[actix_web::test]
async fn status_body_decides_leave() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .insert_header(employee(7))
        .set_json(annual_leave(7))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_u64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{id}/status"))
        .insert_header(hr())
        .set_json(json!({ "status": "Rejected" }))
        .to_request();
    let rejected: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(rejected["status"], "Rejected");

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{id}/status"))
        .insert_header(hr())
        .set_json(json!({ "status": "Pending" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn reversed_dates_are_a_validation_error() {
    let app = test_app!();
    let mut body = annual_leave(1000);
    body["start_date"] = json!("2024-01-12");
    body["end_date"] = json!("2024-01-10");

    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .insert_header(employee(1000))
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = test::read_body_json(resp).await;
    assert_eq!(err["kind"], "ValidationError");
    assert_eq!(err["message"], "end date before start date");

    let req = test::TestRequest::get()
        .uri("/api/v1/leave/employee/1000")
        .insert_header(employee(1000))
        .to_request();
    let leaves: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(leaves, json!([]));
}

#[actix_web::test]
async fn malformed_json_uses_error_body() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .insert_header(employee(1000))
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = test::read_body_json(resp).await;
    assert_eq!(err["kind"], "ValidationError");
}

#[actix_web::test]
async fn employees_cannot_decide_or_peek() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .insert_header(employee(1000))
        .set_json(annual_leave(1000))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_u64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{id}/approve"))
        .insert_header(employee(1000))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let err: Value = test::read_body_json(resp).await;
    assert_eq!(err["kind"], "ForbiddenError");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/leave/{id}"))
        .insert_header(employee(2000))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/leave")
        .insert_header(employee(1000))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn missing_leave_is_not_found() {
    let app = test_app!();
    for req in [
        test::TestRequest::get().uri("/api/v1/leave/99"),
        test::TestRequest::delete().uri("/api/v1/leave/99"),
        test::TestRequest::put().uri("/api/v1/leave/99/reject"),
    ] {
        let resp = test::call_service(&app, req.insert_header(hr()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let err: Value = test::read_body_json(resp).await;
        assert_eq!(err["kind"], "NotFoundError");
    }
}

#[actix_web::test]
async fn non_numeric_id_is_a_validation_error() {
    let app = test_app!();
    let req = test::TestRequest::get()
        .uri("/api/v1/leave/abc")
        .insert_header(hr())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let err: Value = test::read_body_json(resp).await;
    assert_eq!(err["kind"], "ValidationError");
}

#[actix_web::test]
async fn edit_then_delete_pending_leave() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .insert_header(employee(1000))
        .set_json(annual_leave(1000))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_u64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{id}"))
        .insert_header(employee(1000))
        .set_json(json!({ "end_date": "2024-01-16" }))
        .to_request();
    let edited: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(edited["duration_days"], 7);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/leave/{id}"))
        .insert_header(employee(1000))
        .to_request();
    let deleted: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(deleted, json!({ "id": id }));

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/leave/{id}"))
        .insert_header(employee(1000))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn hr_lists_with_filters_and_paging() {
    let app = test_app!();
    for employee_id in [1, 2, 2] {
        let req = test::TestRequest::post()
            .uri("/api/v1/leave")
            .insert_header(hr())
            .set_json(annual_leave(employee_id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri("/api/v1/leave?employee_id=2&per_page=1")
        .insert_header(hr())
        .to_request();
    let page: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["per_page"], 1);
    assert_eq!(page["data"].as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn page_far_past_the_end_is_empty() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .insert_header(employee(1000))
        .set_json(annual_leave(1000))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/v1/leave?page=18446744073709551615&per_page=100")
        .insert_header(hr())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"], json!([]));
}

#[actix_web::test]
async fn notification_routes_follow_the_lifecycle() {
    let app = test_app!();
    let req = test::TestRequest::post()
        .uri("/api/v1/leave")
        .insert_header(employee(1000))
        .set_json(annual_leave(1000))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let id = created["id"].as_u64().unwrap();

    let req = test::TestRequest::get()
        .uri("/api/v1/notifications")
        .insert_header(hr())
        .to_request();
    let admin_feed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(admin_feed[0]["message"], "Jane Doe applied for Annual leave");
    assert_eq!(admin_feed[0]["target_user_id"], Value::Null);

    let req = test::TestRequest::put()
        .uri("/api/v1/notifications/read-admin")
        .insert_header(hr())
        .to_request();
    let marked: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(marked["updated"], 1);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/leave/{id}/reject"))
        .insert_header(hr())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/notifications")
        .insert_header(employee(1000))
        .to_request();
    let own_feed: Value = test::call_and_read_body_json(&app, req).await;
    let own = own_feed.as_array().unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0]["message"], "Your leave was Rejected");
    let notice_id = own[0]["id"].as_u64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/notifications/{notice_id}/read"))
        .insert_header(employee(2000))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/notifications/{notice_id}/read"))
        .insert_header(employee(1000))
        .to_request();
    let read: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(read["is_read"], true);
}
