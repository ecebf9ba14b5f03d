use crate::{
    api::{leave, notification},
    auth::middleware::auth_middleware,
    error::LeaveError,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::anyhow;
use std::sync::Arc;

pub type RateLimiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Built once at startup so every worker shares the same per-IP budget.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<RateLimiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limiter settings for {requests_per_min}/min"))?;
    Ok(Arc::new(Governor::new(&cfg)))
}

/// Mounts the protected API: bearer auth plus per-IP rate limiting.
pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: RateLimiter) {
    cfg.service(
        web::scope(api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiter) // rate limiting
            .configure(api_routes),
    );
}

/// Route table without the outer scope so tests can mount it bare.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(
            web::scope("/leave")
                // /leave
                .service(
                    web::resource("")
                        .route(web::get().to(leave::leave_list))
                        .route(web::post().to(leave::submit_leave)),
                )
                // /leave/employee/{employee_id}
                .service(
                    web::resource("/employee/{employee_id}")
                        .route(web::get().to(leave::employee_leave)),
                )
                // /leave/balance/{employee_id}
                .service(
                    web::resource("/balance/{employee_id}")
                        .route(web::get().to(leave::leave_balance)),
                )
                // /leave/{id}
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(leave::get_leave))
                        .route(web::put().to(leave::edit_leave))
                        .route(web::delete().to(leave::delete_leave)),
                )
                // /leave/{id}/status
                .service(
                    web::resource("/{id}/status").route(web::put().to(leave::update_status)),
                )
                // /leave/{id}/approve
                .service(
                    web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)),
                )
                // /leave/{id}/reject
                .service(
                    web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                ),
        )
        .service(
            web::scope("/notifications")
                .service(
                    web::resource("").route(web::get().to(notification::list_notifications)),
                )
                // registered before /{id}/read so the literal segment wins
                .service(
                    web::resource("/read-admin")
                        .route(web::put().to(notification::mark_admin_read)),
                )
                .service(
                    web::resource("/{id}/read").route(web::put().to(notification::mark_read)),
                ),
        );
}

// Extractor failures answer with the same {message, kind} body as the
// service errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| LeaveError::validation(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| LeaveError::validation(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| LeaveError::validation(err.to_string()).into())
}
