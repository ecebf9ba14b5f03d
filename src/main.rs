use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod routes;
mod service;
mod store;

use config::{Config, StoreBackend};
use db::init_db;

use crate::service::events::BroadcastPublisher;
use crate::service::leave::LeaveService;
use crate::service::notification::NotificationService;
use crate::service::reconcile::Reconciler;
use crate::store::{
    BalanceRepository, LeaveRepository, NotificationRepository, memory::MemoryStore,
    mysql::MySqlStore,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa_swagger_ui::SwaggerUi;

type Repositories = (
    Arc<dyn LeaveRepository>,
    Arc<dyn BalanceRepository>,
    Arc<dyn NotificationRepository>,
);

async fn build_repositories(config: &Config) -> anyhow::Result<Repositories> {
    match config.store_backend {
        StoreBackend::MySql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set for the mysql backend")?;
            let store = Arc::new(MySqlStore::new(init_db(url).await?));
            let leaves: Arc<dyn LeaveRepository> = store.clone();
            let balances: Arc<dyn BalanceRepository> = store.clone();
            let notifications: Arc<dyn NotificationRepository> = store;
            Ok((leaves, balances, notifications))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let leaves: Arc<dyn LeaveRepository> = store.clone();
            let balances: Arc<dyn BalanceRepository> = store.clone();
            let notifications: Arc<dyn NotificationRepository> = store;
            Ok((leaves, balances, notifications))
        }
    }
}

/// Logs every published lifecycle event until the bus closes.
fn spawn_event_log(publisher: &BroadcastPublisher) {
    let mut rx = publisher.subscribe();
    actix_web::rt::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => info!(event = event.name(), "Leave event published"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(backend = ?config.store_backend, "Server starting...");

    let (leaves, balances, notifications) = build_repositories(&config).await?;

    let publisher = BroadcastPublisher::new(config.event_buffer);
    spawn_event_log(&publisher);

    let reconciler = Reconciler::new(leaves.clone(), balances.clone(), config.entitlements.clone());
    let leave_service = Data::new(LeaveService::new(
        leaves,
        balances,
        notifications.clone(),
        Arc::new(publisher),
        reconciler,
    ));
    let notification_service = Data::new(NotificationService::new(notifications));

    let limiter = routes::build_limiter(config.rate_protected_per_min)?;
    let server_addr = config.server_addr.clone();
    let openapi = docs::openapi_for_prefix(&config.api_prefix);
    let config_data = Data::new(config);

    HttpServer::new(move || {
        let api_prefix = config_data.api_prefix.clone();
        let limiter = limiter.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard matches the JS/CSS assets
                    .url("/api-doc/openapi.json", openapi.clone()),
            )
            .app_data(config_data.clone())
            .app_data(leave_service.clone())
            .app_data(notification_service.clone())
            .configure(|cfg| routes::configure(cfg, &api_prefix, limiter))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
