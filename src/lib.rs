//! Finance Dashboard Server Library
//!
//! This module exports the core types and functions for testing and reuse.

pub mod accounts;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod finance;
pub mod models;
pub mod reports;
pub mod routes;
pub mod security;
pub mod sync;

pub use config::Config;
pub use db::{MemoryTableStore, PgTableStore, Store, Table, TableStore};
pub use error::{AppError, Result};
pub use sync::TableSynchronizer;

use axum::{
    routing::{get, patch, post},
    Router,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub sync: TableSynchronizer,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState over the given store and configuration
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            sync: TableSynchronizer::new(store),
            config,
        }
    }
}

/// Build the API router (without CORS/tracing layers)
pub fn router(state: AppState) -> Router {
    use routes::*;

    Router::new()
        .route("/health", get(health_check))
        .route("/api/login", post(login))
        .route("/api/data", get(load_all_data))
        .route("/api/data/:table", get(load_table_data).put(save_table_data))
        .route("/api/summary", get(dashboard_summary))
        .route("/api/reports/monthly", post(save_monthly_report))
        .route("/api/reports/monthly/html", get(monthly_report_html))
        .route("/api/projections/contribution", post(contribution_plan))
        .route(
            "/api/admin/users",
            get(list_users).post(create_user).put(replace_users),
        )
        .route("/api/admin/users/:usuario", patch(update_user))
        .with_state(state)
}
