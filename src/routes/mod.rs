pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod data;
pub mod health;
pub mod validation;

pub use admin::{create_user, list_users, replace_users, update_user};
pub use auth::{login, AdminSession, AuthSession};
pub use dashboard::{
    contribution_plan, dashboard_summary, monthly_report_html, save_monthly_report,
};
pub use data::{load_all_data, load_table_data, save_table_data};
pub use health::health_check;
pub use validation::{claim_rows, timestamp_to_rfc3339};
