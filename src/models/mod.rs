pub mod frame;
pub mod report;
pub mod user;

pub use frame::Frame;
pub use report::MonthlyReport;
pub use user::{normalize_roster, UserAccount, UserSummary};
