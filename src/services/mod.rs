pub mod accounts;
pub mod activity_log;
pub mod audits;
pub mod listing;
pub mod questions;
pub mod reports;

pub use activity_log::{record, ActivityEntry};
pub use listing::{list_all, list_page};
