// handlers/protected/mod.rs - token required
//
// Each handler receives the `Caller` inserted by the auth middleware and the
// shared `AppState`. List handlers build a filter from the query string,
// resolve the sort and hand both to the listing service.
pub mod activity;
pub mod area;
pub mod audit;
pub mod category;
pub mod checklist;
pub mod common;
pub mod location;
pub mod question;
pub mod report;
pub mod task;
pub mod user;
