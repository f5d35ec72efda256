pub mod collection;
pub mod manager;
pub mod pg_store;
pub mod populate;
pub mod query_builder;
pub mod store;

pub use collection::Collection;
pub use manager::{DatabaseError, DatabaseManager};
pub use pg_store::PgStore;
pub use populate::{populate, Populate};
pub use store::{Document, DocumentStore, FindOptions};
