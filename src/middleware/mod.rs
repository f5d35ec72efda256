pub mod auth;
pub mod response;

pub use auth::{authorize, require_admin, require_member};
pub use response::{ApiResponse, ApiResult};
