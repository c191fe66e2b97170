pub mod auth;
pub mod response;

pub use auth::{require_auth, restrict_to, CurrentUser};
pub use response::ApiResponse;
