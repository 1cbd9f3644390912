pub mod auth;
pub mod dashboard;
pub mod error_code;
pub mod helpers;
pub mod routes;
pub mod types;

pub use auth::LoginRateKey;
pub use error_code::ErrorCode;
pub use helpers::{error_from_beacon, error_response, extract_bearer_token, success_response};
pub use routes::admin_routes;
pub use types::ApiResponse;
