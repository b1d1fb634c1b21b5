pub mod auth;
pub mod gate;
pub mod response;

pub use auth::{ApiAuthorizer, ApiRejection, AuthContext};
pub use gate::access_gate_middleware;
pub use response::{ApiResponse, ApiResult};
