pub mod gatekeeper;
pub mod organization;
pub mod response;

pub use gatekeeper::{gate, gatekeeper, Gate};
pub use organization::{organization_guard, Verdict};
pub use response::{ApiResponse, ApiResult, PRIVATE_SHORT_CACHE};
