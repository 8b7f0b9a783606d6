mod http;
mod traits;

pub use http::{HttpKeyService, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use traits::{KeyService, ServiceError};
