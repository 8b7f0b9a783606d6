pub mod api_key;
pub mod docs;
pub mod error;
pub mod session;

pub use api_key::{mask_secret, ApiKey};
pub use error::FindorError;
pub use session::Session;
