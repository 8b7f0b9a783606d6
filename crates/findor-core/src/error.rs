use thiserror::Error;

#[derive(Debug, Error)]
pub enum FindorError {
    /// The embedded docs catalog could not be loaded.
    #[error("catalog error: {0}")]
    Catalog(String),
}
