//! State controller for the API key dashboard.
//!
//! [`KeyManager`] owns the key list and the in-flight flags, talks to a
//! [`findor_service::KeyService`], and publishes every change through a
//! `watch` channel so any view can re-render from [`ManagerState`].

mod manager;
mod refresh;
mod state;

pub use manager::{KeyManager, DEFAULT_REFRESH_INTERVAL};
pub use state::{ManagerState, Phase, CREATE_FAILED, DELETE_FAILED, FETCH_FAILED};
