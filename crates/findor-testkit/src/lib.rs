//! Shared test doubles for the key service: an in-process fake backend
//! served over HTTP, and a scripted in-memory `KeyService`.

pub mod fake_backend;
pub mod scripted;

pub use fake_backend::{spawn_fake_backend, FakeBackend, FakeServer};
pub use scripted::{Op, ScriptedKeyService};
