//! Port traits implemented by [`crate::adapters`].

pub mod acquisition_port;
pub mod artifact_port;
pub mod config_port;
