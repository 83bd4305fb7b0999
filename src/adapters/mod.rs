//! Concrete adapter implementations for ports.

pub mod artifact_store;
pub mod csv_adapter;
pub mod file_config_adapter;
