//! Core domain types and logic.

pub mod bar;
pub mod indicator;
pub mod indicator_helpers;
pub mod metrics;
pub mod search;
pub mod features;
pub mod labels;
pub mod dataset;
pub mod task;
pub mod workspace;
pub mod config;
pub mod config_validation;
pub mod error;
