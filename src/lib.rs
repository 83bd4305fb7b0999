//! lightquant: single-symbol research pipeline for a dual moving-average strategy.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`]. [`pipeline`] sequences the
//! acquire, optimize, features and labels stages over one run workspace.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod pipeline;
pub mod cli;
