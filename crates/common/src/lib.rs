//! Core data model shared by all lagebot crates.

pub mod types;
