//! Pure domain logic for the Maison seed pipeline.
//!
//! This crate has zero internal dependencies so it can be used by the
//! gateway, the store layer, the seeder, and any future CLI tooling.

pub mod content;
pub mod matching;
pub mod pace;
pub mod placeholder;
pub mod pricing;
pub mod retry;
pub mod types;
