//! Collaborator seams for the seed pipeline.
//!
//! The document store and object storage are external systems; this
//! crate defines the narrow trait contracts the pipeline is allowed to
//! use (find-by-slug/id, upsert-by-slug, atomic array append) plus
//! in-memory implementations backing tests and dry runs.

pub mod entities;
pub mod memory;
pub mod traits;

pub use entities::*;
pub use memory::{InMemoryObjectStorage, InMemoryStore};
pub use traits::{CatalogStore, ExecutionStore, ObjectStorage, StoreError, StyleStore};
