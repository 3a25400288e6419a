//! Identity Mapping
//!
//! Builds the model id → matching key table from the model query channel and
//! derives its inverse.

pub mod adapter;
pub mod builder;
pub mod reverse;

pub use adapter::canonical_key;
pub use builder::{ModelConnection, ModelIndex, ModelIndexBuilder, ModelRow, RowStream, BUILDING_QUERY};
pub use reverse::{invert, KeyCollision, KeyIndex};
