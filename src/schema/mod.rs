//! Validation schemas derived from resource descriptors.

mod derive;
mod object;
pub use derive::*;
pub use object::{ObjectSchema, SchemaField};
