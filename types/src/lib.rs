//! Shared type definitions for relmap
//!
//! This crate provides the vocabulary shared by the relmap crates:
//!
//! - [`Dialect`] - SQL dialect (identifier quoting and placeholder style)
//! - [`ValueType`] - the underlying value type carried by a schema column
//!
//! # Features
//!
//! - `serde` - Enable serde serialization/deserialization

mod dialect;
mod value_type;

pub use dialect::{Dialect, DialectParseError};
pub use value_type::ValueType;

/// Prelude module for commonly used types
pub mod prelude {
    pub use crate::{Dialect, ValueType};
}
