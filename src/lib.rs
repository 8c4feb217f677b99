//! # relmap
//!
//! Relation inference and automatic join compilation for ORM-style entity
//! graphs.
//!
//! ## Quick Start
//!
//! ```rust
//! use relmap::prelude::*;
//!
//! # fn main() -> relmap::Result<()> {
//! let mut schemes = Schemes::new();
//! schemes.add(
//!     EntityDef::new("Country")
//!         .column(Column::new("Id", ValueType::Int).at(&[0]))
//!         .column(Column::new("Name", ValueType::Text).at(&[1])),
//! )?;
//! let order = schemes.add(
//!     EntityDef::new("Order")
//!         .column(Column::new("Id", ValueType::Int).at(&[0]))
//!         .column(Column::new("CountryId", ValueType::Int).at(&[1]))
//!         .relation(RelationDef::new("Country", "Country").at(&[2])),
//! )?;
//!
//! let compiled = compile_condition(&schemes, order, "Country.Name = ?", &["NL"])?;
//! assert_eq!(compiled.sql, "`_order_country`.`name` = ?");
//! assert_eq!(
//!     compiled.joins[0].render(schemes.dialect()),
//!     "JOIN `country` AS `_order_country` ON `_order`.`country_id` = `_order_country`.`id`"
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate          | Contents                                         |
//! |----------------|--------------------------------------------------|
//! | `relmap-types` | [`Dialect`], [`ValueType`]                       |
//! | `relmap-core`  | schema graph, lexer, path resolver, splitter     |

pub use relmap_core::*;
pub use relmap_types::{Dialect, DialectParseError, ValueType};

/// Everything needed to register entities and compile statements.
pub mod prelude {
    pub use relmap_core::prelude::*;
}
