//! Schema graph, path resolution and join compilation for relmap.
//!
//! Entities are registered into [`Schemes`], which infers the relation kind
//! of every declared relation from column naming. A [`QueryCompiler`] then
//! turns dotted relation paths in conditions, orderings and eager-load lists
//! into aliased joins over that graph.

mod trace;

pub mod config;
pub mod depends;
pub mod error;
pub mod lexer;
pub mod naming;
pub mod plan;
pub mod resolve;
pub mod schema;
pub mod select;

// Re-export key types
pub use config::{ConfigError, NamingConfig, RelmapConfig};
pub use depends::{Depends, Dependents, FollowUp, ScanTarget, SelectColumn, compile_dependents};
pub use error::{RelmapError, Result};
pub use naming::{NamingStrategy, SnakeCaseNaming};
pub use plan::{Edge, EdgePath, JoinClause, JoinPlan, JoinType};
pub use resolve::{CompiledCondition, Fragment, PathSegment, QueryCompiler, compile_condition};
pub use schema::{
    Column, EntityDef, EntityId, EntityNode, FieldIndex, Pivot, Relation, RelationDef,
    RelationKind, RelationRef, Schemes,
};
pub use select::{SelectBuilder, SelectStatement};

pub mod prelude {
    pub use crate::config::RelmapConfig;
    pub use crate::depends::{Dependents, compile_dependents};
    pub use crate::error::{RelmapError, Result};
    pub use crate::naming::{NamingStrategy, SnakeCaseNaming};
    pub use crate::resolve::{QueryCompiler, compile_condition};
    pub use crate::schema::{Column, EntityDef, EntityId, RelationDef, RelationKind, Schemes};
    pub use crate::select::SelectBuilder;
    pub use relmap_types::{Dialect, ValueType};
}
