use compact_str::CompactString;
use thiserror::Error;

/// Errors raised while registering entities or compiling path expressions.
///
/// Every variant is a local, deterministic failure: compiling the same input
/// against the same schema yields the same error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RelmapError {
    /// An entity with this identity is already registered
    #[error("entity `{0}` is already registered")]
    DuplicateEntity(CompactString),

    /// No entity is registered under this identity or name
    #[error("entity `{0}` not found")]
    EntityNotFound(CompactString),

    /// A path segment names no relation, forward or reverse
    #[error("cannot resolve relation `{segment}` on entity `{entity}`")]
    UnresolvableRelation {
        segment: CompactString,
        entity: CompactString,
    },

    /// The trailing field of a path is not a column of the resolved entity
    #[error("cannot resolve column `{column}` on entity `{entity}`")]
    UnresolvableColumn {
        column: CompactString,
        entity: CompactString,
    },

    /// A bracket hint matched none of the same-named relations
    #[error("hint `{hint}` matches no relation `{segment}` on entity `{entity}`")]
    AmbiguousRelationHint {
        segment: CompactString,
        hint: CompactString,
        entity: CompactString,
    },

    /// A join needs a key column the entity does not have
    #[error("entity `{entity}` has no primary key column")]
    MissingPrimaryKey { entity: CompactString },

    /// A placeholder was scanned but no bind value was supplied for it
    #[error("no bind value supplied for placeholder #{index}")]
    MissingBindValue { index: usize },
}

/// Result type for schema and compile operations
pub type Result<T> = std::result::Result<T, RelmapError>;
