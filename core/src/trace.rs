//! Tracing utilities for schema registration and path compilation.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]` boilerplate
//! at every call site.

/// Emit a debug-level event when an entity is registered.
///
/// ```ignore
/// relmap_trace_entity!(&node.name, &node.table);
/// ```
#[macro_export]
macro_rules! relmap_trace_entity {
    ($name:expr, $table:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(entity = %$name, table = %$table, "relmap.register");
    };
}

/// Emit a trace-level event when a relation gets classified.
#[macro_export]
macro_rules! relmap_trace_relation {
    ($entity:expr, $relation:expr, $kind:expr) => {
        #[cfg(feature = "tracing")]
        tracing::trace!(entity = %$entity, relation = %$relation, kind = $kind, "relmap.relation");
    };
}

/// Emit a trace-level event for join allocation or reuse.
///
/// ```ignore
/// relmap_trace_join!("alloc", &alias, &table);
/// ```
#[macro_export]
macro_rules! relmap_trace_join {
    ($event:literal, $alias:expr, $table:expr) => {
        #[cfg(feature = "tracing")]
        tracing::trace!(event = $event, alias = %$alias, table = %$table, "relmap.join");
    };
}

/// Emit a debug-level event when a speculative dependent path is dropped.
#[macro_export]
macro_rules! relmap_trace_skip {
    ($path:expr, $reason:literal) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %$path, reason = $reason, "relmap.depends.skip");
    };
}

/// Emit a debug-level event with compiled SQL text and bind count.
#[macro_export]
macro_rules! relmap_trace_sql {
    ($sql:expr, $bind_count:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, binds = $bind_count, "relmap.compile");
    };
}
