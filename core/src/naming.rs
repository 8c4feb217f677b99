//! Naming conventions mapping entity and field names onto SQL names.
//!
//! Every function here is pure: the same input always yields the same name,
//! which is what keeps join aliases stable across compile calls.

use heck::ToSnakeCase;

/// Maps entity and field names onto table, column, alias and junction names.
///
/// Implementations must be deterministic and side-effect free.
/// [`pivot_table_name`](NamingStrategy::pivot_table_name) must be symmetric
/// in its two arguments.
pub trait NamingStrategy: Send + Sync {
    /// Table name for an entity, e.g. `OrderLine` -> `order_line`.
    fn table_name(&self, entity: &str) -> String;

    /// Column name for a field, e.g. `OptionalAddress` -> `optional_address`.
    fn column_name(&self, field: &str) -> String;

    /// Alias for a root table reference, e.g. `order` -> `_order`.
    fn table_alias(&self, table: &str) -> String;

    /// Junction table for a many-to-many pair, independent of argument order.
    fn pivot_table_name(&self, a: &str, b: &str) -> String;

    /// Foreign key column referencing a relation column, e.g. `address` -> `address_id`.
    fn foreign_key(&self, column: &str) -> String {
        format!("{column}_id")
    }

    /// Alias for a table reached from `parent` over `relation`.
    fn join_alias(&self, parent: &str, relation: &str) -> String {
        format!("{parent}_{}", self.column_name(relation))
    }

    /// Alias for the junction table sitting in front of the join aliased `alias`.
    fn pivot_alias(&self, alias: &str) -> String {
        format!("{alias}_pivot")
    }
}

/// Default strategy: lower snake case everywhere, root aliases prefixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnakeCaseNaming {
    pub alias_prefix: String,
    pub foreign_key_suffix: String,
    pub pivot_separator: String,
    pub pivot_alias_suffix: String,
}

impl Default for SnakeCaseNaming {
    fn default() -> Self {
        Self {
            alias_prefix: "_".to_string(),
            foreign_key_suffix: "_id".to_string(),
            pivot_separator: "_".to_string(),
            pivot_alias_suffix: "pivot".to_string(),
        }
    }
}

impl NamingStrategy for SnakeCaseNaming {
    fn table_name(&self, entity: &str) -> String {
        entity.to_snake_case()
    }

    fn column_name(&self, field: &str) -> String {
        field.to_snake_case()
    }

    fn table_alias(&self, table: &str) -> String {
        format!("{}{table}", self.alias_prefix)
    }

    fn pivot_table_name(&self, a: &str, b: &str) -> String {
        let (a, b) = (self.table_name(a), self.table_name(b));
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        format!("{first}{}{second}", self.pivot_separator)
    }

    fn foreign_key(&self, column: &str) -> String {
        format!("{column}{}", self.foreign_key_suffix)
    }

    fn pivot_alias(&self, alias: &str) -> String {
        format!("{alias}_{}", self.pivot_alias_suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case_names() {
        let naming = SnakeCaseNaming::default();
        assert_eq!(naming.table_name("OrderLine"), "order_line");
        assert_eq!(naming.column_name("OptionalAddress"), "optional_address");
        assert_eq!(naming.column_name("id"), "id");
        assert_eq!(naming.table_alias("order"), "_order");
        assert_eq!(naming.foreign_key("address"), "address_id");
    }

    #[test]
    fn test_pivot_table_name_is_symmetric() {
        let naming = SnakeCaseNaming::default();
        let pairs = [("Order", "Tag"), ("Tag", "Order"), ("UserGroup", "Account"), ("A", "A")];
        for (a, b) in pairs {
            assert_eq!(naming.pivot_table_name(a, b), naming.pivot_table_name(b, a));
        }
        assert_eq!(naming.pivot_table_name("Tag", "Order"), "order_tag");
    }

    #[test]
    fn test_chained_join_alias() {
        let naming = SnakeCaseNaming::default();
        let first = naming.join_alias("_order", "OptionalAddress");
        assert_eq!(first, "_order_optional_address");
        assert_eq!(
            naming.join_alias(&first, "Country"),
            "_order_optional_address_country"
        );
        assert_eq!(naming.pivot_alias("_order_tags"), "_order_tags_pivot");
    }

    #[test]
    fn test_custom_prefix_and_suffix() {
        let naming = SnakeCaseNaming {
            alias_prefix: "t_".into(),
            foreign_key_suffix: "_fk".into(),
            pivot_separator: "__".into(),
            pivot_alias_suffix: "link".into(),
        };
        assert_eq!(naming.table_alias("order"), "t_order");
        assert_eq!(naming.foreign_key("address"), "address_fk");
        assert_eq!(naming.pivot_table_name("Tag", "Order"), "order__tag");
        assert_eq!(naming.pivot_alias("t_order_tags"), "t_order_tags_link");
    }
}
