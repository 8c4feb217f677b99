use compact_str::CompactString;

use super::column::Column;
use super::relation::{EntityId, Relation, RelationDef};
use crate::naming::NamingStrategy;

/// Input contract for registering an entity.
///
/// The column and relation lists come from whatever extracts structural
/// metadata; relmap only needs names, types and field positions.
///
/// ```
/// use relmap_core::schema::{Column, EntityDef, RelationDef};
/// use relmap_types::ValueType;
///
/// let order = EntityDef::new("Order")
///     .column(Column::new("Id", ValueType::Int).at(&[0]))
///     .column(Column::new("AddressId", ValueType::Int).at(&[1]))
///     .relation(RelationDef::new("Address", "Address").at(&[2]))
///     .identity("Id");
/// assert_eq!(order.type_key, "Order");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDef {
    /// Unique identity of the structural type, e.g. `shop::Order`.
    pub type_key: CompactString,
    pub name: CompactString,
    /// Overrides the table name the naming strategy would pick.
    pub table: Option<CompactString>,
    pub columns: Vec<Column>,
    pub relations: Vec<RelationDef>,
    pub primary_keys: Vec<CompactString>,
    /// Identity / auto-increment column.
    pub identity: Option<CompactString>,
}

impl EntityDef {
    pub fn new(name: impl Into<CompactString>) -> Self {
        let name = name.into();
        Self {
            type_key: name.clone(),
            name,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn type_key(mut self, key: impl Into<CompactString>) -> Self {
        self.type_key = key.into();
        self
    }

    #[must_use]
    pub fn table(mut self, table: impl Into<CompactString>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    #[must_use]
    pub fn columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    #[must_use]
    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    #[must_use]
    pub fn primary_key(mut self, column: impl Into<CompactString>) -> Self {
        self.primary_keys.push(column.into());
        self
    }

    #[must_use]
    pub fn identity(mut self, column: impl Into<CompactString>) -> Self {
        self.identity = Some(column.into());
        self
    }
}

/// Schema representation of one registered entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityNode {
    pub id: EntityId,
    pub type_key: CompactString,
    pub name: CompactString,
    pub table: CompactString,
    /// Alias used when this entity is the root of a statement.
    pub alias: CompactString,
    pub columns: Vec<Column>,
    pub relations: Vec<Relation>,
    /// Candidate key columns, as indexes into `columns`.
    pub primary_keys: Vec<usize>,
    pub identity: Option<usize>,
}

impl EntityNode {
    pub(crate) fn build(id: EntityId, def: EntityDef, naming: &dyn NamingStrategy) -> Self {
        let table: CompactString = match def.table {
            Some(table) => table,
            None => naming.table_name(&def.name).into(),
        };
        let alias = naming.table_alias(&table).into();

        let columns: Vec<Column> = def
            .columns
            .into_iter()
            .map(|mut column| {
                column.name = naming.column_name(&column.field).into();
                column
            })
            .collect();

        let relations = def
            .relations
            .into_iter()
            .map(|rel| Relation {
                column_name: naming.column_name(&rel.name).into(),
                name: rel.name,
                target_type: rel.target,
                field_index: Some(rel.field_index),
                kind: super::RelationKind::Unresolved,
            })
            .collect();

        let position = |wanted: &str| columns.iter().position(|c| c.matches(wanted));
        let primary_keys = def.primary_keys.iter().filter_map(|k| position(k)).collect();
        let identity = def.identity.as_deref().and_then(position);

        Self {
            id,
            type_key: def.type_key,
            name: def.name,
            table,
            alias,
            columns,
            relations,
            primary_keys,
            identity,
        }
    }

    /// Key column used for joins: identity, then first primary key, then `id`.
    #[must_use]
    pub fn key_column(&self) -> Option<&Column> {
        self.identity
            .or_else(|| self.primary_keys.first().copied())
            .or_else(|| self.columns.iter().position(|c| c.name.eq_ignore_ascii_case("id")))
            .map(|i| &self.columns[i])
    }

    /// Position of the column with this exact SQL name.
    #[must_use]
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Looks up a column by field or column name, ignoring case.
    #[must_use]
    pub fn find_column(&self, field: &str, naming: &dyn NamingStrategy) -> Option<&Column> {
        let snake = naming.column_name(field);
        self.columns
            .iter()
            .find(|c| c.matches(field) || c.name == snake)
    }

    /// Relations whose name matches `segment`, in declaration order.
    pub fn relations_named<'a>(
        &'a self,
        segment: &'a str,
        naming: &dyn NamingStrategy,
    ) -> impl Iterator<Item = (usize, &'a Relation)> + 'a {
        let snake = naming.column_name(segment);
        self.relations
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.matches(segment, &snake))
    }

    /// Whether `segment` names this entity, ignoring case.
    pub(crate) fn is_named(&self, segment: &str, naming: &dyn NamingStrategy) -> bool {
        self.name.eq_ignore_ascii_case(segment)
            || naming.column_name(&self.name) == naming.column_name(segment)
    }
}
