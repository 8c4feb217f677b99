use compact_str::CompactString;

use super::column::FieldIndex;

/// Stable identity of an entity node inside [`Schemes`](super::Schemes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Address of one relation: the owning entity plus its slot in that
/// entity's relation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationRef {
    pub entity: EntityId,
    pub index: usize,
}

/// A relation as declared by the metadata layer, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDef {
    pub name: CompactString,
    /// Type key of the singular element type.
    pub target: CompactString,
    pub field_index: FieldIndex,
}

impl RelationDef {
    pub fn new(name: impl Into<CompactString>, target: impl Into<CompactString>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            field_index: FieldIndex::new(),
        }
    }

    #[must_use]
    pub fn at(mut self, index: &[usize]) -> Self {
        self.field_index = FieldIndex::from_slice(index);
        self
    }
}

/// Junction table realizing a many-to-many relation.
///
/// `local_column` references the owning side, `remote_column` the target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pivot {
    pub table: CompactString,
    pub local_column: CompactString,
    pub remote_column: CompactString,
}

impl Pivot {
    /// The same junction seen from the other side.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            table: self.table.clone(),
            local_column: self.remote_column.clone(),
            remote_column: self.local_column.clone(),
        }
    }
}

/// Classification of a relation, decided once per resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// Target entity not registered yet.
    Unresolved,
    /// Foreign key lives on the owner; `foreign_key` indexes the owner's columns.
    BelongsTo { target: EntityId, foreign_key: usize },
    /// Foreign key lives on the target; `foreign_key` indexes the target's columns.
    HasMany { target: EntityId, foreign_key: usize },
    ManyToMany { target: EntityId, pivot: Pivot },
    /// Synthesized mirror of a many-to-many relation declared on the target.
    Reverse { target: EntityId, pivot: Pivot },
}

impl RelationKind {
    #[must_use]
    pub const fn target(&self) -> Option<EntityId> {
        match self {
            RelationKind::Unresolved => None,
            RelationKind::BelongsTo { target, .. }
            | RelationKind::HasMany { target, .. }
            | RelationKind::ManyToMany { target, .. }
            | RelationKind::Reverse { target, .. } => Some(*target),
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        !matches!(self, RelationKind::Unresolved)
    }

    /// Whether one owner row matches at most one target row.
    #[must_use]
    pub const fn is_to_one(&self) -> bool {
        matches!(self, RelationKind::BelongsTo { .. })
    }

    #[must_use]
    pub const fn is_to_many(&self) -> bool {
        matches!(
            self,
            RelationKind::HasMany { .. }
                | RelationKind::ManyToMany { .. }
                | RelationKind::Reverse { .. }
        )
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            RelationKind::Unresolved => "unresolved",
            RelationKind::BelongsTo { .. } => "belongs_to",
            RelationKind::HasMany { .. } => "has_many",
            RelationKind::ManyToMany { .. } => "many_to_many",
            RelationKind::Reverse { .. } => "reverse",
        }
    }
}

/// A relation edge attached to an entity node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: CompactString,
    /// Snake-cased relation name; `<column_name>_id` is the local foreign key.
    pub column_name: CompactString,
    pub target_type: CompactString,
    /// Owning field; `None` for synthesized reverse relations.
    pub field_index: Option<FieldIndex>,
    pub kind: RelationKind,
}

impl Relation {
    /// Matches either the declared name or its column form, ignoring case.
    pub(crate) fn matches(&self, segment: &str, segment_column: &str) -> bool {
        self.name.eq_ignore_ascii_case(segment) || self.column_name.eq_ignore_ascii_case(segment_column)
    }
}
