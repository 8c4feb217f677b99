//! Schema graph: registered entities and the relations inferred between them.
//!
//! Entities live in an arena addressed by [`EntityId`]; relations point at
//! their targets by id. Every [`Schemes::add`] re-runs relation resolution
//! over all nodes, since a new entity can satisfy relations declared earlier.

mod column;
mod entity;
mod relation;

pub use column::{Column, FieldIndex};
pub use entity::{EntityDef, EntityNode};
pub use relation::{EntityId, Pivot, Relation, RelationDef, RelationKind, RelationRef};

use compact_str::{CompactString, ToCompactString};
use hashbrown::HashMap;

use relmap_types::Dialect;

use crate::config::RelmapConfig;
use crate::error::{RelmapError, Result};
use crate::naming::{NamingStrategy, SnakeCaseNaming};

/// Mapping from entity identity to entity node.
///
/// Mutation goes through `&mut self`, so registration is single-writer; once
/// built, `&Schemes` can be shared across threads for compilation.
pub struct Schemes {
    nodes: Vec<EntityNode>,
    by_key: HashMap<CompactString, EntityId>,
    /// Lower-cased name -> first entity registered under it.
    by_name: HashMap<CompactString, EntityId>,
    naming: Box<dyn NamingStrategy>,
    dialect: Dialect,
}

impl core::fmt::Debug for Schemes {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Schemes")
            .field("nodes", &self.nodes)
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl Default for Schemes {
    fn default() -> Self {
        Self::new()
    }
}

impl Schemes {
    /// Empty graph with [`SnakeCaseNaming`] and the MySQL dialect.
    pub fn new() -> Self {
        Self::with_naming(SnakeCaseNaming::default(), Dialect::default())
    }

    pub fn with_naming(naming: impl NamingStrategy + 'static, dialect: Dialect) -> Self {
        Self {
            nodes: Vec::new(),
            by_key: HashMap::new(),
            by_name: HashMap::new(),
            naming: Box::new(naming),
            dialect,
        }
    }

    pub fn with_config(config: &RelmapConfig) -> Self {
        Self::with_naming(config.naming_strategy(), config.dialect)
    }

    #[inline]
    pub fn naming(&self) -> &dyn NamingStrategy {
        self.naming.as_ref()
    }

    #[inline]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityNode> {
        self.nodes.iter()
    }

    /// Node for an id handed out by this graph.
    #[inline]
    pub fn node(&self, id: EntityId) -> &EntityNode {
        &self.nodes[id.index()]
    }

    /// The relation an edge reference points at.
    #[inline]
    pub fn relation(&self, r: RelationRef) -> &Relation {
        &self.node(r.entity).relations[r.index]
    }

    /// Registers an entity and re-resolves relations across the whole graph.
    pub fn add(&mut self, def: EntityDef) -> Result<EntityId> {
        if self.by_key.contains_key(&def.type_key) {
            return Err(RelmapError::DuplicateEntity(def.type_key));
        }

        let id = EntityId(self.nodes.len() as u32);
        let node = EntityNode::build(id, def, self.naming.as_ref());
        crate::relmap_trace_entity!(node.name, node.table);

        self.by_key.insert(node.type_key.clone(), id);
        self.by_name
            .entry(node.name.to_ascii_lowercase().to_compact_string())
            .or_insert(id);
        self.nodes.push(node);

        self.resolve_relations();
        self.synthesize_reverse();
        Ok(id)
    }

    /// Looks an entity up by its type identity.
    pub fn find(&self, type_key: &str) -> Result<&EntityNode> {
        self.by_key
            .get(type_key)
            .map(|id| self.node(*id))
            .ok_or_else(|| RelmapError::EntityNotFound(type_key.into()))
    }

    /// Looks an entity up by name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Result<&EntityNode> {
        self.by_name
            .get(name.to_ascii_lowercase().as_str())
            .map(|id| self.node(*id))
            .ok_or_else(|| RelmapError::EntityNotFound(name.into()))
    }

    fn resolve_relations(&mut self) {
        for owner in 0..self.nodes.len() {
            for index in 0..self.nodes[owner].relations.len() {
                if self.nodes[owner].relations[index].kind.is_resolved() {
                    continue;
                }
                let kind = self.classify(&self.nodes[owner], &self.nodes[owner].relations[index]);
                crate::relmap_trace_relation!(
                    self.nodes[owner].name,
                    self.nodes[owner].relations[index].name,
                    kind.label()
                );
                self.nodes[owner].relations[index].kind = kind;
            }
        }
    }

    fn classify(&self, owner: &EntityNode, relation: &Relation) -> RelationKind {
        let Some(&target) = self.by_key.get(&relation.target_type) else {
            return RelationKind::Unresolved;
        };

        let local_fk = self.naming.foreign_key(&relation.column_name);
        if let Some(foreign_key) = owner.column_position(&local_fk) {
            return RelationKind::BelongsTo { target, foreign_key };
        }

        let target_node = self.node(target);
        let remote_fk = self.naming.foreign_key(&self.naming.column_name(&owner.name));
        if let Some(foreign_key) = target_node.column_position(&remote_fk) {
            return RelationKind::HasMany { target, foreign_key };
        }

        RelationKind::ManyToMany {
            target,
            pivot: self.pivot_between(owner, target_node, relation),
        }
    }

    /// Junction for `owner -> target`. A self-referencing relation names its
    /// far column after the relation, since both sides share one entity.
    fn pivot_between(&self, owner: &EntityNode, target: &EntityNode, relation: &Relation) -> Pivot {
        let naming = self.naming.as_ref();
        let local_column = naming.foreign_key(&naming.column_name(&owner.name));
        let remote_column = if owner.id == target.id {
            naming.foreign_key(&relation.column_name)
        } else {
            naming.foreign_key(&naming.column_name(&target.name))
        };
        Pivot {
            table: naming.pivot_table_name(&owner.name, &target.name).into(),
            local_column: local_column.into(),
            remote_column: remote_column.into(),
        }
    }

    /// Mirrors every many-to-many relation onto a target that has no
    /// relation pointing back at the owner.
    fn synthesize_reverse(&mut self) {
        let mut additions: Vec<(EntityId, EntityId, Pivot)> = Vec::new();

        for node in &self.nodes {
            for relation in &node.relations {
                let RelationKind::ManyToMany { target, pivot } = &relation.kind else {
                    continue;
                };
                let back = self.node(*target);
                let mirrored = back
                    .relations
                    .iter()
                    .any(|r| r.kind.target() == Some(node.id) || r.target_type == node.type_key);
                let pending = additions
                    .iter()
                    .any(|(t, source, _)| t == target && *source == node.id);
                if !mirrored && !pending {
                    additions.push((*target, node.id, pivot.flipped()));
                }
            }
        }

        for (target, source, pivot) in additions {
            let source = self.node(source);
            let relation = Relation {
                name: source.name.clone(),
                column_name: self.naming.column_name(&source.name).into(),
                target_type: source.type_key.clone(),
                field_index: None,
                kind: RelationKind::Reverse {
                    target: source.id,
                    pivot,
                },
            };
            crate::relmap_trace_relation!(self.node(target).name, relation.name, "reverse");
            self.nodes[target.index()].relations.push(relation);
        }
    }
}
