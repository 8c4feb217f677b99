//! Join plan accumulated while compiling one statement.
//!
//! Joins are keyed by the ordered list of relation edges walked from the
//! root, not by alias text, so two different paths can never share a join
//! by accident and the same path always does.

use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

use relmap_types::Dialect;

use crate::schema::{EntityId, EntityNode, RelationRef};

// =============================================================================
// Join Type Enum
// =============================================================================

/// The type of JOIN operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Join,
    Left,
}

impl JoinType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            JoinType::Join => "JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

// =============================================================================
// Edge keys
// =============================================================================

/// One traversed relation. `reverse` marks an implicit hop found by looking
/// up the relation on the far entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub relation: RelationRef,
    pub reverse: bool,
}

pub type EdgePath = SmallVec<[Edge; 4]>;

/// Key of one join: the edge path plus whether it is the junction table in
/// front of the path's target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct JoinKey {
    pub path: EdgePath,
    pub pivot: bool,
}

// =============================================================================
// Join clauses and plan
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: CompactString,
    pub alias: CompactString,
    /// Rendered `ON` condition.
    pub on: String,
    /// Joined entity; `None` for junction tables.
    pub entity: Option<EntityId>,
    /// The join can multiply root rows.
    pub fan_out: bool,
}

impl JoinClause {
    #[must_use]
    pub fn render(&self, dialect: Dialect) -> String {
        format!(
            "{} {} AS {} ON {}",
            self.join_type.as_str(),
            dialect.quote(&self.table),
            dialect.quote(&self.alias),
            self.on
        )
    }
}

#[derive(Clone, Debug)]
pub struct JoinPlan {
    root: EntityId,
    root_alias: CompactString,
    root_key: Option<CompactString>,
    joins: Vec<JoinClause>,
    by_key: HashMap<JoinKey, usize>,
    aliases: HashSet<CompactString>,
}

impl JoinPlan {
    pub fn new(root: &EntityNode) -> Self {
        let mut aliases = HashSet::new();
        aliases.insert(root.alias.clone());
        Self {
            root: root.id,
            root_alias: root.alias.clone(),
            root_key: root.key_column().map(|c| c.name.clone()),
            joins: Vec::new(),
            by_key: HashMap::new(),
            aliases,
        }
    }

    #[inline]
    pub const fn root(&self) -> EntityId {
        self.root
    }

    #[inline]
    pub fn root_alias(&self) -> &CompactString {
        &self.root_alias
    }

    #[inline]
    pub fn root_key(&self) -> Option<&CompactString> {
        self.root_key.as_ref()
    }

    /// Joins in first-discovered order.
    #[inline]
    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    #[must_use]
    pub fn has_fan_out(&self) -> bool {
        self.joins.iter().any(|j| j.fan_out)
    }

    pub(crate) fn lookup(&self, key: &JoinKey) -> Option<&JoinClause> {
        self.by_key.get(key).map(|&i| &self.joins[i])
    }

    /// Reserves `wanted`, or `wanted_2`, `wanted_3`, ... if the text is taken.
    pub(crate) fn reserve_alias(&mut self, wanted: String) -> CompactString {
        let mut alias = CompactString::from(wanted.as_str());
        let mut n = 2;
        while self.aliases.contains(&alias) {
            alias = CompactString::from(format!("{wanted}_{n}"));
            n += 1;
        }
        self.aliases.insert(alias.clone());
        alias
    }

    pub(crate) fn push(&mut self, key: JoinKey, clause: JoinClause) {
        self.by_key.insert(key, self.joins.len());
        self.joins.push(clause);
    }

    /// `GROUP BY <root>.<key>` when any join fans out.
    #[must_use]
    pub fn group_by(&self, dialect: Dialect) -> Option<String> {
        if !self.has_fan_out() {
            return None;
        }
        let key = self.root_key.as_ref()?;
        Some(format!(
            "GROUP BY {}",
            dialect.qualified(&self.root_alias, key)
        ))
    }

    /// All joins rendered and separated by single spaces.
    #[must_use]
    pub fn render_joins(&self, dialect: Dialect) -> String {
        self.joins
            .iter()
            .map(|j| j.render(dialect))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, EntityDef, Schemes};
    use relmap_types::ValueType;

    fn plan() -> JoinPlan {
        let mut schemes = Schemes::new();
        let id = schemes
            .add(EntityDef::new("Order").column(Column::new("Id", ValueType::Int)))
            .unwrap();
        JoinPlan::new(schemes.node(id))
    }

    fn edge(index: usize) -> Edge {
        Edge {
            relation: RelationRef {
                entity: EntityId(0),
                index,
            },
            reverse: false,
        }
    }

    fn clause(alias: &CompactString, fan_out: bool) -> JoinClause {
        JoinClause {
            join_type: JoinType::Join,
            table: "address".into(),
            alias: alias.clone(),
            on: "x = y".into(),
            entity: None,
            fan_out,
        }
    }

    #[test]
    fn test_alias_collision_gets_suffix() {
        let mut plan = plan();
        assert_eq!(plan.reserve_alias("_order".into()), "_order_2");
        assert_eq!(plan.reserve_alias("_order_a".into()), "_order_a");
        assert_eq!(plan.reserve_alias("_order_a".into()), "_order_a_2");
        assert_eq!(plan.reserve_alias("_order_a".into()), "_order_a_3");
    }

    #[test]
    fn test_lookup_by_edge_path() {
        let mut plan = plan();
        let alias = plan.reserve_alias("_order_address".into());
        let key = JoinKey {
            path: EdgePath::from_slice(&[edge(0)]),
            pivot: false,
        };
        plan.push(key.clone(), clause(&alias, false));

        assert_eq!(plan.lookup(&key).map(|j| &j.alias), Some(&alias));
        let other = JoinKey {
            path: EdgePath::from_slice(&[edge(1)]),
            pivot: false,
        };
        assert!(plan.lookup(&other).is_none());
        assert!(plan.lookup(&JoinKey { pivot: true, ..key }).is_none());
        assert_eq!(plan.group_by(Dialect::MySQL), None);
    }

    #[test]
    fn test_group_by_only_with_fan_out() {
        let mut plan = plan();
        let alias = plan.reserve_alias("_order_lines".into());
        plan.push(
            JoinKey {
                path: EdgePath::from_slice(&[edge(2)]),
                pivot: false,
            },
            clause(&alias, true),
        );
        assert_eq!(
            plan.group_by(Dialect::MySQL).as_deref(),
            Some("GROUP BY `_order`.`id`")
        );
        assert_eq!(
            plan.render_joins(Dialect::MySQL),
            "JOIN `address` AS `_order_lines` ON x = y"
        );
    }
}
