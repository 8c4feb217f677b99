//! Splitting eager-load paths into inline joins and deferred queries.
//!
//! To-one relations are flattened into the primary statement (their columns
//! join the SELECT list and get their own scan slot). To-many relations
//! become [`Depends`] entries, each planned as a follow-up query whose rows
//! are scattered back into the parent by field index.

use compact_str::CompactString;

use relmap_types::ValueType;

use crate::error::{RelmapError, Result};
use crate::plan::{EdgePath, JoinClause, JoinPlan, JoinType};
use crate::resolve::{Hop, PathSegment, QueryCompiler, ResolvedHop};
use crate::schema::{EntityId, EntityNode, FieldIndex, RelationKind, RelationRef, Schemes};
use crate::select::StatementParts;

/// One entity instance scanned per result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub entity: EntityId,
    pub alias: CompactString,
    /// Where the instance lives inside the root entity; empty for the root.
    pub field_index: FieldIndex,
}

/// One column of the primary SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectColumn {
    pub alias: CompactString,
    pub column: CompactString,
    pub value_type: ValueType,
    pub scanner: bool,
    /// Index into [`Dependents::scan_targets`].
    pub slot: usize,
}

impl SelectColumn {
    #[must_use]
    pub fn render(&self, dialect: relmap_types::Dialect) -> String {
        dialect.qualified(&self.alias, &self.column)
    }
}

/// A to-many relation that needs its own query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depends {
    /// Field path from the root entity to the slot the results fill.
    pub field_index: FieldIndex,
    pub relation: RelationRef,
    pub parent: EntityId,
    /// Alias of the parent inside the primary statement.
    pub parent_alias: CompactString,
    /// Path suffixes still to load on the related entity.
    pub paths: Vec<CompactString>,
}

/// Output of the splitter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependents {
    pub select: Vec<SelectColumn>,
    pub depends: Vec<Depends>,
    pub scan_targets: Vec<ScanTarget>,
}

impl Dependents {
    /// Number of entity instances scanned per row.
    #[inline]
    pub fn scan_count(&self) -> usize {
        self.scan_targets.len()
    }

    fn add_target(&mut self, node: &EntityNode, alias: CompactString, field_index: FieldIndex) {
        let slot = self.scan_targets.len();
        self.select.extend(node.columns.iter().map(|c| SelectColumn {
            alias: alias.clone(),
            column: c.name.clone(),
            value_type: c.value_type.clone(),
            scanner: c.scanner,
            slot,
        }));
        self.scan_targets.push(ScanTarget {
            entity: node.id,
            alias,
            field_index,
        });
    }
}

struct Group<'p> {
    hop: ResolvedHop,
    field: FieldIndex,
    suffixes: Vec<&'p str>,
}

/// `a.b.c` -> (`a`, Some(`b.c`)), ignoring dots inside brackets.
fn split_head(path: &str) -> (&str, Option<&str>) {
    let mut depth = 0usize;
    for (i, c) in path.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => return (&path[..i], Some(&path[i + 1..])),
            _ => {}
        }
    }
    (path, None)
}

impl<'s> QueryCompiler<'s> {
    /// Splits eager-load `paths` into inline joins (added to this compiler's
    /// plan) and deferred [`Depends`] entries.
    ///
    /// Paths that do not resolve are dropped; callers may pass speculative
    /// paths. Call once per statement, since the root is always selected.
    pub fn compile_dependents<S: AsRef<str>>(&mut self, paths: &[S]) -> Dependents {
        let root = self.root();
        let alias = self.plan.root_alias().clone();
        let mut out = Dependents::default();
        out.add_target(root, alias.clone(), FieldIndex::new());

        let paths: Vec<&str> = paths.iter().map(AsRef::as_ref).collect();
        let mut plan = self.plan.clone();
        self.split(&mut plan, root, &alias, &EdgePath::new(), &FieldIndex::new(), &paths, &mut out);
        self.plan = plan;
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn split(
        &self,
        plan: &mut JoinPlan,
        node: &'s EntityNode,
        alias: &CompactString,
        edges: &EdgePath,
        prefix: &FieldIndex,
        paths: &[&str],
        out: &mut Dependents,
    ) {
        let mut groups: Vec<Group<'_>> = Vec::new();

        for &path in paths {
            let (head, rest) = split_head(path);
            let Ok(hop) = self.resolve_segment(node, &PathSegment::parse(head), false) else {
                crate::relmap_trace_skip!(path, "unresolvable");
                continue;
            };
            let Some(field) = self.schemes.relation(hop.edge.relation).field_index.clone() else {
                crate::relmap_trace_skip!(path, "no owning field");
                continue;
            };

            let i = match groups.iter().position(|g| g.hop.edge == hop.edge) {
                Some(i) => i,
                None => {
                    groups.push(Group {
                        hop,
                        field,
                        suffixes: Vec::new(),
                    });
                    groups.len() - 1
                }
            };
            if let Some(rest) = rest.filter(|r| !r.is_empty()) {
                if !groups[i].suffixes.contains(&rest) {
                    groups[i].suffixes.push(rest);
                }
            }
        }

        for group in groups {
            let mut child_edges = edges.clone();
            child_edges.push(group.hop.edge);
            let mut field = prefix.clone();
            field.extend_from_slice(&group.field);

            match &group.hop.hop {
                Hop::ToOne { target, .. } => {
                    let child_alias = match self.join_hop(plan, &child_edges, alias, &group.hop, JoinType::Left) {
                        Ok(child_alias) => child_alias,
                        Err(_) => {
                            crate::relmap_trace_skip!(group.hop.label, "join failed");
                            continue;
                        }
                    };
                    let target = self.schemes.node(*target);
                    if !out.scan_targets.iter().any(|t| t.alias == child_alias) {
                        out.add_target(target, child_alias.clone(), field.clone());
                    }
                    if !group.suffixes.is_empty() {
                        self.split(plan, target, &child_alias, &child_edges, &field, &group.suffixes, out);
                    }
                }
                Hop::ToMany { .. } | Hop::Pivot { .. } => {
                    out.depends.push(Depends {
                        field_index: field,
                        relation: group.hop.edge.relation,
                        parent: node.id,
                        parent_alias: alias.clone(),
                        paths: group.suffixes.iter().map(|s| CompactString::from(*s)).collect(),
                    });
                }
            }
        }
    }
}

/// Splits `paths` against `root` with a fresh join plan.
pub fn compile_dependents<S: AsRef<str>>(
    schemes: &Schemes,
    root: EntityId,
    paths: &[S],
) -> (JoinPlan, Dependents) {
    let mut compiler = QueryCompiler::new(schemes, root);
    let dependents = compiler.compile_dependents(paths);
    (compiler.into_plan(), dependents)
}

/// Planned follow-up query for one [`Depends`] entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    pub sql: String,
    /// Qualified column carrying the parent key of each row.
    pub scatter_column: String,
    pub joins: Vec<JoinClause>,
    pub dependents: Dependents,
    /// Number of parent keys the statement expects as bind values.
    pub placeholders: usize,
}

impl Depends {
    /// Plans the query loading this relation for `key_count` parent keys.
    ///
    /// Has-many relations filter the target on its foreign key; many-to-many
    /// relations go through the junction table and select its parent column.
    pub fn follow_up(&self, schemes: &Schemes, key_count: usize) -> Result<FollowUp> {
        let dialect = schemes.dialect();
        let naming = schemes.naming();
        let relation = schemes.relation(self.relation);
        let parent = schemes.node(self.parent);
        let target_id = relation
            .kind
            .target()
            .ok_or_else(|| RelmapError::UnresolvableRelation {
                segment: relation.name.clone(),
                entity: parent.name.clone(),
            })?;
        let target = schemes.node(target_id);

        let mut compiler = QueryCompiler::new(schemes, target_id);
        let dependents = compiler.compile_dependents(&self.paths);
        let mut plan = compiler.into_plan();
        let alias = plan.root_alias().clone();

        let mut parts = StatementParts::new(dialect, &target.table, &alias);
        parts.columns = dependents.select.iter().map(|c| c.render(dialect)).collect();

        let scatter_column = match &relation.kind {
            RelationKind::HasMany { foreign_key, .. } => {
                dialect.qualified(&alias, &target.columns[*foreign_key].name)
            }
            RelationKind::ManyToMany { pivot, .. } | RelationKind::Reverse { pivot, .. } => {
                let key = target
                    .key_column()
                    .ok_or_else(|| RelmapError::MissingPrimaryKey {
                        entity: target.name.clone(),
                    })?;
                let pivot_alias = plan.reserve_alias(naming.pivot_alias(&alias));
                parts.joins.push(format!(
                    "{} {} AS {} ON {} = {}",
                    JoinType::Join.as_str(),
                    dialect.quote(&pivot.table),
                    dialect.quote(&pivot_alias),
                    dialect.qualified(&pivot_alias, &pivot.remote_column),
                    dialect.qualified(&alias, &key.name)
                ));
                let scatter = dialect.qualified(&pivot_alias, &pivot.local_column);
                parts.columns.push(scatter.clone());
                scatter
            }
            RelationKind::BelongsTo { .. } | RelationKind::Unresolved => {
                return Err(RelmapError::UnresolvableRelation {
                    segment: relation.name.clone(),
                    entity: parent.name.clone(),
                });
            }
        };

        parts.joins.extend(plan.joins().iter().map(|j| j.render(dialect)));
        if key_count == 0 {
            parts.filters.push("1 = 0".to_string());
        } else {
            let placeholders = (1..=key_count)
                .map(|n| dialect.placeholder(n))
                .collect::<Vec<_>>()
                .join(", ");
            parts.filters.push(format!("{scatter_column} IN ({placeholders})"));
        }

        let sql = parts.render();
        crate::relmap_trace_sql!(sql, key_count);
        Ok(FollowUp {
            sql,
            scatter_column,
            joins: plan.joins().to_vec(),
            dependents,
            placeholders: key_count,
        })
    }
}
