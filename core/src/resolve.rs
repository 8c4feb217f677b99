//! Path resolution and automatic joins.
//!
//! A [`QueryCompiler`] owns the join plan of one statement. Every dotted
//! identifier in a condition or order string is walked segment by segment
//! from the root entity; each segment becomes a relation hop, each hop a join
//! (reused when the same edge path was joined before), and the identifier is
//! rewritten as `alias.column`.

use compact_str::CompactString;

use crate::error::{RelmapError, Result};
use crate::lexer::{Lexer, Token};
use crate::plan::{Edge, EdgePath, JoinClause, JoinKey, JoinPlan, JoinType};
use crate::schema::{EntityId, EntityNode, Pivot, Relation, RelationKind, RelationRef, Schemes};

/// One segment of a dotted path, e.g. `person[optional_address]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSegment<'a> {
    pub name: &'a str,
    pub hint: Option<&'a str>,
}

impl<'a> PathSegment<'a> {
    pub fn parse(raw: &'a str) -> Self {
        match raw.split_once('[') {
            Some((name, rest)) => {
                let hint = rest.trim_end_matches(']').trim();
                Self {
                    name,
                    hint: (!hint.is_empty()).then_some(hint),
                }
            }
            None => Self {
                name: raw,
                hint: None,
            },
        }
    }
}

/// Splits `a.b[h].c` into segments, ignoring dots inside brackets.
pub fn split_segments(raw: &str) -> Vec<PathSegment<'_>> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                out.push(PathSegment::parse(&raw[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(PathSegment::parse(&raw[start..]));
    out
}

/// How one relation hop is joined, seen from the entity it starts at.
#[derive(Debug, Clone)]
pub(crate) enum Hop {
    /// Foreign key on the current entity.
    ToOne {
        target: EntityId,
        local_fk: CompactString,
        target_key: CompactString,
    },
    /// Foreign key on the target entity.
    ToMany {
        target: EntityId,
        remote_fk: CompactString,
        local_key: CompactString,
    },
    /// Through a junction table.
    Pivot {
        target: EntityId,
        pivot: Pivot,
        local_key: CompactString,
        target_key: CompactString,
    },
}

impl Hop {
    pub(crate) const fn target(&self) -> EntityId {
        match self {
            Hop::ToOne { target, .. } | Hop::ToMany { target, .. } | Hop::Pivot { target, .. } => {
                *target
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedHop {
    pub edge: Edge,
    /// Name the alias is derived from.
    pub label: CompactString,
    pub hop: Hop,
}

/// SQL fragment plus the bind values it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment<V> {
    pub sql: String,
    pub binds: Vec<V>,
}

/// Output of [`compile_condition`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition<V> {
    pub sql: String,
    pub joins: Vec<JoinClause>,
    pub binds: Vec<V>,
    /// `GROUP BY` over the root key, present when a join fans out.
    pub group_by: Option<String>,
}

/// Compiles condition, order and dependent paths for one statement.
#[derive(Debug, Clone)]
pub struct QueryCompiler<'s> {
    pub(crate) schemes: &'s Schemes,
    root: &'s EntityNode,
    pub(crate) plan: JoinPlan,
    placeholders: usize,
}

impl<'s> QueryCompiler<'s> {
    pub fn new(schemes: &'s Schemes, root: EntityId) -> Self {
        let root = schemes.node(root);
        Self {
            schemes,
            root,
            plan: JoinPlan::new(root),
            placeholders: 0,
        }
    }

    #[inline]
    pub fn root(&self) -> &'s EntityNode {
        self.root
    }

    #[inline]
    pub fn plan(&self) -> &JoinPlan {
        &self.plan
    }

    #[inline]
    pub fn into_plan(self) -> JoinPlan {
        self.plan
    }

    /// Rewrites every identifier in `condition` and binds placeholders from
    /// `args` in scan order.
    ///
    /// Placeholders are numbered continuously across all fragments compiled
    /// by this compiler. On error the join plan is left untouched.
    pub fn compile_condition<V: Clone>(&mut self, condition: &str, args: &[V]) -> Result<Fragment<V>> {
        let mut scratch = self.plan.clone();
        let mut binds = Vec::new();
        let sql = self.compile_tokens(&mut scratch, condition, args, &mut binds)?;
        self.plan = scratch;
        self.placeholders += binds.len();
        crate::relmap_trace_sql!(sql, binds.len());
        Ok(Fragment { sql, binds })
    }

    /// Rewrites an order clause such as `Number DESC, Address.City`.
    pub fn compile_order(&mut self, order: &str) -> Result<String> {
        let fragment = self.compile_condition::<()>(order, &[])?;
        Ok(fragment.sql)
    }

    fn compile_tokens<V: Clone>(
        &self,
        plan: &mut JoinPlan,
        text: &str,
        args: &[V],
        binds: &mut Vec<V>,
    ) -> Result<String> {
        let dialect = self.schemes.dialect();
        let mut out = SqlWriter::default();

        for token in Lexer::new(text) {
            match token {
                Token::Ident(raw) => {
                    let column = self.resolve_identifier(plan, &raw, JoinType::Join)?;
                    out.word(&column);
                }
                Token::Func(name) => out.func(&name),
                Token::Str(raw) | Token::Int(raw) | Token::Float(raw) => out.word(&raw),
                Token::Placeholder => {
                    let value = args
                        .get(binds.len())
                        .ok_or(RelmapError::MissingBindValue {
                            index: binds.len() + 1,
                        })?;
                    binds.push(value.clone());
                    out.word(&dialect.placeholder(self.placeholders + binds.len()));
                }
                Token::LParen => out.open(),
                Token::RParen => out.close(),
                Token::Comma => out.comma(),
                Token::Op(c) => out.op(c),
                Token::Keyword(keyword) => out.word(keyword.as_str()),
                Token::Null => out.word("NULL"),
                Token::Other(c) => out.word(c.encode_utf8(&mut [0; 4])),
                Token::Eof => break,
            }
        }

        Ok(out.finish())
    }

    /// Resolves a dotted identifier to a qualified column, adding joins to
    /// `plan` as needed.
    pub(crate) fn resolve_identifier(
        &self,
        plan: &mut JoinPlan,
        raw: &str,
        join_type: JoinType,
    ) -> Result<String> {
        let dialect = self.schemes.dialect();
        let naming = self.schemes.naming();

        let mut segments = split_segments(raw);
        let field = segments.pop().map_or("", |s| s.name);
        let mut path = segments.as_slice();
        if let Some(first) = path.first() {
            if first.hint.is_none() && self.root.is_named(first.name, naming) {
                path = &path[1..];
            }
        }

        let mut node = self.root;
        let mut alias = plan.root_alias().clone();
        let mut edges = EdgePath::new();

        for (i, segment) in path.iter().enumerate() {
            let hop = self.resolve_segment(node, segment, true)?;
            edges.push(hop.edge);
            let target = self.schemes.node(hop.hop.target());

            if let Hop::Pivot {
                pivot, target_key, ..
            } = &hop.hop
            {
                let is_last = i + 1 == path.len();
                let pivot_alias = self.join_pivot(plan, &edges, &alias, &hop, join_type)?;
                if is_last && naming.column_name(field) == target_key.as_str() {
                    return Ok(dialect.qualified(&pivot_alias, &pivot.remote_column));
                }
                alias = self.join_pivot_target(plan, &edges, &alias, &pivot_alias, &hop, join_type);
            } else {
                alias = self.join_hop(plan, &edges, &alias, &hop, join_type)?;
            }
            node = target;
        }

        let column = node
            .find_column(field, naming)
            .ok_or_else(|| RelmapError::UnresolvableColumn {
                column: field.into(),
                entity: node.name.clone(),
            })?;
        Ok(dialect.qualified(&alias, &column.name))
    }

    /// Finds the relation `segment` names on `node`.
    ///
    /// With `allow_reverse`, a segment naming another entity that holds a
    /// relation back to `node` resolves as an implicit reverse hop.
    pub(crate) fn resolve_segment(
        &self,
        node: &EntityNode,
        segment: &PathSegment<'_>,
        allow_reverse: bool,
    ) -> Result<ResolvedHop> {
        let naming = self.schemes.naming();
        let mut candidates = node.relations_named(segment.name, naming).peekable();

        if candidates.peek().is_some() {
            let (index, relation) = match segment.hint {
                Some(hint) => candidates
                    .find(|(_, r)| self.hint_matches(r, hint))
                    .ok_or_else(|| RelmapError::AmbiguousRelationHint {
                        segment: segment.name.into(),
                        hint: hint.into(),
                        entity: node.name.clone(),
                    })?,
                None => candidates.next().ok_or_else(|| unresolvable(segment, node))?,
            };
            let hop = self.forward_hop(node, relation).ok_or_else(|| unresolvable(segment, node))??;
            return Ok(ResolvedHop {
                edge: Edge {
                    relation: RelationRef {
                        entity: node.id,
                        index,
                    },
                    reverse: false,
                },
                label: relation.name.clone(),
                hop,
            });
        }

        if allow_reverse {
            if let Some(resolved) = self.reverse_lookup(node, segment)? {
                return Ok(resolved);
            }
        }
        Err(unresolvable(segment, node))
    }

    fn hint_matches(&self, relation: &Relation, hint: &str) -> bool {
        let naming = self.schemes.naming();
        relation.column_name.eq_ignore_ascii_case(hint)
            || relation.name.eq_ignore_ascii_case(hint)
            || naming.foreign_key(&relation.column_name).eq_ignore_ascii_case(hint)
    }

    /// Hop for a relation declared on `node`; `None` while unresolved.
    fn forward_hop(&self, node: &EntityNode, relation: &Relation) -> Option<Result<Hop>> {
        let target_id = relation.kind.target()?;
        let target = self.schemes.node(target_id);
        Some(match &relation.kind {
            RelationKind::Unresolved => return None,
            RelationKind::BelongsTo { foreign_key, .. } => key_of(target).map(|target_key| Hop::ToOne {
                target: target_id,
                local_fk: node.columns[*foreign_key].name.clone(),
                target_key,
            }),
            RelationKind::HasMany { foreign_key, .. } => key_of(node).map(|local_key| Hop::ToMany {
                target: target_id,
                remote_fk: target.columns[*foreign_key].name.clone(),
                local_key,
            }),
            RelationKind::ManyToMany { pivot, .. } | RelationKind::Reverse { pivot, .. } => {
                pivot_hop(node, target, pivot.clone())
            }
        })
    }

    /// First entity named `segment` that holds a relation pointing at `node`.
    fn reverse_lookup(&self, node: &EntityNode, segment: &PathSegment<'_>) -> Result<Option<ResolvedHop>> {
        let naming = self.schemes.naming();

        for owner in self.schemes.iter().filter(|e| e.is_named(segment.name, naming)) {
            let mut back = owner
                .relations
                .iter()
                .enumerate()
                .filter(|(_, r)| r.kind.target() == Some(node.id))
                .peekable();
            if back.peek().is_none() {
                continue;
            }

            let (index, relation) = match segment.hint {
                Some(hint) => back.find(|(_, r)| self.hint_matches(r, hint)).ok_or_else(|| {
                    RelmapError::AmbiguousRelationHint {
                        segment: segment.name.into(),
                        hint: hint.into(),
                        entity: node.name.clone(),
                    }
                })?,
                None => match back.next() {
                    Some(found) => found,
                    None => continue,
                },
            };

            let hop = match &relation.kind {
                RelationKind::Unresolved => continue,
                RelationKind::BelongsTo { foreign_key, .. } => Hop::ToMany {
                    target: owner.id,
                    remote_fk: owner.columns[*foreign_key].name.clone(),
                    local_key: key_of(node)?,
                },
                RelationKind::HasMany { foreign_key, .. } => Hop::ToOne {
                    target: owner.id,
                    local_fk: node.columns[*foreign_key].name.clone(),
                    target_key: key_of(owner)?,
                },
                RelationKind::ManyToMany { pivot, .. } | RelationKind::Reverse { pivot, .. } => {
                    pivot_hop(node, owner, pivot.flipped())?
                }
            };

            return Ok(Some(ResolvedHop {
                edge: Edge {
                    relation: RelationRef {
                        entity: owner.id,
                        index,
                    },
                    reverse: true,
                },
                label: owner.name.clone(),
                hop,
            }));
        }
        Ok(None)
    }

    /// Joins a to-one or to-many hop and returns the target alias.
    pub(crate) fn join_hop(
        &self,
        plan: &mut JoinPlan,
        edges: &EdgePath,
        parent: &str,
        hop: &ResolvedHop,
        join_type: JoinType,
    ) -> Result<CompactString> {
        let dialect = self.schemes.dialect();
        let naming = self.schemes.naming();
        let key = JoinKey {
            path: edges.clone(),
            pivot: false,
        };
        if let Some(existing) = plan.lookup(&key) {
            crate::relmap_trace_join!("reuse", existing.alias, existing.table);
            return Ok(existing.alias.clone());
        }

        let target = self.schemes.node(hop.hop.target());
        let alias = plan.reserve_alias(naming.join_alias(parent, &hop.label));
        let (on, fan_out) = match &hop.hop {
            Hop::ToOne {
                local_fk,
                target_key,
                ..
            } => (
                format!(
                    "{} = {}",
                    dialect.qualified(parent, local_fk),
                    dialect.qualified(&alias, target_key)
                ),
                false,
            ),
            Hop::ToMany {
                remote_fk,
                local_key,
                ..
            } => {
                self.require_root_key()?;
                (
                    format!(
                        "{} = {}",
                        dialect.qualified(&alias, remote_fk),
                        dialect.qualified(parent, local_key)
                    ),
                    true,
                )
            }
            Hop::Pivot { .. } => {
                return Err(RelmapError::UnresolvableRelation {
                    segment: hop.label.clone(),
                    entity: target.name.clone(),
                });
            }
        };

        crate::relmap_trace_join!("alloc", alias, target.table);
        plan.push(
            key,
            JoinClause {
                join_type,
                table: target.table.clone(),
                alias: alias.clone(),
                on,
                entity: Some(target.id),
                fan_out,
            },
        );
        Ok(alias)
    }

    /// Joins the junction table of a many-to-many hop and returns its alias.
    fn join_pivot(
        &self,
        plan: &mut JoinPlan,
        edges: &EdgePath,
        parent: &str,
        hop: &ResolvedHop,
        join_type: JoinType,
    ) -> Result<CompactString> {
        let Hop::Pivot {
            pivot, local_key, ..
        } = &hop.hop
        else {
            return Err(RelmapError::UnresolvableRelation {
                segment: hop.label.clone(),
                entity: parent.into(),
            });
        };
        let key = JoinKey {
            path: edges.clone(),
            pivot: true,
        };
        if let Some(existing) = plan.lookup(&key) {
            crate::relmap_trace_join!("reuse", existing.alias, existing.table);
            return Ok(existing.alias.clone());
        }
        self.require_root_key()?;

        let dialect = self.schemes.dialect();
        let naming = self.schemes.naming();
        let alias = plan.reserve_alias(naming.pivot_alias(&naming.join_alias(parent, &hop.label)));
        let on = format!(
            "{} = {}",
            dialect.qualified(&alias, &pivot.local_column),
            dialect.qualified(parent, local_key)
        );
        crate::relmap_trace_join!("alloc", alias, pivot.table);
        plan.push(
            key,
            JoinClause {
                join_type,
                table: pivot.table.clone(),
                alias: alias.clone(),
                on,
                entity: None,
                fan_out: true,
            },
        );
        Ok(alias)
    }

    /// Joins the target entity behind an already joined junction table.
    fn join_pivot_target(
        &self,
        plan: &mut JoinPlan,
        edges: &EdgePath,
        parent: &str,
        pivot_alias: &str,
        hop: &ResolvedHop,
        join_type: JoinType,
    ) -> CompactString {
        let key = JoinKey {
            path: edges.clone(),
            pivot: false,
        };
        if let Some(existing) = plan.lookup(&key) {
            crate::relmap_trace_join!("reuse", existing.alias, existing.table);
            return existing.alias.clone();
        }

        let dialect = self.schemes.dialect();
        let naming = self.schemes.naming();
        let target = self.schemes.node(hop.hop.target());
        let alias = plan.reserve_alias(naming.join_alias(parent, &hop.label));
        let on = match &hop.hop {
            Hop::Pivot {
                pivot, target_key, ..
            } => format!(
                "{} = {}",
                dialect.qualified(&alias, target_key),
                dialect.qualified(pivot_alias, &pivot.remote_column)
            ),
            _ => String::new(),
        };
        crate::relmap_trace_join!("alloc", alias, target.table);
        plan.push(
            key,
            JoinClause {
                join_type,
                table: target.table.clone(),
                alias: alias.clone(),
                on,
                entity: Some(target.id),
                fan_out: true,
            },
        );
        alias
    }

    fn require_root_key(&self) -> Result<()> {
        match self.plan.root_key() {
            Some(_) => Ok(()),
            None => Err(RelmapError::MissingPrimaryKey {
                entity: self.root.name.clone(),
            }),
        }
    }
}

fn unresolvable(segment: &PathSegment<'_>, node: &EntityNode) -> RelmapError {
    RelmapError::UnresolvableRelation {
        segment: segment.name.into(),
        entity: node.name.clone(),
    }
}

fn key_of(node: &EntityNode) -> Result<CompactString> {
    node.key_column()
        .map(|c| c.name.clone())
        .ok_or_else(|| RelmapError::MissingPrimaryKey {
            entity: node.name.clone(),
        })
}

fn pivot_hop(node: &EntityNode, target: &EntityNode, pivot: Pivot) -> Result<Hop> {
    Ok(Hop::Pivot {
        target: target.id,
        pivot,
        local_key: key_of(node)?,
        target_key: key_of(target)?,
    })
}

/// Compiles a condition against `root` with a fresh join plan.
///
/// ```
/// use relmap_core::prelude::*;
/// use relmap_types::ValueType;
///
/// let mut schemes = Schemes::new();
/// schemes.add(EntityDef::new("Country").column(Column::new("Id", ValueType::Int))).unwrap();
/// let order = schemes
///     .add(
///         EntityDef::new("Order")
///             .column(Column::new("Id", ValueType::Int))
///             .column(Column::new("CountryId", ValueType::Int))
///             .relation(RelationDef::new("Country", "Country")),
///     )
///     .unwrap();
///
/// let compiled = compile_condition(&schemes, order, "Country.Id = ?", &[7]).unwrap();
/// assert_eq!(compiled.sql, "`_order_country`.`id` = ?");
/// assert_eq!(compiled.binds, vec![7]);
/// assert_eq!(compiled.joins.len(), 1);
/// ```
pub fn compile_condition<V: Clone>(
    schemes: &Schemes,
    root: EntityId,
    condition: &str,
    args: &[V],
) -> Result<CompiledCondition<V>> {
    let mut compiler = QueryCompiler::new(schemes, root);
    let fragment = compiler.compile_condition(condition, args)?;
    let plan = compiler.into_plan();
    Ok(CompiledCondition {
        sql: fragment.sql,
        group_by: plan.group_by(schemes.dialect()),
        joins: plan.joins().to_vec(),
        binds: fragment.binds,
    })
}

// =============================================================================
// Output rendering
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Last {
    #[default]
    Start,
    Word,
    Func,
    Open,
    Op(char),
}

/// Joins rendered tokens with the spacing rules of the compiled output.
#[derive(Debug, Default)]
struct SqlWriter {
    buf: String,
    last: Last,
}

impl SqlWriter {
    fn space(&mut self) {
        if !matches!(self.last, Last::Start | Last::Open | Last::Func) {
            self.buf.push(' ');
        }
    }

    fn word(&mut self, s: &str) {
        self.space();
        self.buf.push_str(s);
        self.last = Last::Word;
    }

    fn func(&mut self, name: &str) {
        self.space();
        self.buf.push_str(name);
        self.last = Last::Func;
    }

    fn open(&mut self) {
        self.space();
        self.buf.push('(');
        self.last = Last::Open;
    }

    fn close(&mut self) {
        self.buf.push(')');
        self.last = Last::Word;
    }

    fn comma(&mut self) {
        self.buf.push(',');
        self.last = Last::Word;
    }

    /// Glues a two-character comparison (`!=`, `<=`, `>=`, `<>`); any other
    /// adjacent operators stay apart, so `-` `-` never renders as a comment.
    fn op(&mut self, c: char) {
        let glued = matches!(
            (self.last, c),
            (Last::Op('!' | '<' | '>'), '=') | (Last::Op('<'), '>')
        );
        if !glued {
            self.space();
        }
        self.buf.push(c);
        self.last = if glued { Last::Word } else { Last::Op(c) };
    }

    fn finish(self) -> String {
        self.buf
    }
}
