//! SELECT statement assembly on top of [`QueryCompiler`].

use compact_str::CompactString;

use relmap_types::Dialect;

use crate::depends::Dependents;
use crate::error::Result;
use crate::plan::JoinClause;
use crate::resolve::QueryCompiler;
use crate::schema::{EntityId, Schemes};

/// Clauses of one SELECT, rendered in SQL order.
#[derive(Debug, Clone)]
pub(crate) struct StatementParts {
    dialect: Dialect,
    table: CompactString,
    alias: CompactString,
    pub columns: Vec<String>,
    pub joins: Vec<String>,
    pub filters: Vec<String>,
    pub group_by: Option<String>,
    pub order_by: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl StatementParts {
    pub(crate) fn new(dialect: Dialect, table: &str, alias: &str) -> Self {
        Self {
            dialect,
            table: table.into(),
            alias: alias.into(),
            columns: Vec::new(),
            joins: Vec::new(),
            filters: Vec::new(),
            group_by: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub(crate) fn render(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(&format!(
            " FROM {} AS {}",
            self.dialect.quote(&self.table),
            self.dialect.quote(&self.alias)
        ));
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }

        match self.filters.as_slice() {
            [] => {}
            [only] => {
                sql.push_str(" WHERE ");
                sql.push_str(only);
            }
            many => {
                let wrapped: Vec<String> = many.iter().map(|f| format!("({f})")).collect();
                sql.push_str(" WHERE ");
                sql.push_str(&wrapped.join(" AND "));
            }
        }

        if let Some(group_by) = &self.group_by {
            sql.push(' ');
            sql.push_str(group_by);
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        sql
    }
}

/// A compiled SELECT with its bind values and eager-load plan.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement<V> {
    pub sql: String,
    pub binds: Vec<V>,
    pub joins: Vec<JoinClause>,
    pub dependents: Dependents,
}

/// Builds a SELECT over one root entity.
///
/// Nothing is compiled until [`SelectBuilder::build`]; clauses are then
/// compiled in statement order so placeholder numbering follows the SQL text.
///
/// ```
/// use relmap_core::prelude::*;
/// use relmap_types::ValueType;
///
/// let mut schemes = Schemes::new();
/// schemes.add(EntityDef::new("Country").column(Column::new("Id", ValueType::Int))).unwrap();
/// schemes
///     .add(
///         EntityDef::new("Address")
///             .column(Column::new("Id", ValueType::Int).at(&[0]))
///             .column(Column::new("CountryId", ValueType::Int).at(&[1]))
///             .relation(RelationDef::new("Country", "Country").at(&[2])),
///     )
///     .unwrap();
///
/// let stmt = SelectBuilder::for_entity(&schemes, "address")
///     .unwrap()
///     .filter("Country.Id = ?", [3])
///     .limit(10)
///     .build()
///     .unwrap();
/// assert_eq!(
///     stmt.sql,
///     "SELECT `_address`.`id`, `_address`.`country_id` FROM `address` AS `_address` \
///      JOIN `country` AS `_address_country` ON `_address`.`country_id` = `_address_country`.`id` \
///      WHERE `_address_country`.`id` = ? LIMIT 10"
/// );
/// assert_eq!(stmt.binds, vec![3]);
/// ```
#[derive(Debug, Clone)]
pub struct SelectBuilder<'s, V> {
    schemes: &'s Schemes,
    root: EntityId,
    with: Vec<CompactString>,
    filters: Vec<(String, Vec<V>)>,
    orders: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<'s, V: Clone> SelectBuilder<'s, V> {
    pub fn new(schemes: &'s Schemes, root: EntityId) -> Self {
        Self {
            schemes,
            root,
            with: Vec::new(),
            filters: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Starts from the entity registered under `name`, ignoring case.
    pub fn for_entity(schemes: &'s Schemes, name: &str) -> Result<Self> {
        let root = schemes.find_by_name(name)?.id;
        Ok(Self::new(schemes, root))
    }

    /// Eager-loads the given relation paths.
    pub fn with<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with
            .extend(paths.into_iter().map(|p| CompactString::from(p.as_ref())));
        self
    }

    /// Adds a condition; several conditions are AND-ed.
    pub fn filter(mut self, condition: impl Into<String>, args: impl IntoIterator<Item = V>) -> Self {
        self.filters.push((condition.into(), args.into_iter().collect()));
        self
    }

    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.orders.push(order.into());
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn build(&self) -> Result<SelectStatement<V>> {
        let dialect = self.schemes.dialect();
        let mut compiler = QueryCompiler::new(self.schemes, self.root);
        let dependents = compiler.compile_dependents(&self.with);

        let mut binds = Vec::new();
        let mut filters = Vec::with_capacity(self.filters.len());
        for (condition, args) in &self.filters {
            let fragment = compiler.compile_condition(condition, args)?;
            binds.extend(fragment.binds);
            filters.push(fragment.sql);
        }
        let order_by = self
            .orders
            .iter()
            .map(|order| compiler.compile_order(order))
            .collect::<Result<Vec<_>>>()?;

        let root = compiler.root();
        let plan = compiler.into_plan();
        let mut parts = StatementParts::new(dialect, &root.table, plan.root_alias());
        parts.columns = dependents.select.iter().map(|c| c.render(dialect)).collect();
        parts.joins = plan.joins().iter().map(|j| j.render(dialect)).collect();
        parts.filters = filters;
        parts.group_by = plan.group_by(dialect);
        parts.order_by = order_by;
        parts.limit = self.limit;
        parts.offset = self.offset;

        let sql = parts.render();
        crate::relmap_trace_sql!(sql, binds.len());
        Ok(SelectStatement {
            sql,
            binds,
            joins: plan.joins().to_vec(),
            dependents,
        })
    }
}
