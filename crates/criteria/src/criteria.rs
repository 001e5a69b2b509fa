use std::fmt;
use std::marker::PhantomData;

use sea_query::{Alias, SelectStatement};

use crate::attribute::Relation;
use crate::condition::{Predicate, WhereCondition};
use crate::entity::Entity;
use crate::error::{CriteriaError, Result};
use crate::join::{JoinBuilder, JoinKind, JoinNode, JoinScope};
use crate::order::OrderBy;
use crate::query::{Query, QueryBuilder, values_to_datatypes};
use crate::runner::QueryRunner;
use crate::transform::{
    JoinSpec, OrderByTransformer, PathResolver, Scope, WhereTransformer, table_column,
};

// LIMIT and OFFSET are signed 64-bit in SQL engines
const MAX_BOUND: u64 = i64::MAX.unsigned_abs();

/// Fluent builder for a select over root entity `E`, materializing rows as `S`.
///
/// `S` defaults to `E`. When it differs, every column of `S` must also be a
/// column of `E`; it is selected from the root table.
///
/// Conditions added through [`r#where`](Self::r#where) are conjoined. Orderings
/// keep the order they were added in. A builder with nothing added selects every
/// row of the root entity.
pub struct EasyCriteriaQuery<E, S = E> {
    conditions: Vec<Predicate>,
    orders: Vec<OrderBy<E>>,
    joins: Vec<JoinNode>,
    offset: u64,
    row_count: u64,
    distinct: bool,
    _marker: PhantomData<fn() -> (E, S)>,
}

impl<E, S> Default for EasyCriteriaQuery<E, S> {
    fn default() -> Self {
        Self {
            conditions: Vec::new(),
            orders: Vec::new(),
            joins: Vec::new(),
            offset: 0,
            row_count: 0,
            distinct: false,
            _marker: PhantomData,
        }
    }
}

impl<E: Entity, S: Entity> EasyCriteriaQuery<E, S> {
    /// Creates an empty criteria query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition. Successive conditions are conjoined.
    #[must_use]
    pub fn r#where(mut self, condition: WhereCondition<E>) -> Self {
        self.add_condition(condition);
        self
    }

    /// Appends sort keys; earlier keys take precedence.
    #[must_use]
    pub fn order_by(mut self, orders: impl IntoIterator<Item = OrderBy<E>>) -> Self {
        self.orders.extend(orders);
        self
    }

    /// Opens a join along `relation`, aliased by the relation's name.
    pub fn join<J: Entity>(self, relation: Relation<E, J>, kind: JoinKind) -> JoinBuilder<Self, J> {
        JoinBuilder::new(self, relation, kind, None)
    }

    /// Opens a join along `relation` under an explicit alias.
    pub fn join_as<J: Entity>(
        self, relation: Relation<E, J>, kind: JoinKind, alias: &str,
    ) -> JoinBuilder<Self, J> {
        JoinBuilder::new(self, relation, kind, Some(alias))
    }

    /// Removes duplicate rows from the result.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Limits the number of rows returned. `0` means unbounded.
    #[must_use]
    pub const fn limit(mut self, row_count: u64) -> Self {
        self.row_count = row_count;
        self
    }

    /// Skips `offset` rows and returns at most `row_count` rows (`0` means
    /// unbounded).
    #[must_use]
    pub const fn limit_with_offset(mut self, offset: u64, row_count: u64) -> Self {
        self.offset = offset;
        self.row_count = row_count;
        self
    }

    /// Sets the number of rows to skip.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Compiles the builder into a select statement.
    ///
    /// Explicit joins are emitted in the order they were opened, nested joins
    /// right after their parent, followed by the implicit joins created for
    /// association paths.
    ///
    /// # Errors
    ///
    /// Fails on unknown attributes, join conditions that traverse associations,
    /// duplicate aliases, or a projection column missing from the root entity.
    pub fn compile(self) -> Result<CompiledQuery<S>> {
        let root = E::TABLE;
        let condition_count = self.conditions.len();

        let unknown = S::projection().iter().find(|column| !E::projection().contains(*column));
        if let Some(column) = unknown {
            return Err(CriteriaError::UnknownAttribute {
                entity: root,
                attribute: (*column).to_string(),
            });
        }

        let mut resolver = PathResolver::new();
        resolver.reserve(root)?;

        let mut explicit = Vec::new();
        for join in self.joins {
            join.compile(&mut resolver, &mut explicit)?;
        }

        let scope = Scope::root(root, root, E::projection());
        let filter = WhereTransformer::transform(&self.conditions, &scope, &mut resolver)?;
        let ordering = OrderByTransformer::transform(&self.orders, &scope, &mut resolver)?;
        let implicit = resolver.into_joins();
        let join_count = explicit.len() + implicit.len();

        let mut statement = sea_query::Query::select();
        for field in S::projection() {
            statement.column(table_column(root, field));
        }
        statement.from(Alias::new(root));

        for JoinSpec {
            table,
            alias,
            kind,
            on,
        } in explicit.into_iter().chain(implicit)
        {
            if alias == table {
                statement.join(kind, Alias::new(table), on);
            } else {
                statement.join_as(kind, Alias::new(table), Alias::new(alias), on);
            }
        }

        if let Some(filter) = filter {
            statement.and_where(filter);
        }

        if self.distinct {
            statement.distinct();
        }

        for (column, order) in ordering {
            statement.order_by(column, order);
        }

        // engines reject OFFSET without LIMIT, so a bare offset is left to the runner
        if self.row_count > 0 {
            statement.limit(self.row_count.min(MAX_BOUND));
            if self.offset > 0 {
                statement.offset(self.offset.min(MAX_BOUND));
            }
        }

        tracing::debug!(
            table = root,
            conditions = condition_count,
            joins = join_count,
            "compiled criteria query"
        );

        Ok(CompiledQuery {
            statement,
            offset: self.offset,
            row_count: self.row_count,
            distinct: self.distinct,
            _marker: PhantomData,
        })
    }

    /// Compiles the query and runs it, returning every matching row.
    ///
    /// # Errors
    ///
    /// Returns compile errors and whatever the runner reports.
    pub fn get_result_list<R: QueryRunner>(self, runner: &R) -> anyhow::Result<Vec<S>> {
        let compiled = self.compile()?;
        runner.get_result_list(&compiled)
    }

    /// Compiles the query and runs it, expecting exactly one row.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::NoResult`] or [`CriteriaError::NonUniqueResult`]
    /// when the result does not hold exactly one row, as well as compile and
    /// runner errors.
    pub fn get_single_result<R: QueryRunner>(self, runner: &R) -> anyhow::Result<S> {
        let compiled = self.compile()?;
        runner.get_single_result(&compiled)
    }
}

impl<E: Entity, S: Entity> JoinScope for EasyCriteriaQuery<E, S> {
    type Entity = E;

    fn scope_alias(&self) -> &str {
        E::TABLE
    }

    fn add_condition(&mut self, condition: WhereCondition<E>) {
        self.conditions.push(condition.into_predicate());
    }

    fn attach_join(&mut self, join: JoinNode) {
        self.joins.push(join);
    }
}

impl<E, S> fmt::Debug for EasyCriteriaQuery<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EasyCriteriaQuery")
            .field("conditions", &self.conditions)
            .field("orders", &self.orders)
            .field("joins", &self.joins)
            .field("offset", &self.offset)
            .field("row_count", &self.row_count)
            .field("distinct", &self.distinct)
            .finish()
    }
}

/// One-line summary of the builder:
/// `FROM <table> WHERE <conditions> ORDER BY <keys> LIMIT <offset>,<row count>`.
///
/// Sections without content are omitted. Explicit joins are not shown.
impl<E: Entity, S> fmt::Display for EasyCriteriaQuery<E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FROM {}", E::TABLE)?;

        for (i, condition) in self.conditions.iter().enumerate() {
            let keyword = if i == 0 { "WHERE" } else { "AND" };
            write!(f, " {keyword} {condition}")?;
        }

        for (i, order) in self.orders.iter().enumerate() {
            let keyword = if i == 0 { " ORDER BY" } else { "," };
            write!(f, "{keyword} {order}")?;
        }

        if self.offset > 0 || self.row_count > 0 {
            write!(f, " LIMIT {},{}", self.offset, self.row_count)?;
        }
        Ok(())
    }
}

/// A compiled criteria query, ready to be rendered and run.
pub struct CompiledQuery<S> {
    statement: SelectStatement,
    offset: u64,
    row_count: u64,
    distinct: bool,
    _marker: PhantomData<fn() -> S>,
}

impl<S> CompiledQuery<S> {
    /// The native select statement.
    #[must_use]
    pub const fn statement(&self) -> &SelectStatement {
        &self.statement
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Maximum rows to return; `0` means unbounded.
    #[must_use]
    pub const fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Whether duplicate rows are removed.
    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Rows the statement does not skip itself and the runner must drop.
    #[must_use]
    pub const fn pending_offset(&self) -> u64 {
        if self.row_count == 0 { self.offset } else { 0 }
    }

    /// Renders the statement with the default backend.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::UnsupportedValue`] if a bound value has no
    /// row-model counterpart.
    pub fn build(&self) -> Result<Query> {
        self.build_with(QueryBuilder::default())
    }

    /// Renders the statement with `builder`.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::UnsupportedValue`] if a bound value has no
    /// row-model counterpart.
    pub fn build_with(&self, builder: QueryBuilder) -> Result<Query> {
        let (sql, values) = self.statement.build(builder);
        let params = values_to_datatypes(values)?;

        tracing::debug!(sql = %sql, param_count = params.len(), "CompiledQuery generated SQL");

        Ok(Query { sql, params })
    }
}

impl<S> Clone for CompiledQuery<S> {
    fn clone(&self) -> Self {
        Self {
            statement: self.statement.clone(),
            offset: self.offset,
            row_count: self.row_count,
            distinct: self.distinct,
            _marker: PhantomData,
        }
    }
}

impl<S> fmt::Debug for CompiledQuery<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("statement", &self.statement)
            .field("offset", &self.offset)
            .field("row_count", &self.row_count)
            .field("distinct", &self.distinct)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{DataType, Row};

    struct Toy;

    impl Entity for Toy {
        const TABLE: &'static str = "toys";

        fn projection() -> &'static [&'static str] {
            &["id", "name"]
        }

        fn from_row(_row: &Row) -> anyhow::Result<Self> {
            Ok(Self)
        }
    }

    const NAME: crate::Attribute<Toy, String> = crate::Attribute::new("name");

    #[test]
    fn bare_offset_is_pending() {
        let compiled = EasyCriteriaQuery::<Toy>::new().offset(3).compile().unwrap();
        assert_eq!(compiled.pending_offset(), 3);
        assert!(!compiled.build().unwrap().sql.contains("OFFSET"));
    }

    #[test]
    fn bounded_offset_is_encoded() {
        let compiled = EasyCriteriaQuery::<Toy>::new().limit_with_offset(1, 2).compile().unwrap();
        assert_eq!(compiled.pending_offset(), 0);
        let sql = compiled.build().unwrap().sql;
        assert!(sql.ends_with("LIMIT $1 OFFSET $2"), "{sql}");
    }

    #[test]
    fn oversized_bounds_are_capped() {
        let query = EasyCriteriaQuery::<Toy>::new()
            .limit_with_offset(u64::MAX - 1, u64::MAX)
            .compile()
            .unwrap()
            .build()
            .unwrap();
        let max = i64::MAX.unsigned_abs();
        assert_eq!(query.params, vec![DataType::Uint64(Some(max)), DataType::Uint64(Some(max))]);
    }

    #[test]
    fn display_summarizes_builder() {
        assert_eq!(EasyCriteriaQuery::<Toy>::new().to_string(), "FROM toys");

        let query = EasyCriteriaQuery::<Toy>::new()
            .r#where(NAME.eq("ball").or(NAME.like("b%")))
            .r#where(!NAME.in_set(["top", "kite"]))
            .order_by([NAME.desc()])
            .limit_with_offset(2, 5);
        assert_eq!(
            query.to_string(),
            "FROM toys WHERE (name = ? OR name LIKE ?) AND NOT name IN (?, ?) \
             ORDER BY name DESC LIMIT 2,5"
        );
    }

    #[test]
    fn positional_placeholders() {
        let query = EasyCriteriaQuery::<Toy>::new()
            .r#where(NAME.eq("ball"))
            .compile()
            .unwrap()
            .build_with(QueryBuilder::positional())
            .unwrap();
        assert!(query.sql.ends_with(r#"WHERE ("toys"."name") = (?)"#), "{}", query.sql);
        assert_eq!(query.params, vec![DataType::Str(Some("ball".to_string()))]);
    }
}
