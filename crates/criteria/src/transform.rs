//! Compilation of predicates and orderings into ``SeaQuery`` expressions.
//!
//! Both transformers are stateless. Attribute paths are resolved against a
//! [`Scope`] through a [`PathResolver`], which records the implicit joins that
//! nested paths require so the caller can attach them to the statement.

use std::collections::HashSet;

use sea_query::{Alias, ColumnRef, Expr, ExprTrait, IntoIden, JoinType, Order, SimpleExpr, Value};

use crate::attribute::AttributePath;
use crate::condition::{Comparison, Operand, Operator, Predicate};
use crate::error::{CriteriaError, Result};
use crate::order::OrderBy;

/// The entity scope attribute paths resolve against: the query root or a join.
#[derive(Debug, Clone)]
pub struct Scope {
    alias: String,
    entity: &'static str,
    columns: &'static [&'static str],
    traversal: bool,
}

impl Scope {
    /// Root scope. Paths may traverse associations.
    #[must_use]
    pub fn root(
        alias: impl Into<String>, entity: &'static str, columns: &'static [&'static str],
    ) -> Self {
        Self {
            alias: alias.into(),
            entity,
            columns,
            traversal: true,
        }
    }

    /// Join scope. Paths must name columns of the joined entity directly, since
    /// an ON clause cannot see tables joined after it.
    #[must_use]
    pub fn join(
        alias: impl Into<String>, entity: &'static str, columns: &'static [&'static str],
    ) -> Self {
        Self {
            alias: alias.into(),
            entity,
            columns,
            traversal: false,
        }
    }

    /// Alias columns are qualified with.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }
}

/// A join ready to be attached to a select statement.
#[derive(Debug, Clone)]
pub struct JoinSpec {
    /// Joined table.
    pub table: &'static str,
    /// Alias the table is joined as.
    pub alias: String,
    /// Join type.
    pub kind: JoinType,
    /// ON condition.
    pub on: SimpleExpr,
}

/// Resolves attribute paths to qualified columns, tracking aliases in use and
/// the implicit joins created for association hops.
#[derive(Debug, Default)]
pub struct PathResolver {
    aliases: HashSet<String>,
    implicit: Vec<JoinSpec>,
}

impl PathResolver {
    /// Creates a resolver with no aliases reserved.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves an alias for the root or an explicit join.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::DuplicateAlias`] if the alias is already taken.
    pub fn reserve(&mut self, alias: &str) -> Result<()> {
        if !self.aliases.insert(alias.to_string()) {
            return Err(CriteriaError::DuplicateAlias(alias.to_string()));
        }
        Ok(())
    }

    /// Resolves `path` against `scope`, adding one inner join per association hop
    /// not already joined. Hop aliases are `<parent alias>__<association>`.
    ///
    /// # Errors
    ///
    /// Fails when the final column is not declared by its owning entity, when a
    /// join scope path traverses an association, or when a hop alias collides
    /// with an explicit one.
    pub fn resolve(&mut self, scope: &Scope, path: &AttributePath) -> Result<ColumnRef> {
        let mut alias = scope.alias.clone();
        let mut entity = scope.entity;
        let mut columns = scope.columns;

        for hop in path.hops() {
            if !scope.traversal {
                return Err(CriteriaError::TraversalInJoin {
                    alias: scope.alias.clone(),
                    association: hop.name,
                });
            }

            let next = format!("{alias}__{}", hop.name);
            if !self.implicit.iter().any(|join| join.alias == next) {
                self.reserve(&next)?;
                let on = Expr::col(table_column(&alias, hop.local_column))
                    .eq(Expr::col(table_column(&next, hop.remote_column)));
                tracing::trace!(alias = %next, table = hop.table, "adding implicit join");
                self.implicit.push(JoinSpec {
                    table: hop.table,
                    alias: next.clone(),
                    kind: JoinType::InnerJoin,
                    on,
                });
            }

            alias = next;
            entity = hop.table;
            columns = hop.columns;
        }

        if !columns.contains(&path.column_name()) {
            return Err(CriteriaError::UnknownAttribute {
                entity,
                attribute: path.to_string(),
            });
        }

        Ok(table_column(&alias, path.column_name()))
    }

    /// Implicit joins in the order they were first required.
    #[must_use]
    pub fn into_joins(self) -> Vec<JoinSpec> {
        self.implicit
    }
}

/// Folds predicates into one native predicate.
pub struct WhereTransformer;

impl WhereTransformer {
    /// Conjoins `predicates` in order. An empty list yields `None` (no filter).
    ///
    /// # Errors
    ///
    /// Propagates the first resolution failure; nothing is partially applied.
    pub fn transform<'a>(
        predicates: impl IntoIterator<Item = &'a Predicate>, scope: &Scope,
        resolver: &mut PathResolver,
    ) -> Result<Option<SimpleExpr>> {
        let mut folded: Option<SimpleExpr> = None;
        for predicate in predicates {
            let expr = Self::predicate(predicate, scope, resolver)?;
            folded = Some(match folded {
                Some(acc) => acc.and(expr),
                None => expr,
            });
        }
        Ok(folded)
    }

    fn predicate(
        predicate: &Predicate, scope: &Scope, resolver: &mut PathResolver,
    ) -> Result<SimpleExpr> {
        match predicate {
            Predicate::Comparison(comparison) => Self::comparison(comparison, scope, resolver),
            Predicate::And(children) => {
                let exprs = Self::children(children, scope, resolver)?;
                let mut exprs = exprs.into_iter();
                Ok(exprs.next().map_or_else(
                    || Expr::value(true), // no conditions, so all satisfied, hence `true`
                    |first| exprs.fold(first, sea_query::SimpleExpr::and),
                ))
            }
            Predicate::Or(children) => {
                let exprs = Self::children(children, scope, resolver)?;
                let mut exprs = exprs.into_iter();
                Ok(exprs.next().map_or_else(
                    || Expr::value(false), // no conditions, so none satisfied, hence `false`
                    |first| exprs.fold(first, sea_query::SimpleExpr::or),
                ))
            }
            Predicate::Not(child) => {
                Ok(Expr::expr(Self::predicate(child, scope, resolver)?).not())
            }
        }
    }

    fn children(
        children: &[Predicate], scope: &Scope, resolver: &mut PathResolver,
    ) -> Result<Vec<SimpleExpr>> {
        children.iter().map(|child| Self::predicate(child, scope, resolver)).collect()
    }

    fn comparison(
        comparison: &Comparison, scope: &Scope, resolver: &mut PathResolver,
    ) -> Result<SimpleExpr> {
        let column: SimpleExpr = Expr::col(resolver.resolve(scope, &comparison.path)?).into();
        let invalid = || CriteriaError::InvalidOperand {
            operator: comparison.operator,
            attribute: comparison.path.to_string(),
        };

        let expr = match (comparison.operator, &comparison.operand) {
            (Operator::IsNull, Operand::None) => column.is_null(),
            (Operator::IsNotNull, Operand::None) => column.is_not_null(),
            (Operator::In, Operand::Values(values)) if values.is_empty() => Expr::value(false),
            (Operator::NotIn, Operand::Values(values)) if values.is_empty() => Expr::value(true),
            (Operator::In, Operand::Values(values)) => column.is_in(values.clone()),
            (Operator::NotIn, Operand::Values(values)) => column.is_not_in(values.clone()),
            (Operator::Between, Operand::Range(low, high)) => {
                column.between(low.clone(), high.clone())
            }
            (Operator::NotBetween, Operand::Range(low, high)) => {
                column.not_between(low.clone(), high.clone())
            }
            (Operator::Like, Operand::Value(Value::String(Some(pattern)))) => {
                column.like(pattern.as_str())
            }
            (Operator::NotLike, Operand::Value(Value::String(Some(pattern)))) => {
                column.not_like(pattern.as_str())
            }
            (
                operator @ (Operator::Eq
                | Operator::Ne
                | Operator::Gt
                | Operator::Gte
                | Operator::Lt
                | Operator::Lte),
                operand @ (Operand::Value(_) | Operand::Attribute(_)),
            ) => {
                let right = match operand {
                    Operand::Attribute(path) => SimpleExpr::Column(resolver.resolve(scope, path)?),
                    Operand::Value(value) => SimpleExpr::Value(value.clone()),
                    _ => return Err(invalid()),
                };
                match operator {
                    Operator::Eq => column.eq(right),
                    Operator::Ne => column.ne(right),
                    Operator::Gt => column.gt(right),
                    Operator::Gte => column.gte(right),
                    Operator::Lt => column.lt(right),
                    _ => column.lte(right),
                }
            }
            _ => return Err(invalid()),
        };

        Ok(expr)
    }
}

/// Folds sort keys into native ordering, preserving precedence.
pub struct OrderByTransformer;

impl OrderByTransformer {
    /// Resolves each key in order. An empty list yields no ordering.
    ///
    /// # Errors
    ///
    /// Propagates the first resolution failure.
    pub fn transform<E>(
        orders: &[OrderBy<E>], scope: &Scope, resolver: &mut PathResolver,
    ) -> Result<Vec<(ColumnRef, Order)>> {
        orders
            .iter()
            .map(|order| {
                let column = resolver.resolve(scope, order.path())?;
                Ok((column, order.direction().into_order()))
            })
            .collect()
    }
}

pub(crate) fn table_column(table: &str, column: &str) -> ColumnRef {
    ColumnRef::TableColumn(Alias::new(table).into_iden(), Alias::new(column).into_iden())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Attribute;

    struct Dog;

    const NAME: Attribute<Dog, String> = Attribute::new("name");
    const AGE: Attribute<Dog, i32> = Attribute::new("age");
    const COLOR: Attribute<Dog, String> = Attribute::new("color");

    fn dogs() -> Scope {
        Scope::root("dogs", "dogs", &["id", "name", "age"])
    }

    #[test]
    fn empty_list_is_no_filter() {
        let mut resolver = PathResolver::new();
        let expr = WhereTransformer::transform([], &dogs(), &mut resolver).unwrap();
        assert!(expr.is_none());
    }

    #[test]
    fn unknown_column_fails() {
        let mut resolver = PathResolver::new();
        let predicate = COLOR.eq("brown").into_predicate();
        let err = WhereTransformer::transform([&predicate], &dogs(), &mut resolver).unwrap_err();
        assert_eq!(
            err,
            CriteriaError::UnknownAttribute {
                entity: "dogs",
                attribute: "color".to_string(),
            }
        );
    }

    #[test]
    fn mismatched_operand_fails() {
        let mut resolver = PathResolver::new();
        let predicate = Predicate::Comparison(Comparison {
            path: AttributePath::column("age"),
            operator: Operator::Between,
            operand: Operand::Value(Value::from(3)),
        });
        let err = WhereTransformer::transform([&predicate], &dogs(), &mut resolver).unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidOperand { operator: Operator::Between, .. }));
    }

    #[test]
    fn duplicate_reservation_fails() {
        let mut resolver = PathResolver::new();
        resolver.reserve("dogs").unwrap();
        assert_eq!(
            resolver.reserve("dogs").unwrap_err(),
            CriteriaError::DuplicateAlias("dogs".to_string())
        );
    }

    #[test]
    fn orders_keep_precedence() {
        let mut resolver = PathResolver::new();
        let orders = [AGE.desc(), NAME.asc()];
        let compiled = OrderByTransformer::transform(&orders, &dogs(), &mut resolver).unwrap();
        assert_eq!(compiled.len(), 2);
        assert!(matches!(compiled[0].1, Order::Desc));
        assert!(matches!(compiled[1].1, Order::Asc));
        assert!(resolver.into_joins().is_empty());
    }
}
