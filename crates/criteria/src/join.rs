use std::marker::PhantomData;

use sea_query::{Expr, JoinType};

use crate::attribute::{Hop, Relation};
use crate::condition::{Predicate, WhereCondition};
use crate::entity::Entity;
use crate::error::Result;
use crate::transform::{JoinSpec, PathResolver, Scope, WhereTransformer, table_column};

/// Join types supported by criteria queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN
    Inner,
    /// LEFT JOIN
    Left,
    /// RIGHT JOIN
    Right,
    /// FULL OUTER JOIN
    Full,
}

impl JoinKind {
    const fn into_join_type(self) -> JoinType {
        match self {
            Self::Inner => JoinType::InnerJoin,
            Self::Left => JoinType::LeftJoin,
            Self::Right => JoinType::RightJoin,
            Self::Full => JoinType::FullOuterJoin,
        }
    }
}

/// Capability shared by every builder that conditions can be scoped to: the
/// root query and each (possibly nested) join.
pub trait JoinScope: Sized {
    /// Entity the scope's conditions resolve against.
    type Entity: Entity;

    /// Alias columns of this scope are qualified with.
    fn scope_alias(&self) -> &str;

    /// Adds a condition to this scope.
    fn add_condition(&mut self, condition: WhereCondition<Self::Entity>);

    /// Takes ownership of a finished child join.
    fn attach_join(&mut self, join: JoinNode);
}

/// A finished join: its target, its local conditions, and its own nested joins.
#[derive(Debug, Clone)]
pub struct JoinNode {
    hop: Hop,
    alias: String,
    parent_alias: String,
    kind: JoinKind,
    conditions: Vec<Predicate>,
    children: Vec<Self>,
}

impl JoinNode {
    /// Compiles this join, then its nested joins depth first, so every ON
    /// clause only references tables joined before it.
    pub(crate) fn compile(self, resolver: &mut PathResolver, out: &mut Vec<JoinSpec>) -> Result<()> {
        resolver.reserve(&self.alias)?;

        let scope = Scope::join(self.alias.clone(), self.hop.table, self.hop.columns);
        let keys = Expr::col(table_column(&self.parent_alias, self.hop.local_column))
            .eq(Expr::col(table_column(&self.alias, self.hop.remote_column)));
        let on = match WhereTransformer::transform(&self.conditions, &scope, resolver)? {
            Some(conditions) => keys.and(conditions),
            None => keys,
        };

        out.push(JoinSpec {
            table: self.hop.table,
            alias: self.alias,
            kind: self.kind.into_join_type(),
            on,
        });

        for child in self.children {
            child.compile(resolver, out)?;
        }
        Ok(())
    }
}

/// Builder scoping conditions to a join of entity `J`, opened from parent `P`.
///
/// `end_join` consumes the builder and hands back the parent, so a finished
/// join can no longer be modified.
#[must_use = "call `end_join` to resume the enclosing query"]
pub struct JoinBuilder<P, J> {
    parent: P,
    node: JoinNode,
    _marker: PhantomData<fn() -> J>,
}

impl<P: JoinScope, J: Entity> JoinBuilder<P, J> {
    pub(crate) fn new(
        parent: P, relation: Relation<P::Entity, J>, kind: JoinKind, alias: Option<&str>,
    ) -> Self {
        let node = JoinNode {
            hop: relation.hop(),
            alias: alias.unwrap_or(relation.name()).to_string(),
            parent_alias: parent.scope_alias().to_string(),
            kind,
            conditions: Vec::new(),
            children: Vec::new(),
        };

        Self {
            parent,
            node,
            _marker: PhantomData,
        }
    }

    /// Adds a condition to the join's ON clause.
    pub fn on(mut self, condition: WhereCondition<J>) -> Self {
        self.add_condition(condition);
        self
    }

    /// Opens a nested join from the joined entity.
    pub fn join<K: Entity>(self, relation: Relation<J, K>, kind: JoinKind) -> JoinBuilder<Self, K> {
        JoinBuilder::new(self, relation, kind, None)
    }

    /// Opens a nested join under an explicit alias.
    pub fn join_as<K: Entity>(
        self, relation: Relation<J, K>, kind: JoinKind, alias: &str,
    ) -> JoinBuilder<Self, K> {
        JoinBuilder::new(self, relation, kind, Some(alias))
    }

    /// Folds the join's conditions into its ON clause and returns the parent.
    /// Without conditions the join is constrained by its keys alone.
    pub fn end_join(self) -> P {
        let Self {
            mut parent, node, ..
        } = self;
        tracing::trace!(
            alias = %node.alias,
            conditions = node.conditions.len(),
            "closing join scope"
        );
        parent.attach_join(node);
        parent
    }
}

impl<P: JoinScope, J: Entity> JoinScope for JoinBuilder<P, J> {
    type Entity = J;

    fn scope_alias(&self) -> &str {
        &self.node.alias
    }

    fn add_condition(&mut self, condition: WhereCondition<J>) {
        self.node.conditions.push(condition.into_predicate());
    }

    fn attach_join(&mut self, join: JoinNode) {
        self.node.children.push(join);
    }
}
