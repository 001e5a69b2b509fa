//! Typed attribute and association descriptors.
//!
//! Descriptors are plain values, usually declared once per entity as `const`
//! items (the `entity!` macro generates attribute constants on request):
//!
//! ```ignore
//! impl Dog {
//!     pub const PET_ADDRESS: Relation<Dog, PetAddress> =
//!         Relation::new("pet_address", "pet_address_id", "id");
//! }
//!
//! // dogs whose address has zip "zip1"
//! Dog::PET_ADDRESS.get(PetAddress::ZIP).eq("zip1")
//! ```

use std::fmt;
use std::marker::PhantomData;

use sea_query::Value;

use crate::condition::{Comparison, Operand, Operator, Predicate, WhereCondition};
use crate::entity::Entity;
use crate::order::{Direction, OrderBy};

/// One association traversal within an [`AttributePath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    /// Logical name of the association.
    pub name: &'static str,
    /// Table of the associated entity.
    pub table: &'static str,
    /// Key column on the owning side.
    pub local_column: &'static str,
    /// Key column on the associated side.
    pub remote_column: &'static str,
    /// Columns of the associated entity.
    pub columns: &'static [&'static str],
}

/// Untyped attribute path: zero or more association hops followed by a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    hops: Vec<Hop>,
    column: &'static str,
}

impl AttributePath {
    /// Creates a path naming a column on the scope entity.
    #[must_use]
    pub const fn column(column: &'static str) -> Self {
        Self {
            hops: Vec::new(),
            column,
        }
    }

    /// Association hops, outermost first.
    #[must_use]
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// The final column name.
    #[must_use]
    pub const fn column_name(&self) -> &'static str {
        self.column
    }

    /// Returns `true` when the path traverses at least one association.
    #[must_use]
    pub const fn is_nested(&self) -> bool {
        !self.hops.is_empty()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for hop in &self.hops {
            write!(f, "{}.", hop.name)?;
        }
        f.write_str(self.column)
    }
}

/// A column of entity `E` holding values of type `T`.
pub struct Attribute<E, T> {
    path: AttributePath,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<E, T> Attribute<E, T> {
    /// Creates an attribute for a column declared directly on `E`.
    #[must_use]
    pub const fn new(column: &'static str) -> Self {
        Self {
            path: AttributePath::column(column),
            _marker: PhantomData,
        }
    }

    /// The untyped path of this attribute.
    #[must_use]
    pub const fn path(&self) -> &AttributePath {
        &self.path
    }

    fn compare(&self, operator: Operator, operand: Operand) -> WhereCondition<E> {
        WhereCondition::from_predicate(Predicate::Comparison(Comparison {
            path: self.path.clone(),
            operator,
            operand,
        }))
    }

    /// `attribute IS NULL`
    #[must_use]
    pub fn is_null(&self) -> WhereCondition<E> {
        self.compare(Operator::IsNull, Operand::None)
    }

    /// `attribute IS NOT NULL`
    #[must_use]
    pub fn is_not_null(&self) -> WhereCondition<E> {
        self.compare(Operator::IsNotNull, Operand::None)
    }

    /// `attribute = other`
    #[must_use]
    pub fn eq_attr(&self, other: &Self) -> WhereCondition<E> {
        self.compare(Operator::Eq, Operand::Attribute(other.path.clone()))
    }

    /// `attribute != other`
    #[must_use]
    pub fn ne_attr(&self, other: &Self) -> WhereCondition<E> {
        self.compare(Operator::Ne, Operand::Attribute(other.path.clone()))
    }

    /// `attribute > other`
    #[must_use]
    pub fn gt_attr(&self, other: &Self) -> WhereCondition<E> {
        self.compare(Operator::Gt, Operand::Attribute(other.path.clone()))
    }

    /// `attribute >= other`
    #[must_use]
    pub fn gte_attr(&self, other: &Self) -> WhereCondition<E> {
        self.compare(Operator::Gte, Operand::Attribute(other.path.clone()))
    }

    /// `attribute < other`
    #[must_use]
    pub fn lt_attr(&self, other: &Self) -> WhereCondition<E> {
        self.compare(Operator::Lt, Operand::Attribute(other.path.clone()))
    }

    /// `attribute <= other`
    #[must_use]
    pub fn lte_attr(&self, other: &Self) -> WhereCondition<E> {
        self.compare(Operator::Lte, Operand::Attribute(other.path.clone()))
    }

    /// Ascending sort key.
    #[must_use]
    pub fn asc(&self) -> OrderBy<E> {
        OrderBy::new(self.path.clone(), Direction::Asc)
    }

    /// Descending sort key.
    #[must_use]
    pub fn desc(&self) -> OrderBy<E> {
        OrderBy::new(self.path.clone(), Direction::Desc)
    }
}

impl<E, T: Into<Value>> Attribute<E, T> {
    /// `attribute = value`
    #[must_use]
    pub fn eq(&self, value: impl Into<T>) -> WhereCondition<E> {
        self.compare(Operator::Eq, Operand::Value(literal::<T, _>(value)))
    }

    /// `attribute != value`
    #[must_use]
    pub fn ne(&self, value: impl Into<T>) -> WhereCondition<E> {
        self.compare(Operator::Ne, Operand::Value(literal::<T, _>(value)))
    }

    /// `attribute > value`
    #[must_use]
    pub fn gt(&self, value: impl Into<T>) -> WhereCondition<E> {
        self.compare(Operator::Gt, Operand::Value(literal::<T, _>(value)))
    }

    /// `attribute >= value`
    #[must_use]
    pub fn gte(&self, value: impl Into<T>) -> WhereCondition<E> {
        self.compare(Operator::Gte, Operand::Value(literal::<T, _>(value)))
    }

    /// `attribute < value`
    #[must_use]
    pub fn lt(&self, value: impl Into<T>) -> WhereCondition<E> {
        self.compare(Operator::Lt, Operand::Value(literal::<T, _>(value)))
    }

    /// `attribute <= value`
    #[must_use]
    pub fn lte(&self, value: impl Into<T>) -> WhereCondition<E> {
        self.compare(Operator::Lte, Operand::Value(literal::<T, _>(value)))
    }

    /// `attribute IN (values)`. An empty set matches nothing.
    #[must_use]
    pub fn in_set<V: Into<T>>(&self, values: impl IntoIterator<Item = V>) -> WhereCondition<E> {
        let values = values.into_iter().map(literal::<T, _>).collect();
        self.compare(Operator::In, Operand::Values(values))
    }

    /// `attribute NOT IN (values)`. An empty set matches everything.
    #[must_use]
    pub fn not_in<V: Into<T>>(&self, values: impl IntoIterator<Item = V>) -> WhereCondition<E> {
        let values = values.into_iter().map(literal::<T, _>).collect();
        self.compare(Operator::NotIn, Operand::Values(values))
    }

    /// `attribute BETWEEN low AND high` (closed interval).
    #[must_use]
    pub fn between(&self, low: impl Into<T>, high: impl Into<T>) -> WhereCondition<E> {
        self.compare(Operator::Between, Operand::Range(literal::<T, _>(low), literal::<T, _>(high)))
    }

    /// `attribute NOT BETWEEN low AND high`
    #[must_use]
    pub fn not_between(&self, low: impl Into<T>, high: impl Into<T>) -> WhereCondition<E> {
        self.compare(Operator::NotBetween, Operand::Range(literal::<T, _>(low), literal::<T, _>(high)))
    }
}

fn literal<T: Into<Value>, V: Into<T>>(value: V) -> Value {
    let value: T = value.into();
    value.into()
}

/// Attribute value types that support pattern matching.
pub trait Textual {}

impl Textual for String {}
impl Textual for Option<String> {}

impl<E, T: Textual> Attribute<E, T> {
    /// `attribute LIKE pattern`; wildcards are passed through to the engine.
    #[must_use]
    pub fn like(&self, pattern: impl Into<String>) -> WhereCondition<E> {
        self.compare(Operator::Like, Operand::Value(Value::from(pattern.into())))
    }

    /// `attribute NOT LIKE pattern`
    #[must_use]
    pub fn not_like(&self, pattern: impl Into<String>) -> WhereCondition<E> {
        self.compare(Operator::NotLike, Operand::Value(Value::from(pattern.into())))
    }
}

impl<E, T> Clone for Attribute<E, T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E, T> fmt::Debug for Attribute<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Attribute").field(&self.path).finish()
    }
}

/// An association from entity `E` to entity `R`, joined on
/// `E.local_column = R.remote_column`.
pub struct Relation<E, R> {
    name: &'static str,
    local_column: &'static str,
    remote_column: &'static str,
    _marker: PhantomData<fn() -> (E, R)>,
}

impl<E, R> Relation<E, R> {
    /// Creates an association descriptor.
    #[must_use]
    pub const fn new(
        name: &'static str, local_column: &'static str, remote_column: &'static str,
    ) -> Self {
        Self {
            name,
            local_column,
            remote_column,
            _marker: PhantomData,
        }
    }

    /// Logical name of the association; the default alias when joined.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Key column on `E`.
    #[must_use]
    pub const fn local_column(&self) -> &'static str {
        self.local_column
    }

    /// Key column on `R`.
    #[must_use]
    pub const fn remote_column(&self) -> &'static str {
        self.remote_column
    }
}

impl<E, R: Entity> Relation<E, R> {
    /// Reaches through this association to an attribute of `R`, producing an
    /// attribute of `E`. Chains to any depth.
    #[must_use]
    pub fn get<T>(&self, attribute: Attribute<R, T>) -> Attribute<E, T> {
        let mut hops = Vec::with_capacity(attribute.path.hops.len() + 1);
        hops.push(self.hop());
        hops.extend(attribute.path.hops);

        Attribute {
            path: AttributePath {
                hops,
                column: attribute.path.column,
            },
            _marker: PhantomData,
        }
    }

    pub(crate) fn hop(&self) -> Hop {
        Hop {
            name: self.name,
            table: R::TABLE,
            local_column: self.local_column,
            remote_column: self.remote_column,
            columns: R::projection(),
        }
    }
}

impl<E, R> Clone for Relation<E, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, R> Copy for Relation<E, R> {}

impl<E, R> fmt::Debug for Relation<E, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("name", &self.name)
            .field("local_column", &self.local_column)
            .field("remote_column", &self.remote_column)
            .finish()
    }
}
