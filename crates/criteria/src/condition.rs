use std::fmt;
use std::marker::PhantomData;
use std::ops::Not;

use sea_query::Value;

use crate::attribute::AttributePath;
use crate::error::{CriteriaError, Result};

/// Comparison operators available to leaf conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// attribute = operand
    Eq,
    /// attribute != operand
    Ne,
    /// attribute > operand
    Gt,
    /// attribute >= operand
    Gte,
    /// attribute < operand
    Lt,
    /// attribute <= operand
    Lte,
    /// attribute LIKE pattern
    Like,
    /// attribute NOT LIKE pattern
    NotLike,
    /// attribute IN (values)
    In,
    /// attribute NOT IN (values)
    NotIn,
    /// attribute IS NULL
    IsNull,
    /// attribute IS NOT NULL
    IsNotNull,
    /// attribute BETWEEN low AND high
    Between,
    /// attribute NOT BETWEEN low AND high
    NotBetween,
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No operand (`IS NULL`, `IS NOT NULL`).
    None,
    /// A single literal.
    Value(Value),
    /// A finite set of literals.
    Values(Vec<Value>),
    /// A closed interval `[low, high]`.
    Range(Value, Value),
    /// Another attribute resolved in the same scope.
    Attribute(AttributePath),
}

/// A leaf comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Attribute being compared.
    pub path: AttributePath,
    /// Operator applied.
    pub operator: Operator,
    /// Operand(s) compared against.
    pub operand: Operand,
}

/// Untyped predicate tree.
///
/// Combinators built through [`WhereCondition`] always have at least one child.
/// Hand-built empty combinators compile the way their identity element would:
/// `And([])` as true, `Or([])` as false.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Leaf comparison.
    Comparison(Comparison),
    /// Logical AND of the children.
    And(Vec<Self>),
    /// Logical OR of the children.
    Or(Vec<Self>),
    /// Logical NOT of exactly one child.
    Not(Box<Self>),
}

/// An immutable predicate tree over the attributes of entity `E`.
///
/// The entity parameter pins the scope a condition resolves against: root
/// queries accept conditions over their root entity, join builders over the
/// joined entity.
pub struct WhereCondition<E> {
    predicate: Predicate,
    _marker: PhantomData<fn() -> E>,
}

impl<E> WhereCondition<E> {
    pub(crate) const fn from_predicate(predicate: Predicate) -> Self {
        Self {
            predicate,
            _marker: PhantomData,
        }
    }

    /// Conjunction of all `conditions`.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::EmptyCombinator`] when `conditions` is empty.
    pub fn all(conditions: impl IntoIterator<Item = Self>) -> Result<Self> {
        let children: Vec<Predicate> =
            conditions.into_iter().map(|condition| condition.predicate).collect();
        if children.is_empty() {
            return Err(CriteriaError::EmptyCombinator { combinator: "all" });
        }
        Ok(Self::from_predicate(Predicate::And(children)))
    }

    /// Disjunction of all `conditions`.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::EmptyCombinator`] when `conditions` is empty.
    pub fn any(conditions: impl IntoIterator<Item = Self>) -> Result<Self> {
        let children: Vec<Predicate> =
            conditions.into_iter().map(|condition| condition.predicate).collect();
        if children.is_empty() {
            return Err(CriteriaError::EmptyCombinator { combinator: "any" });
        }
        Ok(Self::from_predicate(Predicate::Or(children)))
    }

    /// `self AND other`
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let children = match self.predicate {
            Predicate::And(mut children) => {
                extend_flat(&mut children, other.predicate, true);
                children
            }
            first => {
                let mut children = vec![first];
                extend_flat(&mut children, other.predicate, true);
                children
            }
        };
        Self::from_predicate(Predicate::And(children))
    }

    /// `self OR other`
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        let children = match self.predicate {
            Predicate::Or(mut children) => {
                extend_flat(&mut children, other.predicate, false);
                children
            }
            first => {
                let mut children = vec![first];
                extend_flat(&mut children, other.predicate, false);
                children
            }
        };
        Self::from_predicate(Predicate::Or(children))
    }

    /// The underlying predicate tree.
    #[must_use]
    pub const fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Consumes the condition, returning its predicate tree.
    #[must_use]
    pub fn into_predicate(self) -> Predicate {
        self.predicate
    }
}

// Appends `next` to an AND (`conjunction`) or OR child list, splicing in the
// children of a same-kind combinator.
fn extend_flat(children: &mut Vec<Predicate>, next: Predicate, conjunction: bool) {
    match next {
        Predicate::And(nested) if conjunction => children.extend(nested),
        Predicate::Or(nested) if !conjunction => children.extend(nested),
        other => children.push(other),
    }
}

impl<E> Not for WhereCondition<E> {
    type Output = Self;

    fn not(self) -> Self {
        Self::from_predicate(Predicate::Not(Box::new(self.predicate)))
    }
}

impl<E> Clone for WhereCondition<E> {
    fn clone(&self) -> Self {
        Self::from_predicate(self.predicate.clone())
    }
}

impl<E> fmt::Debug for WhereCondition<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WhereCondition").field(&self.predicate).finish()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
        })
    }
}

// Literals render as `?`; only the shape of the condition is shown.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison(Comparison {
                path,
                operator,
                operand,
            }) => match operand {
                Operand::None => write!(f, "{path} {operator}"),
                Operand::Value(_) => write!(f, "{path} {operator} ?"),
                Operand::Values(values) => {
                    write!(f, "{path} {operator} ({})", vec!["?"; values.len()].join(", "))
                }
                Operand::Range(..) => write!(f, "{path} {operator} ? AND ?"),
                Operand::Attribute(other) => write!(f, "{path} {operator} {other}"),
            },
            Self::And(children) => write_group(f, children, " AND "),
            Self::Or(children) => write_group(f, children, " OR "),
            Self::Not(child) => write!(f, "NOT {child}"),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, children: &[Predicate], sep: &str) -> fmt::Result {
    f.write_str("(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

impl<E> From<WhereCondition<E>> for Predicate {
    fn from(condition: WhereCondition<E>) -> Self {
        condition.predicate
    }
}
