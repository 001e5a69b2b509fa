//! Errors

use thiserror::Error;

use crate::condition::Operator;

/// Result type used across the crate.
pub type Result<T> = anyhow::Result<T, CriteriaError>;

/// Errors raised while building, compiling, or materializing a criteria query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriteriaError {
    // --- Construction errors ---
    /// An n-ary combinator was given no conditions.
    #[error("`{combinator}` requires at least one condition")]
    EmptyCombinator {
        /// Name of the combinator (`all` or `any`).
        combinator: &'static str,
    },

    // --- Compile errors ---
    /// The attribute does not name a column of its owning entity.
    #[error("unknown attribute `{attribute}` on `{entity}`")]
    UnknownAttribute {
        /// Table of the entity the attribute was resolved against.
        entity: &'static str,
        /// The offending attribute path.
        attribute: String,
    },

    /// A join condition tried to traverse an association.
    #[error("condition on join `{alias}` cannot traverse `{association}`; use a nested join")]
    TraversalInJoin {
        /// Alias of the join whose condition is invalid.
        alias: String,
        /// The association the condition tried to traverse.
        association: &'static str,
    },

    /// A hand-built comparison pairs an operator with the wrong kind of operand.
    #[error("operator `{operator:?}` cannot take the operand given for `{attribute}`")]
    InvalidOperand {
        /// The comparison operator.
        operator: Operator,
        /// The attribute path of the comparison.
        attribute: String,
    },

    /// Two joins in the same query share an alias.
    #[error("alias `{0}` is used more than once")]
    DuplicateAlias(String),

    /// A query value has no row-model counterpart.
    #[error("unsupported value `{0}`; convert it explicitly before building the query")]
    UnsupportedValue(String),

    // --- Result errors ---
    /// A single result was requested but none matched.
    #[error("expected exactly one result, found none")]
    NoResult,

    /// A single result was requested but several matched.
    #[error("expected exactly one result, found {0}")]
    NonUniqueResult(usize),
}
