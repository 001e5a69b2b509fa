//! Fluent, typed criteria queries.
//!
//! Builds select statements from typed predicate trees, orderings and scoped
//! joins, compiles them to ``SeaQuery`` and hands them to a [`QueryRunner`] for
//! execution.
//!
//! # Quick Start
//!
//! ## Define Entities
//!
//! ```ignore
//! entity! {
//!     table = "pet_addresses",
//!     #[derive(Debug, Clone)]
//!     pub struct PetAddress {
//!         pub id: i64 => ID,
//!         pub zip: String => ZIP,
//!     }
//! }
//!
//! entity! {
//!     table = "dogs",
//!     #[derive(Debug, Clone)]
//!     pub struct Dog {
//!         pub id: i64 => ID,
//!         pub name: String => NAME,
//!         pub pet_address_id: i64,
//!     }
//! }
//!
//! impl Dog {
//!     pub const PET_ADDRESS: Relation<Dog, PetAddress> =
//!         Relation::new("pet_address", "pet_address_id", "id");
//! }
//! ```
//!
//! ## Query
//!
//! ```ignore
//! // dogs living at zip "zip1", by name
//! let dogs = EasyCriteriaQuery::<Dog>::new()
//!     .r#where(Dog::PET_ADDRESS.get(PetAddress::ZIP).eq("zip1"))
//!     .order_by([Dog::NAME.asc()])
//!     .limit_with_offset(0, 10)
//!     .get_result_list(&runner)?;
//! ```
//!
//! ## Conditions
//!
//! ```ignore
//! Dog::NAME.eq("rex")
//! Dog::NAME.like("r%")
//! Dog::ID.in_set([1, 2, 3])
//! Dog::ID.between(1, 10)
//!
//! // combinators
//! Dog::NAME.eq("rex").or(Dog::NAME.eq("fido"))
//! !Dog::NAME.is_null()
//! WhereCondition::all([Dog::ID.gt(1), Dog::ID.lt(9)])?
//! ```
//!
//! ## Joins
//!
//! Conditions given to `on` constrain the join's ON clause, never the root
//! WHERE clause. `end_join` returns the enclosing builder.
//!
//! ```ignore
//! let people = EasyCriteriaQuery::<Person>::new()
//!     .join(Person::DOGS, JoinKind::Inner)
//!     .on(Dog::NAME.eq("rex"))
//!     .join(Dog::PET_ADDRESS, JoinKind::Left)
//!     .end_join()
//!     .end_join()
//!     .distinct()
//!     .get_result_list(&runner)?;
//! ```

mod attribute;
mod condition;
mod criteria;
mod entity;
mod error;
mod join;
mod order;
mod query;
mod row;
mod runner;
mod transform;

pub use attribute::{Attribute, AttributePath, Hop, Relation, Textual};
pub use condition::{Comparison, Operand, Operator, Predicate, WhereCondition};
pub use criteria::{CompiledQuery, EasyCriteriaQuery};
pub use entity::{Entity, FetchValue};
pub use error::{CriteriaError, Result};
pub use join::{JoinBuilder, JoinKind, JoinNode, JoinScope};
pub use order::{Direction, OrderBy};
pub use query::{Query, QueryBuilder, values_to_datatypes};
pub use row::{DataType, Field, Row};
pub use runner::QueryRunner;
pub use transform::{JoinSpec, OrderByTransformer, PathResolver, Scope, WhereTransformer};

// Re-exports for `entity` macro use only.
#[doc(hidden)]
pub mod __private {
    pub use anyhow;
}
