use std::fmt;
use std::marker::PhantomData;

use sea_query::Order;

use crate::attribute::AttributePath;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl Direction {
    pub(crate) const fn into_order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

/// One sort key over an attribute of entity `E`.
pub struct OrderBy<E> {
    path: AttributePath,
    direction: Direction,
    _marker: PhantomData<fn() -> E>,
}

impl<E> OrderBy<E> {
    pub(crate) const fn new(path: AttributePath, direction: Direction) -> Self {
        Self {
            path,
            direction,
            _marker: PhantomData,
        }
    }

    /// Attribute sorted on.
    #[must_use]
    pub const fn path(&self) -> &AttributePath {
        &self.path
    }

    /// Sort direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

impl<E> Clone for OrderBy<E> {
    fn clone(&self) -> Self {
        Self::new(self.path.clone(), self.direction)
    }
}

impl<E> fmt::Debug for OrderBy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderBy")
            .field("path", &self.path)
            .field("direction", &self.direction)
            .finish()
    }
}

impl<E> fmt::Display for OrderBy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Asc => write!(f, "{} ASC", self.path),
            Direction::Desc => write!(f, "{} DESC", self.path),
        }
    }
}
