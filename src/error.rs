use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The kind of record that a lookup failed to find.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    Category,
    Expense,
}

serde_plain::derive_display_from_serialize!(Entity);

/// Returned (inside an `anyhow::Error`) when a single-record lookup by id matches no row.
///
/// This is the only store error that is expected to reach callers during normal use. Mutations
/// never raise it; they report `Outcome::NoOp(NoOpReason::NotFound)` instead.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct NotFound {
    entity: Entity,
    id: i64,
}

impl NotFound {
    pub(crate) fn new(entity: Entity, id: i64) -> Self {
        Self { entity, id }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn id(&self) -> i64 {
        self.id
    }
}

impl Display for NotFound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cannot find {} with id {}", self.entity, self.id)
    }
}

impl std::error::Error for NotFound {}

/// Returns true if `e` was caused by a `NotFound` lookup.
pub fn is_not_found(e: &Error) -> bool {
    e.downcast_ref::<NotFound>().is_some()
}

/// Why a mutation did not change anything.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    /// The id given to a delete or update does not exist.
    NotFound,
    /// An expense referenced a category id that does not exist.
    UnknownCategory,
    /// A category referenced a category type code that does not exist.
    UnknownCategoryType,
    /// The category is still referenced by at least one expense.
    CategoryInUse,
}

serde_plain::derive_display_from_serialize!(NoOpReason);

/// The result of a store mutation.
///
/// Deletes and updates are idempotent against stale ids, and adds are rejected when they
/// reference rows that do not exist. None of those cases are errors, so they are reported here
/// rather than through `Result`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome<T = ()> {
    Applied(T),
    NoOp(NoOpReason),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    /// Returns the applied value, if any.
    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::NoOp(_) => None,
        }
    }

    pub fn no_op_reason(&self) -> Option<NoOpReason> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::NoOp(reason) => Some(*reason),
        }
    }
}
