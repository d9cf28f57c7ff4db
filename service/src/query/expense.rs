//! [`Query`] collection related to [`Expense`]s.

use common::operations::By;

use crate::domain::{expense, Expense};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Expense`] by its [`expense::Id`].
pub type ById = DatabaseQuery<By<Option<Expense>, expense::Id>>;

/// Queries all the [`Expense`]s, the most recent first.
pub type List = DatabaseQuery<By<Vec<Expense>, ()>>;
