//! [`Query`] collection related to [`Room`]s.

use common::operations::By;

use crate::domain::{room, Room};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Room`] by its [`room::Id`].
pub type ById = DatabaseQuery<By<Option<Room>, room::Id>>;

/// Queries all the [`Room`]s ordered by their [`room::Number`]s.
pub type List = DatabaseQuery<By<Vec<Room>, ()>>;
