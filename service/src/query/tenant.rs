//! [`Query`] collection related to [`Tenant`]s.

use common::operations::By;

use crate::domain::{tenant, Tenant};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`Tenant`] by its [`tenant::Id`].
pub type ById = DatabaseQuery<By<Option<Tenant>, tenant::Id>>;

/// Queries all the [`Tenant`]s in the order they were created.
pub type List = DatabaseQuery<By<Vec<Tenant>, ()>>;
