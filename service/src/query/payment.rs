//! [`Query`] collection related to [`Payment`]s.

use common::operations::By;

use crate::{
    domain::{payment, tenant, Payment},
    read,
};
#[cfg(doc)]
use crate::{domain::Tenant, Query};

use super::DatabaseQuery;

/// Queries a [`Payment`] by its [`payment::Id`].
pub type ById = DatabaseQuery<By<Option<Payment>, payment::Id>>;

/// Queries all the [`Payment`]s ordered by their due dates.
pub type List = DatabaseQuery<By<Vec<Payment>, ()>>;

/// Queries all the [`Payment`]s of a [`Tenant`] ordered by their due dates.
pub type ByTenant = DatabaseQuery<By<Vec<Payment>, tenant::Id>>;

/// Queries the [`Payment`]s being overdue at some moment.
pub type Overdue = DatabaseQuery<By<Vec<Payment>, read::payment::OverdueAt>>;
