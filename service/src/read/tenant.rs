//! [`Tenant`]-related read definitions.

use derive_more::{Display, From, Into};

#[cfg(doc)]
use crate::domain::Tenant;

/// Number of [`Tenant`]s.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, From, Hash, Into, PartialEq,
)]
pub struct Count(i64);
