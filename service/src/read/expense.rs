//! [`Expense`]-related read definitions.

use std::ops::Range;

use crate::domain::expense;
#[cfg(doc)]
use crate::domain::Expense;

/// Selector of [`Expense`]s spent within the half-open [`Range`].
#[derive(Clone, Debug)]
pub struct DatedWithin(pub Range<expense::SpendingDateTime>);
