//! [`Payment`]-related read definitions.

use std::ops::Range;

use common::DateTime;
use derive_more::{Display, From, Into};

use crate::domain::payment;
#[cfg(doc)]
use crate::domain::{payment::Status, Payment};

/// Number of [`Payment`]s.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, From, Hash, Into, PartialEq,
)]
pub struct Count(i64);

/// Selector of [`Payment`]s being overdue at the provided [`DateTime`].
///
/// Overdue is [`Status::Unpaid`] with a due date strictly before the moment.
#[derive(Clone, Copy, Debug)]
pub struct OverdueAt(pub DateTime);

/// Selector of [`Status::Paid`] [`Payment`]s paid within the half-open
/// [`Range`].
#[derive(Clone, Debug)]
pub struct PaidWithin(pub Range<payment::PaidDateTime>);
