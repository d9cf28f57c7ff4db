//! [`Room`]-related read definitions.

use derive_more::{Display, From, Into, Sub};

#[cfg(doc)]
use crate::domain::Room;

/// Number of [`Room`]s.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Sub,
)]
pub struct Count(i64);
