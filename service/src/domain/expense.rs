//! [`Expense`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Operational expense of the boarding house.
#[derive(Clone, Debug)]
pub struct Expense {
    /// ID of this [`Expense`].
    pub id: Id,

    /// [`Description`] of this [`Expense`].
    pub description: Description,

    /// Amount spent.
    pub amount: Money,

    /// [`DateTime`] the money was spent at.
    pub date: SpendingDateTime,

    /// [`DateTime`] when this [`Expense`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Expense`] was last modified.
    pub updated_at: ModificationDateTime,
}

/// ID of an [`Expense`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Description of an [`Expense`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `text` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Creates a new [`Description`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Description`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        text.trim() == text && !text.is_empty() && text.chars().count() <= 255
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// Marker of spending money.
#[derive(Clone, Copy, Debug)]
pub struct Spending;

/// [`DateTime`] the money of an [`Expense`] was spent at.
pub type SpendingDateTime = DateTimeOf<(Expense, Spending)>;

/// [`DateTime`] when an [`Expense`] was created.
pub type CreationDateTime = DateTimeOf<(Expense, unit::Creation)>;

/// [`DateTime`] when an [`Expense`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Expense, unit::Modification)>;
