//! [`Room`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Tenant;

/// Room of a boarding house available for rent.
#[derive(Clone, Debug)]
pub struct Room {
    /// ID of this [`Room`].
    pub id: Id,

    /// [`Number`] of this [`Room`].
    pub number: Number,

    /// Monthly rent price of this [`Room`].
    pub price: Money,

    /// [`Status`] of this [`Room`].
    ///
    /// Mirrors whether any [`Tenant`] references this [`Room`].
    pub status: Status,

    /// [`Facilities`] of this [`Room`].
    pub facilities: Facilities,

    /// [`Notes`] about this [`Room`].
    pub notes: Notes,

    /// [`DateTime`] when this [`Room`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Room`] was last modified.
    pub updated_at: ModificationDateTime,
}

/// ID of a [`Room`].
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

/// Number of a [`Room`], unique across the boarding house.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Creates a new [`Number`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `number` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Creates a new [`Number`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Number`].
    fn check(number: impl AsRef<str>) -> bool {
        let number = number.as_ref();
        number.trim() == number
            && !number.is_empty()
            && number.chars().count() <= 20
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Number`")
    }
}

/// Free-text list of facilities of a [`Room`].
#[derive(AsRef, Clone, Debug, Default, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Facilities(String);

impl Facilities {
    /// Creates new [`Facilities`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (text.len() <= 4096).then_some(Self(text))
    }
}

impl FromStr for Facilities {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Facilities`")
    }
}

/// Free-text notes about a [`Room`].
#[derive(AsRef, Clone, Debug, Default, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

impl Notes {
    /// Creates new [`Notes`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (text.len() <= 4096).then_some(Self(text))
    }
}

impl FromStr for Notes {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Notes`")
    }
}

define_kind! {
    #[doc = "Occupancy status of a [`Room`]."]
    enum Status {
        #[doc = "No [`Tenant`] lives in the [`Room`]."]
        Empty = "empty",

        #[doc = "A [`Tenant`] lives in the [`Room`]."]
        Occupied = "occupied",
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Empty
    }
}

/// Change of a [`Room`]'s [`Status`] alone, leaving its other fields intact.
#[derive(Clone, Copy, Debug)]
pub struct StatusUpdate {
    /// ID of the [`Room`] to update.
    pub id: Id,

    /// New [`Status`] of the [`Room`].
    pub status: Status,

    /// [`DateTime`] of the change.
    pub updated_at: ModificationDateTime,
}

/// [`DateTime`] when a [`Room`] was created.
pub type CreationDateTime = DateTimeOf<(Room, unit::Creation)>;

/// [`DateTime`] when a [`Room`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Room, unit::Modification)>;

#[cfg(test)]
mod spec {
    use super::{Number, Status};

    #[test]
    fn number_is_trimmed_and_bounded() {
        assert!(Number::new("101").is_some());
        assert!(Number::new("A-12b").is_some());
        assert!(Number::new("a".repeat(20)).is_some());

        assert!(Number::new("").is_none());
        assert!(Number::new(" 101").is_none());
        assert!(Number::new("101 ").is_none());
        assert!(Number::new("a".repeat(21)).is_none());
    }

    #[test]
    fn status_uses_lowercase_strings() {
        assert_eq!(Status::Empty.as_str(), "empty");
        assert_eq!(Status::Occupied.to_string(), "occupied");
        assert_eq!("occupied".parse::<Status>().unwrap(), Status::Occupied);
        assert!("Occupied".parse::<Status>().is_err());
    }
}
