//! [`Tenant`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::room;
#[cfg(doc)]
use crate::domain::{Payment, Room};

/// Person renting a [`Room`].
#[derive(Clone, Debug)]
pub struct Tenant {
    /// ID of this [`Tenant`].
    pub id: Id,

    /// [`Name`] of this [`Tenant`].
    pub name: Name,

    /// [`Phone`] of this [`Tenant`].
    pub phone: Phone,

    /// ID of the [`Room`] this [`Tenant`] lives in, if any.
    pub room_id: Option<room::Id>,

    /// [`DateTime`] when the tenancy started.
    pub start_date: StartDateTime,

    /// [`DateTime`] when the tenancy ends, if known.
    pub end_date: Option<EndDateTime>,

    /// [`Status`] of this [`Tenant`].
    pub status: Status,

    /// [`DateTime`] when this [`Tenant`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Tenant`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Tenant {
    /// Indicates whether this [`Tenant`]'s tenancy period is well-formed, so
    /// it doesn't end before it starts.
    #[must_use]
    pub fn has_valid_period(&self) -> bool {
        self.end_date.map_or(true, |end| {
            end.coerce::<()>() >= self.start_date.coerce()
        })
    }
}

/// ID of a [`Tenant`].
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

/// Full name of a [`Tenant`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.chars().count() <= 100
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Phone number of a [`Tenant`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `number` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Phone`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+?[0-9()][0-9()\s\-]{0,19}$").expect("valid regex")
        });

        let number = number.as_ref();
        number.len() <= 20
            && number.trim() == number
            && REGEX.is_match(number)
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

define_kind! {
    #[doc = "Status of a [`Tenant`]."]
    enum Status {
        #[doc = "[`Tenant`] currently rents."]
        Active = "active",

        #[doc = "[`Tenant`] doesn't rent anymore, but is still kept along \
                 with its [`Payment`]s."]
        Inactive = "inactive",
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Active
    }
}

/// Marker of a tenancy start.
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker of a tenancy end.
#[derive(Clone, Copy, Debug)]
pub struct End;

/// [`DateTime`] when a [`Tenant`]'s tenancy starts.
pub type StartDateTime = DateTimeOf<(Tenant, Start)>;

/// [`DateTime`] when a [`Tenant`]'s tenancy ends.
pub type EndDateTime = DateTimeOf<(Tenant, End)>;

/// [`DateTime`] when a [`Tenant`] was created.
pub type CreationDateTime = DateTimeOf<(Tenant, unit::Creation)>;

/// [`DateTime`] when a [`Tenant`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Tenant, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::{Id, Name, Phone, Status, Tenant};

    #[test]
    fn phone_format() {
        for valid in ["081234567890", "+62 812-3456-7890", "(021) 555 0101"] {
            assert!(Phone::new(valid).is_some(), "`{valid}` is rejected");
        }
        let too_long = "1".repeat(21);
        for invalid in ["", "phone", "+", " 0812", "0812 ", too_long.as_str()] {
            assert!(Phone::new(invalid).is_none(), "`{invalid}` is accepted");
        }
    }

    #[test]
    fn name_is_bounded() {
        assert!(Name::new("Budi Santoso").is_some());
        assert!(Name::new("b".repeat(100)).is_some());
        assert!(Name::new("b".repeat(101)).is_none());
        assert!(Name::new("").is_none());
    }

    #[test]
    fn tenancy_period_must_not_end_before_start() {
        let start = DateTime::from_date(2024, 1, 10).unwrap();
        let mut tenant = Tenant {
            id: Id::new(),
            name: Name::new("Budi").unwrap(),
            phone: Phone::new("0812").unwrap(),
            room_id: None,
            start_date: start.coerce(),
            end_date: None,
            status: Status::Active,
            created_at: start.coerce(),
            updated_at: start.coerce(),
        };
        assert!(tenant.has_valid_period());

        tenant.end_date = Some(start.coerce());
        assert!(tenant.has_valid_period());

        tenant.end_date = DateTime::from_date(2024, 1, 9).map(|d| d.coerce());
        assert!(!tenant.has_valid_period());
    }
}
