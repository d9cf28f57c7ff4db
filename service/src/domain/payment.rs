//! [`Payment`] definitions and its lifecycle resolution.

use common::{define_kind, unit, DateTime, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::tenant;
#[cfg(doc)]
use crate::domain::Tenant;

/// Rent payment of a [`Tenant`].
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the [`Tenant`] this [`Payment`] belongs to.
    pub tenant_id: tenant::Id,

    /// Amount of this [`Payment`].
    pub amount: Money,

    /// [`DateTime`] this [`Payment`] is due at.
    pub due_date: DueDateTime,

    /// [`DateTime`] this [`Payment`] was paid at, if it was.
    pub paid_at: Option<PaidDateTime>,

    /// [`Status`] of this [`Payment`].
    ///
    /// Always the result of [`Status::resolve()`] at the moment this
    /// [`Payment`] was last saved.
    pub status: Status,

    /// [`Method`] this [`Payment`] was paid with.
    pub method: Method,

    /// [`DateTime`] when this [`Payment`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Payment`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Payment {
    /// Recomputes the [`Status`] of this [`Payment`] at the provided `now`.
    pub fn resolve_status(&mut self, now: DateTime) {
        self.status = Status::resolve(self.due_date, self.paid_at, now);
    }

    /// Indicates whether this [`Payment`] is overdue at the provided `now`.
    ///
    /// Overdue is never stored, and is computed on read only.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime) -> bool {
        matches!(self.status, Status::Unpaid)
            && self.due_date.coerce::<()>() < now
    }
}

/// ID of a [`Payment`].
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

/// Method a [`Payment`] was made with (cash, transfer, etc.).
#[derive(AsRef, Clone, Debug, Default, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Method(String);

impl Method {
    /// Creates a new [`Method`] if the given `method` is valid.
    ///
    /// Empty [`Method`] is allowed.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Option<Self> {
        let method = method.into();
        Self::check(&method).then_some(Self(method))
    }

    /// Checks whether the given `method` is a valid [`Method`].
    fn check(method: impl AsRef<str>) -> bool {
        let method = method.as_ref();
        method.trim() == method && method.chars().count() <= 20
    }
}

impl FromStr for Method {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Method`")
    }
}

define_kind! {
    #[doc = "Lifecycle status of a [`Payment`]."]
    enum Status {
        #[doc = "[`Payment`] is not paid yet."]
        Unpaid = "unpaid",

        #[doc = "[`Payment`] is paid in time."]
        Paid = "paid",

        #[doc = "[`Payment`] is paid after its due date."]
        Late = "late",
    }
}

impl Status {
    /// Resolves the [`Status`] of a [`Payment`] with the provided `due_date`
    /// and `paid_at` at the provided `now`.
    ///
    /// A paid [`Payment`] is [`Status::Late`] when its `due_date` is already in
    /// the past at the moment of saving, regardless of when exactly it has
    /// been paid.
    #[must_use]
    pub fn resolve(
        due_date: DueDateTime,
        paid_at: Option<PaidDateTime>,
        now: DateTime,
    ) -> Self {
        match paid_at {
            None => Self::Unpaid,
            Some(_) if due_date.coerce::<()>() < now => Self::Late,
            Some(_) => Self::Paid,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Unpaid
    }
}

/// Marker of a [`Payment`] due.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// Marker of a [`Payment`] being paid.
#[derive(Clone, Copy, Debug)]
pub struct Paying;

/// [`DateTime`] a [`Payment`] is due at.
pub type DueDateTime = DateTimeOf<(Payment, Due)>;

/// [`DateTime`] a [`Payment`] was paid at.
pub type PaidDateTime = DateTimeOf<(Payment, Paying)>;

/// [`DateTime`] when a [`Payment`] was created.
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

/// [`DateTime`] when a [`Payment`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Payment, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::{DateTime, Money};

    use crate::domain::tenant;

    use super::{Id, Method, Payment, Status};

    fn date(day: u8) -> DateTime {
        DateTime::from_date(2024, 1, day).unwrap()
    }

    fn payment(due: u8, paid: Option<u8>) -> Payment {
        Payment {
            id: Id::new(),
            tenant_id: tenant::Id::new(),
            amount: Money::from(500),
            due_date: date(due).coerce(),
            paid_at: paid.map(|d| date(d).coerce()),
            status: Status::Unpaid,
            method: Method::default(),
            created_at: date(1).coerce(),
            updated_at: date(1).coerce(),
        }
    }

    #[test]
    fn paid_before_due_is_paid() {
        let mut p = payment(10, Some(3));

        p.resolve_status(date(5));

        assert_eq!(p.status, Status::Paid);
    }

    #[test]
    fn saved_after_due_is_late() {
        let mut p = payment(10, Some(3));

        p.resolve_status(date(15));

        assert_eq!(p.status, Status::Late);
    }

    #[test]
    fn saved_at_due_instant_is_paid() {
        let due = date(10);

        assert_eq!(
            Status::resolve(due.coerce(), Some(due.coerce()), due),
            Status::Paid,
        );
    }

    #[test]
    fn without_paid_at_is_always_unpaid() {
        for now in [date(1), date(10), date(31)] {
            assert_eq!(
                Status::resolve(date(10).coerce(), None, now),
                Status::Unpaid,
            );
        }
    }

    #[test]
    fn overdue_only_when_unpaid_and_past_due() {
        let mut unpaid = payment(10, None);
        unpaid.resolve_status(date(5));
        assert!(!unpaid.is_overdue(date(10)));
        assert!(unpaid.is_overdue(date(11)));

        let mut late = payment(10, Some(12));
        late.resolve_status(date(12));
        assert_eq!(late.status, Status::Late);
        assert!(!late.is_overdue(date(20)));

        let mut paid = payment(10, Some(3));
        paid.resolve_status(date(3));
        assert!(!paid.is_overdue(date(20)));
    }

    #[test]
    fn method_may_be_empty() {
        assert!(Method::new("").is_some());
        assert!(Method::new("transfer").is_some());
        assert!(Method::new("x".repeat(21)).is_none());
    }
}
