//! [`Money`]-related definitions.

use std::{fmt, iter, ops, str::FromStr};

use derive_more::{Add, From, Into, Neg, Sub, Sum};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{prelude::ToPrimitive as _, Decimal};

/// Amount of money.
///
/// There is no notion of currency: every amount in the system is expressed in
/// the same one.
#[derive(
    Add,
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    From,
    Into,
    Neg,
    Ord,
    PartialEq,
    PartialOrd,
    Sub,
    Sum,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(transparent)
)]
pub struct Money(Decimal);

impl Money {
    /// Zero amount of [`Money`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Money`] of the provided `amount`.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Returns the amount of this [`Money`].
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Indicates whether this [`Money`] is below zero.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.0.normalize();
        if amount.is_integer() {
            write!(f, "{}", amount.to_i128().expect("integer"))
        } else {
            write!(f, "{amount}")
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() != s || s.is_empty() {
            return Err("invalid amount");
        }
        Decimal::from_str(s)
            .map(Self)
            .map_err(|_| "invalid amount")
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(amount.into())
    }
}

impl ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl<'a> iter::Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Money;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            money("123.45").amount(),
            "123.45".parse::<Decimal>().unwrap(),
        );
        assert_eq!(money("-5"), Money::from(-5));
        assert_eq!(money("0"), Money::ZERO);

        assert!(Money::from_str("").is_err());
        assert!(Money::from_str(" 12").is_err());
        assert!(Money::from_str("12USD").is_err());
        assert!(Money::from_str("twelve").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(money("123.45").to_string(), "123.45");
        assert_eq!(money("123.00").to_string(), "123");
        assert_eq!(money("123.0").to_string(), "123");
        assert_eq!(money("123.50").to_string(), "123.5");
        assert_eq!(money("-7").to_string(), "-7");
    }

    #[test]
    fn arithmetic() {
        assert_eq!(money("500") - money("200"), money("300"));
        assert_eq!(money("200") - money("500"), money("-300"));
        assert_eq!(
            [money("100"), money("150.5"), money("249.5")]
                .iter()
                .sum::<Money>(),
            money("500"),
        );
        assert_eq!(Vec::<Money>::new().into_iter().sum::<Money>(), Money::ZERO);
    }

    #[test]
    fn is_negative() {
        assert!(money("-0.01").is_negative());
        assert!(!money("0").is_negative());
        assert!(!money("-0").is_negative());
        assert!(!money("10").is_negative());
    }
}
