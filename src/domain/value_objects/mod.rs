//! Value Objects for the storefront

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use uuid::Uuid;

/// Money value object.
///
/// Always carries exactly two decimal places once constructed; storage keeps the
/// amount as integer cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        let mut amount = amount.round_dp(2);
        amount.rescale(2);
        Ok(Self(amount))
    }

    pub fn from_cents(cents: i64) -> Self { Self(Decimal::new(cents, 2)) }

    pub fn to_cents(&self) -> Result<i64, MoneyError> {
        let mut amount = self.0;
        amount.rescale(2);
        i64::try_from(amount.mantissa()).map_err(|_| MoneyError::Overflow)
    }

    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_zero(&self) -> bool { self.0.is_zero() }

    pub fn times(&self, quantity: i64) -> Money { Money(self.0 * Decimal::from(quantity)) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

impl std::ops::Add for Money {
    type Output = Money;
    fn add(self, other: Money) -> Money { Money(self.0 + other.0) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, |acc, m| acc + m) }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;
    fn try_from(amount: Decimal) -> Result<Self, Self::Error> { Money::new(amount) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum MoneyError { Negative, Overflow }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Negative => write!(f, "Amount cannot be negative"), Self::Overflow => write!(f, "Amount out of range") }
    }
}

/// Human-facing order label: `<prefix>-<YYYYMMDD>-<sequence>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// `sequence` is 1-based within the day and zero-padded to four digits.
    pub fn allocate(prefix: &str, day: NaiveDate, sequence: i64) -> Self {
        Self(format!("{}{:04}", Self::day_stem(prefix, day), sequence))
    }

    /// Everything before the sequence, e.g. `CS-20240307-`.
    pub fn day_stem(prefix: &str, day: NaiveDate) -> String {
        format!("{}-{}-", prefix, day.format("%Y%m%d"))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<String> for OrderNumber {
    fn from(value: String) -> Self { Self(value) }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Identifies whose cart a line belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSession(String);

impl CartSession {
    pub const DEFAULT: &'static str = "default";

    /// A fresh random session, e.g. for a second shopper on the same device.
    pub fn generate() -> Self { Self(Uuid::new_v4().to_string()) }

    pub fn named(value: impl Into<String>) -> Self { Self(value.into()) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for CartSession {
    fn default() -> Self { Self(Self::DEFAULT.to_string()) }
}

impl fmt::Display for CartSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// One page of a listing.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool { (self.page as i64) * (self.per_page as i64) < self.total }
}

/// 1-based page selector. `per_page` is clamped to 1..=100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub const MAX_PER_PAGE: u32 = 100;

    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page: page.max(1), per_page: per_page.clamp(1, Self::MAX_PER_PAGE) }
    }

    pub fn first(per_page: u32) -> Self { Self::new(1, per_page) }

    pub fn offset(&self) -> i64 { (self.page.max(1) as i64 - 1) * self.per_page as i64 }
}
