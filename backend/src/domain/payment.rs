//! Payments recorded against rentals.
//!
//! Card numbers enter the domain only as [`CardNumber`], which zeroises its
//! buffer on drop and exposes nothing but the last four digits.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::{RentalId, UserId};

/// Shortest card number accepted.
pub const CARD_DIGITS_MIN: usize = 12;
/// Longest card number accepted.
pub const CARD_DIGITS_MAX: usize = 19;

/// Validation errors raised by payment value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentValidationError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("card number must contain {min} to {max} digits")]
    CardNumberLength { min: usize, max: usize },
    #[error("card number may only contain digits, spaces or dashes")]
    CardNumberCharacters,
    #[error("card suffix must be exactly four digits")]
    InvalidLastFour,
    #[error("unknown payment status: {0}")]
    UnknownStatus(String),
}

/// Stable payment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Mint a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a stored identifier.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Charged amount in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    pub fn new(minor_units: i64) -> Result<Self, PaymentValidationError> {
        if minor_units <= 0 {
            return Err(PaymentValidationError::NonPositiveAmount);
        }
        Ok(Self(minor_units))
    }

    pub fn minor_units(self) -> i64 {
        self.0
    }
}

impl From<Amount> for i64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = PaymentValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Full card number supplied with a payment request.
///
/// # Examples
/// ```
/// use rental_ledger::domain::CardNumber;
///
/// let card = CardNumber::new("4111 1111-1111 1234").expect("valid card");
/// assert_eq!(card.last_four().as_ref(), "1234");
/// ```
#[derive(Clone)]
pub struct CardNumber(Zeroizing<String>);

impl CardNumber {
    /// Validate a card number. Spaces and dashes are ignored.
    pub fn new(raw: &str) -> Result<Self, PaymentValidationError> {
        let mut digits = Zeroizing::new(String::with_capacity(raw.len()));
        for c in raw.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' => {}
                _ => return Err(PaymentValidationError::CardNumberCharacters),
            }
        }
        if !(CARD_DIGITS_MIN..=CARD_DIGITS_MAX).contains(&digits.len()) {
            return Err(PaymentValidationError::CardNumberLength {
                min: CARD_DIGITS_MIN,
                max: CARD_DIGITS_MAX,
            });
        }
        Ok(Self(digits))
    }

    /// The only part of a card number that may be retained.
    pub fn last_four(&self) -> CardLastFour {
        let digits = self.0.as_str();
        let start = digits.len().saturating_sub(4);
        CardLastFour(digits.get(start..).unwrap_or_default().to_owned())
    }
}

impl fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardNumber(****{})", self.last_four().as_ref())
    }
}

/// Last four digits of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardLastFour(String);

impl CardLastFour {
    /// Validate a stored suffix.
    pub fn new(raw: impl Into<String>) -> Result<Self, PaymentValidationError> {
        let raw = raw.into();
        if raw.len() != 4 || !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentValidationError::InvalidLastFour);
        }
        Ok(Self(raw))
    }
}

impl AsRef<str> for CardLastFour {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<CardLastFour> for String {
    fn from(value: CardLastFour) -> Self {
        value.0
    }
}

impl TryFrom<String> for CardLastFour {
    type Error = PaymentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Settlement status of a recorded payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = PaymentValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            other => Err(PaymentValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// A payment recorded against a rental.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub id: PaymentId,
    pub rental_id: RentalId,
    pub user_id: UserId,
    pub amount: Amount,
    pub card_last_four: CardLastFour,
    pub status: PaymentStatus,
    pub paid_at: DateTime<Utc>,
}

/// Validated input for recording a payment.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub rental_id: RentalId,
    pub user_id: UserId,
    pub amount: Amount,
    pub card: CardNumber,
}
