//! Rider feedback attached to completed rentals.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{RentalId, UserId};

/// Longest accepted feedback comment, in characters.
pub const FEEDBACK_TEXT_MAX: usize = 1000;

/// Validation errors raised by feedback value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedbackValidationError {
    #[error("rating must be between 1 and 5")]
    RatingOutOfRange,
    #[error("feedback text must be at most {max} characters")]
    TextTooLong { max: usize },
}

/// Stable feedback identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedbackId(Uuid);

impl FeedbackId {
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

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Star rating from one to five.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub struct Rating(i16);

impl Rating {
    /// Validate a star rating.
    pub fn new(value: i16) -> Result<Self, FeedbackValidationError> {
        if !(1..=5).contains(&value) {
            return Err(FeedbackValidationError::RatingOutOfRange);
        }
        Ok(Self(value))
    }

    /// Numeric star count.
    pub fn value(self) -> i16 {
        self.0
    }
}

impl From<Rating> for i16 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

impl TryFrom<i16> for Rating {
    type Error = FeedbackValidationError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Free-text comment. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeedbackText(String);

impl FeedbackText {
    /// Trim and length-check a comment.
    pub fn new(text: impl Into<String>) -> Result<Self, FeedbackValidationError> {
        let raw = text.into();
        let trimmed = raw.trim();
        if trimmed.chars().count() > FEEDBACK_TEXT_MAX {
            return Err(FeedbackValidationError::TextTooLong {
                max: FEEDBACK_TEXT_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for FeedbackText {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<FeedbackText> for String {
    fn from(value: FeedbackText) -> Self {
        value.0
    }
}

impl TryFrom<String> for FeedbackText {
    type Error = FeedbackValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Feedback left by the renter after returning a bicycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub id: FeedbackId,
    pub rental_id: RentalId,
    pub user_id: UserId,
    pub text: FeedbackText,
    pub rating: Rating,
    pub submitted_at: DateTime<Utc>,
}

/// Validated input for submitting feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub rental_id: RentalId,
    pub user_id: UserId,
    pub text: FeedbackText,
    pub rating: Rating,
}
