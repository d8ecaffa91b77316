//! Rental records and the return matching policy.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BicycleId, UserId};

/// Stable rental identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RentalId(Uuid);

/// Raised when a rental identifier is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rental id must be a valid UUID")]
pub struct InvalidRentalId;

impl RentalId {
    /// Parse a rental identifier from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, InvalidRentalId> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(InvalidRentalId);
        }
        Uuid::parse_str(raw).map(Self).map_err(|_| InvalidRentalId)
    }

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

impl fmt::Display for RentalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RentalId> for String {
    fn from(value: RentalId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for RentalId {
    type Error = InvalidRentalId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Truncate `at` to the microsecond precision PostgreSQL keeps, so a
/// timestamp reads back exactly as it was returned.
pub fn at_storage_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}

/// A rental transaction.
///
/// ## Invariants
/// - `started_at` never changes after creation.
/// - `ended_at` is set at most once and is never earlier than `started_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rental {
    id: RentalId,
    user_id: UserId,
    bicycle_id: BicycleId,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl Rental {
    /// Open a new rental starting at `now`.
    pub fn open(user_id: UserId, bicycle_id: BicycleId, now: DateTime<Utc>) -> Self {
        Self {
            id: RentalId::random(),
            user_id,
            bicycle_id,
            started_at: at_storage_precision(now),
            ended_at: None,
        }
    }

    /// Reassemble a rental from stored components.
    pub fn from_parts(
        id: RentalId,
        user_id: UserId,
        bicycle_id: BicycleId,
        started_at: DateTime<Utc>,
        ended_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            user_id,
            bicycle_id,
            started_at,
            ended_at,
        }
    }

    /// End timestamp for closing this rental at `now`.
    ///
    /// Clamped to `started_at` so a clock step backwards cannot produce an
    /// end before the start.
    pub fn end_time_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        at_storage_precision(now).max(self.started_at)
    }

    /// Return a closed copy of this rental. Closing twice keeps the first end
    /// time.
    #[must_use]
    pub fn closed_at(mut self, now: DateTime<Utc>) -> Self {
        if self.ended_at.is_none() {
            self.ended_at = Some(self.end_time_at(now));
        }
        self
    }

    /// Rental identifier.
    pub fn id(&self) -> RentalId {
        self.id
    }

    /// User who opened the rental.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Rented bicycle.
    pub fn bicycle_id(&self) -> BicycleId {
        self.bicycle_id
    }

    /// When the rental opened.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the rental closed, if it has.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// True while the rental has no end timestamp.
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// How `ReturnBicycle` matches the caller against the open rental.
///
/// With either policy, when several open rentals match, the most recently
/// opened one is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnPolicy {
    /// Only the user who opened the rental may return the bicycle.
    #[default]
    MatchRenter,
    /// Any user may return the bicycle, closing whoever's rental is open.
    AnyRenter,
}

impl ReturnPolicy {
    /// Renter filter the repository applies when locating the open rental.
    pub fn renter_filter<'a>(&self, caller: &'a UserId) -> Option<&'a UserId> {
        match self {
            Self::MatchRenter => Some(caller),
            Self::AnyRenter => None,
        }
    }
}

/// Raised when a configured return policy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown return policy `{0}`; expected `match_renter` or `any_renter`")]
pub struct UnknownReturnPolicy(pub String);

impl FromStr for ReturnPolicy {
    type Err = UnknownReturnPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "match_renter" => Ok(Self::MatchRenter),
            "any_renter" => Ok(Self::AnyRenter),
            other => Err(UnknownReturnPolicy(other.to_owned())),
        }
    }
}
