//! Rentable bicycles and their equipment descriptors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DisplayName, UserId};

/// Maximum length of a pickup location.
pub const LOCATION_MAX: usize = 100;
/// Maximum length of the bike name and bike type inside [`Gear`].
pub const GEAR_LABEL_MAX: usize = 60;

/// Validation errors raised by bicycle value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BicycleValidationError {
    #[error("bicycle id must be a valid UUID")]
    InvalidId,
    #[error("location must not be empty")]
    EmptyLocation,
    #[error("location must be at most {max} characters")]
    LocationTooLong { max: usize },
    #[error("{field} must not be empty")]
    EmptyGearLabel { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    GearLabelTooLong { field: &'static str, max: usize },
    #[error("price per hour must be greater than zero")]
    NonPositivePrice,
    #[error("unknown bicycle status: {0}")]
    UnknownStatus(String),
}

/// Stable bicycle identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BicycleId(Uuid);

impl BicycleId {
    /// Parse a bicycle identifier from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, BicycleValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(BicycleValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| BicycleValidationError::InvalidId)
    }

    /// Generate a fresh identifier for a newly listed bicycle.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID read back from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for BicycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<BicycleId> for String {
    fn from(value: BicycleId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for BicycleId {
    type Error = BicycleValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Availability of a bicycle.
///
/// `Rented` holds exactly when the bicycle has an open rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BicycleStatus {
    Available,
    Rented,
}

impl BicycleStatus {
    /// Storage representation, matching the `bicycles.status` CHECK constraint.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Rented => "rented",
        }
    }
}

impl fmt::Display for BicycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BicycleStatus {
    type Err = BicycleValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "rented" => Ok(Self::Rented),
            other => Err(BicycleValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Pickup location of a bicycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Location(String);

impl Location {
    /// Validate and construct a location. Surrounding whitespace is trimmed.
    pub fn new(location: impl Into<String>) -> Result<Self, BicycleValidationError> {
        let raw = location.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BicycleValidationError::EmptyLocation);
        }
        if trimmed.chars().count() > LOCATION_MAX {
            return Err(BicycleValidationError::LocationTooLong { max: LOCATION_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Location> for String {
    fn from(value: Location) -> Self {
        value.0
    }
}

impl TryFrom<String> for Location {
    type Error = BicycleValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Equipment descriptor stored alongside a bicycle.
///
/// Persisted as a JSON document through serde; never assembled by hand.
///
/// # Examples
/// ```
/// use rental_ledger::domain::Gear;
///
/// let gear = Gear::new("Trek FX 3", "hybrid", 450).expect("valid gear");
/// let json = serde_json::to_value(&gear).expect("serialise gear");
/// assert_eq!(json["pricePerHour"], 450);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(try_from = "GearDto", into = "GearDto")]
pub struct Gear {
    name: String,
    kind: String,
    price_per_hour: u32,
}

impl Gear {
    /// Validate and construct a descriptor. `price_per_hour` is expressed in
    /// minor currency units.
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        price_per_hour: u32,
    ) -> Result<Self, BicycleValidationError> {
        let name = gear_label("bikeName", name.into())?;
        let kind = gear_label("bikeType", kind.into())?;
        if price_per_hour == 0 {
            return Err(BicycleValidationError::NonPositivePrice);
        }
        Ok(Self {
            name,
            kind,
            price_per_hour,
        })
    }

    /// Display name of the bike model.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Bike type such as `road` or `mountain`.
    pub fn kind(&self) -> &str {
        self.kind.as_str()
    }

    /// Hourly price in minor currency units.
    pub fn price_per_hour(&self) -> u32 {
        self.price_per_hour
    }
}

fn gear_label(field: &'static str, raw: String) -> Result<String, BicycleValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BicycleValidationError::EmptyGearLabel { field });
    }
    if trimmed.chars().count() > GEAR_LABEL_MAX {
        return Err(BicycleValidationError::GearLabelTooLong {
            field,
            max: GEAR_LABEL_MAX,
        });
    }
    Ok(trimmed.to_owned())
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GearDto {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    price_per_hour: u32,
}

impl From<Gear> for GearDto {
    fn from(value: Gear) -> Self {
        Self {
            name: value.name,
            kind: value.kind,
            price_per_hour: value.price_per_hour,
        }
    }
}

impl TryFrom<GearDto> for Gear {
    type Error = BicycleValidationError;

    fn try_from(value: GearDto) -> Result<Self, Self::Error> {
        Self::new(value.name, value.kind, value.price_per_hour)
    }
}

/// A rentable bicycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bicycle {
    id: BicycleId,
    status: BicycleStatus,
    location: Location,
    gear: Gear,
    owner: Option<UserId>,
}

impl Bicycle {
    /// Reassemble a bicycle from stored components.
    pub fn new(
        id: BicycleId,
        status: BicycleStatus,
        location: Location,
        gear: Gear,
        owner: Option<UserId>,
    ) -> Self {
        Self {
            id,
            status,
            location,
            gear,
            owner,
        }
    }

    /// A freshly listed bicycle always starts out available.
    pub fn listed(owner: UserId, location: Location, gear: Gear) -> Self {
        Self::new(
            BicycleId::random(),
            BicycleStatus::Available,
            location,
            gear,
            Some(owner),
        )
    }

    pub fn id(&self) -> BicycleId {
        self.id
    }

    pub fn status(&self) -> BicycleStatus {
        self.status
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn gear(&self) -> &Gear {
        &self.gear
    }

    /// User who listed the bicycle, if they still exist.
    pub fn owner(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }
}

/// Bicycle joined with its owner's display name for catalogue listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BicycleListing {
    pub bicycle: Bicycle,
    pub owner_name: Option<DisplayName>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(BicycleStatus::Available)]
    #[case(BicycleStatus::Rented)]
    fn status_parses_its_storage_form(#[case] status: BicycleStatus) {
        assert_eq!(status.as_str().parse::<BicycleStatus>(), Ok(status));
    }

    #[test]
    fn status_rejects_mixed_case() {
        assert!("Available".parse::<BicycleStatus>().is_err());
    }

    #[test]
    fn gear_serialises_through_a_single_schema() {
        let gear = Gear::new(" Brompton ", "folding", 300).expect("valid gear");
        let value = serde_json::to_value(&gear).expect("serialise gear");
        assert_eq!(
            value,
            json!({ "name": "Brompton", "type": "folding", "pricePerHour": 300 })
        );
        let decoded: Gear = serde_json::from_value(value).expect("deserialise gear");
        assert_eq!(decoded, gear);
    }

    #[rstest]
    #[case(json!({ "name": "", "type": "road", "pricePerHour": 1 }))]
    #[case(json!({ "name": "Bike", "type": "road", "pricePerHour": 0 }))]
    #[case(json!({ "name": "Bike", "pricePerHour": 10 }))]
    fn gear_rejects_invalid_documents(#[case] value: serde_json::Value) {
        assert!(serde_json::from_value::<Gear>(value).is_err());
    }

    #[rstest]
    #[case("  ", Err(BicycleValidationError::EmptyLocation))]
    #[case(" Dock 4 ", Ok("Dock 4"))]
    fn location_is_trimmed(
        #[case] raw: &str,
        #[case] expected: Result<&str, BicycleValidationError>,
    ) {
        let result = Location::new(raw).map(String::from);
        assert_eq!(result, expected.map(str::to_owned));
    }

    #[test]
    fn listed_bicycles_start_available() {
        let owner = UserId::random();
        let bicycle = Bicycle::listed(
            owner.clone(),
            Location::new("Dock 1").expect("location"),
            Gear::new("City", "hybrid", 200).expect("gear"),
        );
        assert_eq!(bicycle.status(), BicycleStatus::Available);
        assert_eq!(bicycle.owner(), Some(&owner));
    }
}
