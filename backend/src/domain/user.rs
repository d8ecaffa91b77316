//! User identity model.
//!
//! Users are owned by the identity service. The rental ledger only ever
//! refers to them through [`UserId`].

use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must not be empty")]
    EmptyId,
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("name must not be empty")]
    EmptyDisplayName,
    #[error("name must be at most {max} characters")]
    DisplayNameTooLong { max: usize },
    #[error("email address must not be empty")]
    EmptyEmail,
    #[error("email address must look like name@domain.tld")]
    InvalidEmail,
    #[error("email address must be at most {max} characters")]
    EmailTooLong { max: usize },
    #[error("phone number may only contain digits, spaces, '+', '-', '(' or ')'")]
    InvalidPhone,
    #[error("phone number must be at most {max} characters")]
    PhoneTooLong { max: usize },
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    ///
    /// # Examples
    /// ```
    /// use rental_ledger::domain::UserId;
    ///
    /// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
    /// assert_eq!(id.as_ref(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    /// ```
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an already-parsed UUID, typically read back from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Maximum allowed length for a display name.
pub const DISPLAY_NAME_MAX: usize = 100;
/// Maximum allowed length for an email address.
pub const EMAIL_MAX: usize = 100;
/// Maximum allowed length for a phone number.
pub const PHONE_MAX: usize = 20;

/// Human readable name shown next to listed bicycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`]. Surrounding whitespace is
    /// trimmed.
    pub fn new(display_name: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = display_name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(UserValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // At least one local character, a domain label, a dot and a two
        // character suffix.
        let pattern = r"^[^@\s]+@[^@\s]+\.[^@\s.]{2,}$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Login identifier. Stored lowercase so uniqueness is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    ///
    /// # Examples
    /// ```
    /// use rental_ledger::domain::EmailAddress;
    ///
    /// let email = EmailAddress::new(" Ada@Example.org ").expect("valid email");
    /// assert_eq!(email.as_ref(), "ada@example.org");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = email.into();
        let normalised = raw.trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Contact phone number as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate a phone number. Empty input is allowed and stored as-is.
    pub fn new(phone: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = phone.into();
        let trimmed = raw.trim();
        if trimmed.chars().count() > PHONE_MAX {
            return Err(UserValidationError::PhoneTooLong { max: PHONE_MAX });
        }
        let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')');
        if !trimmed.chars().all(allowed) {
            return Err(UserValidationError::InvalidPhone);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Registered rider or bicycle owner.
///
/// ## Invariants
/// - `email` is unique across all users (enforced by storage).
/// - The password hash never travels with this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    display_name: DisplayName,
    email: EmailAddress,
    phone: PhoneNumber,
    date_of_birth: NaiveDate,
}

impl User {
    /// Build a new [`User`] from validated components.
    pub fn new(
        id: UserId,
        display_name: DisplayName,
        email: EmailAddress,
        phone: PhoneNumber,
        date_of_birth: NaiveDate,
    ) -> Self {
        Self {
            id,
            display_name,
            email,
            phone,
            date_of_birth,
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Name shown to other users.
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Login email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Contact phone number.
    pub fn phone(&self) -> &PhoneNumber {
        &self.phone
    }

    /// Date of birth as supplied at registration.
    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }
}
