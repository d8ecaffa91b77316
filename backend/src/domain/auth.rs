//! Credentials handled by registration and login.
//!
//! Plaintext passwords only ever live inside [`Zeroizing`] buffers and are
//! wiped when dropped. Hashes are opaque strings produced by a
//! [`PasswordHasher`](crate::domain::ports::PasswordHasher) adapter.

use std::fmt;

use chrono::NaiveDate;
use zeroize::Zeroizing;

use super::{DisplayName, EmailAddress, PhoneNumber, UserValidationError};

/// Minimum accepted password length for new accounts.
pub const PASSWORD_MIN: usize = 8;
/// Maximum accepted password length. bcrypt ignores bytes past 72.
pub const PASSWORD_MAX: usize = 72;

/// Errors raised when credential inputs are malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    #[error(transparent)]
    Email(#[from] UserValidationError),
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("password must be between {min} and {max} bytes")]
    PasswordLength { min: usize, max: usize },
}

/// Plaintext password supplied by a caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Accept any non-empty password. Used for login, where length policy
    /// must not leak which accounts exist.
    pub fn for_login(raw: &str) -> Result<Self, CredentialsValidationError> {
        if raw.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Accept a password for a new account, enforcing the length policy.
    pub fn for_registration(raw: &str) -> Result<Self, CredentialsValidationError> {
        if raw.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&raw.len()) {
            return Err(CredentialsValidationError::PasswordLength {
                min: PASSWORD_MIN,
                max: PASSWORD_MAX,
            });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Borrow the plaintext for hashing or verification.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Salted password hash as stored by the identity store.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash produced by a hasher adapter or read from storage.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Borrow the encoded hash.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<redacted>)")
    }
}

/// Validated login credentials used by the identity service.
///
/// # Examples
/// ```
/// use rental_ledger::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.org", "password").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.org");
/// assert_eq!(creds.password().expose(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Password,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialsValidationError> {
        Ok(Self {
            email: EmailAddress::new(email)?,
            password: Password::for_login(password)?,
        })
    }

    /// Normalised email used for the account lookup.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password supplied by the caller.
    pub fn password(&self) -> &Password {
        &self.password
    }
}

/// Validated sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub display_name: DisplayName,
    pub email: EmailAddress,
    pub phone: PhoneNumber,
    pub date_of_birth: NaiveDate,
    pub password: Password,
}
