//! User aggregate and its validated value objects.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors raised by user value-object constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyEmail,
    InvalidEmail,
    EmptyFullName,
    NegativeCredits,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must contain a local part and a domain"),
            Self::EmptyFullName => write!(f, "full name must not be empty"),
            Self::NegativeCredits => write!(f, "credits must not be negative"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        let uuid = Uuid::new_v4();
        Self(uuid, uuid.to_string())
    }

    /// Wrap an already-parsed UUID.
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

/// Validated email address used as the login handle.
///
/// Deliberately loose: identity lives with an external provider, this type
/// only rejects obviously malformed input at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`] from owned input.
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(email.into())
    }

    fn from_owned(email: String) -> Result<Self, UserValidationError> {
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(trimmed.to_lowercase()))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Application user.
///
/// ## Invariants
/// - `credits` is never negative as committed state; the ledger's
///   conditional decrement enforces this at the storage layer.
/// - `is_active = false` blocks session establishment at the login seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: Email,
    full_name: String,
    credits: i32,
    is_vip: bool,
    is_active: bool,
    first_login_completed: bool,
}

/// Plain struct carrying unvalidated user fields into [`User::new`].
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
    pub credits: i32,
    pub is_vip: bool,
    pub is_active: bool,
    pub first_login_completed: bool,
}

impl User {
    /// Build a [`User`] from a draft, enforcing aggregate invariants.
    pub fn new(draft: UserDraft) -> Result<Self, UserValidationError> {
        let UserDraft {
            id,
            email,
            full_name,
            credits,
            is_vip,
            is_active,
            first_login_completed,
        } = draft;

        if full_name.trim().is_empty() {
            return Err(UserValidationError::EmptyFullName);
        }
        if credits < 0 {
            return Err(UserValidationError::NegativeCredits);
        }

        Ok(Self {
            id,
            email,
            full_name,
            credits,
            is_vip,
            is_active,
            first_login_completed,
        })
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Login email handle.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Name shown in confirmations and the grid header.
    pub fn full_name(&self) -> &str {
        self.full_name.as_str()
    }

    /// Current credit balance (1 credit = 1 bookable hour).
    pub fn credits(&self) -> i32 {
        self.credits
    }

    /// Whether the user books inside the extended VIP window.
    pub fn is_vip(&self) -> bool {
        self.is_vip
    }

    /// Whether the account may establish new sessions.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Whether the first-login flow has been completed.
    pub fn first_login_completed(&self) -> bool {
        self.first_login_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draft() -> UserDraft {
        UserDraft {
            id: UserId::random(),
            email: Email::new("ana@example.com").expect("valid email"),
            full_name: "Ana Torres".to_owned(),
            credits: 4,
            is_vip: false,
            is_active: true,
            first_login_completed: true,
        }
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("not-a-uuid")]
    #[case(" 3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    fn user_id_rejects_invalid_input(#[case] raw: &str) {
        assert!(UserId::new(raw).is_err());
    }

    #[rstest]
    #[case("ana@example.com", "ana@example.com")]
    #[case("  Ana@Example.COM ", "ana@example.com")]
    fn email_normalises(#[case] raw: &str, #[case] expected: &str) {
        let email = Email::new(raw).expect("valid email");
        assert_eq!(email.as_ref(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("ana")]
    #[case("@example.com")]
    #[case("ana@")]
    #[case("ana@localhost")]
    fn email_rejects_malformed_input(#[case] raw: &str) {
        assert!(Email::new(raw).is_err());
    }

    #[rstest]
    fn user_rejects_negative_credits() {
        let mut bad = draft();
        bad.credits = -1;
        assert_eq!(User::new(bad), Err(UserValidationError::NegativeCredits));
    }

    #[rstest]
    fn user_rejects_blank_full_name() {
        let mut bad = draft();
        bad.full_name = "  ".to_owned();
        assert_eq!(User::new(bad), Err(UserValidationError::EmptyFullName));
    }
}
