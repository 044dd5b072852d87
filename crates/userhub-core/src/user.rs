//! The User entity and the documents that create, patch and expose it.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

static EMAIL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    // A literal pattern that is checked by the tests below.
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("e-mail pattern is valid")
});

/// Returns `true` if `email` has the `local@domain.tld` shape.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

/// A persisted user.
///
/// The password hash is never serialized: every JSON rendering of a `User`
/// (relay payloads included) omits it, and deserialization leaves it empty.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned identity, immutable after creation.
    pub id: Uuid,
    /// Unique among live users.
    pub nickname: String,
    /// Unique among live users.
    pub email: String,
    /// One-way hash of the password (PHC string).
    #[serde(skip)]
    pub password_hash: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Country of residence.
    pub country: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
    /// Row version used for optimistic concurrency; starts at 1.
    pub version: i64,
}

impl User {
    /// Builds a brand-new user from a validated creation document.
    #[must_use]
    pub fn register(id: Uuid, new_user: NewUser, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            nickname: new_user.nickname.trim().to_owned(),
            email: new_user.email.trim().to_owned(),
            password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            country: new_user.country,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("country", &self.country)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("version", &self.version)
            .finish()
    }
}

/// Creation document: the payload of a `CREATED` event and of `POST /user`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    /// Requested nickname.
    #[serde(default)]
    pub nickname: String,
    /// Requested e-mail.
    #[serde(default)]
    pub email: String,
    /// Plaintext password; hashed before it reaches the store.
    #[serde(default)]
    pub password: String,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Country of residence.
    #[serde(default)]
    pub country: String,
}

impl NewUser {
    /// Checks the required fields and the e-mail shape.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` listing every offending field.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut problems = Vec::new();
        if self.nickname.trim().is_empty() {
            problems.push("nickname is required");
        }
        if self.email.trim().is_empty() {
            problems.push("email is required");
        } else if !is_valid_email(self.email.trim()) {
            problems.push("email is not a valid address");
        }
        if self.password.is_empty() {
            problems.push("password is required");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(problems.join(", ")))
        }
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("country", &self.country)
            .finish()
    }
}

/// Partial-update document: the payload of an `UPDATED` event.
///
/// A field that is present and non-empty replaces the matching attribute;
/// an absent or empty field leaves it untouched.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    /// Replacement nickname.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Replacement e-mail.
    #[serde(default)]
    pub email: Option<String>,
    /// Replacement plaintext password.
    #[serde(default)]
    pub password: Option<String>,
    /// Replacement given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Replacement family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Replacement country.
    #[serde(default)]
    pub country: Option<String>,
}

fn present(field: Option<&String>) -> Option<&str> {
    field.map(String::as_str).filter(|value| !value.is_empty())
}

impl UserPatch {
    /// The new plaintext password, if one was supplied.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        present(self.password.as_ref())
    }

    /// The replacement nickname, if one was supplied.
    #[must_use]
    pub fn nickname(&self) -> Option<&str> {
        present(self.nickname.as_ref()).map(str::trim)
    }

    /// The replacement e-mail, if one was supplied.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        present(self.email.as_ref()).map(str::trim)
    }

    /// Checks the shape of the supplied fields.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a supplied e-mail is malformed or a
    /// supplied nickname is blank.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(email) = self.email() {
            if !is_valid_email(email) {
                return Err(DomainError::Validation("email is not a valid address".into()));
            }
        }
        if self.nickname().is_some_and(str::is_empty) {
            return Err(DomainError::Validation("nickname must not be blank".into()));
        }
        Ok(())
    }

    /// Copies every supplied non-password field onto `user`, field for field.
    pub fn merge_into(&self, user: &mut User) {
        if let Some(nickname) = self.nickname() {
            nickname.clone_into(&mut user.nickname);
        }
        if let Some(email) = self.email() {
            email.clone_into(&mut user.email);
        }
        if let Some(first_name) = present(self.first_name.as_ref()) {
            first_name.clone_into(&mut user.first_name);
        }
        if let Some(last_name) = present(self.last_name.as_ref()) {
            last_name.clone_into(&mut user.last_name);
        }
        if let Some(country) = present(self.country.as_ref()) {
            country.clone_into(&mut user.country);
        }
    }
}

impl fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPatch")
            .field("nickname", &self.nickname)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("country", &self.country)
            .finish()
    }
}

/// Public view of a user; never carries the password or its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    /// User id.
    pub id: Uuid,
    /// Nickname.
    pub nickname: String,
    /// E-mail.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Country.
    pub country: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            country: user.country.clone(),
        }
    }
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            nickname: user.nickname,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            country: user.country,
        }
    }
}
