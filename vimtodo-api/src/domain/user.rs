use std::fmt;

use axum_login::AuthUser;
use serde::Serialize;

use super::{models::UserId, ValidationError};

pub const MAX_NAME_LENGTH: usize = 50;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 100;

#[derive(Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string. `None` for accounts created through OAuth.
    #[serde(skip)]
    pub password_hash: Option<String>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password_hash", &"[redacted]")
            .finish()
    }
}

impl AuthUser for User {
    type Id = i32;

    fn id(&self) -> Self::Id {
        self.id.as_i32()
    }

    // Changing the password invalidates existing sessions.
    fn session_auth_hash(&self) -> &[u8] {
        self.password_hash
            .as_deref()
            .unwrap_or(self.email.as_str())
            .as_bytes()
    }
}

/// A validated sign-up request. The password is still in clear text here and
/// gets hashed by the auth layer before it is stored.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .finish()
    }
}

impl Registration {
    pub fn parse(name: &str, email: &str, password: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::InvalidName(MAX_NAME_LENGTH));
        }

        let email = normalize_email(email).ok_or(ValidationError::InvalidEmail)?;

        let length = password.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
            return Err(ValidationError::PasswordLength {
                min: MIN_PASSWORD_LENGTH,
                max: MAX_PASSWORD_LENGTH,
            });
        }
        let has_lower = password.chars().any(|c| c.is_lowercase());
        let has_upper = password.chars().any(|c| c.is_uppercase());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if !(has_lower && has_upper && has_digit) {
            return Err(ValidationError::WeakPassword);
        }

        Ok(Self {
            name: name.to_string(),
            email,
            password: password.to_string(),
        })
    }
}

/// Lowercase and sanity-check an email address. Returns `None` when it is not
/// shaped like `local@domain`.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || email.contains(' ') {
        return None;
    }
    Some(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_normalizes_email() {
        let reg = Registration::parse(" Ada ", "Ada@Example.COM", "Secret123").unwrap();
        assert_eq!(reg.name, "Ada");
        assert_eq!(reg.email, "ada@example.com");
    }

    #[test]
    fn registration_rejects_bad_names() {
        assert_eq!(
            Registration::parse("  ", "a@b.c", "Secret123"),
            Err(ValidationError::InvalidName(MAX_NAME_LENGTH))
        );
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(
            Registration::parse(&long, "a@b.c", "Secret123"),
            Err(ValidationError::InvalidName(MAX_NAME_LENGTH))
        );
    }

    #[test]
    fn registration_rejects_bad_emails() {
        for email in ["", "nobody", "@example.com", "a@", "a@b@c", "a b@c.d"] {
            assert_eq!(
                Registration::parse("Ada", email, "Secret123"),
                Err(ValidationError::InvalidEmail),
                "{email}"
            );
        }
    }

    #[test]
    fn registration_enforces_password_policy() {
        assert!(matches!(
            Registration::parse("Ada", "a@b.c", "Ab1"),
            Err(ValidationError::PasswordLength { .. })
        ));
        assert_eq!(
            Registration::parse("Ada", "a@b.c", "alllowercase1"),
            Err(ValidationError::WeakPassword)
        );
        assert_eq!(
            Registration::parse("Ada", "a@b.c", "NoDigitsHere"),
            Err(ValidationError::WeakPassword)
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let user = User {
            id: UserId::from(1),
            email: "a@b.c".to_string(),
            name: "Ada".to_string(),
            password_hash: Some("$argon2id$secret".to_string()),
        };
        assert!(!format!("{user:?}").contains("secret"));

        let reg = Registration::parse("Ada", "a@b.c", "Secret123").unwrap();
        assert!(!format!("{reg:?}").contains("Secret123"));
    }
}
