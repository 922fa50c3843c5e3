use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use innkeep_core::{AuditFields, DomainError, DomainResult, Entity, GuestId};

const MAX_AGE: u32 = 150;

/// Normalized (trimmed, lowercased) email address.
///
/// Guest email uniqueness is checked on this form, so `A@x.io` and `a@x.io`
/// collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let value = raw.trim().to_lowercase();
        if value.is_empty() {
            return Err(DomainError::validation("email cannot be empty"));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::validation("email must contain '@'"));
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(DomainError::validation("email is malformed"));
        }
        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(DomainError::validation("email domain is malformed"));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("email cannot contain whitespace"));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Guest registration input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGuest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub age: u32,
}

impl NewGuest {
    pub fn validate(&self) -> DomainResult<()> {
        if self.first_name.trim().is_empty() {
            return Err(DomainError::validation("first_name cannot be empty"));
        }
        if self.last_name.trim().is_empty() {
            return Err(DomainError::validation("last_name cannot be empty"));
        }
        Email::parse(&self.email)?;
        if self.age == 0 || self.age > MAX_AGE {
            return Err(DomainError::validation(format!(
                "age must be between 1 and {MAX_AGE}"
            )));
        }
        Ok(())
    }
}

/// A guest profile. Referenced by reservations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    #[serde(rename = "uuid")]
    pub id: GuestId,
    #[serde(flatten)]
    pub audit: AuditFields,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub age: u32,
}

impl Guest {
    /// Materialize a validated registration with store-assigned identity.
    pub fn register(id: GuestId, input: NewGuest, now: DateTime<Utc>) -> DomainResult<Self> {
        input.validate()?;
        let email = Email::parse(&input.email)?;
        Ok(Self {
            id,
            audit: AuditFields::new(now),
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email,
            age: input.age,
        })
    }
}

impl Entity for Guest {
    type Id = GuestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewGuest {
        NewGuest {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "Ada@Example.com".to_string(),
            age: 36,
        }
    }

    #[test]
    fn register_normalizes_email_and_names() {
        let mut raw = input();
        raw.first_name = "  Ada ".to_string();
        let guest = Guest::register(GuestId::new(), raw, Utc::now()).unwrap();
        assert_eq!(guest.first_name, "Ada");
        assert_eq!(guest.email.as_str(), "ada@example.com");
        assert!(guest.is_live());
    }

    #[test]
    fn rejects_blank_names() {
        let mut raw = input();
        raw.last_name = "   ".to_string();
        let err = raw.validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("last_name")));
    }

    #[test]
    fn rejects_out_of_range_age() {
        let mut raw = input();
        raw.age = 0;
        assert!(raw.validate().is_err());
        raw.age = 151;
        assert!(raw.validate().is_err());
    }

    #[test]
    fn email_parsing() {
        assert!(Email::parse("a@b.co").is_ok());
        assert!(Email::parse("").is_err());
        assert!(Email::parse("nobody").is_err());
        assert!(Email::parse("@b.co").is_err());
        assert!(Email::parse("a@b").is_err());
        assert!(Email::parse("a@@b.co").is_err());
        assert!(Email::parse("a b@c.io").is_err());
    }

    #[test]
    fn serializes_with_uuid_and_flat_audit_columns() {
        let guest = Guest::register(GuestId::new(), input(), Utc::now()).unwrap();
        let json = serde_json::to_value(&guest).unwrap();
        assert_eq!(json["uuid"], guest.id.to_string());
        assert_eq!(json["active"], true);
        assert!(json["deleted_at"].is_null());
        assert_eq!(json["email"], "ada@example.com");

        let back: Guest = serde_json::from_value(json).unwrap();
        assert_eq!(back, guest);
    }
}
