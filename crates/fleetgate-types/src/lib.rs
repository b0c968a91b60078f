//! # fleetgate-types: Core types for `Fleetgate`
//!
//! This crate contains the shared types used across the `Fleetgate` system:
//! - Entity IDs ([`TenantId`], [`MembershipId`], [`RoleId`], [`AppModuleId`])
//! - Tenant addressing ([`TenantSlug`])
//! - Grant keys ([`GrantKey`]), the `subject:action` join key between coarse
//!   and fine-grained grants
//! - The membership payload delivered by the backend ([`Membership`],
//!   [`Role`], [`Permission`], [`TenantPermission`], [`Tenant`])
//! - The structured fetch error ([`FetchError`], [`ErrorCode`])

use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub mod error;
pub mod lenient;
pub mod membership;

pub use error::{ErrorCode, FetchError};
pub use membership::{
    AppModule, Grant, Membership, Permission, Role, Tenant, TenantModule, TenantPermission,
    decode_memberships,
};

// ============================================================================
// Entity IDs - All Copy (cheap 8-byte values)
// ============================================================================

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub fn new(id: u64) -> Self {
                Self(id)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

numeric_id!(
    /// Unique identifier for a tenant (fleet operator / customer).
    TenantId
);

numeric_id!(
    /// Unique identifier for a person's membership in one tenant.
    MembershipId
);

numeric_id!(
    /// Unique identifier for a role.
    RoleId
);

numeric_id!(
    /// Unique identifier for an application module (a licensable feature).
    AppModuleId
);

// ============================================================================
// TenantSlug - Clone (heap-allocated string)
// ============================================================================

/// URL-safe tenant handle used to select the active membership.
///
/// Slugs are compared exactly; the backend owns their normalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TenantSlug(String);

impl TenantSlug {
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for an empty or whitespace-only slug.
    ///
    /// A blank slug never selects a membership.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for TenantSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TenantSlug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for TenantSlug {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TenantSlug {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<TenantSlug> for String {
    fn from(slug: TenantSlug) -> Self {
        slug.0
    }
}

// ============================================================================
// GrantKey - Clone (normalized subject:action pair)
// ============================================================================

/// Normalized `subject:action` key.
///
/// Both halves are trimmed and lower-cased on construction, so two keys built
/// from `"Vehicle"`/`"READ"` and `"vehicle"`/`"read"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GrantKey {
    subject: String,
    action: String,
}

impl GrantKey {
    /// Builds a key from raw subject and action strings.
    ///
    /// Returns `None` if either half is blank after trimming.
    pub fn new(subject: &str, action: &str) -> Option<Self> {
        let subject = normalize(subject);
        let action = normalize(action);
        if subject.is_empty() || action.is_empty() {
            return None;
        }
        Some(Self { subject, action })
    }

    /// Parses a `"subject:action"` string.
    ///
    /// The split happens on the first `:`. Returns `None` when the separator
    /// is missing or either half is blank.
    ///
    /// # Examples
    ///
    /// ```
    /// # use fleetgate_types::GrantKey;
    /// let key = GrantKey::parse("Vehicle:Stats").unwrap();
    /// assert_eq!(key.subject(), "vehicle");
    /// assert_eq!(key.action(), "stats");
    /// assert_eq!(key.to_string(), "vehicle:stats");
    ///
    /// assert!(GrantKey::parse("vehicle").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let (subject, action) = raw.split_once(':')?;
        Self::new(subject, action)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn action(&self) -> &str {
        &self.action
    }
}

impl Display for GrantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.subject, self.action)
    }
}

/// Trims and lower-cases a subject, action or module key.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}
