//! Flat `subject:action` capabilities.
//!
//! The coarse gate answers "can the user do X at all", independent of which
//! role granted it. Both grant kinds contribute: a fine-grained grant on
//! `(vehicle, read)` implies the coarse `vehicle:read` capability.

use std::collections::BTreeSet;

use fleetgate_types::{Grant, GrantKey, Membership};
use serde::{Deserialize, Serialize};

/// Deduplicated, case-normalized set of `subject:action` capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatPermissions(BTreeSet<GrantKey>);

impl FlatPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a `"subject:action"` string, case-insensitively.
    ///
    /// Malformed input (no `:` or a blank half) is never granted.
    pub fn contains(&self, permission: &str) -> bool {
        GrantKey::parse(permission).is_some_and(|key| self.0.contains(&key))
    }

    /// Checks an already-normalized key.
    pub fn contains_key(&self, key: &GrantKey) -> bool {
        self.0.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GrantKey> {
        self.0.iter()
    }

    /// Sorted `"subject:action"` strings.
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<GrantKey> for FlatPermissions {
    fn from_iter<T: IntoIterator<Item = GrantKey>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Reduces a tenant's membership to its flat capability set.
///
/// `None` (no membership for the tenant) yields an empty set. Grants with a
/// missing or blank subject/action are skipped.
pub fn derive_flat_permissions(membership: Option<&Membership>) -> FlatPermissions {
    let Some(membership) = membership else {
        return FlatPermissions::new();
    };

    let coarse = membership.permissions().filter_map(Grant::grant_key);
    let fine = membership.tenant_permissions().filter_map(Grant::grant_key);

    coarse.chain(fine).collect()
}
