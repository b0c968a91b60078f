//! Attribute-level resolution.
//!
//! Several roles may carry a fine-grained grant for the same
//! `(subject, action)`. Their lists are merged into one allowed-attribute
//! list:
//!
//! 1. **Whitelist precedence**: if any matching grant has a non-empty allow
//!    list, the result is the union of all non-empty allow lists. Deny lists
//!    are ignored entirely.
//! 2. **Blacklist fallback**: otherwise, if any grant has a non-empty deny
//!    list, the result is the registry list minus the union of deny lists.
//! 3. **Unrestricted**: otherwise the full registry list.
//!
//! When no role carries a matching fine-grained grant at all, the coarse
//! grant alone decides and the full registry list is returned.
//!
//! Attribute names are compared after trimming, case-sensitively.

use std::collections::HashSet;

use fleetgate_types::{Grant, GrantKey, Membership, TenantPermission};
use serde::{Deserialize, Serialize};

use crate::registry::AttributeSchemaRegistry;

/// Which merge rule produced an [`AttributeDecision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeRule {
    /// No fine-grained grant matched; the full registry list applies.
    NoFineGrainedGrant,
    /// Fine-grained grants matched but none restricts anything.
    Unrestricted,
    /// Union of allow lists.
    Whitelist,
    /// Registry list minus union of deny lists.
    Blacklist,
}

impl AttributeRule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoFineGrainedGrant => "no_fine_grained_grant",
            Self::Unrestricted => "unrestricted",
            Self::Whitelist => "whitelist",
            Self::Blacklist => "blacklist",
        }
    }
}

impl std::fmt::Display for AttributeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of merging the grants for one `(subject, action)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDecision {
    pub rule: AttributeRule,
    pub attributes: Vec<String>,
}

impl AttributeDecision {
    fn new(rule: AttributeRule, attributes: Vec<String>) -> Self {
        Self { rule, attributes }
    }

    /// Returns whether `attribute` is in the allowed list.
    pub fn allows(&self, attribute: &str) -> bool {
        let attribute = attribute.trim();
        self.attributes.iter().any(|a| a == attribute)
    }
}

/// Merges matching fine-grained grants against the subject's full list.
///
/// `grants` must already be filtered to the `(subject, action)` in question.
/// An empty slice means "no fine-grained grant".
///
/// # Examples
///
/// ```
/// use fleetgate_rbac::{AttributeRule, merge_attribute_grants};
/// use fleetgate_types::TenantPermission;
///
/// let full = ["plate".to_string(), "model_year".to_string(), "status".to_string()];
/// let a = TenantPermission::new("vehicle", "read").allow(["plate"]);
/// let b = TenantPermission::new("vehicle", "read").deny(["status"]);
///
/// let decision = merge_attribute_grants(&[&a, &b], &full);
/// assert_eq!(decision.rule, AttributeRule::Whitelist);
/// assert_eq!(decision.attributes, ["plate"]);
/// ```
pub fn merge_attribute_grants(grants: &[&TenantPermission], full: &[String]) -> AttributeDecision {
    if grants.is_empty() {
        return AttributeDecision::new(AttributeRule::NoFineGrainedGrant, full.to_vec());
    }

    if grants.iter().any(|g| g.has_allow_list()) {
        let mut seen = HashSet::new();
        let union = grants
            .iter()
            .flat_map(|g| g.allowed())
            .filter(|a| seen.insert(*a))
            .map(str::to_string)
            .collect();
        return AttributeDecision::new(AttributeRule::Whitelist, union);
    }

    if grants.iter().any(|g| g.has_deny_list()) {
        let denied: HashSet<&str> = grants.iter().flat_map(|g| g.denied()).collect();
        let remaining = full
            .iter()
            .filter(|a| !denied.contains(a.trim()))
            .cloned()
            .collect();
        return AttributeDecision::new(AttributeRule::Blacklist, remaining);
    }

    AttributeDecision::new(AttributeRule::Unrestricted, full.to_vec())
}

/// Resolves the allowed attributes for `(subject, action)` within one membership.
///
/// Subject and action are matched case-insensitively. A blank subject or
/// action matches no grant, so the registry list for `subject` is returned.
pub fn resolve_allowed_attributes(
    membership: &Membership,
    registry: &AttributeSchemaRegistry,
    subject: &str,
    action: &str,
) -> AttributeDecision {
    let full = registry.full_attributes(subject);

    let Some(key) = GrantKey::new(subject, action) else {
        return AttributeDecision::new(AttributeRule::NoFineGrainedGrant, full.to_vec());
    };

    let matching: Vec<&TenantPermission> = membership
        .tenant_permissions()
        .filter(|g| g.matches(&key))
        .collect();

    merge_attribute_grants(&matching, full)
}
