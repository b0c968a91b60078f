//! Read-side queries over a [`PermissionsState`] snapshot.
//!
//! Selectors are pure and never fail. "Not ready" (no memberships, or no
//! membership for the requested tenant) is reported as `None` or as a
//! denial, never as a full grant.

use std::sync::{Arc, Mutex, PoisonError};

use fleetgate_types::{Membership, TenantSlug, normalize};
use tracing::debug;

use crate::attributes::{AttributeDecision, resolve_allowed_attributes};
use crate::flat::FlatPermissions;
use crate::modules::EffectiveModule;
use crate::registry::AttributeSchemaRegistry;
use crate::sieve_cache::SieveCache;
use crate::state::PermissionsState;

/// Default number of memoized resolutions kept by [`AttributeSelector`].
pub const DEFAULT_SELECTOR_CAPACITY: usize = 256;

/// Finds the active membership for `slug` in a membership list.
pub(crate) fn find_membership<'a>(
    memberships: &'a [Membership],
    slug: &TenantSlug,
) -> Option<&'a Membership> {
    if slug.is_blank() {
        return None;
    }
    memberships
        .iter()
        .find(|m| m.active && m.tenant.slug.as_str().trim() == slug.as_str().trim())
}

/// Membership for `tenant_slug`, provided it is the tenant currently loaded.
///
/// Asking for any other tenant yields `None`: the snapshot holds no data for
/// it, even if the raw membership list happens to mention it.
pub fn select_membership_for_tenant<'a>(
    state: &'a PermissionsState,
    tenant_slug: &str,
) -> Option<&'a Membership> {
    let loaded = state.tenant_slug_loaded()?;
    if loaded.as_str().trim() != tenant_slug.trim() {
        return None;
    }
    find_membership(state.memberships.as_deref()?, loaded)
}

/// Membership for the currently loaded tenant.
pub fn select_current_membership(state: &PermissionsState) -> Option<&Membership> {
    let loaded = state.tenant_slug_loaded()?;
    find_membership(state.memberships.as_deref()?, loaded)
}

pub fn select_flat_permissions(state: &PermissionsState) -> &FlatPermissions {
    &state.flat_permissions
}

/// Returns whether the user holds `"subject:action"` (case-insensitive).
///
/// # Examples
///
/// ```
/// use fleetgate_rbac::{PermissionsState, has_permission};
///
/// let state = PermissionsState::new();
/// assert!(!has_permission(&state, "vehicle:stats"));
/// ```
pub fn has_permission(state: &PermissionsState, permission: &str) -> bool {
    state.flat_permissions.contains(permission)
}

/// Returns whether the user holds at least one of `permissions`.
pub fn has_any_permission<I, S>(state: &PermissionsState, permissions: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    permissions
        .into_iter()
        .any(|p| has_permission(state, p.as_ref()))
}

/// Returns whether the user holds every one of `permissions`.
///
/// An empty list is vacuously satisfied.
pub fn has_all_permissions<I, S>(state: &PermissionsState, permissions: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    permissions
        .into_iter()
        .all(|p| has_permission(state, p.as_ref()))
}

pub fn select_effective_modules(state: &PermissionsState) -> &[EffectiveModule] {
    &state.effective_modules
}

/// Returns whether the loaded tenant has module `key` licensed and active.
pub fn is_module_licensed(state: &PermissionsState, key: &str) -> bool {
    state.tenant_modules.is_active(key)
}

/// Returns whether module `key` is licensed and the user can act in it.
pub fn can_access_module(state: &PermissionsState, key: &str) -> bool {
    let key = normalize(key);
    is_module_licensed(state, &key)
        && state
            .effective_modules
            .iter()
            .any(|m| m.app_module_key == key)
}

/// Resolves allowed attributes with the rule that produced them.
///
/// `None` while not ready: blank or absent `tenant_slug`, memberships not
/// loaded, or no membership for the tenant.
pub fn select_attribute_decision(
    state: &PermissionsState,
    registry: &AttributeSchemaRegistry,
    tenant_slug: Option<&str>,
    subject: &str,
    action: &str,
) -> Option<AttributeDecision> {
    let tenant_slug = tenant_slug.map(str::trim).filter(|s| !s.is_empty())?;
    let membership = select_membership_for_tenant(state, tenant_slug)?;
    Some(resolve_allowed_attributes(
        membership, registry, subject, action,
    ))
}

/// Allowed attributes for `(subject, action)` in `tenant_slug`.
///
/// `None` means "not ready"; `Some(vec![])` means "ready, nothing allowed".
pub fn select_allowed_attributes(
    state: &PermissionsState,
    registry: &AttributeSchemaRegistry,
    tenant_slug: Option<&str>,
    subject: &str,
    action: &str,
) -> Option<Vec<String>> {
    select_attribute_decision(state, registry, tenant_slug, subject, action)
        .map(|decision| decision.attributes)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    tenant_slug: String,
    subject: String,
    action: String,
}

#[derive(Debug)]
struct Memo {
    version: u64,
    entries: SieveCache<MemoKey, Option<AttributeDecision>>,
}

/// Memoized [`select_attribute_decision`] bound to one registry.
///
/// Results are cached per snapshot version; the first lookup against a new
/// snapshot drops every entry computed for the previous one.
#[derive(Debug)]
pub struct AttributeSelector {
    registry: Arc<AttributeSchemaRegistry>,
    memo: Mutex<Memo>,
}

impl AttributeSelector {
    pub fn new(registry: Arc<AttributeSchemaRegistry>) -> Self {
        Self::with_capacity(registry, DEFAULT_SELECTOR_CAPACITY)
    }

    pub fn with_capacity(registry: Arc<AttributeSchemaRegistry>, capacity: usize) -> Self {
        Self {
            registry,
            memo: Mutex::new(Memo {
                version: 0,
                entries: SieveCache::new(capacity),
            }),
        }
    }

    pub fn registry(&self) -> &AttributeSchemaRegistry {
        &self.registry
    }

    /// Memoized [`select_attribute_decision`].
    pub fn decision(
        &self,
        state: &PermissionsState,
        tenant_slug: Option<&str>,
        subject: &str,
        action: &str,
    ) -> Option<AttributeDecision> {
        let key = MemoKey {
            tenant_slug: tenant_slug.map(str::trim).unwrap_or_default().to_string(),
            subject: normalize(subject),
            action: normalize(action),
        };

        // A panic while holding the lock cannot leave a half-written entry.
        let mut memo = self.memo.lock().unwrap_or_else(PoisonError::into_inner);
        if memo.version != state.version() {
            debug!(
                previous = memo.version,
                current = state.version(),
                cached = memo.entries.len(),
                "Attribute memo invalidated"
            );
            memo.entries.clear();
            memo.version = state.version();
        }

        if let Some(hit) = memo.entries.get(&key) {
            return hit.clone();
        }

        let decision =
            select_attribute_decision(state, &self.registry, tenant_slug, subject, action);
        memo.entries.insert(key, decision.clone());
        decision
    }

    /// Memoized [`select_allowed_attributes`].
    pub fn allowed_attributes(
        &self,
        state: &PermissionsState,
        tenant_slug: Option<&str>,
        subject: &str,
        action: &str,
    ) -> Option<Vec<String>> {
        self.decision(state, tenant_slug, subject, action)
            .map(|decision| decision.attributes)
    }

    /// Number of memoized entries for the current snapshot.
    pub fn cached(&self) -> usize {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}
