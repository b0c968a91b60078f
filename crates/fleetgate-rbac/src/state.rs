//! Permission snapshot and its transitions.
//!
//! [`PermissionsState`] is immutable once built. Every change goes through
//! [`PermissionsState::reduce`], which returns a brand new snapshot (with a
//! new version) or `None` when the action does not apply. Derived data is
//! always recomputed from the memberships, never patched.
//!
//! ```text
//!            FetchStarted(T)             FetchSucceeded(id)
//!   idle ──────────────────► loading ────────────────────► ready(T)
//!     ▲                        │  │
//!     │        Cleared         │  └── FetchFailed(id) ───► failed (fail closed)
//!     └────────────────────────┘
//! ```
//!
//! Responses carry the [`RequestId`] of the fetch that produced them. A
//! response whose id is not the pending one is stale and is discarded.

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fleetgate_types::{FetchError, Membership, TenantSlug};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::flat::{FlatPermissions, derive_flat_permissions};
use crate::modules::{EffectiveModule, TenantModules, build_effective_modules};
use crate::selectors::find_membership;

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Identifier of one membership fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// The fetch whose response the state is waiting for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingFetch {
    pub request_id: RequestId,
    pub tenant_slug: TenantSlug,
}

/// Inputs to [`PermissionsState::reduce`].
#[derive(Debug, Clone)]
pub enum PermissionsAction {
    /// A fetch for `tenant_slug` was issued. Supersedes any pending fetch.
    FetchStarted {
        request_id: RequestId,
        tenant_slug: TenantSlug,
    },
    /// The fetch identified by `request_id` returned memberships.
    FetchSucceeded {
        request_id: RequestId,
        memberships: Vec<Membership>,
    },
    /// The fetch identified by `request_id` failed.
    FetchFailed {
        request_id: RequestId,
        error: FetchError,
    },
    /// Logout or explicit reset.
    Cleared,
}

/// Immutable permission snapshot.
#[derive(Debug, Clone)]
pub struct PermissionsState {
    version: u64,
    pub loading: bool,
    pub error: Option<FetchError>,
    /// `None` until a fetch succeeds.
    pub memberships: Option<Arc<Vec<Membership>>>,
    pub effective_modules: Vec<EffectiveModule>,
    pub flat_permissions: FlatPermissions,
    pub tenant_modules: TenantModules,
    pub pending: Option<PendingFetch>,
}

impl Default for PermissionsState {
    fn default() -> Self {
        Self {
            version: next_version(),
            loading: false,
            error: None,
            memberships: None,
            effective_modules: Vec::new(),
            flat_permissions: FlatPermissions::new(),
            tenant_modules: TenantModules::default(),
            pending: None,
        }
    }
}

impl PermissionsState {
    /// Creates an empty, idle snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-unique, increasing snapshot version.
    ///
    /// Two snapshots with the same version hold the same data; memoized
    /// selectors key on it.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Tenant whose memberships are loaded (or being loaded).
    pub fn tenant_slug_loaded(&self) -> Option<&TenantSlug> {
        self.tenant_modules.tenant_slug_loaded.as_ref()
    }

    /// Returns whether memberships have been loaded for some tenant.
    pub fn is_loaded(&self) -> bool {
        self.memberships.is_some()
    }

    /// Applies `action`, returning the next snapshot.
    ///
    /// Returns `None` when the action is a stale response (its request id is
    /// not the pending one); the caller keeps the current snapshot.
    #[must_use]
    pub fn reduce(&self, action: PermissionsAction) -> Option<Self> {
        match action {
            PermissionsAction::FetchStarted {
                request_id,
                tenant_slug,
            } => Some(self.fetch_started(request_id, tenant_slug)),
            PermissionsAction::FetchSucceeded {
                request_id,
                memberships,
            } => {
                let pending = self.take_pending(request_id)?;
                Some(Self::loaded(pending, memberships))
            }
            PermissionsAction::FetchFailed { request_id, error } => {
                let pending = self.take_pending(request_id)?;
                warn!(
                    tenant = %pending.tenant_slug,
                    request = %request_id,
                    code = %error.code,
                    detail = %error.detail,
                    "Membership fetch failed; permissions cleared"
                );
                Some(Self {
                    error: Some(error),
                    ..Self::default()
                })
            }
            PermissionsAction::Cleared => {
                info!(
                    tenant = ?self.tenant_slug_loaded().map(TenantSlug::as_str),
                    "Permissions cleared"
                );
                Some(Self::default())
            }
        }
    }

    fn fetch_started(&self, request_id: RequestId, tenant_slug: TenantSlug) -> Self {
        if let Some(previous) = &self.pending {
            debug!(
                superseded = %previous.request_id,
                request = %request_id,
                "Pending membership fetch superseded"
            );
        }

        let pending = Some(PendingFetch {
            request_id,
            tenant_slug: tenant_slug.clone(),
        });

        // Refreshing the same tenant keeps serving the current data.
        if self.tenant_slug_loaded() == Some(&tenant_slug) {
            return Self {
                version: next_version(),
                loading: true,
                error: None,
                pending,
                ..self.clone()
            };
        }

        info!(
            from = ?self.tenant_slug_loaded().map(TenantSlug::as_str),
            to = %tenant_slug,
            request = %request_id,
            "Switching tenant; derived permissions reset"
        );
        Self {
            loading: true,
            tenant_modules: TenantModules {
                tenant_slug_loaded: Some(tenant_slug),
                ..TenantModules::default()
            },
            pending,
            ..Self::default()
        }
    }

    fn take_pending(&self, request_id: RequestId) -> Option<PendingFetch> {
        match &self.pending {
            Some(pending) if pending.request_id == request_id => Some(pending.clone()),
            _ => {
                debug!(
                    request = %request_id,
                    pending = ?self.pending.as_ref().map(|p| p.request_id),
                    "Discarding stale membership response"
                );
                None
            }
        }
    }

    fn loaded(pending: PendingFetch, memberships: Vec<Membership>) -> Self {
        let slug = pending.tenant_slug;
        let membership = find_membership(&memberships, &slug);

        let flat_permissions = derive_flat_permissions(membership);
        let effective_modules = build_effective_modules(membership);
        let tenant_modules = TenantModules::from_membership(slug.clone(), membership);

        info!(
            tenant = %slug,
            request = %pending.request_id,
            memberships = memberships.len(),
            matched = membership.is_some(),
            permissions = flat_permissions.len(),
            modules = effective_modules.len(),
            "Permissions loaded"
        );

        Self {
            memberships: Some(Arc::new(memberships)),
            effective_modules,
            flat_permissions,
            tenant_modules,
            ..Self::default()
        }
    }
}
