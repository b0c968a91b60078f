//! # Fleetgate
//!
//! Attribute-level permission resolution for multi-tenant fleet dashboards.
//!
//! Fleetgate turns the role-based membership payload delivered by the
//! backend into immutable permission snapshots:
//!
//! - **Fail closed** - not loaded, failed, or switched tenant means no access
//! - **Latest wins** - a superseded fetch never applies its response
//! - **Whole snapshots** - readers see one consistent [`PermissionsState`]
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Fleetgate                           │
//! │  ┌────────────┐   ┌──────────────┐   ┌──────────────────────┐ │
//! │  │  Fetcher   │ → │    Store     │ → │ Selectors / Columns  │ │
//! │  │  (async)   │   │ (reducer +   │   │ (pure, memoized)     │ │
//! │  │            │   │  watch chan) │   │                      │ │
//! │  └────────────┘   └──────────────┘   └──────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use fleetgate::{FileMembershipFetcher, PermissionsStore, has_permission};
//!
//! # async fn run() -> Result<(), fleetgate::StoreError> {
//! let store = PermissionsStore::new(FileMembershipFetcher::new("memberships.json"));
//!
//! let state = store.load_tenant("acme").await?;
//! if has_permission(&state, "vehicle:stats") {
//!     // show the stats page
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - **Store**: [`PermissionsStore`], [`MembershipFetcher`] - async boundary
//! - **Resolution**: re-exported from `fleetgate-rbac`
//! - **Wiring**: [`PermissionedTable`], [`registry_from_config`] - config to resolvers

mod error;
mod fetcher;
mod store;
mod tables;

pub use error::{Result, StoreError};
pub use fetcher::{FileMembershipFetcher, MembershipFetcher, StaticMembershipFetcher};
pub use store::{DEFAULT_FETCH_TIMEOUT, PermissionsStore};
pub use tables::{PermissionedTable, registry_from_config, selector_from_config};

// Re-export payload types
pub use fleetgate_types::{
    AppModule, ErrorCode, FetchError, Membership, Permission, Role, Tenant, TenantModule,
    TenantPermission, TenantSlug, decode_memberships,
};

// Re-export resolution
pub use fleetgate_rbac::{
    AttributeDecision, AttributeRule, AttributeSchemaRegistry, AttributeSelector, ColumnDef,
    ColumnPreferenceKey, ColumnResolution, ColumnResolver, ColumnSelection, EffectiveModule,
    FlatPermissions, PermissionsAction, PermissionsState, RequestId, TenantModules,
    can_access_module, has_all_permissions, has_any_permission, has_permission,
    is_module_licensed, sanitize_selection, select_allowed_attributes, select_attribute_decision,
    select_current_membership, select_effective_modules, select_flat_permissions,
};

// Re-export configuration
pub use fleetgate_config::{ConfigLoader, FleetgateConfig};
