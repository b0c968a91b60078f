//! # fleetgate-rbac: Attribute-Level Permission Resolution
//!
//! Turns a role-based membership payload into the answers a fleet dashboard
//! needs before it renders anything:
//! - **Flat permissions**: "can the user do `vehicle:stats` at all"
//! - **Effective modules**: which licensed modules the user can act in
//! - **Allowed attributes**: which fields of a subject the user may read
//! - **Visible columns**: which table columns to render
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Membership payload (per tenant)             │
//! └─────────────────┬───────────────────────────┘
//!                   │ PermissionsState::reduce
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  PermissionsState (immutable snapshot)       │
//! │  ├─ FlatPermissions                          │
//! │  ├─ EffectiveModules                         │
//! │  └─ TenantModules                            │
//! └─────────────────┬───────────────────────────┘
//!                   │ selectors + AttributeSchemaRegistry
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Allowed attributes ─► ColumnResolver        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Merge rules
//!
//! | Matching fine-grained grants         | Result                           |
//! |--------------------------------------|----------------------------------|
//! | none                                 | full registry list               |
//! | any non-empty allow list             | union of allow lists             |
//! | no allow list, some deny list        | registry list minus denied       |
//! | all lists empty                      | full registry list               |
//!
//! ## Example
//!
//! ```
//! use fleetgate_rbac::{
//!     AttributeSchemaRegistry, PermissionsAction, PermissionsState, RequestId,
//!     has_permission, select_allowed_attributes,
//! };
//! use fleetgate_types::{Membership, Role, Tenant, TenantPermission, TenantSlug};
//!
//! let registry = AttributeSchemaRegistry::new()
//!     .with_subject("vehicle", ["plate", "model_year", "status"]);
//!
//! let membership = Membership::new(1, Tenant::new(1, "acme")).with_role(
//!     Role::new(1, "dispatcher")
//!         .with_tenant_permission(TenantPermission::new("vehicle", "read").deny(["status"])),
//! );
//!
//! let request_id = RequestId::new(1);
//! let state = PermissionsState::new()
//!     .reduce(PermissionsAction::FetchStarted {
//!         request_id,
//!         tenant_slug: TenantSlug::new("acme"),
//!     })
//!     .and_then(|s| {
//!         s.reduce(PermissionsAction::FetchSucceeded {
//!             request_id,
//!             memberships: vec![membership],
//!         })
//!     })
//!     .unwrap();
//!
//! assert!(has_permission(&state, "Vehicle:Read"));
//! assert_eq!(
//!     select_allowed_attributes(&state, &registry, Some("acme"), "vehicle", "read"),
//!     Some(vec!["plate".to_string(), "model_year".to_string()]),
//! );
//! assert_eq!(
//!     select_allowed_attributes(&state, &registry, Some("globex"), "vehicle", "read"),
//!     None,
//! );
//! ```

pub mod attributes;
pub mod columns;
pub mod flat;
pub mod modules;
pub mod registry;
pub mod selectors;
pub mod state;

mod sieve_cache;

pub use attributes::{
    AttributeDecision, AttributeRule, merge_attribute_grants, resolve_allowed_attributes,
};
pub use columns::{
    ColumnDef, ColumnPreferenceKey, ColumnResolution, ColumnResolver, ColumnSelection,
    sanitize_selection,
};
pub use flat::{FlatPermissions, derive_flat_permissions};
pub use modules::{EffectiveModule, TenantModules, build_effective_modules};
pub use registry::AttributeSchemaRegistry;
pub use selectors::{
    AttributeSelector, DEFAULT_SELECTOR_CAPACITY, can_access_module, has_all_permissions,
    has_any_permission, has_permission, is_module_licensed, select_allowed_attributes,
    select_attribute_decision, select_current_membership, select_effective_modules,
    select_flat_permissions, select_membership_for_tenant,
};
pub use state::{PendingFetch, PermissionsAction, PermissionsState, RequestId};

#[cfg(test)]
mod tests;

// Kani proofs for bounded model checking
#[cfg(kani)]
mod kani_proofs;
