//! Kani bounded model checking proofs for attribute resolution.
//!
//! - Proof #1: Whitelist precedence - any allow list overrides every deny list
//! - Proof #2: Blacklist subset - blacklist results never exceed the registry list
//! - Proof #3: Not-ready never grants - an unloaded snapshot resolves to `None`

use crate::{
    attributes::{AttributeRule, merge_attribute_grants},
    registry::AttributeSchemaRegistry,
    selectors::select_allowed_attributes,
    state::PermissionsState,
};
use fleetgate_types::TenantPermission;

fn attribute(index: u8) -> String {
    match index % 3 {
        0 => "plate".to_string(),
        1 => "model_year".to_string(),
        _ => "status".to_string(),
    }
}

fn full() -> Vec<String> {
    (0..3).map(attribute).collect()
}

//=============================================================================
// Proof #1: Whitelist Precedence
//=============================================================================

/// **Property**: when one grant carries a non-empty allow list, the result is
/// exactly the allow list, whatever the other grant denies.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(6)]
fn verify_whitelist_precedence() {
    let allowed = attribute(kani::any());
    let denied = attribute(kani::any());

    let a = TenantPermission::new("vehicle", "read").allow([allowed.clone()]);
    let b = TenantPermission::new("vehicle", "read").deny([denied]);

    let decision = merge_attribute_grants(&[&a, &b], &full());

    assert_eq!(decision.rule, AttributeRule::Whitelist);
    assert_eq!(decision.attributes, vec![allowed]);
}

//=============================================================================
// Proof #2: Blacklist Subset
//=============================================================================

/// **Property**: a blacklist never adds attributes and always removes the
/// denied one.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(6)]
fn verify_blacklist_subset() {
    let denied = attribute(kani::any());
    let grant = TenantPermission::new("vehicle", "read").deny([denied.clone()]);
    let full = full();

    let decision = merge_attribute_grants(&[&grant], &full);

    assert_eq!(decision.rule, AttributeRule::Blacklist);
    assert!(decision.attributes.len() < full.len());
    assert!(!decision.attributes.contains(&denied));
    assert!(decision.attributes.iter().all(|a| full.contains(a)));
}

//=============================================================================
// Proof #3: Not-Ready Never Grants
//=============================================================================

/// **Property**: an empty snapshot never yields an attribute list.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_not_ready_never_grants() {
    let state = PermissionsState::new();
    let registry = AttributeSchemaRegistry::new().with_subject("vehicle", full());

    let resolved = select_allowed_attributes(&state, &registry, Some("acme"), "vehicle", "read");

    assert!(resolved.is_none());
}
