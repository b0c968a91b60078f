//! Unit tests for fleetgate-rbac

use std::sync::Arc;

use fleetgate_types::{
    AppModule, FetchError, Membership, Permission, Role, Tenant, TenantModule, TenantPermission,
    TenantSlug,
};
use proptest::prelude::*;
use test_case::test_case;

use crate::*;

// ============================================================================
// Fixtures
// ============================================================================

fn registry() -> AttributeSchemaRegistry {
    AttributeSchemaRegistry::new()
        .with_subject("vehicle", ["plate", "model_year", "color", "status"])
        .with_subject("driver", ["name", "license", "phone"])
        .with_subject("trailer", Vec::<String>::new())
}

fn fleet() -> AppModule {
    AppModule::new("fleet", "Fleet")
}

fn membership(slug: &str, roles: Vec<Role>) -> Membership {
    let tenant = Tenant::new(1, slug).with_module(TenantModule::new(fleet(), true));
    roles
        .into_iter()
        .fold(Membership::new(1, tenant), Membership::with_role)
}

/// Runs a full start/succeed cycle for `slug`.
fn loaded(slug: &str, memberships: Vec<Membership>) -> PermissionsState {
    let request_id = RequestId::new(1);
    PermissionsState::new()
        .reduce(PermissionsAction::FetchStarted {
            request_id,
            tenant_slug: TenantSlug::new(slug),
        })
        .and_then(|s| {
            s.reduce(PermissionsAction::FetchSucceeded {
                request_id,
                memberships,
            })
        })
        .unwrap()
}

fn allowed(state: &PermissionsState, subject: &str, action: &str) -> Option<Vec<String>> {
    select_allowed_attributes(state, &registry(), Some("acme"), subject, action)
}

// ============================================================================
// Merge rules
// ============================================================================

#[test_case(
    vec![TenantPermission::new("vehicle", "read").allow(["plate"]),
         TenantPermission::new("vehicle", "read").deny(["status"])],
    &["plate"];
    "allow list beats deny list"
)]
#[test_case(
    vec![TenantPermission::new("vehicle", "read"),
         TenantPermission::new("vehicle", "read").deny(["status"])],
    &["plate", "model_year", "color"];
    "empty allow list falls back to deny list"
)]
#[test_case(
    vec![TenantPermission::new("vehicle", "read").deny(["status"]),
         TenantPermission::new("vehicle", "read").deny(["color", "plate"])],
    &["model_year"];
    "deny lists union"
)]
#[test_case(
    vec![TenantPermission::new("vehicle", "read").allow(["plate"]),
         TenantPermission::new("vehicle", "read").allow(["status", "plate"])],
    &["plate", "status"];
    "allow lists union"
)]
#[test_case(
    vec![TenantPermission::new("vehicle", "read")],
    &["plate", "model_year", "color", "status"];
    "empty lists do not restrict"
)]
#[test_case(
    vec![TenantPermission::new("vehicle", "update").allow(["plate"])],
    &["plate", "model_year", "color", "status"];
    "other action does not match"
)]
fn merge_rules(grants: Vec<TenantPermission>, expected: &[&str]) {
    let roles = grants
        .into_iter()
        .enumerate()
        .map(|(i, g)| Role::new(i as u64, format!("role-{i}")).with_tenant_permission(g))
        .collect();
    let state = loaded("acme", vec![membership("acme", roles)]);

    assert_eq!(allowed(&state, "vehicle", "read").unwrap(), expected);
}

#[test]
fn no_membership_for_slug_is_not_ready() {
    let state = loaded("acme", vec![membership("globex", vec![])]);

    assert_eq!(allowed(&state, "vehicle", "read"), None);

    let resolution = ColumnResolver::new(vec![ColumnDef::new("plate", "plate")])
        .without_audit()
        .resolve(allowed(&state, "vehicle", "read").as_deref(), None);
    assert!(!resolution.is_ready);
}

#[test_case(None; "absent slug")]
#[test_case(Some(""); "empty slug")]
#[test_case(Some("   "); "blank slug")]
#[test_case(Some("globex"); "slug not loaded")]
fn not_ready_slugs(slug: Option<&str>) {
    let state = loaded("acme", vec![membership("acme", vec![])]);

    assert_eq!(
        select_allowed_attributes(&state, &registry(), slug, "vehicle", "read"),
        None
    );
}

#[test]
fn not_loaded_is_not_ready() {
    let state = PermissionsState::new();
    assert_eq!(allowed(&state, "vehicle", "read"), None);
}

#[test]
fn unknown_and_empty_subjects_resolve_to_empty_list() {
    let state = loaded("acme", vec![membership("acme", vec![])]);

    assert_eq!(allowed(&state, "trailer", "read"), Some(vec![]));
    assert_eq!(allowed(&state, "container", "read"), Some(vec![]));
}

#[test]
fn inactive_membership_is_ignored() {
    let roles = vec![Role::new(1, "a").with_permission(Permission::new("vehicle", "read"))];
    let state = loaded("acme", vec![membership("acme", roles).inactive()]);

    assert_eq!(allowed(&state, "vehicle", "read"), None);
    assert!(!has_permission(&state, "vehicle:read"));
    assert!(select_current_membership(&state).is_none());
}

// ============================================================================
// Gates
// ============================================================================

#[test]
fn permission_gates() {
    let roles = vec![
        Role::new(1, "viewer")
            .with_permission(Permission::new("vehicle", "read").in_module(fleet()))
            .with_tenant_permission(TenantPermission::new("vehicle", "stats").allow(["plate"])),
    ];
    let state = loaded("acme", vec![membership("acme", roles)]);

    assert!(has_permission(&state, "VEHICLE:stats"));
    assert!(has_any_permission(&state, ["driver:read", "vehicle:read"]));
    assert!(!has_any_permission(&state, ["driver:read"]));
    assert!(has_all_permissions(&state, ["vehicle:read", "vehicle:stats"]));
    assert!(!has_all_permissions(&state, ["vehicle:read", "driver:read"]));
    assert!(has_all_permissions(&state, Vec::<String>::new()));
}

#[test]
fn module_access_needs_license_and_grant() {
    let maintenance = AppModule::new("maintenance", "Maintenance");
    let tenant = Tenant::new(1, "acme")
        .with_module(TenantModule::new(fleet(), true))
        .with_module(TenantModule::new(maintenance.clone(), false));
    let member = Membership::new(1, tenant).with_role(
        Role::new(1, "ops")
            .with_permission(Permission::new("vehicle", "read").in_module(fleet()))
            .with_permission(Permission::new("work_order", "read").in_module(maintenance)),
    );
    let state = loaded("acme", vec![member]);

    assert!(is_module_licensed(&state, "fleet"));
    assert!(can_access_module(&state, "Fleet"));
    // Granted but not licensed.
    assert!(!is_module_licensed(&state, "maintenance"));
    assert!(!can_access_module(&state, "maintenance"));
    // Effective modules stay a pure function of the membership.
    assert_eq!(select_effective_modules(&state).len(), 2);
}

#[test]
fn licensed_module_without_grant_is_not_accessible() {
    let state = loaded("acme", vec![membership("acme", vec![])]);

    assert!(is_module_licensed(&state, "fleet"));
    assert!(!can_access_module(&state, "fleet"));
}

// ============================================================================
// State transitions
// ============================================================================

fn started(state: &PermissionsState, id: u64, slug: &str) -> PermissionsState {
    state
        .reduce(PermissionsAction::FetchStarted {
            request_id: RequestId::new(id),
            tenant_slug: TenantSlug::new(slug),
        })
        .unwrap()
}

fn reader_roles() -> Vec<Role> {
    vec![Role::new(1, "a").with_permission(Permission::new("vehicle", "read"))]
}

#[test]
fn stale_response_is_discarded() {
    let state = started(&PermissionsState::new(), 1, "acme");
    let state = started(&state, 2, "globex");

    let stale = state.reduce(PermissionsAction::FetchSucceeded {
        request_id: RequestId::new(1),
        memberships: vec![membership("acme", reader_roles())],
    });
    assert!(stale.is_none());

    let state = state
        .reduce(PermissionsAction::FetchSucceeded {
            request_id: RequestId::new(2),
            memberships: vec![membership("globex", vec![])],
        })
        .unwrap();

    assert_eq!(state.tenant_slug_loaded(), Some(&TenantSlug::new("globex")));
    assert!(!has_permission(&state, "vehicle:read"));
    assert!(!state.loading);
}

#[test]
fn tenant_switch_resets_derived_data() {
    let state = loaded("acme", vec![membership("acme", reader_roles())]);
    assert!(has_permission(&state, "vehicle:read"));

    let state = started(&state, 2, "globex");

    assert!(state.loading);
    assert!(state.memberships.is_none());
    assert!(state.flat_permissions.is_empty());
    assert!(state.effective_modules.is_empty());
    assert!(state.tenant_modules.active_module_keys.is_empty());
    assert_eq!(allowed(&state, "vehicle", "read"), None);
}

#[test]
fn same_tenant_refresh_keeps_data() {
    let state = loaded("acme", vec![membership("acme", reader_roles())]);

    let refreshing = started(&state, 2, "acme");

    assert!(refreshing.loading);
    assert!(has_permission(&refreshing, "vehicle:read"));
    assert_ne!(refreshing.version(), state.version());
}

#[test]
fn fetch_failure_fails_closed() {
    let state = loaded("acme", vec![membership("acme", reader_roles())]);
    let state = started(&state, 2, "acme");

    let state = state
        .reduce(PermissionsAction::FetchFailed {
            request_id: RequestId::new(2),
            error: FetchError::permission_denied("revoked"),
        })
        .unwrap();

    assert!(!state.loading);
    assert!(state.error.is_some());
    assert!(!has_permission(&state, "vehicle:read"));
    assert_eq!(allowed(&state, "vehicle", "read"), None);
}

#[test]
fn stale_failure_is_discarded() {
    let state = started(&PermissionsState::new(), 1, "acme");
    let state = started(&state, 2, "acme");

    assert!(
        state
            .reduce(PermissionsAction::FetchFailed {
                request_id: RequestId::new(1),
                error: FetchError::timeout(10),
            })
            .is_none()
    );
}

#[test]
fn cleared_resets_everything() {
    let state = loaded("acme", vec![membership("acme", reader_roles())]);

    let state = state.reduce(PermissionsAction::Cleared).unwrap();

    assert!(!state.is_loaded());
    assert!(state.tenant_slug_loaded().is_none());
    assert!(state.flat_permissions.is_empty());
    assert!(state.pending.is_none());
}

#[test]
fn versions_increase() {
    let first = PermissionsState::new();
    let second = started(&first, 1, "acme");
    assert!(second.version() > first.version());
}

// ============================================================================
// Memoized selector
// ============================================================================

#[test]
fn selector_memoizes_per_snapshot() {
    let roles = vec![
        Role::new(1, "a")
            .with_tenant_permission(TenantPermission::new("vehicle", "read").deny(["status"])),
    ];
    let state = loaded("acme", vec![membership("acme", roles)]);
    let selector = AttributeSelector::new(Arc::new(registry()));

    let first = selector.allowed_attributes(&state, Some("acme"), "vehicle", "read");
    let second = selector.allowed_attributes(&state, Some("acme"), "Vehicle", "READ");

    assert_eq!(first, second);
    assert_eq!(selector.cached(), 1);
    assert_eq!(first, allowed(&state, "vehicle", "read"));
}

#[test]
fn selector_invalidates_on_new_snapshot() {
    let state = loaded("acme", vec![membership("acme", reader_roles())]);
    let selector = AttributeSelector::with_capacity(Arc::new(registry()), 8);

    assert!(
        selector
            .allowed_attributes(&state, Some("acme"), "vehicle", "read")
            .is_some()
    );

    let switched = started(&state, 2, "globex");
    assert_eq!(
        selector.allowed_attributes(&switched, Some("acme"), "vehicle", "read"),
        None
    );
    assert_eq!(selector.cached(), 1);
}

#[test]
fn selector_reports_rule() {
    let roles = vec![
        Role::new(1, "a")
            .with_tenant_permission(TenantPermission::new("vehicle", "read").allow(["plate"])),
    ];
    let state = loaded("acme", vec![membership("acme", roles)]);
    let selector = AttributeSelector::new(Arc::new(registry()));

    let decision = selector
        .decision(&state, Some("acme"), "vehicle", "read")
        .unwrap();
    assert_eq!(decision.rule, AttributeRule::Whitelist);
}

// ============================================================================
// Property-Based Tests
// ============================================================================

const ATTRIBUTES: [&str; 4] = ["plate", "model_year", "color", "status"];

fn attribute_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(ATTRIBUTES.to_vec()), 0..4)
        .prop_map(|v| v.into_iter().map(String::from).collect())
}

fn grant() -> impl Strategy<Value = TenantPermission> {
    (attribute_list(), attribute_list())
        .prop_map(|(allow, deny)| TenantPermission::new("vehicle", "read").allow(allow).deny(deny))
}

fn full() -> Vec<String> {
    ATTRIBUTES.map(String::from).to_vec()
}

proptest! {
    #[test]
    fn any_allow_list_wins(grants in prop::collection::vec(grant(), 1..5)) {
        prop_assume!(grants.iter().any(TenantPermission::has_allow_list));
        let refs: Vec<&TenantPermission> = grants.iter().collect();

        let decision = merge_attribute_grants(&refs, &full());

        prop_assert_eq!(decision.rule, AttributeRule::Whitelist);
        for attribute in &decision.attributes {
            prop_assert!(grants.iter().any(|g| g.allowed().any(|a| a == attribute.as_str())));
        }
        for g in &grants {
            for a in g.allowed() {
                prop_assert!(decision.allows(a));
            }
        }
    }

    #[test]
    fn blacklist_is_full_minus_denied(denies in prop::collection::vec(attribute_list(), 1..4)) {
        let grants: Vec<TenantPermission> = denies
            .iter()
            .map(|d| TenantPermission::new("vehicle", "read").deny(d.clone()))
            .collect();
        let refs: Vec<&TenantPermission> = grants.iter().collect();

        let decision = merge_attribute_grants(&refs, &full());

        let expected: Vec<String> = full()
            .into_iter()
            .filter(|a| !denies.iter().flatten().any(|d| d == a))
            .collect();
        prop_assert_eq!(decision.attributes, expected);
    }

    #[test]
    fn merge_is_order_independent_as_a_set(grants in prop::collection::vec(grant(), 0..5)) {
        let forward: Vec<&TenantPermission> = grants.iter().collect();
        let backward: Vec<&TenantPermission> = grants.iter().rev().collect();

        let mut a = merge_attribute_grants(&forward, &full()).attributes;
        let mut b = merge_attribute_grants(&backward, &full()).attributes;
        a.sort();
        b.sort();

        prop_assert_eq!(a, b);
    }

    #[test]
    fn flat_permissions_ignore_order_and_duplicates(
        pairs in prop::collection::vec(("[a-c]{1,3}", "[a-c]{1,3}"), 0..8),
        upper in any::<bool>(),
    ) {
        let forward: Vec<Role> = pairs
            .iter()
            .map(|(s, a)| Role::new(1, "r").with_permission(Permission::new(s.clone(), a.clone())))
            .collect();
        let mut backward: Vec<Role> = pairs
            .iter()
            .rev()
            .map(|(s, a)| {
                let (s, a) = if upper { (s.to_uppercase(), a.to_uppercase()) } else { (s.clone(), a.clone()) };
                Role::new(2, "r").with_permission(Permission::new(s, a))
            })
            .collect();
        backward.extend(backward.clone());

        let a = derive_flat_permissions(Some(&membership("acme", forward)));
        let b = derive_flat_permissions(Some(&membership("acme", backward)));

        prop_assert_eq!(a, b);
    }

    #[test]
    fn sanitized_selection_is_subset_of_allowed(
        selection in attribute_list(),
        allowed in attribute_list(),
    ) {
        let sanitized = sanitize_selection(&selection, &allowed);
        for field in &sanitized {
            prop_assert!(allowed.contains(field));
            prop_assert!(selection.contains(field));
        }
    }

    #[test]
    fn visible_columns_are_permitted(
        allowed in attribute_list(),
        selection in attribute_list(),
    ) {
        let resolver = ColumnResolver::new(
            ATTRIBUTES.iter().map(|f| ColumnDef::new(*f, *f)).collect(),
        )
        .without_audit();
        let selection: ColumnSelection = selection.into_iter().collect();

        let resolution = resolver.resolve(Some(allowed.as_slice()), Some(&selection));

        prop_assert!(resolution.is_ready);
        for column in &resolution.visible {
            prop_assert!(allowed.contains(&column.field));
        }
    }
}
