//! Module resolution.
//!
//! Two independent views of "modules":
//! - [`EffectiveModule`]: what the *user* can act on, built from coarse grants
//! - [`TenantModules`]: what the *tenant* has licensed, built from the tenant record
//!
//! Navigation needs both: a module is reachable only when it is licensed and
//! the user holds at least one grant in it.

use std::collections::{BTreeMap, BTreeSet};

use fleetgate_types::{Grant, Membership, TenantModule, TenantSlug};
use serde::{Deserialize, Serialize};

/// A module the current user can act on, with the actions granted per subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveModule {
    pub app_module_name: String,
    pub app_module_key: String,
    /// Subject -> union of actions granted on it by any role (first-seen order).
    pub actions_by_subject: BTreeMap<String, Vec<String>>,
}

impl EffectiveModule {
    fn new(key: String, name: String) -> Self {
        Self {
            app_module_name: name,
            app_module_key: key,
            actions_by_subject: BTreeMap::new(),
        }
    }

    /// Returns whether any role grants `action` on `subject` in this module.
    pub fn allows(&self, subject: &str, action: &str) -> bool {
        let subject = fleetgate_types::normalize(subject);
        let action = fleetgate_types::normalize(action);
        self.actions_by_subject
            .get(&subject)
            .is_some_and(|actions| actions.contains(&action))
    }
}

/// Groups coarse grants by module.
///
/// Grants without a usable module key or grant key are skipped. Modules end
/// up in key order; a module only appears when it holds at least one
/// subject/action pair.
pub fn build_effective_modules(membership: Option<&Membership>) -> Vec<EffectiveModule> {
    let Some(membership) = membership else {
        return Vec::new();
    };

    let mut modules: BTreeMap<String, EffectiveModule> = BTreeMap::new();

    for permission in membership.permissions() {
        let Some(app_module) = &permission.app_module else {
            continue;
        };
        let (Some(module_key), Some(grant)) = (app_module.resolved_key(), permission.grant_key())
        else {
            continue;
        };

        let module = modules.entry(module_key.clone()).or_insert_with(|| {
            let name = app_module
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map_or_else(|| module_key.clone(), str::to_string);
            EffectiveModule::new(module_key, name)
        });

        let actions = module
            .actions_by_subject
            .entry(grant.subject().to_string())
            .or_default();
        if !actions.iter().any(|a| a == grant.action()) {
            actions.push(grant.action().to_string());
        }
    }

    modules
        .into_values()
        .filter(|m| !m.actions_by_subject.is_empty())
        .collect()
}

/// Modules licensed to the loaded tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantModules {
    /// Tenant these modules were read from; `None` until a fetch succeeds.
    pub tenant_slug_loaded: Option<TenantSlug>,
    /// Keys of modules with `active = true`.
    pub active_module_keys: BTreeSet<String>,
    /// Every module on the tenant record (active or not), by normalized key.
    pub modules_by_key: BTreeMap<String, TenantModule>,
}

impl TenantModules {
    /// Reads the tenant's module list.
    ///
    /// `membership` is the membership selected for `tenant_slug`; when absent
    /// the slug is still recorded but no module is licensed.
    pub fn from_membership(tenant_slug: TenantSlug, membership: Option<&Membership>) -> Self {
        let mut modules = Self {
            tenant_slug_loaded: Some(tenant_slug),
            ..Self::default()
        };

        let Some(membership) = membership else {
            return modules;
        };

        for module in &membership.tenant.modules {
            let Some(key) = module.app_module.resolved_key() else {
                continue;
            };
            if module.active {
                modules.active_module_keys.insert(key.clone());
            }
            modules.modules_by_key.insert(key, module.clone());
        }

        modules
    }

    /// Returns whether the tenant has `key` licensed and active.
    pub fn is_active(&self, key: &str) -> bool {
        self.active_module_keys
            .contains(&fleetgate_types::normalize(key))
    }
}
