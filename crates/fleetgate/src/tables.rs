//! Wiring from configuration to resolvers.

use std::sync::Arc;

use fleetgate_config::{FleetgateConfig, TableConfig};
use fleetgate_rbac::{
    AttributeSchemaRegistry, AttributeSelector, ColumnDef, ColumnResolution, ColumnResolver,
    ColumnSelection, PermissionsState,
};

/// Builds the attribute registry from `[schema.subjects]`.
pub fn registry_from_config(config: &FleetgateConfig) -> AttributeSchemaRegistry {
    AttributeSchemaRegistry::from(&config.schema.subjects)
}

/// Builds a memoized selector sized by `[cache]`.
pub fn selector_from_config(config: &FleetgateConfig) -> AttributeSelector {
    AttributeSelector::with_capacity(
        Arc::new(registry_from_config(config)),
        config.cache.selector_capacity,
    )
}

/// A configured table bound to the `(subject, action)` it displays.
#[derive(Debug, Clone)]
pub struct PermissionedTable {
    pub id: String,
    pub subject: String,
    pub action: String,
    resolver: ColumnResolver,
}

impl PermissionedTable {
    pub fn from_config(id: impl Into<String>, table: &TableConfig) -> Self {
        let columns = table
            .columns
            .iter()
            .map(|c| ColumnDef {
                id: c.id.clone(),
                field: c.field.clone(),
                hideable: c.hideable,
            })
            .collect();

        Self {
            id: id.into(),
            subject: table.subject.clone(),
            action: table.action.clone(),
            resolver: ColumnResolver::new(columns)
                .with_minimal_safe_fields(&table.minimal_safe_fields)
                .with_always_visible_fields(&table.always_visible_fields),
        }
    }

    /// Every table declared under `[tables]`, in id order.
    pub fn all_from_config(config: &FleetgateConfig) -> Vec<Self> {
        config
            .tables
            .iter()
            .map(|(id, table)| Self::from_config(id.clone(), table))
            .collect()
    }

    /// Disables logging of dropped selections (for testing).
    pub fn without_audit(mut self) -> Self {
        self.resolver = self.resolver.without_audit();
        self
    }

    pub fn resolver(&self) -> &ColumnResolver {
        &self.resolver
    }

    /// Resolves visible columns for `tenant_slug` against `state`.
    pub fn resolve(
        &self,
        selector: &AttributeSelector,
        state: &PermissionsState,
        tenant_slug: Option<&str>,
        selection: Option<&ColumnSelection>,
    ) -> ColumnResolution {
        let allowed = selector.allowed_attributes(state, tenant_slug, &self.subject, &self.action);
        self.resolver.resolve(allowed.as_deref(), selection)
    }
}
