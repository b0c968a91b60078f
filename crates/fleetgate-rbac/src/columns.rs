//! Permissioned table columns.
//!
//! Maps a resolved allowed-attribute list onto a table's column catalog.
//! Until permissions are ready only the skeleton columns are reported, so a
//! table never renders the full column set and then retracts it.

use std::collections::HashSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

fn default_hideable() -> bool {
    true
}

/// One column of a table catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub id: String,
    /// Subject attribute rendered by this column.
    pub field: String,
    /// Whether the user may hide this column; non-hideable columns ignore the
    /// persisted selection.
    #[serde(default = "default_hideable")]
    pub hideable: bool,
}

impl ColumnDef {
    pub fn new(id: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            hideable: true,
        }
    }

    /// Marks the column as non-hideable.
    pub fn pinned(mut self) -> Self {
        self.hideable = false;
        self
    }
}

/// A user's persisted choice of visible fields for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSelection(Vec<String>);

impl ColumnSelection {
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnSelection {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Storage key of a [`ColumnSelection`]: selections are kept per table and tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnPreferenceKey {
    pub table_id: String,
    pub tenant_slug: String,
}

impl ColumnPreferenceKey {
    pub fn new(table_id: impl Into<String>, tenant_slug: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            tenant_slug: tenant_slug.into(),
        }
    }
}

impl Display for ColumnPreferenceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "columns:{}:{}", self.tenant_slug, self.table_id)
    }
}

/// Keeps the entries of `selection` that appear in `allowed`.
///
/// Order and duplicates of `selection` are preserved; the stored selection
/// itself is never touched.
///
/// # Examples
///
/// ```
/// use fleetgate_rbac::sanitize_selection;
///
/// let allowed = ["plate".to_string(), "model_year".to_string()];
/// let selection = ["status".to_string(), "plate".to_string()];
///
/// assert_eq!(sanitize_selection(&selection, &allowed), ["plate"]);
/// ```
pub fn sanitize_selection(selection: &[String], allowed: &[String]) -> Vec<String> {
    let allowed: HashSet<&str> = allowed.iter().map(|a| a.trim()).collect();
    selection
        .iter()
        .filter(|field| allowed.contains(field.trim()))
        .cloned()
        .collect()
}

/// Output of [`ColumnResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnResolution {
    /// `false` while permissions are not loaded for the tenant.
    pub is_ready: bool,
    /// Columns to render, in catalog order.
    pub visible: Vec<ColumnDef>,
    /// Fields removed from the persisted selection because they are denied.
    pub dropped_from_selection: Vec<String>,
}

impl ColumnResolution {
    pub fn visible_ids(&self) -> Vec<&str> {
        self.visible.iter().map(|c| c.id.as_str()).collect()
    }
}

/// Resolves visible columns for one table.
///
/// # Example
///
/// ```
/// use fleetgate_rbac::{ColumnDef, ColumnResolver};
///
/// let resolver = ColumnResolver::new(vec![
///     ColumnDef::new("plate", "plate").pinned(),
///     ColumnDef::new("status", "status"),
/// ])
/// .with_minimal_safe_fields(["plate"])
/// .without_audit();
///
/// let skeleton = resolver.resolve(None, None);
/// assert!(!skeleton.is_ready);
/// assert_eq!(skeleton.visible_ids(), ["plate"]);
///
/// let allowed = vec!["plate".to_string()];
/// let ready = resolver.resolve(Some(allowed.as_slice()), None);
/// assert_eq!(ready.visible_ids(), ["plate"]);
/// ```
#[derive(Debug, Clone)]
pub struct ColumnResolver {
    columns: Vec<ColumnDef>,
    minimal_safe_fields: HashSet<String>,
    always_visible_fields: HashSet<String>,
    audit_enabled: bool,
}

impl ColumnResolver {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            minimal_safe_fields: HashSet::new(),
            always_visible_fields: HashSet::new(),
            audit_enabled: true,
        }
    }

    /// Fields shown as the loading skeleton.
    pub fn with_minimal_safe_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.minimal_safe_fields
            .extend(fields.into_iter().map(|f| f.as_ref().trim().to_string()));
        self
    }

    /// Fields visible once ready regardless of the allowed list.
    pub fn with_always_visible_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.always_visible_fields
            .extend(fields.into_iter().map(|f| f.as_ref().trim().to_string()));
        self
    }

    /// Disables logging of dropped selections (for testing).
    pub fn without_audit(mut self) -> Self {
        self.audit_enabled = false;
        self
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Computes the visible columns.
    ///
    /// * `allowed` - resolved attribute list, `None` while not ready
    /// * `selection` - the user's persisted selection, if any
    ///
    /// A selection that keeps nothing once denied fields are dropped is
    /// ignored and every permitted column is shown.
    pub fn resolve(
        &self,
        allowed: Option<&[String]>,
        selection: Option<&ColumnSelection>,
    ) -> ColumnResolution {
        let Some(allowed) = allowed else {
            return ColumnResolution {
                is_ready: false,
                visible: self
                    .columns
                    .iter()
                    .filter(|c| self.minimal_safe_fields.contains(c.field.trim()))
                    .cloned()
                    .collect(),
                dropped_from_selection: Vec::new(),
            };
        };

        let allowed: HashSet<&str> = allowed.iter().map(|a| a.trim()).collect();
        let permitted: Vec<&ColumnDef> = self
            .columns
            .iter()
            .filter(|c| {
                let field = c.field.trim();
                self.always_visible_fields.contains(field) || allowed.contains(field)
            })
            .collect();
        let permitted_fields: Vec<String> = permitted.iter().map(|c| c.field.clone()).collect();

        let (kept, dropped) = match selection {
            Some(selection) if !selection.is_empty() => {
                let kept = sanitize_selection(selection.fields(), &permitted_fields);
                // Allowed fields without a catalog column are ignored, not reported.
                let dropped: Vec<String> = selection
                    .fields()
                    .iter()
                    .filter(|f| {
                        let field = f.trim();
                        !allowed.contains(field) && !self.always_visible_fields.contains(field)
                    })
                    .cloned()
                    .collect();
                (Some(kept), dropped)
            }
            _ => (None, Vec::new()),
        };

        if self.audit_enabled && !dropped.is_empty() {
            warn!(
                dropped_fields = ?dropped,
                "Denied fields dropped from column selection"
            );
        }

        let kept: Option<HashSet<&str>> = kept
            .as_ref()
            .filter(|k| !k.is_empty())
            .map(|k| k.iter().map(|f| f.trim()).collect());

        let visible: Vec<ColumnDef> = permitted
            .into_iter()
            .filter(|c| match &kept {
                None => true,
                Some(kept) => {
                    let field = c.field.trim();
                    !c.hideable || self.always_visible_fields.contains(field) || kept.contains(field)
                }
            })
            .cloned()
            .collect();

        debug!(
            catalog = self.columns.len(),
            allowed = allowed.len(),
            visible = visible.len(),
            "Columns resolved"
        );

        ColumnResolution {
            is_ready: true,
            visible,
            dropped_from_selection: dropped,
        }
    }
}
