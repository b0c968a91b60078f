//! Resolves visible columns for a configured table.

use anyhow::{Result, anyhow};
use fleetgate::{
    ColumnPreferenceKey, ColumnResolution, ColumnSelection, PermissionedTable, selector_from_config,
};
use serde::Serialize;

use super::session::Session;
use crate::SourceArgs;
use crate::style::colors::SemanticStyle;
use crate::style::{print_json, print_labeled, print_list_table, print_spacer, print_warn};

#[derive(Serialize)]
struct ColumnsReport<'a> {
    table: &'a str,
    preference_key: String,
    #[serde(flatten)]
    resolution: &'a ColumnResolution,
}

pub fn run(source: &SourceArgs, table_id: &str, select: &[String]) -> Result<()> {
    let session = Session::open(source)?;

    let table_config = session.config.table(table_id).ok_or_else(|| {
        let known: Vec<&str> = session.config.tables.keys().map(String::as_str).collect();
        anyhow!(
            "Unknown table '{table_id}' (configured: {})",
            if known.is_empty() {
                "none".to_string()
            } else {
                known.join(", ")
            }
        )
    })?;

    let selector = selector_from_config(&session.config);
    let table = PermissionedTable::from_config(table_id, table_config);
    let selection: Option<ColumnSelection> = if select.is_empty() {
        None
    } else {
        Some(select.iter().map(|s| s.trim()).collect())
    };

    let resolution = table.resolve(
        &selector,
        &session.state,
        Some(&session.tenant),
        selection.as_ref(),
    );
    let preference_key = ColumnPreferenceKey::new(table_id, session.tenant.as_str());

    if source.json {
        return print_json(&ColumnsReport {
            table: table_id,
            preference_key: preference_key.to_string(),
            resolution: &resolution,
        });
    }

    print_labeled("table", &table_id.code());
    print_labeled("grant", &format!("{}:{}", table.subject, table.action).code());
    print_labeled("preference key", &preference_key.to_string());
    if !resolution.is_ready {
        print_warn("Permissions not ready; showing minimal safe fields only");
    }
    for field in &resolution.dropped_from_selection {
        print_warn(&format!("Selected field '{field}' is not permitted and was dropped"));
    }
    print_spacer();

    let rows: Vec<Vec<String>> = resolution
        .visible
        .iter()
        .map(|c| {
            vec![
                c.id.clone(),
                c.field.clone(),
                if c.hideable { "yes".to_string() } else { "no".muted() },
            ]
        })
        .collect();
    print_list_table(&["Column", "Field", "Hideable"], &rows, "column");
    Ok(())
}
