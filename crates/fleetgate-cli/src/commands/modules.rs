//! Lists modules the user can act in and modules the tenant licenses.

use anyhow::Result;
use fleetgate::{can_access_module, is_module_licensed, select_effective_modules};
use serde::Serialize;

use super::session::Session;
use crate::SourceArgs;
use crate::style::colors::SemanticStyle;
use crate::style::{print_json, print_list_table};

#[derive(Serialize)]
struct ModuleRow {
    key: String,
    name: String,
    licensed: bool,
    accessible: bool,
    actions: Vec<String>,
}

pub fn run(source: &SourceArgs) -> Result<()> {
    let session = Session::open(source)?;
    let state = &session.state;

    let mut modules: Vec<ModuleRow> = select_effective_modules(state)
        .iter()
        .map(|m| ModuleRow {
            key: m.app_module_key.clone(),
            name: m.app_module_name.clone(),
            licensed: is_module_licensed(state, &m.app_module_key),
            accessible: can_access_module(state, &m.app_module_key),
            actions: m
                .actions_by_subject
                .iter()
                .flat_map(|(subject, actions)| actions.iter().map(move |a| format!("{subject}:{a}")))
                .collect(),
        })
        .collect();

    // Licensed modules the roles grant nothing in.
    for (key, module) in &state.tenant_modules.modules_by_key {
        if state.tenant_modules.is_active(key) && !modules.iter().any(|m| &m.key == key) {
            modules.push(ModuleRow {
                key: key.clone(),
                name: module.app_module.name.clone().unwrap_or_else(|| key.clone()),
                licensed: true,
                accessible: false,
                actions: Vec::new(),
            });
        }
    }
    modules.sort_by(|a, b| a.key.cmp(&b.key));

    if source.json {
        return print_json(&modules);
    }

    session.warn_if_unmatched();
    let rows: Vec<Vec<String>> = modules
        .iter()
        .map(|m| {
            vec![
                m.key.clone(),
                m.name.clone(),
                verdict(m.licensed),
                verdict(m.accessible),
                m.actions.join(", "),
            ]
        })
        .collect();
    print_list_table(
        &["Key", "Name", "Licensed", "Accessible", "Grants"],
        &rows,
        "module",
    );
    Ok(())
}

fn verdict(value: bool) -> String {
    if value { "yes".granted() } else { "no".denied() }
}
