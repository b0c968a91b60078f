//! Resolves allowed attributes for one subject and action.

use anyhow::Result;
use fleetgate::{AttributeRule, selector_from_config};
use serde::Serialize;

use super::session::Session;
use crate::SourceArgs;
use crate::style::colors::SemanticStyle;
use crate::style::{print_hint, print_json, print_labeled, print_list_table, print_spacer, print_warn};

#[derive(Serialize)]
struct AttributesReport<'a> {
    tenant: &'a str,
    subject: &'a str,
    action: &'a str,
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule: Option<AttributeRule>,
    attributes: Vec<String>,
}

pub fn run(source: &SourceArgs, subject: &str, action: &str) -> Result<()> {
    let session = Session::open(source)?;
    let selector = selector_from_config(&session.config);
    let decision = selector.decision(&session.state, Some(&session.tenant), subject, action);

    if source.json {
        return print_json(&AttributesReport {
            tenant: &session.tenant,
            subject,
            action,
            ready: decision.is_some(),
            rule: decision.as_ref().map(|d| d.rule),
            attributes: decision.map(|d| d.attributes).unwrap_or_default(),
        });
    }

    let registry = selector.registry();
    if !registry.contains_subject(subject) {
        print_warn(&format!("Subject '{subject}' is not declared in [schema.subjects]"));
    }

    let Some(decision) = decision else {
        print_warn(&format!("Not ready: no active membership for tenant '{}'", session.tenant));
        print_hint("Tables render only their minimal safe fields until permissions load");
        return Ok(());
    };

    print_labeled("grant", &format!("{subject}:{action}").code());
    print_labeled("rule", decision.rule.as_str());
    print_spacer();

    let full = registry.full_attributes(subject);
    let mut rows: Vec<Vec<String>> = full
        .iter()
        .map(|attribute| {
            let verdict = if decision.allows(attribute) {
                "allowed".granted()
            } else {
                "hidden".denied()
            };
            vec![attribute.clone(), verdict]
        })
        .collect();

    // Whitelisted names the schema does not declare still pass through.
    for attribute in decision.attributes.iter().filter(|a| !full.contains(a)) {
        rows.push(vec![
            attribute.clone(),
            format!("{} {}", "allowed".granted(), "(not in schema)".muted()),
        ]);
    }

    print_list_table(&["Attribute", "Verdict"], &rows, "attribute");
    Ok(())
}
