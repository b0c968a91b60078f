//! Lists or checks flat `subject:action` capabilities.

use anyhow::{Result, bail};
use fleetgate::{has_permission, select_flat_permissions};
use serde::Serialize;

use super::session::Session;
use crate::SourceArgs;
use crate::style::colors::SemanticStyle;
use crate::style::{print_json, print_list_table, print_spacer, print_success};

#[derive(Serialize)]
struct PermissionsReport<'a> {
    tenant: &'a str,
    permissions: Vec<String>,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    tenant: &'a str,
    granted: Vec<&'a str>,
    missing: Vec<&'a str>,
}

pub fn run(source: &SourceArgs, check: &[String]) -> Result<()> {
    let session = Session::open(source)?;

    if !check.is_empty() {
        return run_check(&session, check, source.json);
    }

    let flat = select_flat_permissions(&session.state);
    if source.json {
        return print_json(&PermissionsReport {
            tenant: &session.tenant,
            permissions: flat.to_strings(),
        });
    }

    session.warn_if_unmatched();
    let rows: Vec<Vec<String>> = flat
        .iter()
        .map(|key| vec![key.subject().to_string(), key.action().to_string()])
        .collect();
    print_list_table(&["Subject", "Action"], &rows, "permission");
    Ok(())
}

fn run_check(session: &Session, check: &[String], json: bool) -> Result<()> {
    let (granted, missing): (Vec<&str>, Vec<&str>) = check
        .iter()
        .map(String::as_str)
        .partition(|p| has_permission(&session.state, p));

    if json {
        print_json(&CheckReport {
            tenant: &session.tenant,
            granted,
            missing: missing.clone(),
        })?;
    } else {
        for permission in check {
            if has_permission(&session.state, permission) {
                println!("{} {}", "✓".granted(), permission.code());
            } else {
                println!("{} {}", "✗".denied(), permission.code());
            }
        }
        print_spacer();
    }

    if missing.is_empty() {
        if !json {
            print_success(&format!("All {} permissions granted", check.len()));
        }
    } else {
        bail!(
            "{} of {} permissions missing for tenant '{}': {}",
            missing.len(),
            check.len(),
            session.tenant,
            missing.join(", ")
        );
    }
    Ok(())
}
