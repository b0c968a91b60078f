//! Shows the effective layered configuration.

use std::path::Path;

use anyhow::{Context, Result};
use fleetgate::ConfigLoader;

use crate::ConfigFormat;
use crate::style::{print_heading, print_info_table, print_json, print_list_table, print_spacer};

pub fn show(project: &Path, format: ConfigFormat) -> Result<()> {
    let config = ConfigLoader::new()
        .with_project_dir(project)
        .load()
        .with_context(|| format!("Failed to load configuration from {}", project.display()))?;

    match format {
        ConfigFormat::Toml => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        ConfigFormat::Json => print_json(&config),
        ConfigFormat::Text => {
            let timeout = format!("{} ms", config.fetch.timeout_ms);
            let membership = config
                .fetch
                .membership_file
                .as_ref()
                .map_or_else(|| "(not set)".to_string(), |p| p.display().to_string());
            let capacity = config.cache.selector_capacity.to_string();
            let project = project.display().to_string();

            print_info_table(&[
                ("project", project.as_str()),
                ("fetch timeout", timeout.as_str()),
                ("membership file", membership.as_str()),
                ("selector capacity", capacity.as_str()),
            ]);
            print_spacer();

            print_heading("Subjects");
            let subjects: Vec<Vec<String>> = config
                .schema
                .subjects
                .iter()
                .map(|(subject, attributes)| vec![subject.clone(), attributes.join(", ")])
                .collect();
            print_list_table(&["Subject", "Attributes"], &subjects, "subject");
            print_spacer();

            print_heading("Tables");
            let tables: Vec<Vec<String>> = config
                .tables
                .iter()
                .map(|(id, t)| {
                    vec![
                        id.clone(),
                        format!("{}:{}", t.subject, t.action),
                        t.columns.len().to_string(),
                    ]
                })
                .collect();
            print_list_table(&["Table", "Grant", "Columns"], &tables, "table");
            Ok(())
        }
    }
}
