//! End-to-end tests for the `fleetgate` binary.

#![allow(deprecated)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"
[schema.subjects]
vehicle = ["plate", "model_year", "color", "status"]

[tables.vehicles]
subject = "vehicle"
action = "read"
minimal_safe_fields = ["plate"]
always_visible_fields = ["plate"]
columns = [
  { id = "plate", field = "plate", hideable = false },
  { id = "year", field = "model_year" },
  { id = "color", field = "color" },
  { id = "status", field = "status" },
]

[fetch]
membership_file = "memberships.json"
"#;

const MEMBERSHIPS: &str = r#"{
  "memberships": [
    {
      "id": 1,
      "tenant": {
        "id": 10,
        "slug": "acme",
        "modules": [
          { "id": 1, "active": true, "app_module": { "id": 1, "key": "fleet", "name": "Fleet" } },
          { "id": 2, "active": true, "app_module": { "id": 2, "key": "reports", "name": "Reports" } }
        ]
      },
      "roles": [
        {
          "id": 100,
          "key": "dispatcher",
          "permissions": [
            { "subject_class": "vehicle", "action": "read", "app_module": { "id": 1, "key": "fleet", "name": "Fleet" } },
            { "subject_class": "vehicle", "action": "stats", "app_module": { "id": 1, "key": "fleet", "name": "Fleet" } }
          ],
          "tenant_permissions": [
            { "subject_class": "vehicle", "action": "read", "deny_attributes": ["status"] }
          ]
        }
      ]
    }
  ]
}"#;

/// Project directory with `fleetgate.toml` and `memberships.json`.
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("fleetgate.toml"), CONFIG).unwrap();
    fs::write(dir.path().join("memberships.json"), MEMBERSHIPS).unwrap();
    dir
}

/// `fleetgate` isolated from the user's config and environment.
fn fleetgate(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fleetgate").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .arg("--no-color");
    cmd
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    fleetgate(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    fleetgate(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("permissions"))
        .stdout(predicate::str::contains("attributes"))
        .stdout(predicate::str::contains("columns"));
}

#[test]
fn test_permissions_json() {
    let dir = project();
    fleetgate(dir.path())
        .args(["permissions", "--tenant", "acme", "--json", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"vehicle:read\""))
        .stdout(predicate::str::contains("\"vehicle:stats\""));
}

#[test]
fn test_permissions_check_passes() {
    let dir = project();
    fleetgate(dir.path())
        .args(["permissions", "--tenant", "acme", "--check", "vehicle:read,VEHICLE:STATS"])
        .arg("--project")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("All 2 permissions granted"));
}

#[test]
fn test_permissions_check_reports_missing() {
    let dir = project();
    fleetgate(dir.path())
        .args(["permissions", "--tenant", "acme", "--check", "vehicle:read,driver:update"])
        .arg("--project")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("driver:update"));
}

#[test]
fn test_unknown_tenant_grants_nothing() {
    let dir = project();
    fleetgate(dir.path())
        .args(["permissions", "--tenant", "globex", "--json", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"permissions\": []"));
}

#[test]
fn test_attributes_blacklist() {
    let dir = project();
    fleetgate(dir.path())
        .args(["attributes", "vehicle", "read", "--tenant", "acme", "--json", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rule\": \"blacklist\""))
        .stdout(predicate::str::contains("\"model_year\""))
        .stdout(predicate::str::contains("\"status\"").not());
}

#[test]
fn test_attributes_without_fine_grained_grant_use_full_list() {
    let dir = project();
    fleetgate(dir.path())
        .args(["attributes", "vehicle", "update", "--tenant", "acme", "--json", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rule\": \"no_fine_grained_grant\""))
        .stdout(predicate::str::contains("\"status\""));
}

#[test]
fn test_attributes_not_ready_for_other_tenant() {
    let dir = project();
    fleetgate(dir.path())
        .args(["attributes", "vehicle", "read", "--tenant", "globex", "--json", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ready\": false"));
}

#[test]
fn test_columns_drop_denied_selection() {
    let dir = project();
    fleetgate(dir.path())
        .args(["columns", "vehicles", "--tenant", "acme", "--select", "status,color"])
        .arg("--project")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("'status' is not permitted"))
        .stdout(predicate::str::contains("color"));
}

#[test]
fn test_columns_json_preference_key() {
    let dir = project();
    fleetgate(dir.path())
        .args(["columns", "vehicles", "--tenant", "acme", "--json", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("columns:acme:vehicles"))
        .stdout(predicate::str::contains("\"is_ready\": true"));
}

#[test]
fn test_columns_unknown_table() {
    let dir = project();
    fleetgate(dir.path())
        .args(["columns", "drivers", "--tenant", "acme", "--project"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown table 'drivers'"));
}

#[test]
fn test_modules_lists_licensed_without_grants() {
    let dir = project();
    fleetgate(dir.path())
        .args(["modules", "--tenant", "acme", "--json", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key\": \"fleet\""))
        .stdout(predicate::str::contains("\"key\": \"reports\""));
}

#[test]
fn test_missing_membership_file() {
    let dir = project();
    fleetgate(dir.path())
        .args(["permissions", "--tenant", "acme", "--membership"])
        .arg(dir.path().join("absent.json"))
        .arg("--project")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.json"));
}

#[test]
fn test_config_toml_roundtrips_tables() {
    let dir = project();
    fleetgate(dir.path())
        .args(["config", "--format", "toml", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[tables.vehicles]"));
}

#[test]
fn test_config_env_override() {
    let dir = project();
    fleetgate(dir.path())
        .env("FLEETGATE_FETCH__TIMEOUT_MS", "2500")
        .args(["config", "--project"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2500 ms"));
}
