//! Loads configuration and memberships for one command invocation.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use fleetgate::{
    ConfigLoader, FileMembershipFetcher, FleetgateConfig, PermissionsState, PermissionsStore,
    select_current_membership,
};
use tracing::debug;

use crate::SourceArgs;
use crate::style::{print_hint, print_warn};

/// Configuration plus the permission snapshot for `--tenant`.
pub struct Session {
    pub config: FleetgateConfig,
    pub tenant: String,
    pub state: Arc<PermissionsState>,
}

impl Session {
    pub fn open(source: &SourceArgs) -> Result<Self> {
        let config = ConfigLoader::new()
            .with_project_dir(&source.project)
            .load()
            .with_context(|| {
                format!(
                    "Failed to load configuration from {}",
                    source.project.display()
                )
            })?;

        let path = source
            .membership
            .clone()
            .or_else(|| config.fetch.membership_file.clone())
            .ok_or_else(|| {
                anyhow!("No membership file given (use --membership or set fetch.membership_file)")
            })?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        let store = PermissionsStore::from_config(FileMembershipFetcher::new(&path), &config);
        let state = runtime
            .block_on(store.load_tenant(&source.tenant))
            .with_context(|| format!("Failed to load memberships from {}", path.display()))?;

        debug!(
            tenant = %source.tenant,
            memberships = state.memberships.as_ref().map_or(0, |m| m.len()),
            "Session opened"
        );

        Ok(Self {
            config,
            tenant: source.tenant.trim().to_string(),
            state,
        })
    }

    /// Warns when the payload holds no active membership for the tenant.
    pub fn warn_if_unmatched(&self) {
        if select_current_membership(&self.state).is_none() {
            print_warn(&format!("No active membership for tenant '{}'", self.tenant));
            print_hint("Every capability resolves to denied");
        }
    }
}
