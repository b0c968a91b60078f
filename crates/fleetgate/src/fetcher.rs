//! Membership fetch boundary.
//!
//! The store never talks to the network itself. It asks a
//! [`MembershipFetcher`] for the memberships of a tenant and treats whatever
//! comes back as the whole truth for that tenant.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fleetgate_types::{ErrorCode, FetchError, Membership, TenantSlug, decode_memberships};
use tracing::debug;

/// Source of membership payloads.
pub trait MembershipFetcher: Send + Sync + 'static {
    /// Fetches the current user's memberships while `tenant_slug` is selected.
    ///
    /// The payload may contain memberships for other tenants; the store only
    /// keeps the one matching `tenant_slug`.
    fn fetch(
        &self,
        tenant_slug: &TenantSlug,
    ) -> impl Future<Output = Result<Vec<Membership>, FetchError>> + Send;
}

/// Serves a fixed payload (or a fixed error).
#[derive(Debug, Clone)]
pub struct StaticMembershipFetcher {
    response: Result<Vec<Membership>, FetchError>,
}

impl StaticMembershipFetcher {
    pub fn new(memberships: Vec<Membership>) -> Self {
        Self {
            response: Ok(memberships),
        }
    }

    /// A fetcher whose every fetch fails with `error`.
    pub fn failing(error: FetchError) -> Self {
        Self {
            response: Err(error),
        }
    }
}

impl MembershipFetcher for StaticMembershipFetcher {
    async fn fetch(&self, _tenant_slug: &TenantSlug) -> Result<Vec<Membership>, FetchError> {
        self.response.clone()
    }
}

/// Reads the payload from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct FileMembershipFetcher {
    path: PathBuf,
}

impl FileMembershipFetcher {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MembershipFetcher for FileMembershipFetcher {
    async fn fetch(&self, tenant_slug: &TenantSlug) -> Result<Vec<Membership>, FetchError> {
        debug!(path = %self.path.display(), tenant = %tenant_slug, "Reading membership file");

        let body = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| {
                let code = match e.kind() {
                    ErrorKind::NotFound => ErrorCode::NotFound,
                    ErrorKind::PermissionDenied => ErrorCode::PermDenied,
                    _ => ErrorCode::UnknownError,
                };
                FetchError::new(
                    code,
                    "Membership file unavailable",
                    format!("{}: {e}", self.path.display()),
                )
            })?;

        Ok(decode_memberships(&body)?)
    }
}
