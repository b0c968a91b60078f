//! Store error types.

use fleetgate_rbac::RequestId;
use fleetgate_types::FetchError;
use thiserror::Error;

/// Errors returned by [`crate::PermissionsStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The fetch failed; permissions were cleared.
    #[error("membership fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A newer fetch was started before this one completed; its response was discarded.
    #[error("membership fetch {request_id} superseded by a newer request")]
    Superseded { request_id: RequestId },

    /// The tenant slug was empty.
    #[error("tenant slug must not be blank")]
    BlankTenant,
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
