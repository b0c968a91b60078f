//! Permission store: the single asynchronous boundary.
//!
//! The store owns the current [`PermissionsState`] snapshot and publishes
//! every new one through a `watch` channel, so readers always observe a
//! whole snapshot. Fetches are tagged with a [`RequestId`]; only the most
//! recently started fetch may apply its response.
//!
//! ```text
//!  switch_tenant(T) ─► FetchStarted ─► spawn(fetch T) ─► FetchSucceeded / FetchFailed
//!        │                                   ▲
//!        └── aborts the previous task ───────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use fleetgate_config::FleetgateConfig;
use fleetgate_rbac::{PermissionsAction, PermissionsState, RequestId};
use fleetgate_types::{FetchError, TenantSlug};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::fetcher::MembershipFetcher;

/// Default upper bound on one membership fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

struct Inner<F> {
    fetcher: F,
    state: watch::Sender<Arc<PermissionsState>>,
    next_request: AtomicU64,
    in_flight: Mutex<Option<JoinHandle<()>>>,
    fetch_timeout: Duration,
}

/// Holds the permission snapshot and drives membership fetches.
///
/// Cloning is cheap; clones share the same snapshot and fetcher.
pub struct PermissionsStore<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for PermissionsStore<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: MembershipFetcher> PermissionsStore<F> {
    /// Creates a store with an empty snapshot.
    pub fn new(fetcher: F) -> Self {
        Self::with_timeout(fetcher, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(fetcher: F, fetch_timeout: Duration) -> Self {
        let (state, _rx) = watch::channel(Arc::new(PermissionsState::new()));
        Self {
            inner: Arc::new(Inner {
                fetcher,
                state,
                next_request: AtomicU64::new(1),
                in_flight: Mutex::new(None),
                fetch_timeout,
            }),
        }
    }

    /// Creates a store using the `[fetch]` settings of `config`.
    pub fn from_config(fetcher: F, config: &FleetgateConfig) -> Self {
        Self::with_timeout(fetcher, Duration::from_millis(config.fetch.timeout_ms))
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<PermissionsState> {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PermissionsState>> {
        self.inner.state.subscribe()
    }

    /// Fetches memberships for `tenant_slug` and waits for the result.
    ///
    /// # Errors
    ///
    /// - [`StoreError::BlankTenant`] if `tenant_slug` is blank
    /// - [`StoreError::Fetch`] if the fetch failed or timed out; permissions
    ///   are cleared
    /// - [`StoreError::Superseded`] if another fetch started meanwhile; the
    ///   response was discarded
    pub async fn load_tenant(&self, tenant_slug: &str) -> Result<Arc<PermissionsState>> {
        let (request_id, slug) = self.start(tenant_slug)?;
        self.inner.run_fetch(request_id, slug).await
    }

    /// Starts a fetch for `tenant_slug` in the background.
    ///
    /// The previous background fetch, if any, is aborted. Must be called from
    /// within a Tokio runtime. Observe completion through [`subscribe`](Self::subscribe).
    pub fn switch_tenant(&self, tenant_slug: &str) -> Result<RequestId> {
        let (request_id, slug) = self.start(tenant_slug)?;

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            if let Err(e) = inner.run_fetch(request_id, slug).await {
                debug!(request = %request_id, error = %e, "Background membership fetch ended");
            }
        });

        if let Some(previous) = self.inner.replace_in_flight(Some(handle)) {
            previous.abort();
        }
        Ok(request_id)
    }

    /// Drops all permission data (logout).
    pub fn clear_permissions(&self) {
        if let Some(previous) = self.inner.replace_in_flight(None) {
            previous.abort();
        }
        self.inner.dispatch(PermissionsAction::Cleared);
    }

    fn start(&self, tenant_slug: &str) -> Result<(RequestId, TenantSlug)> {
        let slug = TenantSlug::new(tenant_slug.trim());
        if slug.is_blank() {
            return Err(StoreError::BlankTenant);
        }

        let request_id = RequestId::new(self.inner.next_request.fetch_add(1, Ordering::Relaxed));
        self.inner.dispatch(PermissionsAction::FetchStarted {
            request_id,
            tenant_slug: slug.clone(),
        });
        Ok((request_id, slug))
    }
}

impl<F: MembershipFetcher> Inner<F> {
    /// Applies `action`; returns whether a new snapshot was published.
    fn dispatch(&self, action: PermissionsAction) -> bool {
        self.state.send_if_modified(|current| match current.reduce(action) {
            Some(next) => {
                *current = Arc::new(next);
                true
            }
            None => false,
        })
    }

    fn replace_in_flight(&self, handle: Option<JoinHandle<()>>) -> Option<JoinHandle<()>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *in_flight, handle)
    }

    async fn run_fetch(
        &self,
        request_id: RequestId,
        tenant_slug: TenantSlug,
    ) -> Result<Arc<PermissionsState>> {
        let outcome = match tokio::time::timeout(
            self.fetch_timeout,
            self.fetcher.fetch(&tenant_slug),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_elapsed) => Err(FetchError::timeout(
                u64::try_from(self.fetch_timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        };

        match outcome {
            Ok(memberships) => {
                let count = memberships.len();
                if self.dispatch(PermissionsAction::FetchSucceeded {
                    request_id,
                    memberships,
                }) {
                    debug!(tenant = %tenant_slug, request = %request_id, memberships = count, "Membership fetch applied");
                    Ok(self.state.borrow().clone())
                } else {
                    Err(StoreError::Superseded { request_id })
                }
            }
            Err(error) => {
                if self.dispatch(PermissionsAction::FetchFailed {
                    request_id,
                    error: error.clone(),
                }) {
                    debug!(tenant = %tenant_slug, request = %request_id, code = %error.code, "Membership fetch rejected");
                    Err(StoreError::Fetch(error))
                } else {
                    Err(StoreError::Superseded { request_id })
                }
            }
        }
    }
}
