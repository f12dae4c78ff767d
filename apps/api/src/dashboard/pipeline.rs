//! Dashboard pipeline — one activation of the dashboard view.
//!
//! Flow: resolve_user → select_query → fetch_for_intent → visible_claims →
//!       filters. Stages run strictly in order; each is awaited before the
//!       next starts. Cancelling the token abandons whatever is in flight.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::dashboard::filters::FilterState;
use crate::dashboard::query::{fetch_for_intent, select_query, ValuationSource};
use crate::dashboard::visibility::visible_claims;
use crate::errors::DashboardError;
use crate::models::user::User;
use crate::models::valuation::Valuation;
use crate::session::{resolve_user, SessionProvider, UserDirectory};

/// External services one activation talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub sessions: Arc<dyn SessionProvider>,
    pub users: Arc<dyn UserDirectory>,
    pub valuations: Arc<dyn ValuationSource>,
    pub session_timeout: Duration,
}

/// Render-ready state of the dashboard after one activation.
#[derive(Debug, Clone)]
pub struct DashboardView {
    /// Every case the user may see, newest first.
    pub claims: Vec<Valuation>,
    /// `claims` narrowed by `filters`.
    pub filtered_claims: Vec<Valuation>,
    pub loading: bool,
    pub error: Option<DashboardError>,
    pub current_user: Option<User>,
    pub filters: FilterState,
    pub now: DateTime<Utc>,
}

impl DashboardView {
    fn empty(filters: FilterState, now: DateTime<Utc>) -> Self {
        Self {
            claims: Vec::new(),
            filtered_claims: Vec::new(),
            loading: true,
            error: None,
            current_user: None,
            filters,
            now,
        }
    }

    /// Runs the pipeline for one activation. Returns `None` when `cancel`
    /// fires before the pipeline settles.
    pub async fn activate(
        collaborators: &Collaborators,
        bearer: Option<&str>,
        filters: FilterState,
        cancel: &CancellationToken,
    ) -> Option<Self> {
        let mut view = Self::empty(filters, Utc::now());
        let settled = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = view.load(collaborators, bearer) => true,
        };
        if !settled {
            info!("Dashboard activation cancelled");
            return None;
        }
        view.loading = false;
        Some(view)
    }

    async fn load(&mut self, collaborators: &Collaborators, bearer: Option<&str>) {
        let resolved = match resolve_user(
            collaborators.sessions.as_ref(),
            collaborators.users.as_ref(),
            bearer,
            collaborators.session_timeout,
        )
        .await
        {
            Ok(resolved) => resolved,
            Err(e) => {
                self.error = Some(e);
                return;
            }
        };

        let intent = select_query(&resolved.user);
        self.current_user = Some(resolved.user);

        let raw = match fetch_for_intent(collaborators.valuations.as_ref(), &intent).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Valuation fetch via {} failed: {e}", intent.label());
                self.error = Some(DashboardError::ValuationFetchFailed);
                return;
            }
        };

        let fetched = raw.len();
        self.claims = visible_claims(raw, &resolved.permissions, self.now);
        info!(
            "Dashboard ready: {} of {} valuations visible",
            self.claims.len(),
            fetched
        );
        self.apply_filter();
    }

    pub fn apply_filter(&mut self) {
        self.filtered_claims = self.filters.apply(&self.claims, self.now);
    }

    pub fn set_status_filter(&mut self, status: &str) {
        self.filters.toggle_status(status);
        self.apply_filter();
    }

    pub fn set_date_filter(&mut self, date: Option<NaiveDate>) {
        self.filters.set_date(date);
        self.apply_filter();
    }
}

/// Registry key for one session: the SHA-256 digest of its bearer token.
/// Tabs that share a token share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey([u8; 32]);

impl SessionKey {
    pub fn from_bearer(token: &str) -> Self {
        Self(Sha256::digest(token.as_bytes()).into())
    }
}

type Registrations = HashMap<SessionKey, (u64, CancellationToken)>;

/// In-flight activations keyed by session. Only the newest activation for a
/// key is honoured; starting another cancels the previous one.
#[derive(Default)]
pub struct ActiveViews {
    inner: Mutex<Registrations>,
    next_generation: AtomicU64,
}

impl ActiveViews {
    pub fn begin(self: &Arc<Self>, key: SessionKey) -> Activation {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let previous = self.lock().insert(key, (generation, token.clone()));
        if let Some((_, previous)) = previous {
            info!("Superseding in-flight dashboard activation");
            previous.cancel();
        }
        Activation {
            registry: Some((Arc::clone(self), key, generation)),
            token,
        }
    }

    /// Drops the registration if it is still the newest for its key.
    fn finish(&self, key: &SessionKey, generation: u64) {
        let mut map = self.lock();
        let current = map.get(key).map(|(current, _)| *current);
        if current == Some(generation) {
            map.remove(key);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registrations> {
        // A poisoned map only holds tokens; keep serving.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
impl ActiveViews {
    fn in_flight(&self) -> usize {
        self.lock().len()
    }
}

/// Lifetime of one activation. Dropping it (request finished or abandoned)
/// cancels the token and releases the registration.
pub struct Activation {
    registry: Option<(Arc<ActiveViews>, SessionKey, u64)>,
    token: CancellationToken,
}

impl Activation {
    /// An activation no later request can supersede.
    pub fn detached() -> Self {
        Self {
            registry: None,
            token: CancellationToken::new(),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for Activation {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some((views, key, generation)) = &self.registry {
            views.finish(key, *generation);
        }
    }
}
