//! Session Resolver — turns the caller's session into a canonical `User`.
//!
//! Flow: current_session (bounded by timeout) → identity check → get_user_by_id.
//! Exactly one directory lookup per activation.

pub mod auth_client;

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::{CollaboratorError, DashboardError};
use crate::models::user::User;

/// The signed-in principal as reported by the auth service.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Session {
    /// The directory key for this session, if it carries a usable one.
    pub fn identity(&self) -> Option<&str> {
        self.phone_number
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns `Ok(None)` when the bearer does not map to a live session.
    async fn current_session(
        &self,
        bearer: Option<&str>,
    ) -> Result<Option<Session>, CollaboratorError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user_by_id(&self, user_id: &str) -> Result<User, CollaboratorError>;
}

/// Permission lookup, answered synchronously from the current session.
pub trait PermissionChecker: Send + Sync {
    fn has_any_permission(&self, names: &[&str]) -> bool;
}

/// Permissions granted to one session.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet(HashSet<String>);

impl PermissionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }
}

impl PermissionChecker for PermissionSet {
    fn has_any_permission(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.0.contains(*name))
    }
}

/// Output of a successful resolution.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub user: User,
    pub permissions: PermissionSet,
}

/// Resolves the caller to a `User`.
///
/// A session call that fails or outlives `timeout` counts as no session. The
/// timeout keeps its own error variant so callers can log it apart, but it
/// reads to the user exactly like being signed out.
pub async fn resolve_user(
    sessions: &dyn SessionProvider,
    directory: &dyn UserDirectory,
    bearer: Option<&str>,
    timeout: Duration,
) -> Result<ResolvedSession, DashboardError> {
    let session = match tokio::time::timeout(timeout, sessions.current_session(bearer)).await {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => {
            warn!("Session lookup failed, treating as signed out: {e}");
            None
        }
        Err(_) => {
            warn!("Session lookup exceeded {}ms", timeout.as_millis());
            return Err(DashboardError::SessionTimeout);
        }
    };

    let Some(session) = session else {
        return Err(DashboardError::NotSignedIn);
    };
    let Some(user_id) = session.identity() else {
        info!("Session carries no identity key");
        return Err(DashboardError::NotSignedIn);
    };

    let user = directory.get_user_by_id(user_id).await.map_err(|e| {
        warn!("User lookup for {user_id} failed: {e}");
        DashboardError::UserLookupFailed
    })?;

    info!(
        "Resolved user {} with role {}",
        user.user_id,
        user.role_id.as_str()
    );
    Ok(ResolvedSession {
        user,
        permissions: PermissionSet::new(session.permissions),
    })
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// What the fake session provider does when called.
    pub enum SessionBehavior {
        Returns(Option<Session>),
        Fails,
        Hangs,
    }

    pub struct FakeSessions(pub SessionBehavior);

    #[async_trait]
    impl SessionProvider for FakeSessions {
        async fn current_session(
            &self,
            _bearer: Option<&str>,
        ) -> Result<Option<Session>, CollaboratorError> {
            match &self.0 {
                SessionBehavior::Returns(session) => Ok(session.clone()),
                SessionBehavior::Fails => Err(CollaboratorError::Status {
                    status: 503,
                    message: "auth unavailable".to_string(),
                }),
                SessionBehavior::Hangs => std::future::pending().await,
            }
        }
    }

    pub struct FakeDirectory {
        pub user: Option<User>,
        pub lookups: AtomicUsize,
    }

    impl FakeDirectory {
        pub fn with(user: Option<User>) -> Self {
            Self {
                user,
                lookups: AtomicUsize::new(0),
            }
        }

        pub fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserDirectory for FakeDirectory {
        async fn get_user_by_id(&self, user_id: &str) -> Result<User, CollaboratorError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.user
                .clone()
                .filter(|u| u.user_id == user_id)
                .ok_or_else(|| CollaboratorError::NotFound(format!("user {user_id}")))
        }
    }

    /// Provider that always answers with a session for `phone`.
    pub fn signed_in(phone: &str, permissions: &[&str]) -> FakeSessions {
        FakeSessions(SessionBehavior::Returns(Some(session(phone, permissions))))
    }

    pub fn session(phone: &str, permissions: &[&str]) -> Session {
        Session {
            phone_number: Some(phone.to_string()),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn user(id: &str, role: &str) -> User {
        User {
            user_id: id.to_string(),
            role_id: role.to_string().into(),
            name: None,
            assigned_states: None,
            assigned_districts: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::*;
    use super::*;
    use crate::models::user::Role;

    const TIMEOUT: Duration = Duration::from_millis(8000);

    #[tokio::test]
    async fn test_resolves_user_and_permissions() {
        let sessions = signed_in("555", &["CanViewInspection"]);
        let directory = FakeDirectory::with(Some(user("555", "AVO")));

        let resolved = resolve_user(&sessions, &directory, Some("tok"), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(resolved.user.role_id, Role::Avo);
        let perms = &resolved.permissions;
        assert!(perms.has_any_permission(&["CanViewInspection"]));
        assert_eq!(directory.lookups(), 1);
    }

    #[tokio::test]
    async fn test_null_session_is_not_signed_in() {
        let sessions = FakeSessions(SessionBehavior::Returns(None));
        let directory = FakeDirectory::with(Some(user("555", "AVO")));

        let err = resolve_user(&sessions, &directory, None, TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err, DashboardError::NotSignedIn);
        assert_eq!(directory.lookups(), 0);
    }

    #[tokio::test]
    async fn test_blank_identity_is_not_signed_in() {
        let sessions = signed_in("  ", &[]);
        let directory = FakeDirectory::with(None);

        let err = resolve_user(&sessions, &directory, Some("tok"), TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err, DashboardError::NotSignedIn);
        assert_eq!(directory.lookups(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_treated_as_signed_out() {
        let sessions = FakeSessions(SessionBehavior::Fails);
        let directory = FakeDirectory::with(Some(user("555", "AVO")));

        let err = resolve_user(&sessions, &directory, Some("tok"), TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err, DashboardError::NotSignedIn);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_session_times_out_and_reads_as_signed_out() {
        let sessions = FakeSessions(SessionBehavior::Hangs);
        let directory = FakeDirectory::with(Some(user("555", "AVO")));

        let started = tokio::time::Instant::now();
        let err = resolve_user(&sessions, &directory, Some("tok"), TIMEOUT)
            .await
            .unwrap_err();
        assert!(started.elapsed() >= TIMEOUT);
        assert_eq!(err, DashboardError::SessionTimeout);
        assert_eq!(
            err.user_message(),
            DashboardError::NotSignedIn.user_message()
        );
        assert_eq!(directory.lookups(), 0);
    }

    #[tokio::test]
    async fn test_directory_failure_reports_user_lookup() {
        let sessions = signed_in("777", &[]);
        let directory = FakeDirectory::with(Some(user("555", "AVO")));

        let err = resolve_user(&sessions, &directory, Some("tok"), TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err, DashboardError::UserLookupFailed);
        assert_eq!(directory.lookups(), 1);
    }

    #[test]
    fn test_permission_set_matches_any() {
        let perms = PermissionSet::new(["CanEditQualityControl"]);
        let asked = ["CanViewQualityControl", "CanEditQualityControl"];
        assert!(perms.has_any_permission(&asked));
        assert!(!perms.has_any_permission(&["CanViewFinalReport"]));
        assert!(!perms.has_any_permission(&[]));
    }
}
