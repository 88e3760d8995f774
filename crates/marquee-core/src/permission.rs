// ── Permission gate ──
//
// Pure, fail-closed capability checks. Callers pass the session they hold
// (or `None`); nothing here reads ambient state, so the checks are trivial
// to test and cannot panic.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::warn;

use marquee_api::SessionResponse;

/// What a grant allows on a resource.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, EnumIter,
    AsRefStr, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
}

/// A granted `(resource, action)` pair. Resource names are lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Capability {
    pub resource: String,
    pub action: Action,
}

impl Capability {
    pub fn new(resource: &str, action: Action) -> Self {
        Self {
            resource: resource.to_ascii_lowercase(),
            action,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.action)
    }
}

/// Authenticated identity plus its capability set.
///
/// Read-only to everything but the session store: controllers receive
/// `&Session` and never mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub grants: HashSet<Capability>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            name: None,
            grants: HashSet::new(),
            expires_at: None,
        }
    }

    #[must_use]
    pub fn with_grant(mut self, resource: &str, action: Action) -> Self {
        self.grants.insert(Capability::new(resource, action));
        self
    }

    /// Grants sorted for display.
    pub fn sorted_grants(&self) -> Vec<&Capability> {
        let mut grants: Vec<_> = self.grants.iter().collect();
        grants.sort();
        grants
    }
}

impl From<SessionResponse> for Session {
    fn from(resp: SessionResponse) -> Self {
        let grants = resp
            .permissions
            .into_iter()
            .filter_map(|g| match g.action.to_ascii_lowercase().parse::<Action>() {
                Ok(action) => Some(Capability::new(&g.resource, action)),
                Err(_) => {
                    warn!(resource = %g.resource, action = %g.action, "dropping unknown grant action");
                    None
                }
            })
            .collect();

        Self {
            user_id: resp.user.id,
            email: resp.user.email,
            name: resp.user.name,
            grants,
            expires_at: resp.expires_at,
        }
    }
}

// ── Checks ──────────────────────────────────────────────────────────

/// Whether `session` holds `(resource, action)`.
///
/// `false` for a missing session, an unknown action or an unknown resource.
pub fn has_permission(session: Option<&Session>, resource: &str, action: &str) -> bool {
    let Some(session) = session else {
        return false;
    };
    let Ok(action) = action.parse::<Action>() else {
        return false;
    };
    session
        .grants
        .contains(&Capability::new(resource, action))
}

/// Page-level access: the session may at least view `resource`.
pub fn has_page_permission(session: Option<&Session>, resource: &str) -> bool {
    has_permission(session, resource, Action::View.as_ref())
}

/// Outcome of gating a whole entry point.
///
/// A denied page is reported as `NotFound` so callers cannot tell
/// "forbidden" from "does not exist".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    Granted,
    NotFound,
}

pub fn page_access(session: Option<&Session>, resource: &str) -> PageAccess {
    if has_page_permission(session, resource) {
        PageAccess::Granted
    } else {
        PageAccess::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marquee_api::{GrantResponse, SessionUser};

    fn session_with(resource: &str, action: Action) -> Session {
        Session::new("u1", "ops@example.com").with_grant(resource, action)
    }

    #[test]
    fn no_session_denies_everything() {
        assert!(!has_permission(None, "genres", "create"));
        assert!(!has_page_permission(None, "genres"));
        assert_eq!(page_access(None, "genres"), PageAccess::NotFound);
    }

    #[test]
    fn exact_grant_allows() {
        let s = session_with("genres", Action::Create);
        assert!(has_permission(Some(&s), "genres", "create"));
    }

    #[test]
    fn view_grant_does_not_imply_create() {
        let s = session_with("genres", Action::View);
        assert!(!has_permission(Some(&s), "genres", "create"));
        assert!(has_page_permission(Some(&s), "genres"));
    }

    #[test]
    fn unknown_resource_or_action_is_denied() {
        let s = session_with("genres", Action::View);
        assert!(!has_permission(Some(&s), "batches", "view"));
        assert!(!has_permission(Some(&s), "genres", "publish"));
        assert!(!has_permission(Some(&s), "genres", ""));
    }

    #[test]
    fn page_without_any_grant_is_not_found() {
        let s = session_with("movies", Action::Delete);
        assert_eq!(page_access(Some(&s), "genres"), PageAccess::NotFound);
        // A mutation grant alone does not open the page either.
        assert_eq!(page_access(Some(&s), "movies"), PageAccess::NotFound);
    }

    #[test]
    fn session_response_grants_are_normalized() {
        let resp = SessionResponse {
            user: SessionUser {
                id: "u1".into(),
                email: "ops@example.com".into(),
                name: None,
            },
            permissions: vec![
                GrantResponse {
                    resource: "Genres".into(),
                    action: "VIEW".into(),
                },
                GrantResponse {
                    resource: "genres".into(),
                    action: "archive".into(),
                },
            ],
            expires_at: None,
        };
        let session = Session::from(resp);
        assert_eq!(session.grants.len(), 1);
        assert!(has_page_permission(Some(&session), "genres"));
    }
}
