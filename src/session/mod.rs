use std::fmt;

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;
use uuid::Uuid;

use crate::config::SessionConfig;

pub(crate) mod extractors;

pub use extractors::{MaybeSession, ProvisionSession, RequireSession};

/// Header carrying the session identifier on every request.
pub const SESSION_HEADER: &str = "session-id";

/// Opaque identifier of a meal collection. The only access-control boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns presented tokens into sessions and mints new ones.
///
/// Swap the implementation in `AppState` to put real verification (signed
/// cookies, expiry) in front of the meal handlers.
pub trait SessionIdentity: Send + Sync {
    fn verify(&self, raw: &str) -> Option<SessionId>;
    fn issue(&self) -> SessionId;
}

/// Trusts any non-empty token; issues random UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueSessions;

impl SessionIdentity for OpaqueSessions {
    fn verify(&self, raw: &str) -> Option<SessionId> {
        SessionId::parse(raw)
    }

    fn issue(&self) -> SessionId {
        SessionId(Uuid::new_v4().to_string())
    }
}

/// Cookie handing a freshly issued session to the client.
pub fn session_cookie(cfg: &SessionConfig, session: &SessionId) -> Cookie<'static> {
    Cookie::build((cfg.cookie_name.clone(), session.as_str().to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(cfg.max_age_days))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_rejects_blank() {
        assert_eq!(SessionId::parse("  abc ").unwrap().as_str(), "abc");
        assert!(SessionId::parse("").is_none());
        assert!(SessionId::parse("   ").is_none());
    }

    #[test]
    fn opaque_sessions_issue_distinct_uuids() {
        let ids = OpaqueSessions;
        let a = ids.issue();
        let b = ids.issue();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
        assert_eq!(ids.verify(a.as_str()), Some(a));
    }

    #[test]
    fn session_cookie_attributes() {
        let cfg = SessionConfig {
            cookie_name: "sessionId".into(),
            max_age_days: 7,
        };
        let cookie = session_cookie(&cfg, &SessionId::parse("s1").unwrap());
        assert_eq!(cookie.name(), "sessionId");
        assert_eq!(cookie.value(), "s1");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));

        let header = cookie.to_string();
        assert!(header.starts_with("sessionId=s1;"));
        assert!(header.contains("Max-Age=604800"));
    }
}
