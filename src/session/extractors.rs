use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use tracing::{debug, warn};

use super::{SessionId, SESSION_HEADER};
use crate::{error::ApiError, state::AppState};

/// Session for read routes. Absent sessions stay absent: reads never provision.
pub struct MaybeSession(pub Option<SessionId>);

/// Session for routes that must not run without one.
pub struct RequireSession(pub SessionId);

/// Session for create: an absent session is issued on the spot and `issued`
/// tells the handler to send it back as a cookie.
pub struct ProvisionSession {
    pub session: SessionId,
    pub issued: bool,
}

/// Header first, then the session cookie.
fn resolve(parts: &Parts, state: &AppState) -> Option<SessionId> {
    let raw = match parts.headers.get(SESSION_HEADER).and_then(|h| h.to_str().ok()) {
        Some(header) => header.to_owned(),
        None => CookieJar::from_headers(&parts.headers)
            .get(&state.config.session.cookie_name)?
            .value()
            .to_owned(),
    };

    let session = state.sessions.verify(&raw);
    if session.is_none() {
        warn!("session token rejected");
    }
    session
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(resolve(parts, state)))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequireSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .map(RequireSession)
            .ok_or(ApiError::MissingSession)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ProvisionSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = resolve(parts, state) {
            return Ok(ProvisionSession {
                session,
                issued: false,
            });
        }
        let session = state.sessions.issue();
        debug!(session_id = %session, "session issued");
        Ok(ProvisionSession {
            session,
            issued: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/meals");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn header_wins_over_cookie() {
        let state = AppState::fake();
        let mut p = parts(&[("session-id", "from-header"), ("cookie", "sessionId=from-cookie")]);
        let MaybeSession(s) = MaybeSession::from_request_parts(&mut p, &state).await.unwrap();
        assert_eq!(s.unwrap().as_str(), "from-header");
    }

    #[tokio::test]
    async fn cookie_is_used_without_header() {
        let state = AppState::fake();
        let mut p = parts(&[("cookie", "a=b; sessionId=from-cookie")]);
        let MaybeSession(s) = MaybeSession::from_request_parts(&mut p, &state).await.unwrap();
        assert_eq!(s.unwrap().as_str(), "from-cookie");
    }

    #[tokio::test]
    async fn require_rejects_missing_and_blank() {
        let state = AppState::fake();
        let mut p = parts(&[]);
        assert!(matches!(
            RequireSession::from_request_parts(&mut p, &state).await,
            Err(ApiError::MissingSession)
        ));
        let mut p = parts(&[("session-id", "  ")]);
        assert!(RequireSession::from_request_parts(&mut p, &state).await.is_err());
    }

    #[tokio::test]
    async fn provision_issues_only_when_absent() {
        let state = AppState::fake();

        let mut p = parts(&[("session-id", "known")]);
        let got = ProvisionSession::from_request_parts(&mut p, &state).await.unwrap();
        assert!(!got.issued);
        assert_eq!(got.session.as_str(), "known");

        let mut p = parts(&[]);
        let got = ProvisionSession::from_request_parts(&mut p, &state).await.unwrap();
        assert!(got.issued);
        assert!(!got.session.as_str().is_empty());
    }
}
