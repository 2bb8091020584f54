use axum::http::{header, HeaderMap};
use chrono::Duration;
use cookie::{Cookie, SameSite};
use std::sync::Arc;

use super::identity::ResolvedIdentity;
use super::token::{Claims, SessionUser, TokenCodec, TokenError};
use crate::database::models::User;
use crate::database::Directory;

pub const SESSION_COOKIE: &str = "session-token";

/// How long a session lasts, for both the token `exp` and the cookie `Max-Age`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLifetime {
    /// 24 hours
    Standard,
    /// 30 days ("remember me")
    Remembered,
}

impl SessionLifetime {
    pub fn from_remember(remember: bool) -> Self {
        if remember {
            SessionLifetime::Remembered
        } else {
            SessionLifetime::Standard
        }
    }

    pub fn max_age_secs(self) -> i64 {
        match self {
            SessionLifetime::Standard => 24 * 60 * 60,
            SessionLifetime::Remembered => 30 * 24 * 60 * 60,
        }
    }

    pub fn ttl(self) -> Duration {
        Duration::seconds(self.max_age_secs())
    }
}

/// Reads and writes the session cookie and resolves it to an identity
#[derive(Clone)]
pub struct SessionStore {
    codec: TokenCodec,
    directory: Arc<dyn Directory>,
    secure: bool,
}

impl SessionStore {
    pub fn new(codec: TokenCodec, directory: Arc<dyn Directory>, secure: bool) -> Self {
        Self {
            codec,
            directory,
            secure,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Issue a token for `user` and wrap it in the session cookie
    pub fn create_session(
        &self,
        user: &User,
        lifetime: SessionLifetime,
    ) -> Result<Cookie<'static>, TokenError> {
        let claims = SessionUser {
            id: user.id,
            email: Some(user.email.clone()),
            name: user.name.clone(),
            org_id: user.org_id,
        };
        let token = self.codec.issue(&claims, lifetime.ttl())?;
        Ok(self.session_cookie(token, lifetime.max_age_secs()))
    }

    /// Removal cookie for the session. Safe to send when no session exists.
    pub fn clear_session(&self) -> Cookie<'static> {
        let mut cookie = self.session_cookie(String::new(), 0);
        cookie.make_removal();
        cookie
    }

    /// Raw session cookie value, if the request carries one
    pub fn session_token(headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
    }

    /// Verified claims without consulting the directory
    pub fn read_claims(&self, headers: &HeaderMap) -> Option<Claims> {
        let token = Self::session_token(headers)?;
        self.codec.verify(&token).ok()
    }

    /// Current identity for the request, re-read from the directory.
    ///
    /// Missing cookie, bad token, deleted user and lookup failures all come back
    /// as `None`.
    pub async fn get_session(&self, headers: &HeaderMap) -> Option<ResolvedIdentity> {
        let claims = self.read_claims(headers)?;
        self.resolve_claims(&claims).await
    }

    pub async fn resolve_claims(&self, claims: &Claims) -> Option<ResolvedIdentity> {
        match self.directory.find_user_by_id(claims.user.id).await {
            Ok(Some(user)) => Some(ResolvedIdentity::from(&user)),
            Ok(None) => {
                tracing::debug!("Session refers to missing user {}", claims.user.id);
                None
            }
            Err(e) => {
                tracing::error!("Failed to resolve session for user {}: {}", claims.user.id, e);
                None
            }
        }
    }

    fn session_cookie(&self, value: String, max_age_secs: i64) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .path("/")
            .max_age(cookie::time::Duration::seconds(max_age_secs))
            .build()
    }
}
