use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::organization::{organization_guard, Verdict};
use crate::auth::{ResolvedIdentity, SessionStore, SIGN_IN_PATH};
use crate::state::AppState;

/// Decision for one page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Proceed(ResolvedIdentity),
    Redirect(&'static str),
}

/// Run the page gate: token check, fresh identity read, then the organization guard.
///
/// Every failure resolves to a redirect; nothing here produces an error response.
pub async fn gate(sessions: &SessionStore, headers: &HeaderMap, path: &str) -> Gate {
    let Some(claims) = sessions.read_claims(headers) else {
        tracing::debug!("Gate: no valid session for {}, redirecting to sign-in", path);
        return Gate::Redirect(SIGN_IN_PATH);
    };

    let Some(identity) = sessions.resolve_claims(&claims).await else {
        return Gate::Redirect(SIGN_IN_PATH);
    };

    match organization_guard(Some(&identity), path) {
        Verdict::Redirect(target) => {
            tracing::debug!(
                "Gate: user {} has no organization, redirecting from {}",
                identity.id,
                path
            );
            Gate::Redirect(target)
        }
        // NoVerdict cannot happen with an identity; treat it as proceed
        Verdict::Proceed | Verdict::NoVerdict => Gate::Proceed(identity),
    }
}

/// Middleware guarding server-rendered pages.
///
/// `/api` paths pass straight through; they authenticate per handler and
/// answer 401 instead of redirecting.
pub async fn gatekeeper(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if is_api_path(&path) {
        return next.run(request).await;
    }

    match gate(&state.sessions, request.headers(), &path).await {
        Gate::Proceed(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Gate::Redirect(target) => Redirect::temporary(target).into_response(),
    }
}

fn is_api_path(path: &str) -> bool {
    path == "/api" || path.starts_with("/api/")
}
