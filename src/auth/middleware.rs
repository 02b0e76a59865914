use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::auth::cookie::CookieCodec;
use crate::auth::store::Role;
use crate::error::ApiError;
use crate::state::AppState;

/// Request-scoped identity set by [`require_authenticated`]. Carries only
/// what downstream handlers need; email and password hash stay behind the
/// storage boundary.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub name: String,
    pub role: Role,
}

/// The session backing the current request, set by [`require_authenticated`].
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub id: String,
    pub expires_at: time::OffsetDateTime,
}

/// Set-Cookie headers are appended, never inserted: one response may clear a
/// stale cookie and re-issue a new one.
fn append_set_cookie(headers: &mut HeaderMap, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.append(SET_COOKIE, v);
        }
        Err(e) => error!(error = %e, "unserializable Set-Cookie value"),
    }
}

/// Place a guard's Set-Cookie ahead of any the downstream handler set.
/// Clients honor the last same-name Set-Cookie, so the handler's cookie
/// (a fresh session on log-in, a clearing blank on log-out) must win over
/// the guard's.
fn prepend_set_cookie(headers: &mut HeaderMap, value: &str) {
    let downstream: Vec<HeaderValue> = headers.get_all(SET_COOKIE).iter().cloned().collect();
    headers.remove(SET_COOKIE);
    append_set_cookie(headers, value);
    for v in downstream {
        headers.append(SET_COOKIE, v);
    }
}

/// Guard for routes that need a logged-in user. Resolves the session cookie,
/// sets [`CurrentUser`] and [`CurrentSession`] on the request, and re-issues
/// the cookie when validation rotated the session. A request with no valid
/// session is terminated with 401; if it presented a stale cookie, a blank
/// cookie is appended so the client drops it.
pub async fn require_authenticated(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let codec = state.cookies();
    let Some(session_id) = CookieCodec::read_session_id(req.headers()).map(str::to_owned)
    else {
        return ApiError::Unauthorized.into_response();
    };

    match state.sessions().validate_session(&session_id).await {
        Err(e) => ApiError::from(e).into_response(),
        Ok(None) => {
            warn!("request with invalid session cookie");
            let mut res = ApiError::Unauthorized.into_response();
            append_set_cookie(res.headers_mut(), &codec.blank_cookie());
            res
        }
        Ok(Some((session, user))) => {
            let fresh = session.fresh;
            let reissued = codec.session_cookie(&session.id);
            req.extensions_mut().insert(CurrentUser {
                id: user.id,
                name: user.name,
                role: user.role,
            });
            req.extensions_mut().insert(CurrentSession {
                id: session.id,
                expires_at: session.expires_at,
            });
            let mut res = next.run(req).await;
            if fresh {
                prepend_set_cookie(res.headers_mut(), &reissued);
            }
            res
        }
    }
}

/// Guard for admin-only routes. Must run after [`require_authenticated`],
/// which provides the identity it checks.
pub async fn require_admin(req: Request, next: Next) -> Response {
    match req.extensions().get::<CurrentUser>() {
        Some(user) if user.role == Role::Admin => next.run(req).await,
        _ => ApiError::Forbidden.into_response(),
    }
}

/// Guard for entry routes (sign-up, log-in) that make no sense for a
/// logged-in user. Anonymous requests pass; a stale cookie is cleared and
/// treated as anonymous; a valid session terminates the request with 400.
/// A UX guard, not a security boundary.
pub async fn reject_if_already_authenticated(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(session_id) = CookieCodec::read_session_id(req.headers()).map(str::to_owned)
    else {
        return next.run(req).await;
    };

    match state.sessions().validate_session(&session_id).await {
        Err(e) => ApiError::from(e).into_response(),
        Ok(None) => {
            let mut res = next.run(req).await;
            prepend_set_cookie(res.headers_mut(), &state.cookies().blank_cookie());
            res
        }
        Ok(Some(_)) => {
            ApiError::Validation("You are already logged in.".to_string()).into_response()
        }
    }
}
