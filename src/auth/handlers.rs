use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    middleware,
    response::AppendHeaders,
    routing::{get, post},
    Extension, Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{IdentityResponse, LogInRequest, MessageResponse, SignUpRequest},
        middleware::{
            reject_if_already_authenticated, require_authenticated, CurrentSession, CurrentUser,
        },
        password::{hash_password, verify_password},
        store::NewUser,
    },
    error::ApiError,
    ids::generate_id,
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn router(state: &AppState) -> Router<AppState> {
    let entry = Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/log-in", post(log_in))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            reject_if_already_authenticated,
        ));

    let protected = Router::new()
        .route("/auth/log-out", post(log_out))
        .route("/auth/log-out-everywhere", post(log_out_everywhere))
        .route("/auth/me", get(me))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_authenticated,
        ));

    Router::new().merge(entry).merge(protected)
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(mut payload): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!("sign-up with invalid email");
        return Err(ApiError::Validation("Invalid email.".into()));
    }
    if payload.password.len() < 8 {
        warn!("sign-up with too short a password");
        return Err(ApiError::Validation(
            "Password must be at least 8 characters long.".into(),
        ));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Name is required.".into()));
    }

    if state.store.find_user_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "sign-up with already registered email");
        return Err(ApiError::Conflict("Email already registered.".into()));
    }

    let hash = hash_password(&payload.password).map_err(ApiError::Internal)?;

    let user = state
        .store
        .create_user(NewUser {
            id: generate_id("usr"),
            name: payload.name,
            given_name: payload.given_name,
            surname: payload.surname,
            email: payload.email,
            hashed_password: Some(hash),
        })
        .await?;

    info!(user_id = %user.id, "user signed up");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Account created successfully. Please check your email to verify your account.",
        )),
    ))
}

#[instrument(skip(state, payload))]
pub async fn log_in(
    State(state): State<AppState>,
    Json(mut payload): Json<LogInRequest>,
) -> Result<
    (
        AppendHeaders<[(axum::http::HeaderName, String); 1]>,
        Json<MessageResponse>,
    ),
    ApiError,
> {
    payload.email = payload.email.trim().to_lowercase();

    // One generic failure for unknown email, missing local password and wrong
    // password, so responses carry no email-exists oracle.
    let invalid = || ApiError::Validation("Invalid credentials.".into());

    let user = state
        .store
        .find_user_by_email(&payload.email)
        .await?
        .ok_or_else(|| {
            warn!("log-in with unknown email");
            invalid()
        })?;

    let Some(hash) = user.hashed_password.as_deref() else {
        warn!(user_id = %user.id, "log-in against user without local password");
        return Err(invalid());
    };

    if !verify_password(&payload.password, hash) {
        warn!(user_id = %user.id, "log-in with wrong password");
        return Err(invalid());
    }

    let session = state.sessions().create_session(&user.id).await?;
    let cookie = state.cookies().session_cookie(&session.id);

    info!(user_id = %user.id, "user logged in");
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(MessageResponse::new("Logged in successfully.")),
    ))
}

#[instrument(skip(state, session))]
pub async fn log_out(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<
    (
        AppendHeaders<[(axum::http::HeaderName, String); 1]>,
        Json<MessageResponse>,
    ),
    ApiError,
> {
    state.sessions().invalidate_session(&session.id).await?;
    info!("user logged out");
    Ok((
        AppendHeaders([(SET_COOKIE, state.cookies().blank_cookie())]),
        Json(MessageResponse::new("Logged out successfully.")),
    ))
}

#[instrument(skip(state, user))]
pub async fn log_out_everywhere(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<
    (
        AppendHeaders<[(axum::http::HeaderName, String); 1]>,
        Json<MessageResponse>,
    ),
    ApiError,
> {
    state
        .sessions()
        .invalidate_all_sessions_for_user(&user.id)
        .await?;
    info!(user_id = %user.id, "user logged out everywhere");
    Ok((
        AppendHeaders([(SET_COOKIE, state.cookies().blank_cookie())]),
        Json(MessageResponse::new("Logged out everywhere.")),
    ))
}

#[instrument(skip(user))]
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        id: user.id,
        name: user.name,
        role: user.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("a@example.com"));
        assert!(is_valid_email("umwana.w.umuhanga@ibimanuka.rw"));
    }

    #[test]
    fn email_validation_rejects_garbage() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email(""));
    }
}
