use axum::http::{header, HeaderMap};

use crate::auth::session::SESSION_LIFETIME;

/// Name of the session cookie. The value is the opaque session id, nothing
/// else; all session state lives server side.
pub const SESSION_COOKIE_NAME: &str = "auth_session";

/// Builds and reads session cookies, independent of the routing framework.
/// `secure` is false only in local development so the cookie works over
/// plain http.
#[derive(Debug, Clone, Copy)]
pub struct CookieCodec {
    secure: bool,
}

impl CookieCodec {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    fn secure_suffix(&self) -> &'static str {
        if self.secure {
            "; Secure"
        } else {
            ""
        }
    }

    /// Set-Cookie value carrying a session id.
    pub fn session_cookie(&self, session_id: &str) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
            SESSION_COOKIE_NAME,
            session_id,
            SESSION_LIFETIME.whole_seconds(),
            self.secure_suffix(),
        )
    }

    /// Set-Cookie value that clears the session cookie: empty value and
    /// immediate expiry, so the client discards it.
    pub fn blank_cookie(&self) -> String {
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{}",
            SESSION_COOKIE_NAME,
            self.secure_suffix(),
        )
    }

    /// Extract the session id from a request's Cookie header, if any.
    pub fn read_session_id(headers: &HeaderMap) -> Option<&str> {
        let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
        for part in cookie_header.split(';') {
            let part = part.trim();
            if let Some((key, value)) = part.split_once('=') {
                if key.trim() == SESSION_COOKIE_NAME {
                    return Some(value.trim());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_cookie_carries_the_id_and_attributes() {
        let codec = CookieCodec::new(false);
        let value = codec.session_cookie("abc123");
        assert!(value.starts_with("auth_session=abc123;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Path=/"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn secure_attribute_outside_local_dev() {
        let codec = CookieCodec::new(true);
        assert!(codec.session_cookie("abc123").ends_with("; Secure"));
        assert!(codec.blank_cookie().ends_with("; Secure"));
    }

    #[test]
    fn blank_cookie_is_empty_and_expired() {
        let codec = CookieCodec::new(false);
        let value = codec.blank_cookie();
        assert!(value.starts_with("auth_session=;"));
        assert!(value.contains("Max-Age=0"));
    }

    #[test]
    fn reads_session_id_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth_session=tok42; lang=rw"),
        );
        assert_eq!(CookieCodec::read_session_id(&headers), Some("tok42"));
    }

    #[test]
    fn missing_cookie_reads_as_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(CookieCodec::read_session_id(&headers), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(CookieCodec::read_session_id(&headers), None);
    }
}
