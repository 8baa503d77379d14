// Session cookie store
// Decision: Stateless; the cookie is the only copy of the session
// Decision: HttpOnly, SameSite=Lax, Path=/, Secure only in production
// Decision: Max-Age mirrors the codec TTL so browser and server expire together

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use vitrine_core::{AuthError, Principal, SessionCodec, SESSION_COOKIE_NAME};

#[derive(Clone, Debug)]
pub struct SessionCookies {
    name: &'static str,
    secure: bool,
    codec: SessionCodec,
}

impl SessionCookies {
    pub fn new(codec: SessionCodec, secure: bool) -> Self {
        Self {
            name: SESSION_COOKIE_NAME,
            secure,
            codec,
        }
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    /// Encode the principal and attach it to the response jar
    pub fn issue(&self, jar: CookieJar, principal: &Principal) -> Result<CookieJar, AuthError> {
        let token = self.codec.encode(principal)?;
        let max_age = i64::try_from(self.codec.ttl().as_secs()).unwrap_or(i64::MAX);

        let cookie = Cookie::build((self.name, token))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(max_age));

        Ok(jar.add(cookie))
    }

    /// Raw token from the request, if any
    pub fn read(&self, jar: &CookieJar) -> Option<String> {
        jar.get(self.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Delete the session cookie; a jar without one is left untouched
    pub fn revoke(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build(self.name).path("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};
    use axum::response::IntoResponse;
    use vitrine_core::{SessionFormat, DEFAULT_SESSION_TTL};

    fn cookies(secure: bool) -> SessionCookies {
        SessionCookies::new(
            SessionCodec::new(DEFAULT_SESSION_TTL, SessionFormat::Plain),
            secure,
        )
    }

    fn jar_with(cookie: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        CookieJar::from_headers(&headers)
    }

    fn set_cookie_headers(jar: CookieJar) -> Vec<String> {
        let response = jar.into_response();
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_issue_sets_flags() {
        let principal = Principal::company("U1", "loja@example.com", Some("C1".to_string()));
        let jar = cookies(false).issue(CookieJar::new(), &principal).unwrap();

        let headers = set_cookie_headers(jar);
        assert_eq!(headers.len(), 1);
        let header = &headers[0];
        assert!(header.starts_with("user_session="));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=604800"));
        assert!(header.contains("SameSite=Lax"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn test_issue_secure_in_production() {
        let principal = Principal::admin("U2", "admin@example.com");
        let jar = cookies(true).issue(CookieJar::new(), &principal).unwrap();
        assert!(set_cookie_headers(jar)[0].contains("Secure"));
    }

    #[test]
    fn test_issued_token_decodes() {
        let store = cookies(false);
        let principal = Principal::company("U1", "loja@example.com", Some("C1".to_string()));
        let jar = store.issue(CookieJar::new(), &principal).unwrap();

        let token = store.read(&jar).unwrap();
        assert_eq!(store.codec().decode(&token).unwrap(), principal);
    }

    #[test]
    fn test_read_is_pure() {
        let store = cookies(false);
        assert_eq!(store.read(&CookieJar::new()), None);
        assert_eq!(store.read(&jar_with("user_session=")), None);

        let jar = jar_with("other=1; user_session=abc");
        assert_eq!(store.read(&jar).as_deref(), Some("abc"));
        assert_eq!(store.read(&jar).as_deref(), Some("abc"));
        assert!(set_cookie_headers(jar).is_empty());
    }

    #[test]
    fn test_revoke_present_session() {
        let store = cookies(false);
        let jar = store.revoke(jar_with("user_session=abc"));

        let headers = set_cookie_headers(jar);
        assert_eq!(headers.len(), 1);
        assert!(headers[0].starts_with("user_session="));
        assert!(headers[0].contains("Max-Age=0"));
        assert!(headers[0].contains("Path=/"));
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let store = cookies(false);

        let absent = store.revoke(CookieJar::new());
        assert!(set_cookie_headers(absent).is_empty());

        let once = store.revoke(jar_with("user_session=abc"));
        let twice = store.revoke(store.revoke(jar_with("user_session=abc")));
        assert_eq!(set_cookie_headers(once), set_cookie_headers(twice));
    }
}
