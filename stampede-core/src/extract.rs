//! Page-data extraction
//!
//! The bootstrap sequence needs two pieces of data that only exist inside
//! rendered HTML: the hidden anti-forgery token on the login page and the
//! session-info blob embedded in the authenticated landing page. The
//! [`PageExtractor`] trait keeps the engine decoupled from the exact markup;
//! [`RegexExtractor`] is the implementation matching the stock web client.

use crate::error::{SessionError, SessionResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Per-user context carried inside the session-info blob
#[derive(Debug, Clone, Deserialize)]
pub struct UserContext {
    pub lang: String,
    pub tz: String,
}

/// Cache-busting hashes published by the server for client resources
#[derive(Debug, Clone, Deserialize)]
pub struct CacheHashes {
    pub load_menus: String,
}

/// The structured session blob embedded in the landing page
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    pub uid: i64,
    pub company_id: i64,
    pub user_context: UserContext,
    pub cache_hashes: CacheHashes,
}

/// Extracts structured data out of rendered pages
pub trait PageExtractor: Send + Sync {
    /// Extract the hidden anti-forgery token from the login page
    fn csrf_token(&self, html: &str) -> SessionResult<String>;

    /// Extract and parse the embedded session-info blob
    fn session_info(&self, html: &str) -> SessionResult<SessionInfo>;
}

static CSRF_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"input type="hidden" name="csrf_token" value="([^"]+)""#)
        .expect("csrf token pattern")
});

static SESSION_INFO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"odoo\.session_info\s*=\s*(\{.*\});").expect("session info pattern")
});

/// Pattern-matching extractor for the stock web client markup
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor;

impl PageExtractor for RegexExtractor {
    fn csrf_token(&self, html: &str) -> SessionResult<String> {
        CSRF_TOKEN_RE
            .captures(html)
            .and_then(|captures| captures.get(1))
            .map(|token| token.as_str().to_string())
            .ok_or_else(|| SessionError::Bootstrap("csrf token not found in login page".into()))
    }

    fn session_info(&self, html: &str) -> SessionResult<SessionInfo> {
        let blob = SESSION_INFO_RE
            .captures(html)
            .and_then(|captures| captures.get(1))
            .map(|blob| blob.as_str())
            .ok_or_else(|| {
                SessionError::Bootstrap("session_info blob not found in landing page".into())
            })?;

        serde_json::from_str(blob).map_err(|e| {
            SessionError::Bootstrap(format!("session_info blob is malformed: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = concat!(
        r#"<form class="oe_login_form" method="post">"#,
        r#"<input type="hidden" name="csrf_token" value="f00dfeed42"/>"#,
        r#"</form>"#
    );

    const LANDING_PAGE: &str = concat!(
        "<script>var odoo = {};\n",
        r#"odoo.session_info = {"uid": 7, "company_id": 1, "#,
        r#""user_context": {"lang": "en_US", "tz": "Europe/Brussels", "uid": 7}, "#,
        r#""cache_hashes": {"load_menus": "4fb40f1", "translations": "99aa00"}};"#,
        "\n</script>"
    );

    #[test]
    fn test_csrf_token_extraction() {
        let token = RegexExtractor.csrf_token(LOGIN_PAGE).unwrap();
        assert_eq!(token, "f00dfeed42");
    }

    #[test]
    fn test_csrf_token_missing() {
        let err = RegexExtractor.csrf_token("<html>no form here</html>");
        assert!(matches!(err, Err(SessionError::Bootstrap(_))));
    }

    #[test]
    fn test_session_info_extraction() {
        let info = RegexExtractor.session_info(LANDING_PAGE).unwrap();
        assert_eq!(info.uid, 7);
        assert_eq!(info.company_id, 1);
        assert_eq!(info.user_context.lang, "en_US");
        assert_eq!(info.user_context.tz, "Europe/Brussels");
        assert_eq!(info.cache_hashes.load_menus, "4fb40f1");
    }

    #[test]
    fn test_session_info_missing() {
        let err = RegexExtractor.session_info("<html></html>");
        assert!(matches!(err, Err(SessionError::Bootstrap(_))));
    }

    #[test]
    fn test_session_info_malformed() {
        let page = "odoo.session_info = {not json at all};";
        let err = RegexExtractor.session_info(page);
        assert!(matches!(err, Err(SessionError::Bootstrap(_))));
    }
}
