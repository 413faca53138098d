//! Anonymous session bootstrap.
//!
//! The homepage sets the `sb` and `fr` cookies and embeds the `datr`
//! anti-automation token and the `lsd` form token. Every later request
//! replays those values. A session is owned by one retrieval call.

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue, REFERER};
use reqwest::redirect::Policy;
use tracing::{debug, info_span};

use crate::config::RetrievalConfig;
use crate::error::{ClientError, Result};
use crate::markup;

/// Site root. Also the bootstrap page.
pub const HOMEPAGE: &str = "https://www.facebook.com";

/// Authenticated session state.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    cookie: HeaderValue,
    lsd: String,
}

impl Session {
    /// Fetch the homepage and harvest cookies and tokens.
    ///
    /// Fails with [`ClientError::Bootstrap`] when `datr` or `lsd` is missing.
    pub fn bootstrap(config: &RetrievalConfig) -> Result<Self> {
        let _span = info_span!("bootstrap").entered();

        let client = Client::builder()
            .default_headers(default_headers())
            .timeout(config.request_timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| ClientError::Network(format!("failed to create HTTP client: {e}")))?;

        let response = client.get(HOMEPAGE).send()?;
        let (sb, fr) = session_cookies(&response);
        let html = response.text()?;

        let tokens = SessionTokens::from_homepage(&html)?;
        debug!(has_sb = sb.is_some(), has_fr = fr.is_some(), "session tokens found");

        let cookie = format!(
            "sb={}; fr={}; datr={};",
            sb.unwrap_or_default(),
            fr.unwrap_or_default(),
            tokens.datr
        );
        let cookie = HeaderValue::from_str(&cookie)
            .map_err(|e| ClientError::Bootstrap(format!("unusable cookie value: {e}")))?;

        Ok(Self {
            client,
            cookie,
            lsd: tokens.lsd,
        })
    }

    /// POST the session form, plus `form`, to `url` with `query` appended.
    ///
    /// Returns the response body. Non-success statuses are reported as
    /// retryable API errors.
    pub fn post(&self, url: &str, query: &[(&str, String)], form: &[(&str, String)]) -> Result<String> {
        let mut body: Vec<(&str, &str)> = vec![("__a", "1"), ("lsd", self.lsd.as_str())];
        body.extend(form.iter().map(|(key, value)| (*key, value.as_str())));

        let response = self
            .client
            .post(url)
            .header(COOKIE, self.cookie.clone())
            .query(query)
            .form(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::ApiResponse(format!("HTTP {status} from {url}")));
        }
        Ok(response.text()?)
    }
}

/// Tokens embedded in the homepage markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub datr: String,
    pub lsd: String,
}

impl SessionTokens {
    pub fn from_homepage(html: &str) -> Result<Self> {
        let datr = markup::extract_datr(html)
            .ok_or_else(|| ClientError::Bootstrap("datr token not found".to_string()))?;
        let lsd = markup::extract_lsd(html)
            .ok_or_else(|| ClientError::Bootstrap("lsd form token not found".to_string()))?;
        Ok(Self {
            datr: datr.to_string(),
            lsd: lsd.to_string(),
        })
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    headers.insert(REFERER, HeaderValue::from_static(HOMEPAGE));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;"));
    headers
}

fn session_cookies(response: &Response) -> (Option<String>, Option<String>) {
    let mut sb = None;
    let mut fr = None;
    for cookie in response.cookies() {
        match cookie.name() {
            "sb" => sb = Some(cookie.value().to_string()),
            "fr" => fr = Some(cookie.value().to_string()),
            _ => {}
        }
    }
    (sb, fr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_required() {
        let html = r#"<script>["_js_datr","abc123"]</script><input type="hidden" name="lsd" value="tok" />"#;
        let tokens = SessionTokens::from_homepage(html).unwrap();
        assert_eq!(tokens.datr, "abc123");
        assert_eq!(tokens.lsd, "tok");

        let err = SessionTokens::from_homepage(r#"<input name="lsd" value="tok">"#).unwrap_err();
        assert!(matches!(err, ClientError::Bootstrap(_)));
        assert!(err.is_fatal());
        let err = SessionTokens::from_homepage(r#"["_js_datr","abc"]"#).unwrap_err();
        assert!(err.to_string().contains("lsd"));
    }
}
