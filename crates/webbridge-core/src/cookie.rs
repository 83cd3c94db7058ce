//! Cookie model and store abstraction.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use webbridge_common::BridgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SameSite {
    None,
    Lax,
    Strict,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SameSite::None => "NONE",
            SameSite::Lax => "LAX",
            SameSite::Strict => "STRICT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    /// Expiry as milliseconds since the Unix epoch.
    pub expires_date: Option<i64>,
    pub is_session_only: bool,
    pub same_site: Option<SameSite>,
    pub is_secure: Option<bool>,
    pub is_http_only: Option<bool>,
    /// Lifetime in seconds.
    pub max_age: Option<i64>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    fn is_expired(&self, now_ms: i64) -> bool {
        self.max_age.is_some_and(|age| age <= 0)
            || self.expires_date.is_some_and(|expires| expires <= now_ms)
    }
}

/// `Set-Cookie` style rendering, e.g.
/// `id=1; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Secure;`
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={domain}")?;
        }
        if let Some(expires) = self.expires_date {
            write!(f, "; Expires={}", expiration_date(expires))?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={max_age}")?;
        }
        if self.is_secure == Some(true) {
            f.write_str("; Secure")?;
        }
        if self.is_http_only == Some(true) {
            f.write_str("; HttpOnly")?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; SameSite={same_site}")?;
        }
        f.write_str(";")
    }
}

/// RFC 1123 date in GMT.
fn expiration_date(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Cookie storage of an engine.
#[async_trait]
pub trait CookieManager: Send + Sync {
    async fn set_cookie(&self, url: &str, cookie: Cookie) -> Result<(), BridgeError>;

    async fn get_cookies(&self, url: &str) -> Result<Vec<Cookie>, BridgeError>;

    async fn remove_cookies(&self, url: &str) -> Result<(), BridgeError>;

    async fn remove_all_cookies(&self) -> Result<(), BridgeError>;
}

/// Process-local cookie jar with host and path matching.
#[derive(Default)]
pub struct InMemoryCookieManager {
    cookies: Mutex<Vec<Cookie>>,
}

impl InMemoryCookieManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn cookies(&self) -> MutexGuard<'_, Vec<Cookie>> {
        self.cookies.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CookieManager for InMemoryCookieManager {
    async fn set_cookie(&self, url: &str, mut cookie: Cookie) -> Result<(), BridgeError> {
        let (host, _) = host_and_path(url)
            .ok_or_else(|| BridgeError::Other(format!("cookie url has no host: {url}")))?;
        let domain = cookie
            .domain
            .get_or_insert_with(|| host.to_string())
            .trim_start_matches('.')
            .to_ascii_lowercase();
        cookie.domain = Some(domain);
        cookie.path.get_or_insert_with(|| "/".to_string());

        let mut cookies = self.cookies();
        cookies.retain(|c| {
            !(c.name == cookie.name && c.domain == cookie.domain && c.path == cookie.path)
        });
        if cookie.is_expired(Utc::now().timestamp_millis()) {
            debug!(name = %cookie.name, "expired cookie removed");
        } else {
            debug!(name = %cookie.name, host = %host, "cookie set");
            cookies.push(cookie);
        }
        Ok(())
    }

    async fn get_cookies(&self, url: &str) -> Result<Vec<Cookie>, BridgeError> {
        let Some((host, path)) = host_and_path(url) else {
            return Ok(Vec::new());
        };
        let now = Utc::now().timestamp_millis();
        Ok(self
            .cookies()
            .iter()
            .filter(|c| !c.is_expired(now) && matches(c, &host, &path))
            .cloned()
            .collect())
    }

    async fn remove_cookies(&self, url: &str) -> Result<(), BridgeError> {
        if let Some((host, path)) = host_and_path(url) {
            self.cookies().retain(|c| !matches(c, &host, &path));
        }
        Ok(())
    }

    async fn remove_all_cookies(&self) -> Result<(), BridgeError> {
        self.cookies().clear();
        Ok(())
    }
}

fn matches(cookie: &Cookie, host: &str, path: &str) -> bool {
    let domain_ok = cookie.domain.as_deref().is_some_and(|d| {
        host == d || host.strip_suffix(d).is_some_and(|rest| rest.ends_with('.'))
    });
    let path_ok = cookie
        .path
        .as_deref()
        .map_or(true, |p| path.starts_with(p));
    domain_ok && path_ok
}

/// Host and path of an absolute URL. IPv6 hosts keep their brackets.
fn host_and_path(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str().filter(|h| !h.is_empty())?;
    Some((host.to_ascii_lowercase(), parsed.path().to_string()))
}
