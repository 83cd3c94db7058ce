//! Request interception: a policy hook consulted before each top-level
//! navigation.

use std::collections::BTreeMap;

use crate::navigator::Navigator;

/// HTTP headers sent with a navigation. Keys are unique.
pub type Headers = BTreeMap<String, String>;

/// A navigation attempt as seen by a [`RequestInterceptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebRequest {
    pub url: String,
    pub headers: Headers,
    pub is_for_main_frame: bool,
    pub is_redirect: bool,
    pub method: String,
}

impl WebRequest {
    /// A main-frame `GET` for `url`.
    pub fn navigation(url: impl Into<String>, headers: Headers) -> Self {
        Self {
            url: url.into(),
            headers,
            is_for_main_frame: true,
            is_redirect: false,
            method: "GET".to_string(),
        }
    }

    /// Copy with a different URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Copy with one header added or replaced.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Verdict for one navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptResult {
    /// Load the request as it stands after the interceptor returns.
    Allow,
    /// Drop the navigation silently.
    Reject,
    /// Load this request instead of the original.
    Modify(WebRequest),
}

/// Policy hook invoked synchronously for every top-level navigation.
///
/// Implementations should be deterministic and cheap. They receive the
/// navigator and may issue navigation themselves; engines that cannot
/// substitute a request in place rely on this to rewrite by reloading.
///
/// The request is passed mutably: on [`InterceptResult::Allow`] whatever
/// the interceptor left in it (for example an added header) is what loads.
pub trait RequestInterceptor: Send + Sync {
    fn on_intercept_url_request(
        &self,
        request: &mut WebRequest,
        navigator: &Navigator,
    ) -> InterceptResult;
}

impl<F> RequestInterceptor for F
where
    F: Fn(&mut WebRequest, &Navigator) -> InterceptResult + Send + Sync,
{
    fn on_intercept_url_request(
        &self,
        request: &mut WebRequest,
        navigator: &Navigator,
    ) -> InterceptResult {
        self(request, navigator)
    }
}
