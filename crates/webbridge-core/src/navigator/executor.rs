use tracing::{debug, warn};

use crate::engine::EngineBinding;
use crate::request::{Headers, InterceptResult, WebRequest};

use super::event::NavigationEvent;
use super::Navigator;

/// Decide what a queued `LoadUrl` actually loads.
///
/// Without an interceptor the request loads as given. With one:
/// `Allow` loads the request as the interceptor left it, `Reject` loads
/// nothing and `Modify` loads the replacement. Pure apart from the
/// interceptor call itself.
pub fn decide_load(navigator: &Navigator, url: String, headers: Headers) -> Option<WebRequest> {
    let mut request = WebRequest::navigation(url, headers);
    let Some(interceptor) = navigator.request_interceptor() else {
        return Some(request);
    };

    match interceptor.on_intercept_url_request(&mut request, navigator) {
        InterceptResult::Allow => Some(request),
        InterceptResult::Reject => {
            debug!(url = %request.url, "load rejected by interceptor");
            None
        }
        InterceptResult::Modify(replacement) => {
            debug!(from = %request.url, to = %replacement.url, "load rewritten by interceptor");
            Some(replacement)
        }
    }
}

/// Run one event against the engine.
///
/// Engine failures are logged and swallowed so one bad command cannot stop
/// the consumer loop.
pub fn execute_event(navigator: &Navigator, binding: &dyn EngineBinding, event: NavigationEvent) {
    let kind = event.kind();
    let result = match event {
        NavigationEvent::LoadUrl {
            url,
            headers,
            decided,
        } => {
            let request = if decided {
                Some(WebRequest::navigation(url, headers))
            } else {
                decide_load(navigator, url, headers)
            };
            match request {
                Some(request) => {
                    if binding.reports_programmatic_navigations() {
                        navigator.mark_decided();
                    }
                    let loaded = binding.load_url(&request.url, &request.headers);
                    if loaded.is_err() {
                        navigator.clear_decided();
                    }
                    loaded
                }
                None => Ok(()),
            }
        }
        NavigationEvent::LoadHtml(data) => binding.load_html(&data),
        NavigationEvent::LoadHtmlFile { path, source } => binding.load_file(&path, source),
        NavigationEvent::Back => binding.go_back(),
        NavigationEvent::Forward => binding.go_forward(),
        NavigationEvent::Reload => binding.reload(),
        NavigationEvent::StopLoading => binding.stop_loading(),
        NavigationEvent::EvaluateScript { script, callback } => {
            binding.evaluate_script(&script, callback)
        }
        NavigationEvent::Reply {
            script,
            binding: owner,
        } => {
            if owner.upgrade().is_none() {
                debug!("reply skipped: its engine binding is gone");
                return;
            }
            binding.evaluate_script(&script, None)
        }
    };

    if let Err(e) = result {
        warn!(event = kind, error = %e, "engine failed to execute navigation event");
    }
}
