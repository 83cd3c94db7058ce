use std::fmt;
use std::sync::Weak;

use crate::content::{FileSource, HtmlData};
use crate::request::Headers;

/// Continuation receiving the engine's result of an evaluated script.
pub type ScriptCallback = Box<dyn FnOnce(String) + Send>;

/// One navigation intent, consumed exactly once by the engine's consumer.
pub enum NavigationEvent {
    LoadUrl {
        url: String,
        headers: Headers,
        /// Already passed interception (a rewrite re-issued by the host).
        decided: bool,
    },
    LoadHtml(HtmlData),
    LoadHtmlFile {
        path: String,
        source: FileSource,
    },
    Back,
    Forward,
    Reload,
    StopLoading,
    EvaluateScript {
        script: String,
        callback: Option<ScriptCallback>,
    },
    /// Answer to a page call. Only meaningful to the engine binding that
    /// was attached when the call came in; skipped once that is gone.
    Reply {
        script: String,
        binding: Weak<()>,
    },
}

impl NavigationEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            NavigationEvent::LoadUrl { .. } => "load_url",
            NavigationEvent::LoadHtml(_) => "load_html",
            NavigationEvent::LoadHtmlFile { .. } => "load_html_file",
            NavigationEvent::Back => "back",
            NavigationEvent::Forward => "forward",
            NavigationEvent::Reload => "reload",
            NavigationEvent::StopLoading => "stop_loading",
            NavigationEvent::EvaluateScript { .. } => "evaluate_script",
            NavigationEvent::Reply { .. } => "reply",
        }
    }

    pub(crate) fn is_reply(&self) -> bool {
        matches!(self, NavigationEvent::Reply { .. })
    }
}

impl fmt::Debug for NavigationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationEvent::LoadUrl {
                url,
                headers,
                decided,
            } => f
                .debug_struct("LoadUrl")
                .field("url", url)
                .field("headers", headers)
                .field("decided", decided)
                .finish(),
            NavigationEvent::LoadHtml(data) => f.debug_tuple("LoadHtml").field(data).finish(),
            NavigationEvent::LoadHtmlFile { path, source } => f
                .debug_struct("LoadHtmlFile")
                .field("path", path)
                .field("source", source)
                .finish(),
            NavigationEvent::Back => f.write_str("Back"),
            NavigationEvent::Forward => f.write_str("Forward"),
            NavigationEvent::Reload => f.write_str("Reload"),
            NavigationEvent::StopLoading => f.write_str("StopLoading"),
            NavigationEvent::EvaluateScript { script, callback } => f
                .debug_struct("EvaluateScript")
                .field("script", script)
                .field("has_callback", &callback.is_some())
                .finish(),
            NavigationEvent::Reply { script, binding } => f
                .debug_struct("Reply")
                .field("script", script)
                .field("live", &(binding.strong_count() > 0))
                .finish(),
        }
    }
}
