//! Navigation and JS-bridge coordination for embedded web views.
//!
//! - [`Navigator`]: ordered queue of navigation commands, safe to use from
//!   any thread
//! - [`RequestInterceptor`]: allow/reject/rewrite hook for every top-level
//!   navigation
//! - [`JsBridge`]: method-name routing of page messages to host handlers,
//!   with replies delivered back into the page
//! - [`StateMirror`]: one loading/URL/title/history snapshot for both push
//!   and poll engines
//! - [`WebSession`]: the owner context tying these to one [`EngineBinding`]
//!
//! A wry-backed binding lives behind the `wry-engine` feature; the
//! [`scripted`] binding records calls instead of rendering.

pub mod bootstrap;
pub mod bridge;
pub mod content;
pub mod cookie;
pub mod engine;
pub mod events;
pub mod history;
pub mod message;
pub mod navigator;
pub mod request;
pub mod scripted;
pub mod session;
pub mod state;

#[cfg(feature = "wry-engine")]
pub mod native;

pub use bootstrap::{bootstrap_script, injection_script, transport_hook_script, MessageTransport};
pub use bridge::{handler_fn, JsBridge, JsMessageHandler, Reply};
pub use content::{ContentProvider, FileSource, HtmlData, WebContent};
pub use cookie::{Cookie, CookieManager, InMemoryCookieManager, SameSite};
pub use engine::{EngineBinding, EngineSample};
pub use events::{EngineSignal, WebViewError};
pub use message::{parse_js_message, reply_script, JsMessage, FIRE_AND_FORGET};
pub use navigator::{NavigationConsumer, NavigationEvent, Navigator};
pub use request::{Headers, InterceptResult, RequestInterceptor, WebRequest};
pub use session::WebSession;
pub use state::{EngineStateSnapshot, LoadingState, StateMirror};

#[cfg(feature = "wry-engine")]
pub use native::WryEngine;
