//! Default TOML config template with inline documentation comments.

use crate::schema::CONFIG_SCHEMA_VERSION;

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    let body = r##"# Only override what you want to change -- missing fields use defaults.

[bridge]
# In-page object: window.<name>.callNative / onCallback / postMessage
name = "kmpJsBridge"

[polling]
# interval_ms = 250           # sampling period for engines without callbacks
# not_ready_retry_ms = 50     # retry while the engine is being constructed
# initial_progress = 0.1
# progress_step = 0.02
# progress_ceiling = 0.9

[engine]
# initial_url = "https://example.com"
# user_agent = "MyApp/1.0"
# devtools = false
# transparent = false
# clipboard = true
# autoplay = true

[logging]
# level = "info"              # trace, debug, info, warn, error
"##;
    format!("# WebBridge Configuration\n# Schema version {CONFIG_SCHEMA_VERSION}\n{body}")
}
