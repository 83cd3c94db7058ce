//! Wire envelope for page script <-> host calls.
//!
//! Messages flow in both directions:
//! - **Page -> host**: page script calls
//!   `window.<bridge>.callNative(methodName, params, callback)`, which posts
//!   `JSON.stringify({callbackId, methodName, params})` through the engine's
//!   native transport. The raw text lands in [`parse_js_message`].
//! - **Host -> page**: a reply is a script statement
//!   `window.<bridge>.onCallback(<id>, <data as JSON string>);` handed to the
//!   engine for evaluation. See [`reply_script`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// Callback id meaning "no reply expected".
pub const FIRE_AND_FORGET: i32 = -1;

/// A call from page script to a host-side handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsMessage {
    /// `-1` for fire-and-forget, otherwise the id the page waits on.
    pub callback_id: i32,
    pub method_name: String,
    /// Opaque JSON payload. Structured params are kept in their compact
    /// serialized form.
    pub params: String,
}

/// Why a raw page message could not be turned into a [`JsMessage`].
#[derive(Debug, thiserror::Error)]
pub enum ParseFailure {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("message is not a JSON object")]
    NotAnObject,

    #[error("missing methodName")]
    MissingMethodName,
}

impl JsMessage {
    pub fn new(callback_id: i32, method_name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            callback_id,
            method_name: method_name.into(),
            params: params.into(),
        }
    }

    /// Whether the page registered a callback for this call.
    pub fn expects_reply(&self) -> bool {
        self.callback_id >= 0
    }

    /// Decode `params` into a caller-provided type.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.params)
    }

    /// Read one string field out of object-shaped params.
    ///
    /// Returns `None` when params are not a JSON object or the field is
    /// absent. Non-string scalars are returned in their JSON text form.
    pub fn param_str(&self, key: &str) -> Option<String> {
        let value: Value = serde_json::from_str(&self.params).ok()?;
        match value.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            v @ (Value::Number(_) | Value::Bool(_)) => Some(v.to_string()),
            _ => None,
        }
    }

    /// Encode in the page -> host wire format.
    pub fn to_wire(&self) -> String {
        serde_json::json!({
            "callbackId": self.callback_id,
            "methodName": self.method_name,
            "params": self.params,
        })
        .to_string()
    }
}

/// Parse raw page text, logging and dropping anything malformed.
///
/// A single bad page message must never take the host down, so failures
/// are absorbed here rather than returned.
pub fn parse_js_message(raw: &str) -> Option<JsMessage> {
    match try_parse_js_message(raw) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!(bytes = raw.len(), error = %e, "dropping malformed JS message");
            None
        }
    }
}

/// Strict variant of [`parse_js_message`] that reports why parsing failed.
///
/// - `callbackId` missing or not an integer becomes [`FIRE_AND_FORGET`].
/// - `methodName` is mandatory.
/// - `params` may be a string (taken verbatim) or any JSON value
///   (re-serialized compactly); missing or `null` becomes `""`.
/// - Unknown fields are ignored.
pub fn try_parse_js_message(raw: &str) -> Result<JsMessage, ParseFailure> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(obj) = value else {
        return Err(ParseFailure::NotAnObject);
    };

    let callback_id = obj
        .get("callbackId")
        .and_then(callback_id_from)
        .unwrap_or(FIRE_AND_FORGET);

    let method_name = match obj.get("methodName") {
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => return Err(ParseFailure::MissingMethodName),
    };

    let params = match obj.get("params") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    Ok(JsMessage {
        callback_id,
        method_name,
        params,
    })
}

fn callback_id_from(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Build the host -> page reply statement, or `None` for fire-and-forget.
///
/// `data` is always encoded as a JSON *string* value, even when it already
/// holds JSON text, so page code receives the text and decodes it once
/// more itself. Existing page code relies on this double encoding.
pub fn reply_script(bridge_name: &str, callback_id: i32, data: &str) -> Option<String> {
    if callback_id < 0 {
        return None;
    }
    let encoded = serde_json::to_string(data).unwrap_or_else(|_| "\"\"".to_string());
    Some(format!(
        "window.{bridge_name}.onCallback({callback_id}, {encoded});"
    ))
}

/// Serialize a handler result to the JSON text a reply carries.
pub fn encode_data<T: Serialize>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_message() {
        let m = try_parse_js_message(
            r#"{"callbackId":3,"methodName":"echo","params":"{\"text\":\"hi\"}"}"#,
        )
        .unwrap();
        assert_eq!(m.callback_id, 3);
        assert_eq!(m.method_name, "echo");
        assert_eq!(m.params, r#"{"text":"hi"}"#);
        assert!(m.expects_reply());
    }

    #[test]
    fn missing_callback_id_is_fire_and_forget() {
        let m = try_parse_js_message(r#"{"methodName":"navigate","params":"x"}"#).unwrap();
        assert_eq!(m.callback_id, FIRE_AND_FORGET);
        assert!(!m.expects_reply());
    }

    #[test]
    fn non_integer_callback_id_is_fire_and_forget() {
        let m = try_parse_js_message(r#"{"callbackId":1.5,"methodName":"a"}"#).unwrap();
        assert_eq!(m.callback_id, -1);
        let m = try_parse_js_message(r#"{"callbackId":{"x":1},"methodName":"a"}"#).unwrap();
        assert_eq!(m.callback_id, -1);
    }

    #[test]
    fn string_callback_id_is_accepted() {
        let m = try_parse_js_message(r#"{"callbackId":"7","methodName":"a"}"#).unwrap();
        assert_eq!(m.callback_id, 7);
    }

    #[test]
    fn missing_method_name_fails() {
        let err = try_parse_js_message(r#"{"callbackId":1,"params":""}"#).unwrap_err();
        assert!(matches!(err, ParseFailure::MissingMethodName));
        assert!(parse_js_message(r#"{"callbackId":1}"#).is_none());
    }

    #[test]
    fn invalid_json_and_non_objects_fail() {
        assert!(matches!(
            try_parse_js_message("not json {"),
            Err(ParseFailure::InvalidJson(_))
        ));
        assert!(matches!(
            try_parse_js_message("[1,2]"),
            Err(ParseFailure::NotAnObject)
        ));
        assert!(parse_js_message("").is_none());
    }

    #[test]
    fn structured_params_are_serialized() {
        let m = try_parse_js_message(r#"{"methodName":"custom","params":{"a":1,"b":[true,null]}}"#)
            .unwrap();
        assert_eq!(m.params, r#"{"a":1,"b":[true,null]}"#);
    }

    #[test]
    fn missing_or_null_params_are_empty() {
        let m = try_parse_js_message(r#"{"methodName":"a"}"#).unwrap();
        assert_eq!(m.params, "");
        let m = try_parse_js_message(r#"{"methodName":"a","params":null}"#).unwrap();
        assert_eq!(m.params, "");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let m = try_parse_js_message(r#"{"methodName":"a","version":2,"extra":{"k":"v"}}"#)
            .unwrap();
        assert_eq!(m, JsMessage::new(-1, "a", ""));
    }

    #[test]
    fn wire_round_trip_preserves_message() {
        let m = JsMessage::new(12, "echo", r#"{"text":"hi \"there\""}"#);
        assert_eq!(try_parse_js_message(&m.to_wire()).unwrap(), m);
    }

    #[test]
    fn structured_params_are_stable_after_first_normalization() {
        let first = try_parse_js_message(r#"{"methodName":"c","params":{ "z" : 1, "a" : [ 1 ] }}"#)
            .unwrap();
        let second = try_parse_js_message(&first.to_wire()).unwrap();
        let third = try_parse_js_message(&second.to_wire()).unwrap();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn param_str_reads_fields() {
        let m = JsMessage::new(-1, "navigate", r#"{"url":"https://a.test","n":4}"#);
        assert_eq!(m.param_str("url").as_deref(), Some("https://a.test"));
        assert_eq!(m.param_str("n").as_deref(), Some("4"));
        assert_eq!(m.param_str("missing"), None);
        assert_eq!(JsMessage::new(-1, "x", "plain").param_str("url"), None);
    }

    #[test]
    fn params_as_decodes_typed() {
        #[derive(serde::Deserialize)]
        struct P {
            text: String,
        }
        let m = JsMessage::new(1, "echo", r#"{"text":"hi"}"#);
        assert_eq!(m.params_as::<P>().unwrap().text, "hi");
    }

    #[test]
    fn reply_script_double_encodes_data() {
        let script = reply_script("kmpJsBridge", 3, "\"hi\"").unwrap();
        assert_eq!(script, r#"window.kmpJsBridge.onCallback(3, "\"hi\"");"#);
    }

    #[test]
    fn reply_script_encodes_plain_text_as_string() {
        let script = reply_script("b", 0, "ok").unwrap();
        assert_eq!(script, r#"window.b.onCallback(0, "ok");"#);
    }

    #[test]
    fn fire_and_forget_produces_no_reply() {
        assert!(reply_script("kmpJsBridge", -1, "anything").is_none());
        assert!(reply_script("kmpJsBridge", -42, "").is_none());
    }

    #[test]
    fn encode_data_serializes() {
        assert_eq!(encode_data(&"hi"), "\"hi\"");
        assert_eq!(encode_data(&serde_json::json!({"ok": true})), r#"{"ok":true}"#);
    }
}
