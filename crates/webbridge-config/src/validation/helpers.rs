//! Shared validation helpers.

/// Push an error if `value` is outside `(0.0, 1.0]`.
pub(crate) fn validate_range_f32(errors: &mut Vec<String>, name: &str, value: f32) {
    if !(value > 0.0 && value <= 1.0) {
        errors.push(format!("{name} = {value} is out of range (0, 1]"));
    }
}

/// Whether `name` can be used verbatim as `window.<name>` in script.
pub(crate) fn is_js_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
