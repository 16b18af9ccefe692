//! Custom header validation.
//!
//! Header names and values come from user configuration and end up on the
//! wire verbatim, so anything that could split a header line or smuggle a
//! second request is rejected up front.

/// Longest accepted header value, in bytes.
pub const MAX_HEADER_VALUE_LEN: usize = 8192;

/// Returns true if `name` is a non-empty RFC 7230 token.
///
/// # Examples
///
/// ```
/// use dayflow_relay::security::is_valid_header_name;
///
/// assert!(is_valid_header_name("X-Api-Key"));
/// assert!(!is_valid_header_name("X Api Key"));
/// assert!(!is_valid_header_name(""));
/// ```
pub fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(is_token_byte)
}

/// Returns true if `value` is safe to send as a header value.
///
/// Values must be ASCII, at most [`MAX_HEADER_VALUE_LEN`] long and free of
/// control characters other than horizontal tab. Empty values are allowed.
///
/// # Examples
///
/// ```
/// use dayflow_relay::security::is_valid_header_value;
///
/// assert!(is_valid_header_value("Bearer abc123"));
/// assert!(is_valid_header_value("a\tb"));
/// assert!(!is_valid_header_value("evil\r\nX-Injected: 1"));
/// ```
pub fn is_valid_header_value(value: &str) -> bool {
    value.len() <= MAX_HEADER_VALUE_LEN && value.bytes().all(is_field_byte)
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn is_field_byte(b: u8) -> bool {
    b == b'\t' || (b.is_ascii() && !b.is_ascii_control())
}
