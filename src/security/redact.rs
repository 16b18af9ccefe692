//! URL redaction for logs.

use url::Url;

const INVALID_URL: &str = "[invalid URL]";

/// Strips credentials, query and fragment from a URL before it is logged.
///
/// Scheme, host, port and path survive. Unparseable or host-less input
/// becomes `[invalid URL]`.
///
/// # Examples
///
/// ```
/// use dayflow_relay::security::redact_url;
///
/// assert_eq!(
///     redact_url("https://user:pw@hooks.example.com:8443/in?token=s3cret#frag"),
///     "https://hooks.example.com:8443/in"
/// );
/// assert_eq!(redact_url("ht!tp://[invalid]"), "[invalid URL]");
/// ```
pub fn redact_url(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw) else {
        return INVALID_URL.to_string();
    };
    let Some(host) = parsed.host_str().filter(|host| !host.is_empty()) else {
        return INVALID_URL.to_string();
    };

    let mut redacted = format!("{}://{}", parsed.scheme(), host);
    if let Some(port) = parsed.port() {
        redacted.push_str(&format!(":{port}"));
    }
    if parsed.path() != "/" {
        redacted.push_str(parsed.path());
    }
    redacted
}
