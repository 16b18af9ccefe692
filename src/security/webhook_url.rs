//! Webhook URL validation.

use std::fmt;

use url::Url;

/// Why a webhook URL was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlRejection {
    Empty,
    Malformed,
    UnsupportedScheme(String),
    MissingHost,
    EmbeddedCredentials,
}

impl fmt::Display for UrlRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlRejection::Empty => write!(f, "URL is empty"),
            UrlRejection::Malformed => write!(f, "URL cannot be parsed"),
            UrlRejection::UnsupportedScheme(scheme) => {
                write!(f, "scheme '{}' is not http or https", scheme)
            }
            UrlRejection::MissingHost => write!(f, "URL has no host"),
            UrlRejection::EmbeddedCredentials => {
                write!(f, "URL embeds credentials; use a header instead")
            }
        }
    }
}

/// Parses and vets a webhook URL.
///
/// Accepts only `http`/`https` URLs with a non-empty host and no userinfo.
///
/// # Errors
///
/// Returns the first [`UrlRejection`] that applies.
pub fn check_webhook_url(raw: &str) -> Result<Url, UrlRejection> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlRejection::Empty);
    }

    let url = Url::parse(raw).map_err(|_| UrlRejection::Malformed)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlRejection::UnsupportedScheme(url.scheme().to_string()));
    }

    // The URL parser forgives `https:///path` by promoting the first path
    // segment to the host. Require an authority in the raw text instead.
    let authority_present = raw
        .split_once("://")
        .is_some_and(|(_, rest)| !rest.is_empty() && !rest.starts_with('/'));
    if !authority_present || url.host_str().is_none_or(str::is_empty) {
        return Err(UrlRejection::MissingHost);
    }

    if !url.username().is_empty() || url.password().is_some() {
        return Err(UrlRejection::EmbeddedCredentials);
    }

    Ok(url)
}

/// Returns true if `raw` is an acceptable webhook target.
///
/// # Examples
///
/// ```
/// use dayflow_relay::security::is_valid_webhook_url;
///
/// assert!(is_valid_webhook_url("https://host:8443/x?q=1"));
/// assert!(!is_valid_webhook_url("ftp://host/x"));
/// assert!(!is_valid_webhook_url("https://user:pw@host/x"));
/// assert!(!is_valid_webhook_url(""));
/// ```
pub fn is_valid_webhook_url(raw: &str) -> bool {
    check_webhook_url(raw).is_ok()
}
