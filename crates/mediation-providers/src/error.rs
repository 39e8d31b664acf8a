use mediation_core::ProviderError;

/// Maps a `reqwest` transport failure to the provider error taxonomy.
pub fn from_reqwest(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Upstream(err.to_string())
    }
}

/// Maps an HTTP response status to the provider error taxonomy.
pub fn from_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthFailed,
        429 => ProviderError::RateLimited,
        _ => ProviderError::Upstream(format!("HTTP {status}: {body}")),
    }
}

/// Only transport-level and rate-limit failures are worth retrying, auth
/// failures are not.
pub fn is_retryable(error: &ProviderError) -> bool {
    matches!(error, ProviderError::Timeout | ProviderError::RateLimited)
}
