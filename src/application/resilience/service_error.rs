use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Delay assumed when GitHub reports an exhausted rate limit without a
/// `Retry-After` header
const DEFAULT_RATE_LIMIT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Failure of a guarded external call.
///
/// Only [`ServiceError::Retryable`] triggers another attempt inside the
/// resilience envelope. The other variants are terminal for one invocation.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("{service}: {message}")]
    Retryable {
        service: String,
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("{service}: {message}")]
    NonRetryable { service: String, message: String },

    #[error("{service}: circuit open, next attempt in {}s", retry_after.as_secs())]
    CircuitOpen {
        service: String,
        retry_after: Duration,
    },

    #[error("{service}: gave up after {attempts} attempt(s): {last}")]
    Exhausted {
        service: String,
        attempts: u32,
        last: Box<ServiceError>,
    },
}

impl ServiceError {
    pub fn retryable(service: &str, message: impl Into<String>) -> Self {
        ServiceError::Retryable {
            service: service.to_string(),
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn non_retryable(service: &str, message: impl Into<String>) -> Self {
        ServiceError::NonRetryable {
            service: service.to_string(),
            message: message.into(),
        }
    }

    /// Classifies an unsuccessful HTTP response.
    ///
    /// 5xx, 408 and 429 are retryable. A 403 carrying
    /// `X-RateLimit-Remaining: 0` is GitHub's rate limit and is retryable
    /// as well. Every other status is non-retryable.
    pub fn from_status(service: &str, status: StatusCode, headers: &HeaderMap, context: &str) -> Self {
        let retry_after = parse_retry_after(headers);
        let message = format!("{} returned HTTP {}", context, status.as_u16());

        if status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
        {
            return ServiceError::Retryable {
                service: service.to_string(),
                message,
                retry_after,
            };
        }

        if status == StatusCode::FORBIDDEN && is_rate_limit_exhausted(headers) {
            return ServiceError::Retryable {
                service: service.to_string(),
                message: format!("{} (rate limit exceeded)", message),
                retry_after: Some(retry_after.unwrap_or(DEFAULT_RATE_LIMIT_RETRY_AFTER)),
            };
        }

        ServiceError::NonRetryable {
            service: service.to_string(),
            message,
        }
    }

    /// Classifies a transport-level failure. Timeouts, connection failures
    /// and interrupted requests are retryable; everything else (bad request
    /// construction, undecodable bodies, redirect loops) is not.
    pub fn from_transport(service: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::retryable(service, "request timed out");
        }
        if error.is_connect() {
            return Self::retryable(service, format!("connection failed: {}", error));
        }
        if let Some(status) = error.status() {
            return Self::from_status(service, status, &HeaderMap::new(), "request");
        }
        if error.is_request() || error.is_body() {
            return Self::retryable(service, format!("request failed: {}", error));
        }
        Self::non_retryable(service, format!("request failed: {}", error))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::Retryable { .. })
    }

    pub fn service(&self) -> &str {
        match self {
            ServiceError::Retryable { service, .. }
            | ServiceError::NonRetryable { service, .. }
            | ServiceError::CircuitOpen { service, .. }
            | ServiceError::Exhausted { service, .. } => service,
        }
    }

    /// Delay the remote side asked for, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ServiceError::Retryable { retry_after, .. } => *retry_after,
            ServiceError::CircuitOpen { retry_after, .. } => Some(*retry_after),
            ServiceError::Exhausted { last, .. } => last.retry_after(),
            ServiceError::NonRetryable { .. } => None,
        }
    }

    /// Classified error kind used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Retryable { .. } => "retryable",
            ServiceError::NonRetryable { .. } => "non_retryable",
            ServiceError::CircuitOpen { .. } => "circuit_open",
            ServiceError::Exhausted { .. } => "exhausted",
        }
    }

    /// Short cause without the service prefix.
    pub fn reason(&self) -> String {
        match self {
            ServiceError::Retryable { message, .. } | ServiceError::NonRetryable { message, .. } => {
                message.clone()
            }
            ServiceError::CircuitOpen { .. } => "circuit open".to_string(),
            ServiceError::Exhausted { attempts, last, .. } => {
                format!("{} (after {} attempts)", last.reason(), attempts)
            }
        }
    }

    /// The line recorded in `failed_detections` when a call degrades to its
    /// fallback.
    pub fn fallback_reason(&self) -> String {
        format!("{} unavailable: {}", self.service(), self.reason())
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn is_rate_limit_exhausted(headers: &HeaderMap) -> bool {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_server_errors_are_retryable() {
        let err = ServiceError::from_status(
            "github_api",
            StatusCode::BAD_GATEWAY,
            &HeaderMap::new(),
            "tree fetch",
        );
        assert!(err.is_retryable());
        assert_eq!(err.reason(), "tree fetch returned HTTP 502");
    }

    #[test]
    fn test_too_many_requests_honors_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        let err = ServiceError::from_status(
            "http_scraper",
            StatusCode::TOO_MANY_REQUESTS,
            &headers,
            "HEAD",
        );
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::UNPROCESSABLE_ENTITY,
        ] {
            let err = ServiceError::from_status("github_api", status, &HeaderMap::new(), "GET");
            assert!(!err.is_retryable(), "{} should not be retryable", status);
        }
    }

    #[test]
    fn test_forbidden_with_exhausted_rate_limit_is_retryable() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        let err =
            ServiceError::from_status("github_api", StatusCode::FORBIDDEN, &headers, "metadata");
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(DEFAULT_RATE_LIMIT_RETRY_AFTER));
    }

    #[test]
    fn test_fallback_reason_for_exhausted() {
        let err = ServiceError::Exhausted {
            service: "github_api".to_string(),
            attempts: 3,
            last: Box::new(ServiceError::retryable("github_api", "request timed out")),
        };
        assert_eq!(
            err.fallback_reason(),
            "github_api unavailable: request timed out (after 3 attempts)"
        );
        assert_eq!(err.kind(), "exhausted");
    }

    #[test]
    fn test_fallback_reason_for_circuit_open() {
        let err = ServiceError::CircuitOpen {
            service: "http_scraper".to_string(),
            retry_after: Duration::from_secs(12),
        };
        assert_eq!(err.fallback_reason(), "http_scraper unavailable: circuit open");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("12s"));
    }
}
