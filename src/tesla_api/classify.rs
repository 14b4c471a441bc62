use super::request_common::ApiError;
use regex::Regex;
use std::sync::LazyLock;
use strum_macros::Display;

/// What a failed telemetry poll means for the tracking loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PollFailure {
    /// The API is throttling us (or timing out under load). Back off hard.
    RateLimited,
    /// The vehicle itself is asleep or unreachable. Replay the last position.
    Unavailable,
    /// Anything else. Back off only after repeated occurrences.
    Other,
}

static RATE_LIMIT_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)429|rate limit|too many requests|timeout").unwrap());
static UNAVAILABLE_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)vehicle unavailable|asleep").unwrap());

/// Maps an API error to its recovery category.
///
/// The owner API has no error taxonomy of its own, so beyond the structured
/// status code this falls back to marker matching on the error text. All
/// matching rules live here; rate-limit markers take precedence.
pub fn classify(err: &ApiError) -> PollFailure {
    let text = match err {
        ApiError::Status { code: 429, .. } => return PollFailure::RateLimited,
        ApiError::Status { code, body } => format!("{code} {body}"),
        ApiError::Request(e) => {
            if e.is_timeout() {
                return PollFailure::RateLimited;
            }
            e.to_string()
        }
    };
    if RATE_LIMIT_MARKERS.is_match(&text) {
        PollFailure::RateLimited
    } else if UNAVAILABLE_MARKERS.is_match(&text) {
        PollFailure::Unavailable
    } else {
        PollFailure::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, body: &str) -> ApiError {
        ApiError::Status { code, body: String::from(body) }
    }

    #[test]
    fn test_structured_rate_limit() {
        assert_eq!(classify(&status(429, "")), PollFailure::RateLimited);
        assert_eq!(classify(&status(429, "whatever")), PollFailure::RateLimited);
    }

    #[test]
    fn test_rate_limit_markers() {
        assert_eq!(classify(&status(500, "Too Many Requests")), PollFailure::RateLimited);
        assert_eq!(classify(&status(400, "rate limit exceeded")), PollFailure::RateLimited);
        assert_eq!(classify(&status(504, "upstream timeout")), PollFailure::RateLimited);
    }

    #[test]
    fn test_unavailable_markers() {
        assert_eq!(classify(&status(408, "vehicle unavailable")), PollFailure::Unavailable);
        assert_eq!(classify(&status(503, "Vehicle is asleep")), PollFailure::Unavailable);
    }

    #[test]
    fn test_rate_limit_takes_precedence() {
        assert_eq!(
            classify(&status(408, "vehicle unavailable: request timeout")),
            PollFailure::RateLimited
        );
    }

    #[test]
    fn test_everything_else_is_other() {
        assert_eq!(classify(&status(500, "internal server error")), PollFailure::Other);
        assert_eq!(classify(&status(401, "unauthorized")), PollFailure::Other);
    }
}
