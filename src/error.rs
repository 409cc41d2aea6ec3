// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A composite error type for all errors that can occur while processing API
//! responses, and the classifier that turns failed exchanges into typed
//! [`ApiError`]s.
//!
//! [`ApiError`]: struct.ApiError.html
//!
//! Service failures arrive as some combination of an HTTP status code and an
//! error payload in the body. Neither alone tells the whole story: a 403 can
//! mean bad credentials or a forbidden operation depending on the error code
//! inside, and some deployments report quota exhaustion with a 400-series
//! status and only the body code to go on. [`classify`] folds both signals
//! into one of the eight [`ErrorKind`] values so that callers can match on
//! structure instead of scraping message strings.
//!
//! [`classify`]: fn.classify.html
//! [`ErrorKind`]: enum.ErrorKind.html

use hyper::StatusCode;
use serde::Deserialize;

use crate::response::{parse_rate_limit, resource_family, RateLimitStatus};
use crate::Headers;

/// Convenient alias to a Result containing a local Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A set of errors that can occur while processing an API response.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The response was not structured the way this library expected. The
    /// enclosed values are a description of what went wrong and the
    /// offending portion of the response, if available.
    #[error("Malformed response: {0}")]
    MalformedResponse(&'static str, Option<String>),
    /// An expected value was missing from the response. The enclosed value
    /// is the name of the missing item.
    #[error("Value missing from response: {0}")]
    MissingValue(&'static str),
    /// An error occurred while deserializing a response body.
    #[error("Error deserializing response: {0}")]
    DeserializeError(#[from] serde_json::Error),
    /// The service reported a failure for the call. See [`ApiError`] for the
    /// typed breakdown.
    ///
    /// [`ApiError`]: struct.ApiError.html
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The classified cause of a failed API call.
///
/// This is a closed set: every failure the service can report resolves to
/// exactly one of these, with [`Unknown`] as the catch-all for signals this
/// library does not recognize. No open-ended string codes reach callers.
///
/// [`Unknown`]: #variant.Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The failure did not match any recognized status or error code.
    Unknown,
    /// The credentials on the call were missing, invalid, or expired.
    NotAuthorized,
    /// The credentials were accepted, but do not permit the requested
    /// operation.
    OperationNotPermitted,
    /// The requested resource does not exist.
    ResourceNotFound,
    /// The quota window for this resource family is exhausted. The
    /// accompanying [`ApiError`] carries the rate-limit status when the
    /// response headers allowed parsing one.
    ///
    /// [`ApiError`]: struct.ApiError.html
    RateLimitExceeded,
    /// The service hit an internal error while handling the call.
    ServerError,
    /// The service is down or unreachable behind its front end.
    ServerUnavailable,
    /// The service is up but shedding load.
    ServerOverloaded,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let text = match self {
            ErrorKind::Unknown => "unknown error",
            ErrorKind::NotAuthorized => "not authorized",
            ErrorKind::OperationNotPermitted => "operation not permitted",
            ErrorKind::ResourceNotFound => "resource not found",
            ErrorKind::RateLimitExceeded => "rate limit exceeded",
            ErrorKind::ServerError => "server error",
            ErrorKind::ServerUnavailable => "server unavailable",
            ErrorKind::ServerOverloaded => "server overloaded",
        };
        f.write_str(text)
    }
}

/// A failure reported by the service for one API call.
///
/// An `ApiError` replaces the successful result of the call; a caller never
/// sees both. Match on [`kind`] to decide what to do; [`message`] is
/// diagnostic text with no stable format, suitable for logs and nothing
/// else.
///
/// [`kind`]: #structfield.kind
/// [`message`]: #structfield.message
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    /// The classified cause of the failure.
    pub kind: ErrorKind,
    /// Human-readable diagnostic text, taken from the response body when one
    /// was present and from the HTTP status line otherwise.
    pub message: String,
    /// The quota accounting for the resource family, parsed from the
    /// response headers. Only populated when `kind` is
    /// [`RateLimitExceeded`], and even then only when the headers were
    /// present and well-formed.
    ///
    /// [`RateLimitExceeded`]: enum.ErrorKind.html#variant.RateLimitExceeded
    pub rate_limit_status: Option<RateLimitStatus>,
}

/// Represents the error payload the service returns in the body of a failed
/// call.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterErrors {
    /// The errors returned by the service.
    pub errors: Vec<TwitterErrorCode>,
}

impl std::fmt::Display for TwitterErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut first = true;
        for e in &self.errors {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{}", e)?;
            first = false;
        }
        Ok(())
    }
}

impl TwitterErrors {
    /// The numeric code of the first error in the payload, if any.
    pub fn first_code(&self) -> Option<i32> {
        self.errors.first().map(|e| e.code)
    }
}

/// Represents a single error and its numeric code from a service error
/// payload.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterErrorCode {
    /// The text of the error.
    pub message: String,
    /// The numeric error code.
    pub code: i32,
}

impl std::fmt::Display for TwitterErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "#{}: {}", self.code, self.message)
    }
}

/// Service error codes the classifier keys on. The full catalog is much
/// larger; these are the ones that disambiguate an HTTP status.
pub mod codes {
    /// Could not authenticate the call at all.
    pub const COULD_NOT_AUTHENTICATE: i32 = 32;
    /// The requested page does not exist.
    pub const PAGE_NOT_FOUND: i32 = 34;
    /// The requested user was not found.
    pub const USER_NOT_FOUND: i32 = 50;
    /// The authenticated account is suspended.
    pub const ACCOUNT_SUSPENDED: i32 = 64;
    /// The client is not permitted to perform this action.
    pub const CLIENT_NOT_PERMITTED: i32 = 87;
    /// The quota window for the resource is exhausted.
    pub const RATE_LIMIT_EXCEEDED: i32 = 88;
    /// The supplied token is invalid or has expired.
    pub const INVALID_OR_EXPIRED_TOKEN: i32 = 89;
    /// The service is over capacity.
    pub const OVER_CAPACITY: i32 = 130;
    /// The service hit an internal error.
    pub const INTERNAL_ERROR: i32 = 131;
    /// The requested status does not exist.
    pub const STATUS_NOT_FOUND: i32 = 144;
    /// The call carried bad or missing authentication data.
    pub const BAD_AUTHENTICATION_DATA: i32 = 215;
    /// The supplied credentials do not allow access to this resource.
    pub const ACCESS_NOT_ALLOWED: i32 = 220;
}

/// Classifies a failed exchange into a typed [`ApiError`].
///
/// [`ApiError`]: struct.ApiError.html
///
/// `resource` is the endpoint path the call targeted (for example
/// `/followers/ids`); it is used to label the rate-limit status attached on
/// quota failures. `raw_body` is the decoded response body; if it contains a
/// recognizable error payload, its first error code takes part in
/// classification and its message becomes the diagnostic text.
///
/// This function is total. Garbage bodies, unheard-of status codes, and
/// missing headers all still produce an `ApiError`; the worst case is a kind
/// of [`ErrorKind::Unknown`] with the status line as the message. When the
/// resolved kind is [`ErrorKind::RateLimitExceeded`], the rate-limit headers
/// are parsed and attached if possible, and silently skipped if not.
///
/// [`ErrorKind::Unknown`]: enum.ErrorKind.html#variant.Unknown
/// [`ErrorKind::RateLimitExceeded`]: enum.ErrorKind.html#variant.RateLimitExceeded
pub fn classify(resource: &str, status: StatusCode, headers: &Headers, raw_body: &str) -> ApiError {
    let errors = serde_json::from_str::<TwitterErrors>(raw_body).ok();
    let code = errors.as_ref().and_then(|e| e.first_code());
    let kind = kind_of(status, code);

    let message = errors
        .as_ref()
        .and_then(|e| e.errors.first())
        .map(|e| e.message.clone())
        .or_else(|| status.canonical_reason().map(|r| r.to_string()))
        .unwrap_or_else(|| format!("HTTP status {}", status.as_u16()));

    let rate_limit_status = if kind == ErrorKind::RateLimitExceeded {
        parse_rate_limit(resource_family(resource), resource, headers).ok()
    } else {
        None
    };

    ApiError {
        kind,
        message,
        rate_limit_status,
    }
}

/// The classification table. The HTTP status is the primary discriminant;
/// the body error code breaks ties (403) and stands in when the status
/// itself says nothing useful.
fn kind_of(status: StatusCode, code: Option<i32>) -> ErrorKind {
    use ErrorKind::*;

    match status.as_u16() {
        401 => NotAuthorized,
        403 => match code {
            Some(c) if is_credential_code(c) => NotAuthorized,
            _ => OperationNotPermitted,
        },
        404 => ResourceNotFound,
        // 420 is the legacy quota signal, retired in favor of 429 but still
        // seen from older endpoints
        420 | 429 => RateLimitExceeded,
        500 => ServerError,
        502 => ServerUnavailable,
        503 => match code {
            Some(codes::OVER_CAPACITY) => ServerOverloaded,
            _ => ServerUnavailable,
        },
        504 => ServerOverloaded,
        _ => match code {
            Some(c) if is_credential_code(c) => NotAuthorized,
            Some(codes::CLIENT_NOT_PERMITTED)
            | Some(codes::ACCESS_NOT_ALLOWED)
            | Some(codes::ACCOUNT_SUSPENDED) => OperationNotPermitted,
            Some(codes::PAGE_NOT_FOUND)
            | Some(codes::USER_NOT_FOUND)
            | Some(codes::STATUS_NOT_FOUND) => ResourceNotFound,
            Some(codes::RATE_LIMIT_EXCEEDED) => RateLimitExceeded,
            Some(codes::INTERNAL_ERROR) => ServerError,
            Some(codes::OVER_CAPACITY) => ServerOverloaded,
            _ => Unknown,
        },
    }
}

fn is_credential_code(code: i32) -> bool {
    code == codes::COULD_NOT_AUTHENTICATE
        || code == codes::INVALID_OR_EXPIRED_TOKEN
        || code == codes::BAD_AUTHENTICATION_DATA
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn body(code: i32, message: &str) -> String {
        format!(r#"{{"errors":[{{"code":{},"message":"{}"}}]}}"#, code, message)
    }

    fn kind_for(status: u16, body: &str) -> ErrorKind {
        let status = StatusCode::from_u16(status).unwrap();
        classify("/statuses/user_timeline", status, &Headers::new(), body).kind
    }

    #[test]
    fn status_table() {
        assert_eq!(kind_for(401, ""), ErrorKind::NotAuthorized);
        assert_eq!(kind_for(404, ""), ErrorKind::ResourceNotFound);
        assert_eq!(kind_for(429, ""), ErrorKind::RateLimitExceeded);
        assert_eq!(kind_for(420, ""), ErrorKind::RateLimitExceeded);
        assert_eq!(kind_for(500, ""), ErrorKind::ServerError);
        assert_eq!(kind_for(502, ""), ErrorKind::ServerUnavailable);
        assert_eq!(kind_for(503, ""), ErrorKind::ServerUnavailable);
        assert_eq!(kind_for(504, ""), ErrorKind::ServerOverloaded);
    }

    #[test]
    fn forbidden_tie_break() {
        // 403 alone is a refused operation
        assert_eq!(kind_for(403, ""), ErrorKind::OperationNotPermitted);
        assert_eq!(
            kind_for(403, &body(codes::CLIENT_NOT_PERMITTED, "not permitted")),
            ErrorKind::OperationNotPermitted
        );
        // but a credential code inside turns it into an auth failure
        assert_eq!(
            kind_for(403, &body(codes::INVALID_OR_EXPIRED_TOKEN, "token expired")),
            ErrorKind::NotAuthorized
        );
        assert_eq!(
            kind_for(403, &body(codes::COULD_NOT_AUTHENTICATE, "nope")),
            ErrorKind::NotAuthorized
        );
    }

    #[test]
    fn overload_tie_break() {
        assert_eq!(
            kind_for(503, &body(codes::OVER_CAPACITY, "over capacity")),
            ErrorKind::ServerOverloaded
        );
        assert_eq!(
            kind_for(503, &body(codes::INTERNAL_ERROR, "internal error")),
            ErrorKind::ServerUnavailable
        );
    }

    #[test]
    fn body_code_stands_in_for_ambiguous_status() {
        assert_eq!(
            kind_for(400, &body(codes::RATE_LIMIT_EXCEEDED, "over quota")),
            ErrorKind::RateLimitExceeded
        );
        assert_eq!(
            kind_for(400, &body(codes::PAGE_NOT_FOUND, "no such page")),
            ErrorKind::ResourceNotFound
        );
        assert_eq!(
            kind_for(400, &body(codes::BAD_AUTHENTICATION_DATA, "bad auth")),
            ErrorKind::NotAuthorized
        );
    }

    #[test]
    fn unrecognized_degrades_to_unknown() {
        assert_eq!(kind_for(418, ""), ErrorKind::Unknown);
        assert_eq!(kind_for(418, "i'm a teapot"), ErrorKind::Unknown);
        assert_eq!(kind_for(400, &body(9999, "mystery")), ErrorKind::Unknown);
        // classification never fails outright, even on non-JSON bodies
        assert_eq!(kind_for(400, "<html>gateway</html>"), ErrorKind::Unknown);
    }

    #[test]
    fn message_prefers_body_over_status_line() {
        let err = classify(
            "/users/show/:id",
            StatusCode::NOT_FOUND,
            &Headers::new(),
            &body(codes::USER_NOT_FOUND, "User not found."),
        );
        assert_eq!(err.kind, ErrorKind::ResourceNotFound);
        assert_eq!(err.message, "User not found.");

        let err = classify("/users/show/:id", StatusCode::NOT_FOUND, &Headers::new(), "");
        assert_eq!(err.message, "Not Found");
    }

    #[test]
    fn rate_limit_attaches_status_when_headers_present() {
        let mut headers = Headers::new();
        headers.insert("x-rate-limit-limit", HeaderValue::from_static("15"));
        headers.insert("x-rate-limit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-rate-limit-reset", HeaderValue::from_static("1483228800"));

        let err = classify(
            "/followers/ids",
            StatusCode::TOO_MANY_REQUESTS,
            &headers,
            &body(codes::RATE_LIMIT_EXCEEDED, "Rate limit exceeded"),
        );

        assert_eq!(err.kind, ErrorKind::RateLimitExceeded);
        let status = err.rate_limit_status.expect("headers should have parsed");
        assert_eq!(status.resource_family, "followers");
        assert_eq!(status.resource_path, "/followers/ids");
        assert_eq!(status.limit, 15);
        assert_eq!(status.remaining, 0);

        // the attached status is exactly what parsing the headers gives
        let reparsed = parse_rate_limit("followers", "/followers/ids", &headers).unwrap();
        assert_eq!(status, reparsed);
    }

    #[test]
    fn rate_limit_without_headers_still_produces_error() {
        let err = classify(
            "/followers/ids",
            StatusCode::TOO_MANY_REQUESTS,
            &Headers::new(),
            "",
        );
        assert_eq!(err.kind, ErrorKind::RateLimitExceeded);
        assert!(err.rate_limit_status.is_none());
    }

    #[test]
    fn non_rate_limit_kinds_carry_no_status() {
        let mut headers = Headers::new();
        headers.insert("x-rate-limit-limit", HeaderValue::from_static("15"));
        headers.insert("x-rate-limit-remaining", HeaderValue::from_static("14"));
        headers.insert("x-rate-limit-reset", HeaderValue::from_static("1483228800"));

        let err = classify("/users/show/:id", StatusCode::NOT_FOUND, &headers, "");
        assert!(err.rate_limit_status.is_none());
    }

    #[test]
    fn display_pairs_kind_and_message() {
        let err = classify("/users/show/:id", StatusCode::UNAUTHORIZED, &Headers::new(), "");
        assert_eq!(err.to_string(), "not authorized: Unauthorized");
    }
}
