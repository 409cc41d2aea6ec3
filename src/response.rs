// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Infrastructure types related to packaging rate-limit information
//! alongside decoded responses.
//!
//! Every exchange with the service carries quota accounting in three
//! headers: the window ceiling, the calls left in the window, and the
//! instant the window resets. [`parse_rate_limit`] reads that triple into a
//! [`RateLimitStatus`], and [`Response`] pairs a decoded payload with the
//! snapshot taken from its own headers, so callers always have the
//! accounting for the call they just made.
//!
//! [`parse_rate_limit`]: fn.parse_rate_limit.html
//! [`RateLimitStatus`]: struct.RateLimitStatus.html
//! [`Response`]: struct.Response.html
//!
//! [`unpack`] and [`unpack_cursored`] sit at the boundary with the
//! transport: they take the raw parts of a finished exchange and either
//! produce a `Response` or fail with the classified error.
//!
//! [`unpack`]: fn.unpack.html
//! [`unpack_cursored`]: fn.unpack_cursored.html

use std::iter::FromIterator;
use std::vec;

use chrono::{DateTime, LocalResult, TimeZone, Utc};
use hyper::StatusCode;
use serde::de::DeserializeOwned;

use crate::cursor::{CursorPage, CursoredList};
use crate::error::{classify, Error, Result};
use crate::Headers;

const RATE_LIMIT_LIMIT: &str = "x-rate-limit-limit";
const RATE_LIMIT_REMAINING: &str = "x-rate-limit-remaining";
const RATE_LIMIT_RESET: &str = "x-rate-limit-reset";

/// A snapshot of the quota accounting for one resource family, taken from
/// the headers of a single exchange.
///
/// A fresh snapshot is parsed from every response; snapshots are never
/// merged or updated in place. The one from the latest response for a
/// family supersedes whatever came before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitStatus {
    /// The resource family whose quota this snapshot describes. Families
    /// group related endpoints under one window; the family name is the
    /// first segment of the resource path.
    pub resource_family: String,
    /// The endpoint path the snapshot was taken from.
    pub resource_path: String,
    /// The number of calls allowed in one window.
    pub limit: i32,
    /// The number of calls left in the current window. Always within
    /// `0..=limit`.
    pub remaining: i32,
    /// The instant at which the current window resets.
    pub reset: DateTime<Utc>,
    /// Whether the reported remaining-calls value was outside `0..=limit`
    /// and had to be clamped into range.
    pub clamped: bool,
}

/// Reads the rate-limit header triple into a [`RateLimitStatus`].
///
/// [`RateLimitStatus`]: struct.RateLimitStatus.html
///
/// The reset header holds epoch seconds and is converted to an absolute
/// instant; no relative interpretation is attempted. A header that is
/// missing fails with `MissingValue`, and one that is present but not an
/// integer (or a reset outside the representable time range) fails with
/// `MalformedResponse`.
///
/// A remaining-calls value outside `0..=limit` does not fail: quota
/// accounting is auxiliary metadata, so the value is clamped into range and
/// the snapshot is marked [`clamped`] instead.
///
/// [`clamped`]: struct.RateLimitStatus.html#structfield.clamped
pub fn parse_rate_limit(
    resource_family: &str,
    resource_path: &str,
    headers: &Headers,
) -> Result<RateLimitStatus> {
    let mut limit: i32 = int_header(headers, RATE_LIMIT_LIMIT)?;
    let mut remaining: i32 = int_header(headers, RATE_LIMIT_REMAINING)?;
    let reset_epoch: i64 = int_header(headers, RATE_LIMIT_RESET)?;

    let reset = match Utc.timestamp_opt(reset_epoch, 0) {
        LocalResult::Single(instant) => instant,
        _ => {
            return Err(Error::MalformedResponse(
                "rate-limit reset header is out of timestamp range",
                Some(reset_epoch.to_string()),
            ))
        }
    };

    let mut clamped = false;
    if limit < 0 {
        limit = 0;
        clamped = true;
    }
    if remaining < 0 {
        remaining = 0;
        clamped = true;
    } else if remaining > limit {
        remaining = limit;
        clamped = true;
    }

    Ok(RateLimitStatus {
        resource_family: resource_family.to_string(),
        resource_path: resource_path.to_string(),
        limit,
        remaining,
        reset,
        clamped,
    })
}

/// The resource family an endpoint path belongs to, i.e. its first path
/// segment: `/statuses/user_timeline` is in the `statuses` family.
pub fn resource_family(path: &str) -> &str {
    let path = path.trim_start_matches('/');
    match path.find('/') {
        Some(idx) => &path[..idx],
        None => path,
    }
}

fn int_header<T: std::str::FromStr>(headers: &Headers, name: &'static str) -> Result<T> {
    let value = headers.get(name).ok_or(Error::MissingValue(name))?;

    value
        .to_str()
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| {
            Error::MalformedResponse(
                "rate-limit header was not an integer",
                Some(format!("{}: {:?}", name, value)),
            )
        })
}

/// A helper struct to wrap response data with accompanying rate-limit
/// information.
///
/// The rate-limit snapshot is parsed fresh from each response's headers.
/// It is optional: a response whose headers could not be parsed still
/// carries its payload, since quota accounting is auxiliary to the result
/// itself.
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The quota accounting parsed from this response's headers, if they
    /// were present and well-formed.
    pub rate_limit_status: Option<RateLimitStatus>,
    /// The decoded response from the request.
    pub response: T,
}

impl<T> Response<T> {
    /// Converts the contained value in this `Response` to another type,
    /// preserving the rate-limit snapshot.
    pub fn map<F, U>(self, fun: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            rate_limit_status: self.rate_limit_status,
            response: fun(self.response),
        }
    }
}

/// Iterator returned by calling `.into_iter()` on a `Response<Vec<T>>`.
///
/// Each item gets a copy of the rate-limit snapshot from the response it
/// came from, so individual elements can be passed around without losing
/// the accounting.
pub struct ResponseIter<T> {
    rate_limit_status: Option<RateLimitStatus>,
    resp_iter: vec::IntoIter<T>,
}

impl<T> Iterator for ResponseIter<T> {
    type Item = Response<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.resp_iter.next().map(|item| Response {
            rate_limit_status: self.rate_limit_status.clone(),
            response: item,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.resp_iter.size_hint()
    }
}

impl<T> DoubleEndedIterator for ResponseIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.resp_iter.next_back().map(|item| Response {
            rate_limit_status: self.rate_limit_status.clone(),
            response: item,
        })
    }
}

impl<T> ExactSizeIterator for ResponseIter<T> {
    fn len(&self) -> usize {
        self.resp_iter.len()
    }
}

impl<T> IntoIterator for Response<Vec<T>> {
    type Item = Response<T>;
    type IntoIter = ResponseIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        ResponseIter {
            rate_limit_status: self.rate_limit_status,
            resp_iter: self.response.into_iter(),
        }
    }
}

impl<T> FromIterator<Response<T>> for Response<Vec<T>> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Response<T>>,
    {
        let mut collected = Response {
            rate_limit_status: None,
            response: Vec::new(),
        };

        for item in iter {
            collected.rate_limit_status =
                more_restrictive(collected.rate_limit_status.take(), item.rate_limit_status);
            collected.response.push(item.response);
        }

        collected
    }
}

/// Picks the snapshot a caller should worry about: the one from the latest
/// window, breaking ties toward fewer remaining calls.
fn more_restrictive(
    current: Option<RateLimitStatus>,
    candidate: Option<RateLimitStatus>,
) -> Option<RateLimitStatus> {
    match (current, candidate) {
        (Some(current), Some(candidate)) => {
            if candidate.reset > current.reset
                || (candidate.reset == current.reset && candidate.remaining < current.remaining)
            {
                Some(candidate)
            } else {
                Some(current)
            }
        }
        (current, candidate) => current.or(candidate),
    }
}

/// Turns the parts of a finished exchange into a decoded [`Response`].
///
/// [`Response`]: struct.Response.html
///
/// `resource` is the endpoint path the call targeted. On a success status
/// the body is deserialized into `T` and wrapped together with the
/// best-effort rate-limit snapshot from the headers. On any other status
/// the exchange is classified and the call fails with the resulting
/// [`ApiError`]; a success is never fabricated from a failed exchange.
///
/// [`ApiError`]: ../error/struct.ApiError.html
pub fn unpack<T: DeserializeOwned>(
    resource: &str,
    status: StatusCode,
    headers: &Headers,
    body: &str,
) -> Result<Response<T>> {
    if !status.is_success() {
        return Err(classify(resource, status, headers, body).into());
    }

    let response = serde_json::from_str(body)?;

    Ok(Response {
        rate_limit_status: parse_rate_limit(resource_family(resource), resource, headers).ok(),
        response,
    })
}

/// Turns the parts of a finished exchange from a cursored endpoint into a
/// decoded page.
///
/// Same contract as [`unpack`], with the body read as a cursor envelope and
/// converted into a [`CursoredList`].
///
/// [`unpack`]: fn.unpack.html
/// [`CursoredList`]: ../cursor/struct.CursoredList.html
pub fn unpack_cursored<T: DeserializeOwned>(
    resource: &str,
    status: StatusCode,
    headers: &Headers,
    body: &str,
) -> Result<Response<CursoredList<T>>> {
    let resp: Response<CursorPage<T>> = unpack(resource, status, headers, body)?;

    Ok(resp.map(CursoredList::from_cursor))
}
