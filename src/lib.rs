// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A library for the typed core of a Twitter v1.1 API client: cursor
//! pagination, rate-limit accounting, and a closed error taxonomy.
//!
//! This crate deliberately stops short of the network. It takes a completed
//! exchange (a status code, a set of headers, and a decoded body) from
//! whatever transport you use, and turns it into typed values:
//!
//! * [`Response<T>`], a decoded payload with the rate-limit snapshot from
//!   that call's headers riding along;
//! * [`CursoredList<T>`], a page of results from a cursored endpoint, with
//!   opaque forward/backward page tokens and `has_next`/`has_previous`
//!   derived from them;
//! * [`ApiError`], a typed failure with an [`ErrorKind`] you can match on
//!   instead of string-matching messages, carrying the rate-limit status
//!   when the failure was quota exhaustion.
//!
//! [`Response<T>`]: response/struct.Response.html
//! [`CursoredList<T>`]: cursor/struct.CursoredList.html
//! [`ApiError`]: error/struct.ApiError.html
//! [`ErrorKind`]: error/enum.ErrorKind.html
//!
//! The expected flow looks like this: your transport performs a call and
//! hands the raw exchange to [`response::unpack`] (or
//! [`response::unpack_cursored`] for cursored endpoints). On a success
//! status the body is deserialized and wrapped; on anything else the
//! exchange is run through [`error::classify`] and the call fails with the
//! resulting `ApiError`. Classification is total: every combination of
//! status and service error code resolves to exactly one `ErrorKind`, with
//! `Unknown` as the fallback for signals this library doesn't recognize.
//!
//! [`response::unpack`]: response/fn.unpack.html
//! [`response::unpack_cursored`]: response/fn.unpack_cursored.html
//! [`error::classify`]: error/fn.classify.html
//!
//! ```
//! use waxwing::{ErrorKind, Headers};
//! use hyper::StatusCode;
//!
//! let body = r#"{"errors":[{"code":34,"message":"Sorry, that page does not exist"}]}"#;
//! let err = waxwing::classify("/users/show/:id", StatusCode::NOT_FOUND, &Headers::new(), body);
//!
//! match err.kind {
//!     ErrorKind::ResourceNotFound => println!("no such user: {}", err.message),
//!     ErrorKind::RateLimitExceeded => println!("over quota"),
//!     _ => println!("call failed: {}", err),
//! }
//! ```
//!
//! Everything in here is a pure function from input to a freshly built,
//! immutable value. There is no shared state, nothing blocks, and all types
//! can be used from concurrent tasks freely.

use hyper::header::{HeaderMap, HeaderValue};

pub mod cursor;
pub mod error;
pub mod response;

pub use crate::cursor::{CursoredList, PageCursor};
pub use crate::error::{classify, ApiError, ErrorKind};
pub use crate::response::{parse_rate_limit, RateLimitStatus, Response};

/// A set of headers from a completed API exchange.
pub type Headers = HeaderMap<HeaderValue>;
