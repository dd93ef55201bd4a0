// Copyright 2026 The HashPass Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors that can be surfaced across HTTP, WebSocket and the admin plane.
//!
//! Modeled on the teacher's `grin_api::error` module: a `Fail`-deriving
//! `ErrorKind` wrapped in a `failure::Context`, with a `kind()` accessor.
//! Every variant here maps 1:1 onto a row of the error table in the spec.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use failure::{Backtrace, Context, Fail};
use serde_json::json;
use std::fmt::{self, Display};

#[derive(Debug)]
pub struct Error {
	inner: Context<ErrorKind>,
}

#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
	#[fail(display = "Authorization header missing")]
	AuthMissing,
	#[fail(display = "Authorization header malformed")]
	AuthMalformed,
	#[fail(display = "Session token expired or revoked")]
	AuthExpired,
	#[fail(display = "ADMIN_TOKEN not configured")]
	AdminNotConfigured,
	#[fail(display = "Admin authentication failed")]
	AdminForbidden,
	#[fail(display = "Too many failed admin attempts, locked out")]
	AdminLockedOut,
	#[fail(display = "Identity mismatch")]
	IdentityMismatch,
	#[fail(display = "Puzzle is stale")]
	PuzzleStale,
	#[fail(display = "Nonce speed too high: {} H/s", _0)]
	SpeedTooHigh(f64),
	#[fail(display = "Hash mismatch")]
	BadSolutionMismatch,
	#[fail(
		display = "Hash does not meet difficulty requirement ({} needed, got {})",
		needed, got
	)]
	BadSolutionDifficulty { needed: u32, got: u32 },
	#[fail(display = "CAPTCHA verification failed: {}", _0)]
	CaptchaFailed(String),
	#[fail(display = "Duplicate connection from same IP")]
	DuplicateConnection,
	#[fail(display = "Bad request: {}", _0)]
	BadRequest(String),
	#[fail(display = "Internal error: {}", _0)]
	Internal(String),
}

impl Fail for Error {
	fn cause(&self) -> Option<&dyn Fail> {
		self.inner.cause()
	}

	fn backtrace(&self) -> Option<&Backtrace> {
		self.inner.backtrace()
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		Display::fmt(&self.inner, f)
	}
}

impl Error {
	pub fn kind(&self) -> &ErrorKind {
		self.inner.get_context()
	}

	/// Close code + human-readable reason for the WebSocket transport.
	pub fn ws_close(&self) -> (u16, String) {
		match self.kind() {
			ErrorKind::IdentityMismatch => (1008, "Identity mismatch".to_string()),
			ErrorKind::DuplicateConnection => {
				(1008, "Duplicate connection from same IP".to_string())
			}
			ErrorKind::CaptchaFailed(reason) => (1008, format!("CAPTCHA failed: {}", reason)),
			ErrorKind::AuthExpired => (1008, "Session token expired or revoked".to_string()),
			other => (1008, other.to_string()),
		}
	}
}

impl From<ErrorKind> for Error {
	fn from(kind: ErrorKind) -> Error {
		Error {
			inner: Context::new(kind),
		}
	}
}

impl From<Context<ErrorKind>> for Error {
	fn from(inner: Context<ErrorKind>) -> Error {
		Error { inner }
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = match self.kind() {
			ErrorKind::AuthMissing
			| ErrorKind::AuthMalformed
			| ErrorKind::AuthExpired
			| ErrorKind::AdminNotConfigured => StatusCode::UNAUTHORIZED,
			ErrorKind::AdminForbidden => StatusCode::FORBIDDEN,
			ErrorKind::AdminLockedOut => StatusCode::TOO_MANY_REQUESTS,
			ErrorKind::IdentityMismatch => StatusCode::FORBIDDEN,
			ErrorKind::PuzzleStale => StatusCode::CONFLICT,
			ErrorKind::SpeedTooHigh(_) => StatusCode::BAD_REQUEST,
			ErrorKind::BadSolutionMismatch | ErrorKind::BadSolutionDifficulty { .. } => {
				StatusCode::BAD_REQUEST
			}
			ErrorKind::CaptchaFailed(_) => StatusCode::FORBIDDEN,
			ErrorKind::DuplicateConnection => StatusCode::CONFLICT,
			ErrorKind::BadRequest(_) => StatusCode::BAD_REQUEST,
			ErrorKind::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
		};
		let body = Json(json!({ "error": self.kind().to_string() }));
		(status, body).into_response()
	}
}
