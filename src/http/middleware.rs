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

//! Outer HTTP middleware (spec 6): a strict security-header/CSP layer
//! applied to every response, and a non-browser User-Agent filter that
//! returns 404 for `/api/*` except `/api/health`, `/api/admin/*`, and the
//! WebSocket upgrade (which screens its own UA via the Admission Pipeline
//! and reports rejection as a close code, not a 404).

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{self, HeaderValue, USER_AGENT};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::admission::is_browser_user_agent;

pub async fn security_headers(req: Request<Body>, next: Next) -> Response {
	let mut response = next.run(req).await;
	let headers = response.headers_mut();
	headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
	headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
	headers.insert(header::REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
	headers.insert(
		header::CONTENT_SECURITY_POLICY,
		HeaderValue::from_static("default-src 'self'"),
	);
	response
}

fn is_exempt(path: &str) -> bool {
	path == "/api/health" || path.starts_with("/api/admin") || path == "/api/ws"
}

pub async fn require_browser_ua(req: Request<Body>, next: Next) -> Response {
	let path = req.uri().path().to_string();
	if !is_exempt(&path) {
		let ua = req.headers().get(USER_AGENT).and_then(|v| v.to_str().ok());
		if !is_browser_user_agent(ua) {
			return StatusCode::NOT_FOUND.into_response();
		}
	}
	next.run(req).await
}
