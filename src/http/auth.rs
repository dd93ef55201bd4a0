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

//! Bearer-token extraction and validation shared by the HTTP handlers
//! (spec 4.3: "recheck IP binding on each call").

use std::net::IpAddr;

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

use crate::error::{Error, ErrorKind};
use crate::state::AppState;

pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, Error> {
	let value = headers
		.get(AUTHORIZATION)
		.ok_or_else(|| Error::from(ErrorKind::AuthMissing))?;
	let value = value
		.to_str()
		.map_err(|_| Error::from(ErrorKind::AuthMalformed))?;
	value
		.strip_prefix("Bearer ")
		.ok_or_else(|| Error::from(ErrorKind::AuthMalformed))
}

pub async fn require_session(state: &AppState, headers: &HeaderMap, ip: IpAddr) -> Result<(), Error> {
	let token = extract_bearer(headers)?;
	if state.sessions.validate(token, ip).await {
		Ok(())
	} else {
		Err(ErrorKind::AuthExpired.into())
	}
}

pub async fn require_admin(state: &AppState, headers: &HeaderMap, ip: IpAddr) -> Result<(), Error> {
	let token = extract_bearer(headers)?;
	state.admin_auth.check(token, ip).await
}
