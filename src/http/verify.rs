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

//! `POST /api/verify` — bearer required (spec 6); the HTTP face of the
//! Puzzle Engine's single-winner critical section (spec 4.1).

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::error::Error;
use crate::http::auth::require_session;
use crate::puzzle::Submission;
use crate::state::AppState;

pub async fn verify(
	State(state): State<AppState>,
	ConnectInfo(addr): ConnectInfo<SocketAddr>,
	headers: HeaderMap,
	Json(submission): Json<Submission>,
) -> Result<Json<Value>, Error> {
	require_session(&state, &headers, addr.ip()).await?;
	let invite_code = state
		.engine
		.submit(
			&submission,
			addr.ip(),
			&state.registry,
			&state.audit,
			&state.webhook,
			&state.stats,
		)
		.await?;
	Ok(Json(json!({ "invite_code": invite_code })))
}
