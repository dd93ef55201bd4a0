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

//! `GET /api/turnstile/config` (spec 6): exposes only the public site key
//! and whether the server is running in test mode, never the secret key.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn turnstile_config(State(state): State<AppState>) -> Json<Value> {
	Json(json!({
		"siteKey": state.config.turnstile_site_key,
		"testMode": state.config.turnstile_test_mode,
	}))
}
