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

//! Webhook notifier (spec 1 "external collaborators"; spec 4.1 step 10,
//! spec 5): fires a non-blocking notification on every solve. Failures are
//! recovered locally per spec 7 ("webhook failures" are never surfaced);
//! retries use exponential backoff (1s, 2s) up to 3 attempts (spec 5).

use std::time::Duration;

use serde::Serialize;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_ATTEMPTS: u32 = 3;

#[derive(Clone, Serialize)]
pub struct SolvePayload {
	pub visitor_id: String,
	pub invite_code: String,
	pub difficulty: u32,
	pub solve_time: f64,
}

#[derive(Clone)]
pub struct WebhookNotifier {
	http: reqwest::Client,
	url: Option<String>,
	token: Option<String>,
}

impl WebhookNotifier {
	pub fn new(url: Option<String>, token: Option<String>) -> WebhookNotifier {
		let http = reqwest::Client::builder()
			.timeout(WEBHOOK_TIMEOUT)
			.build()
			.expect("reqwest client builds with static config");
		WebhookNotifier { http, url, token }
	}

	/// Schedules the notification on a detached task so it never delays the
	/// `verify` response (spec 4.1 step 10: "must not delay the response").
	pub fn notify(&self, payload: SolvePayload) {
		let Some(url) = self.url.clone() else { return };
		let token = self.token.clone();
		let http = self.http.clone();
		tokio::spawn(async move {
			let mut delay = Duration::from_secs(1);
			for attempt in 1..=MAX_ATTEMPTS {
				let mut req = http.post(&url).json(&payload);
				if let Some(token) = &token {
					req = req.bearer_auth(token);
				}
				match req.send().await {
					Ok(resp) if resp.status().is_success() => return,
					Ok(resp) => {
						log::warn!(
							"webhook attempt {} returned status {}",
							attempt,
							resp.status()
						);
					}
					Err(e) => log::warn!("webhook attempt {} failed: {}", attempt, e),
				}
				if attempt < MAX_ATTEMPTS {
					tokio::time::sleep(delay).await;
					delay *= 2;
				}
			}
			log::warn!("webhook notification exhausted all retries");
		});
	}
}
