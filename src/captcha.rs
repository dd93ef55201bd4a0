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

//! CAPTCHA verifier (spec 1 "external collaborators"; spec 4.4, 6): a thin
//! shell around Cloudflare Turnstile's `siteverify` HTTPS endpoint.

use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;

const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";
const CAPTCHA_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct SiteverifyResponse {
	success: bool,
	#[serde(rename = "error-codes", default)]
	error_codes: Vec<String>,
}

pub struct CaptchaClient {
	http: reqwest::Client,
	secret_key: String,
	test_mode: bool,
}

impl CaptchaClient {
	pub fn new(secret_key: String, test_mode: bool) -> CaptchaClient {
		let http = reqwest::Client::builder()
			.timeout(CAPTCHA_TIMEOUT)
			.build()
			.expect("reqwest client builds with static config");
		CaptchaClient {
			http,
			secret_key,
			test_mode,
		}
	}

	/// Verifies a CAPTCHA response token against Turnstile. In test mode the
	/// network is never contacted, matching local-dev behavior (spec 6
	/// `TURNSTILE_TEST_MODE`).
	pub async fn verify(&self, response_token: &str, remote_ip: IpAddr) -> Result<(), String> {
		if self.test_mode {
			return Ok(());
		}

		let form = [
			("secret", self.secret_key.as_str()),
			("response", response_token),
			("remoteip", &remote_ip.to_string()),
		];

		let resp = self
			.http
			.post(SITEVERIFY_URL)
			.form(&form)
			.send()
			.await
			.map_err(|e| format!("captcha request failed: {}", e))?;

		let parsed: SiteverifyResponse = resp
			.json()
			.await
			.map_err(|e| format!("captcha response malformed: {}", e))?;

		if parsed.success {
			Ok(())
		} else {
			Err(parsed.error_codes.join(","))
		}
	}
}
