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

//! Admission Pipeline (spec 4.4): the entry contracts gating the WebSocket
//! endpoint. Pure screening logic lives here; the actual socket
//! registration and session issuance stay in the HTTP layer, which is the
//! only place holding the live `WebSocket` value.

use std::net::IpAddr;

use crate::ban::BanSet;
use crate::captcha::CaptchaClient;
use crate::error::{Error, ErrorKind};
use crate::registry::ConnectionRegistry;
use crate::session::SessionStore;

/// Substrings of a User-Agent that mark it as a known automation client
/// (spec 4.4a). Matched case-insensitively. Mirrors the blocklist in
/// `examples/original_source/src/core/useragent.py`'s `_BOT_PATTERN`, plus a
/// few browser-automation signatures (`phantomjs`, `selenium`, `puppeteer`,
/// `playwright`) the original covers only via the generic `headless` term.
const AUTOMATION_PATTERNS: &[&str] = &[
	"curl",
	"wget",
	"python-requests",
	"python-httpx",
	"python-urllib",
	"httpx",
	"go-http-client",
	"java/",
	"apache-httpclient",
	"postmanruntime",
	"insomnia",
	"httpie",
	"node-fetch",
	"axios",
	"undici",
	"got/",
	"superagent",
	"scrapy",
	"mechanize",
	"aiohttp",
	"bot",
	"crawler",
	"spider",
	"headless",
	"phantomjs",
	"selenium",
	"puppeteer",
	"playwright",
];

/// Whether `ua` passes the browser screen: present, not a known automation
/// signature, and prefixed with `Mozilla/5.0` (spec 4.4a).
pub fn is_browser_user_agent(ua: Option<&str>) -> bool {
	let Some(ua) = ua else { return false };
	if ua.is_empty() {
		return false;
	}
	let lower = ua.to_lowercase();
	if AUTOMATION_PATTERNS.iter().any(|pattern| lower.contains(pattern)) {
		return false;
	}
	ua.starts_with("Mozilla/5.0")
}

pub enum ConnectMode {
	Reconnect,
	FirstConnect,
}

/// Decides which of the two entry modes (spec 4.4) a connection attempt
/// is in: the `token` query parameter is first tried as a session token;
/// if it validates for this IP the attempt is a reconnect, otherwise it is
/// treated as a first-connect CAPTCHA response.
pub async fn classify(token: &str, ip: IpAddr, sessions: &SessionStore) -> ConnectMode {
	if sessions.validate(token, ip).await {
		ConnectMode::Reconnect
	} else {
		ConnectMode::FirstConnect
	}
}

/// Runs the first-connect checks (spec 4.4.1 a-d): UA screen, ban check,
/// duplicate-connection check, CAPTCHA verification. Registration of the
/// socket and session-token issuance happen in the caller once this
/// succeeds.
pub async fn screen_first_connect(
	ua: Option<&str>,
	ip: IpAddr,
	captcha_response: &str,
	ban_set: &BanSet,
	registry: &ConnectionRegistry,
	captcha: &CaptchaClient,
) -> Result<(), Error> {
	if !is_browser_user_agent(ua) {
		return Err(ErrorKind::IdentityMismatch.into());
	}
	if ban_set.is_banned(ip).await {
		return Err(ErrorKind::IdentityMismatch.into());
	}
	if registry.has_connection(ip).await {
		return Err(ErrorKind::DuplicateConnection.into());
	}
	captcha
		.verify(captcha_response, ip)
		.await
		.map_err(|reason| Error::from(ErrorKind::CaptchaFailed(reason)))?;
	Ok(())
}

/// Runs the reconnect check (spec 4.4.2): the token must validate for the
/// current IP. No CAPTCHA re-challenge.
pub async fn screen_reconnect(token: &str, ip: IpAddr, sessions: &SessionStore) -> Result<(), Error> {
	if sessions.validate(token, ip).await {
		Ok(())
	} else {
		Err(ErrorKind::AuthExpired.into())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn accepts_a_plain_browser_ua() {
		let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
		assert!(is_browser_user_agent(Some(ua)));
	}

	#[test]
	fn rejects_missing_ua() {
		assert!(!is_browser_user_agent(None));
	}

	#[test]
	fn rejects_non_mozilla_prefix() {
		assert!(!is_browser_user_agent(Some("HashPassClient/1.0")));
	}

	#[test]
	fn rejects_known_automation_signatures() {
		assert!(!is_browser_user_agent(Some(
			"Mozilla/5.0 (compatible; HeadlessChrome/115.0)"
		)));
		assert!(!is_browser_user_agent(Some("curl/8.0.1")));
	}

	#[test]
	fn rejects_http_client_library_signatures() {
		assert!(!is_browser_user_agent(Some("axios/1.6.0")));
		assert!(!is_browser_user_agent(Some("python-httpx/0.27")));
		assert!(!is_browser_user_agent(Some("Mozilla/5.0 (node-fetch)")));
		assert!(!is_browser_user_agent(Some("Mozilla/5.0 Go-http-client/1.1")));
	}
}
