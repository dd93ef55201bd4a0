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

//! Invite code derivation (spec 3 invariants, spec 6): a deterministic
//! function of `(hmac_secret, visitor_id, nonce, seed)`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const CODE_LEN: usize = 10;

/// `base64url(HMAC-SHA256(hmac_secret, "visitor_id:nonce:seed"))[:10]`
pub fn derive(hmac_secret: &[u8], visitor_id: &str, nonce: u64, seed: &str) -> String {
	let message = format!("{}:{}:{}", visitor_id, nonce, seed);
	let mut mac =
		HmacSha256::new_from_slice(hmac_secret).expect("HMAC accepts a key of any length");
	mac.update(message.as_bytes());
	let tag = mac.finalize().into_bytes();
	let encoded = URL_SAFE_NO_PAD.encode(tag);
	encoded.chars().take(CODE_LEN).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn deterministic_for_same_inputs() {
		let secret = b"super-secret-key-0123456789abcdef";
		let a = derive(secret, "visitor-1", 42, "seedseed");
		let b = derive(secret, "visitor-1", 42, "seedseed");
		assert_eq!(a, b);
		assert_eq!(a.len(), CODE_LEN);
	}

	#[test]
	fn differs_when_any_input_changes() {
		let secret = b"super-secret-key-0123456789abcdef";
		let base = derive(secret, "visitor-1", 42, "seedseed");
		assert_ne!(base, derive(secret, "visitor-2", 42, "seedseed"));
		assert_ne!(base, derive(secret, "visitor-1", 43, "seedseed"));
		assert_ne!(base, derive(secret, "visitor-1", 42, "otherseed"));
		assert_ne!(base, derive(b"different-secret-0123456789abcdef", "visitor-1", 42, "seedseed"));
	}
}
