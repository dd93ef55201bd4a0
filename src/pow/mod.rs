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

//! Hash Verifier (spec 4.9) and the Worker Pool that runs it off the I/O
//! path (spec 4.1 step 7, spec section 2 component 2).
//!
//! The verifier itself is a pure function: it re-derives the Argon2d
//! digest from the salt materials the client claims to have used, checks it
//! against the claimed hash in constant time, and counts leading zero
//! bits. Leading-zero-bit counting follows the per-byte `leading_zeros()`
//! walk used throughout the `zolagonano-rspow` reference library.

mod worker_pool;

pub use worker_pool::WorkerPool;

use argon2::{Algorithm, Argon2, Params, Version};
use subtle::ConstantTimeEq;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Argon2Params {
	pub time_cost: u32,
	pub memory_cost_kb: u32,
	pub parallelism: u32,
}

impl Default for Argon2Params {
	fn default() -> Self {
		Argon2Params {
			time_cost: 3,
			memory_cost_kb: 65536,
			parallelism: 1,
		}
	}
}

pub const HASH_LEN: usize = 32;

/// Outcome of a verification attempt, with enough detail to build the
/// spec's `BadSolution` error variants.
pub struct VerifyOutcome {
	pub hash_matches: bool,
	pub leading_zero_bits: u32,
}

/// Recomputes Argon2d(nonce) with the given salt and params, and reports
/// whether it matches `claimed_hash_hex` and how many leading zero bits the
/// digest has. Pure, CPU-bound, intended to run inside the Worker Pool.
pub fn verify(
	nonce_str: &str,
	salt: &[u8],
	claimed_hash_hex: &str,
	params: &Argon2Params,
) -> Result<VerifyOutcome, String> {
	let argon2_params = Params::new(
		params.memory_cost_kb,
		params.time_cost,
		params.parallelism,
		Some(HASH_LEN),
	)
	.map_err(|e| format!("invalid argon2 params: {}", e))?;
	let argon2 = Argon2::new(Algorithm::Argon2d, Version::V0x13, argon2_params);

	let mut out = [0u8; HASH_LEN];
	argon2
		.hash_password_into(nonce_str.as_bytes(), salt, &mut out)
		.map_err(|e| format!("argon2 hashing failed: {}", e))?;

	let computed_hex = hex::encode(out);
	let hash_matches: bool = computed_hex.as_bytes().ct_eq(claimed_hash_hex.as_bytes()).into();
	let leading_zero_bits = leading_zero_bits(&out);

	Ok(VerifyOutcome {
		hash_matches,
		leading_zero_bits,
	})
}

fn leading_zero_bits(hash: &[u8; HASH_LEN]) -> u32 {
	let mut count = 0u32;
	for byte in hash {
		if *byte == 0 {
			count += 8;
			continue;
		}
		count += byte.leading_zeros();
		break;
	}
	count
}

/// Builds the salt bytes for a submission: `seed || visitor_id || trace_data`
/// as raw UTF-8 byte concatenation (spec 4.1 step 7).
pub fn build_salt(seed: &str, visitor_id: &str, trace_data: &str) -> Vec<u8> {
	let mut salt = Vec::with_capacity(seed.len() + visitor_id.len() + trace_data.len());
	salt.extend_from_slice(seed.as_bytes());
	salt.extend_from_slice(visitor_id.as_bytes());
	salt.extend_from_slice(trace_data.as_bytes());
	salt
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn leading_zero_bits_counts_full_zero_bytes() {
		let mut hash = [0u8; HASH_LEN];
		hash[4] = 0b0000_1111;
		assert_eq!(leading_zero_bits(&hash), 4 * 8 + 4);
	}

	#[test]
	fn leading_zero_bits_zero_for_leading_one_bit() {
		let mut hash = [0u8; HASH_LEN];
		hash[0] = 0b1000_0000;
		assert_eq!(leading_zero_bits(&hash), 0);
	}

	#[test]
	fn verify_rejects_mismatched_claimed_hash() {
		let params = Argon2Params {
			time_cost: 1,
			memory_cost_kb: 8,
			parallelism: 1,
		};
		let salt = build_salt("deadbeef", "visitor-1", "ip=127.0.0.1\n");
		let outcome = verify("12345", &salt, "00", &params).unwrap();
		assert!(!outcome.hash_matches);
	}

	#[test]
	fn verify_accepts_self_consistent_hash() {
		let params = Argon2Params {
			time_cost: 1,
			memory_cost_kb: 8,
			parallelism: 1,
		};
		let salt = build_salt("deadbeef", "visitor-1", "ip=127.0.0.1\n");
		let argon2_params = Params::new(
			params.memory_cost_kb,
			params.time_cost,
			params.parallelism,
			Some(HASH_LEN),
		)
		.unwrap();
		let argon2 = Argon2::new(Algorithm::Argon2d, Version::V0x13, argon2_params);
		let mut out = [0u8; HASH_LEN];
		argon2
			.hash_password_into("12345".as_bytes(), &salt, &mut out)
			.unwrap();
		let hex_hash = hex::encode(out);

		let outcome = verify("12345", &salt, &hex_hash, &params).unwrap();
		assert!(outcome.hash_matches);
		assert_eq!(outcome.leading_zero_bits, leading_zero_bits(&out));
	}
}
