//! Integration coverage for the Puzzle Engine's single-winner property
//! (spec 8, scenario 2) and the Hashrate/Difficulty surfaces it drives.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, Version};

use hashpass::audit::AuditLog;
use hashpass::config::DifficultyConfig;
use hashpass::pow::{self, Argon2Params, WorkerPool, HASH_LEN};
use hashpass::puzzle::{PuzzleEngine, Submission};
use hashpass::registry::ConnectionRegistry;
use hashpass::stats::SubmissionStats;
use hashpass::webhook::WebhookNotifier;

fn ip() -> IpAddr {
	IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn small_argon2() -> Argon2Params {
	Argon2Params {
		time_cost: 1,
		memory_cost_kb: 8,
		parallelism: 1,
	}
}

/// Difficulty clamped to exactly 0 so every recomputed hash satisfies the
/// leading-zero-bit requirement; the test only exercises single-winner
/// seed linearizability, not the difficulty check itself.
fn zero_difficulty_config() -> DifficultyConfig {
	DifficultyConfig {
		d_min: 0,
		d_max: 0,
		target_time: 75.0,
		target_timeout: 600.0,
		ema_window: 5,
	}
}

fn compute_hash(seed: &str, visitor_id: &str, trace_data: &str, nonce: u64, params: &Argon2Params) -> String {
	let salt = pow::build_salt(seed, visitor_id, trace_data);
	let argon2_params = Params::new(params.memory_cost_kb, params.time_cost, params.parallelism, Some(HASH_LEN)).unwrap();
	let argon2 = Argon2::new(Algorithm::Argon2d, Version::V0x13, argon2_params);
	let mut out = [0u8; HASH_LEN];
	argon2
		.hash_password_into(nonce.to_string().as_bytes(), &salt, &mut out)
		.unwrap();
	hex::encode(out)
}

fn temp_audit_path(label: &str) -> String {
	std::env::temp_dir()
		.join(format!("hashpass-it-{}-{}.json", label, rand::random::<u64>()))
		.to_string_lossy()
		.to_string()
}

#[tokio::test]
async fn exactly_one_concurrent_submission_wins_against_the_same_seed() {
	let pool = Arc::new(WorkerPool::new(4));
	let engine = Arc::new(PuzzleEngine::new(
		zero_difficulty_config(),
		0,
		small_argon2(),
		pool,
		b"integration-test-hmac-secret".to_vec(),
		0.0,
	));
	let registry = Arc::new(ConnectionRegistry::new());
	let audit_path = temp_audit_path("single-winner");
	let audit = Arc::new(AuditLog::new(audit_path.clone()));
	let webhook = Arc::new(WebhookNotifier::new(None, None));
	let stats = Arc::new(SubmissionStats::default());

	let seed = engine.view().await.seed;
	let trace = format!("ip={}", ip());
	let visitor_id = "racer";

	let mut handles = Vec::new();
	for nonce in 0u64..8 {
		let hash = compute_hash(&seed, visitor_id, &trace, nonce, &small_argon2());
		let submission = Submission {
			visitor_id: visitor_id.to_string(),
			nonce,
			submitted_seed: seed.clone(),
			trace_data: trace.clone(),
			hash,
		};
		let engine = engine.clone();
		let registry = registry.clone();
		let audit = audit.clone();
		let webhook = webhook.clone();
		let stats = stats.clone();
		handles.push(tokio::spawn(async move {
			engine
				.submit(&submission, ip(), &registry, &audit, &webhook, &stats)
				.await
		}));
	}

	let mut wins = 0;
	let mut stale = 0;
	for handle in handles {
		match handle.await.unwrap() {
			Ok(_invite_code) => wins += 1,
			Err(e) => {
				assert!(matches!(e.kind(), hashpass::error::ErrorKind::PuzzleStale));
				stale += 1;
			}
		}
	}

	assert_eq!(wins, 1, "exactly one concurrent submission must win");
	assert_eq!(stale, 7);
	assert_ne!(engine.view().await.seed, seed, "a win must rotate the seed");

	let _ = std::fs::remove_file(&audit_path);
}

#[tokio::test]
async fn invite_code_is_deterministic_given_identical_inputs() {
	let secret = b"another-integration-secret";
	let a = hashpass::invite::derive(secret, "visitor-x", 7, "deadbeefseed");
	let b = hashpass::invite::derive(secret, "visitor-x", 7, "deadbeefseed");
	assert_eq!(a, b);
}
