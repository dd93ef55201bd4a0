//! Integration coverage for session issuance, IP binding, and reconnect
//! classification (spec 8: "identity binding", "reconnect idempotence").

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use hashpass::admission::{classify, ConnectMode};
use hashpass::session::SessionStore;

fn ip_a() -> IpAddr {
	IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))
}

fn ip_b() -> IpAddr {
	IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))
}

#[tokio::test]
async fn an_unknown_token_classifies_as_first_connect() {
	let sessions = SessionStore::new(Duration::from_secs(300));
	let mode = classify("not-a-real-token", ip_a(), &sessions).await;
	assert!(matches!(mode, ConnectMode::FirstConnect));
}

#[tokio::test]
async fn a_valid_token_from_the_issuing_ip_classifies_as_reconnect() {
	let sessions = SessionStore::new(Duration::from_secs(300));
	let token = sessions.generate(1, ip_a()).await;
	sessions.mark_disconnected(1).await;

	let mode = classify(&token, ip_a(), &sessions).await;
	assert!(matches!(mode, ConnectMode::Reconnect));
}

#[tokio::test]
async fn the_same_token_from_a_different_ip_never_reconnects() {
	let sessions = SessionStore::new(Duration::from_secs(300));
	let token = sessions.generate(1, ip_a()).await;
	sessions.mark_disconnected(1).await;

	let mode = classify(&token, ip_b(), &sessions).await;
	assert!(matches!(mode, ConnectMode::FirstConnect));
}

#[tokio::test]
async fn reconnect_then_disconnect_then_reconnect_both_succeed_until_revoked() {
	let sessions = SessionStore::new(Duration::from_secs(300));
	let token = sessions.generate(1, ip_a()).await;

	sessions.mark_disconnected(1).await;
	assert!(sessions.validate(&token, ip_a()).await);
	sessions.reconnect(&token, 2).await;

	sessions.mark_disconnected(2).await;
	assert!(sessions.validate(&token, ip_a()).await);
	sessions.reconnect(&token, 3).await;

	sessions.revoke_all().await;
	assert!(!sessions.validate(&token, ip_a()).await);
}
