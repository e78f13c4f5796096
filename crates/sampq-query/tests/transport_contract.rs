//! Architectural Contract Test: UDP Transport
//!
//! Constraints verified:
//! - A silent peer yields a timeout close to the configured deadline
//! - One request produces one reply over a real socket
//! - Cancellation ends an in-flight exchange promptly
//! - Replies larger than a typical MTU arrive whole

mod common;

use common::*;
use sampq_core::{CancellationToken, Error, ServerQuery};
use sampq_query::codec::{self, PacketKind};
use sampq_query::transport::{QueryTransport, UdpTransport};
use sampq_query::QueryAdapter;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[tokio::test]
async fn silent_peer_times_out_near_deadline() {
    let responder = UdpResponder::silent().await;
    let transport = UdpTransport::new(Duration::from_millis(200));
    let token = CancellationToken::new();

    let started = Instant::now();
    let request = codec::encode_request(PacketKind::Info, responder.addr);
    let result = transport.exchange(responder.addr, &request, &token).await;
    let elapsed = started.elapsed();

    match result {
        Err(Error::Timeout { after_ms, .. }) => assert_eq!(after_ms, 200),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_millis(180), "returned too early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1500), "returned too late: {elapsed:?}");
}

#[tokio::test]
async fn one_request_one_reply() {
    let reply = info_reply("Local", 3, 30);
    let responder = UdpResponder::start(HashMap::from([(b'i', reply.clone())])).await;
    let transport = UdpTransport::default();
    let token = CancellationToken::new();

    let request = codec::encode_request(PacketKind::Info, responder.addr);
    let exchange = transport
        .exchange(responder.addr, &request, &token)
        .await
        .unwrap();

    assert_eq!(exchange.datagram, reply);
}

#[tokio::test]
async fn cancellation_ends_exchange_promptly() {
    let responder = UdpResponder::silent().await;
    let transport = UdpTransport::new(Duration::from_secs(10));
    let token = CancellationToken::new();

    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            token.cancel();
        })
    };

    let started = Instant::now();
    let request = codec::encode_request(PacketKind::Info, responder.addr);
    let result = transport.exchange(responder.addr, &request, &token).await;
    canceller.await.unwrap();

    assert!(matches!(result, Err(Error::Cancelled)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn adapter_end_to_end_over_udp() {
    let responder = UdpResponder::start(HashMap::from([
        (b'i', info_reply("Test Server", 5, 50)),
        (b'r', rules_reply(&[("lagcomp", "Off"), ("version", "0.3.7-R2")])),
        (b'c', players_reply(PacketKind::PlayersBrief, &["alice"])),
    ]))
    .await;
    let adapter = QueryAdapter::with_transport(UdpTransport::new(Duration::from_millis(300)));
    let token = CancellationToken::new();
    let host_port = responder.addr.to_string();

    let record = adapter.get_full_info(&host_port, &token).await.unwrap();

    assert_eq!(record.name(), "Test Server");
    assert_eq!(record.players_count(), 5);
    assert_eq!(record.max_players(), 50);
    assert!(!record.lag_compensation());
    assert_eq!(record.version(), "0.3.7-R2");
    assert_eq!(record.players(), ["alice"], "silent 'd' falls back to 'c'");

    assert!(!adapter.is_open_mp(&host_port, &token).await.unwrap());
}

#[tokio::test]
async fn large_player_list_is_not_truncated() {
    let names: Vec<String> = (0..250).map(|i| format!("long_player_name_{i:04}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let reply = players_reply(PacketKind::PlayersDetailed, &names);
    assert!(reply.len() > 4096);

    let responder = UdpResponder::start(HashMap::from([(b'd', reply)])).await;
    let adapter = QueryAdapter::with_transport(UdpTransport::new(Duration::from_millis(300)));
    let token = CancellationToken::new();

    let players = adapter
        .get_players(&responder.addr.to_string(), &token)
        .await
        .unwrap();

    assert_eq!(players.len(), 250);
    assert_eq!(players[249].name, "long_player_name_0249");
}
