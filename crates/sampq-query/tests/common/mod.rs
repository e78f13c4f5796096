//! Test doubles for query adapter and transport contract tests

#![allow(dead_code)]

use sampq_core::error::{Error, Result};
use sampq_core::{CancellationToken, PlayerRecord};
use sampq_query::codec::{self, PacketKind, ServerInfo, response};
use sampq_query::transport::{Exchange, QueryTransport};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::UdpSocket;

/// How the scripted transport answers one packet kind
#[derive(Clone)]
pub enum Script {
    /// Reply with the given payload builder output
    Reply(Vec<u8>),
    /// Fail with a timeout
    Timeout,
    /// Reply with bytes that do not decode
    Garbage,
    /// Wait until cancelled
    Hang,
}

/// A QueryTransport answering from a per-opcode script
///
/// Unscripted packet kinds time out.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    scripts: Arc<Mutex<HashMap<u8, Script>>>,
    calls: Arc<Mutex<Vec<u8>>>,
    exchanges: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, kind: PacketKind, script: Script) -> Self {
        self.scripts.lock().unwrap().insert(kind.opcode(), script);
        self
    }

    /// Opcodes sent so far, in order
    pub fn sent(&self) -> Vec<char> {
        self.calls.lock().unwrap().iter().map(|&b| char::from(b)).collect()
    }

    pub fn exchange_count(&self) -> usize {
        self.exchanges.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl QueryTransport for ScriptedTransport {
    async fn exchange(
        &self,
        target: SocketAddrV4,
        request: &[u8],
        token: &CancellationToken,
    ) -> Result<Exchange> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        assert_eq!(request.len(), codec::HEADER_LEN);
        assert_eq!(&request[..4], codec::MAGIC);
        let opcode = request[codec::HEADER_LEN - 1];
        self.calls.lock().unwrap().push(opcode);

        let script = self.scripts.lock().unwrap().get(&opcode).cloned();
        match script {
            Some(Script::Reply(datagram)) => Ok(Exchange {
                datagram,
                elapsed: Duration::from_millis(25),
            }),
            Some(Script::Garbage) => Ok(Exchange {
                datagram: b"SAMP\x7f\x00\x00\x01\x61\x1e?garbage".to_vec(),
                elapsed: Duration::from_millis(25),
            }),
            Some(Script::Hang) => {
                token.cancelled().await;
                Err(Error::Cancelled)
            }
            Some(Script::Timeout) | None => Err(Error::timeout(target, 1000)),
        }
    }
}

pub fn local_target(port: u16) -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)
}

pub fn info_reply(hostname: &str, players: u16, max_players: u16) -> Vec<u8> {
    response::info(
        local_target(7777),
        &ServerInfo {
            password: false,
            players,
            max_players,
            hostname: hostname.to_string(),
            game_mode: "Freeroam".to_string(),
            language: "English".to_string(),
        },
    )
}

pub fn rules_reply(pairs: &[(&str, &str)]) -> Vec<u8> {
    response::rules(local_target(7777), pairs)
}

pub fn players_reply(kind: PacketKind, names: &[&str]) -> Vec<u8> {
    let players: Vec<_> = names
        .iter()
        .enumerate()
        .map(|(i, name)| PlayerRecord::new(i as u16, *name, 10 * i as i32, 50 + i as i32))
        .collect();
    response::players(local_target(7777), kind, &players)
}

/// A local UDP server answering query packets from canned replies
///
/// Packet kinds without a canned reply are ignored (no datagram is sent).
pub struct UdpResponder {
    pub addr: SocketAddrV4,
    handle: tokio::task::JoinHandle<()>,
}

impl UdpResponder {
    pub async fn start(replies: HashMap<u8, Vec<u8>>) -> Self {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let addr = match socket.local_addr().unwrap() {
            std::net::SocketAddr::V4(v4) => v4,
            other => panic!("unexpected local address {other}"),
        };

        let handle = tokio::spawn(async move {
            let mut buffer = [0u8; 512];
            while let Ok((len, from)) = socket.recv_from(&mut buffer).await {
                if len < codec::HEADER_LEN {
                    continue;
                }
                if let Some(reply) = replies.get(&buffer[codec::HEADER_LEN - 1]) {
                    let _ = socket.send_to(reply, from).await;
                }
            }
        });

        Self { addr, handle }
    }

    /// A responder that never answers
    pub async fn silent() -> Self {
        Self::start(HashMap::new()).await
    }
}

impl Drop for UdpResponder {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
