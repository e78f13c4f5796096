//! Test doubles and common utilities for service contract tests
//!
//! These doubles record how often they are called so tests can assert that
//! validation happens before any I/O and that no retries sneak in.

#![allow(dead_code)]

use sampq_core::error::{Error, Result};
use sampq_core::traits::{GatewayResponse, MonitoringGateway, ServerQuery};
use sampq_core::{CancellationToken, PlayerRecord, ServerRecord};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How a [`CountingQuery`] answers
#[derive(Clone)]
pub enum QueryBehavior {
    /// Answer with a record built from the target address
    Respond { name: String, players: u32, max: u32 },
    /// Fail with a timeout for every target
    Timeout,
    /// Never answer until the token fires
    Hang,
}

/// A ServerQuery that counts calls and answers per [`QueryBehavior`]
#[derive(Clone)]
pub struct CountingQuery {
    behavior: QueryBehavior,
    calls: Arc<AtomicUsize>,
}

impl CountingQuery {
    pub fn new(behavior: QueryBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer every query with `name` and the given counts
    pub fn responding(name: &str, players: u32, max: u32) -> Self {
        Self::new(QueryBehavior::Respond {
            name: name.to_string(),
            players,
            max,
        })
    }

    /// Total number of calls across every operation
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self, host_port: &str, token: &CancellationToken) -> Result<ServerRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            QueryBehavior::Respond { name, players, max } => {
                Ok(ServerRecord::new(name.clone(), host_port)
                    .with_player_counts(*players, *max)
                    .with_ping(15))
            }
            QueryBehavior::Timeout => Err(Error::timeout(host_port, 1000)),
            QueryBehavior::Hang => {
                token.cancelled().await;
                Err(Error::Cancelled)
            }
        }
    }
}

#[async_trait::async_trait]
impl ServerQuery for CountingQuery {
    async fn get_info(&self, host_port: &str, token: &CancellationToken) -> Result<ServerRecord> {
        let record = self.answer(host_port, token).await?;
        Ok(record.with_ping(0))
    }

    async fn get_info_with_ping(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> Result<ServerRecord> {
        self.answer(host_port, token).await
    }

    async fn get_rules(&self, host_port: &str, token: &CancellationToken) -> Result<ServerRecord> {
        self.answer(host_port, token).await?;
        Ok(ServerRecord::new("", host_port).with_lag_compensation(true))
    }

    async fn get_players(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> Result<Vec<PlayerRecord>> {
        self.answer(host_port, token).await?;
        Ok(vec![PlayerRecord::new(0, "alice", 10, 40)])
    }

    async fn get_full_info(
        &self,
        host_port: &str,
        token: &CancellationToken,
    ) -> Result<ServerRecord> {
        let record = self.answer(host_port, token).await?;
        Ok(record
            .with_lag_compensation(true)
            .with_players(vec!["alice".to_string()]))
    }

    async fn is_open_mp(&self, host_port: &str, token: &CancellationToken) -> Result<bool> {
        match self.answer(host_port, token).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// A MonitoringGateway returning a fixed list and counting calls
pub struct StubGateway {
    name: &'static str,
    servers: Vec<ServerRecord>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl StubGateway {
    pub fn new(name: &'static str, servers: Vec<ServerRecord>) -> Self {
        Self {
            name,
            servers,
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Delay every list call (to keep calls in flight across a swap)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl MonitoringGateway for StubGateway {
    async fn list_servers(
        &self,
        token: &CancellationToken,
    ) -> Result<GatewayResponse<Vec<ServerRecord>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            biased;
            () = token.cancelled() => Err(Error::Cancelled),
            () = tokio::time::sleep(self.delay) => Ok(GatewayResponse::Data(self.servers.clone())),
        }
    }

    async fn get_server_info(
        &self,
        host: &str,
        port: u16,
        _token: &CancellationToken,
    ) -> Result<GatewayResponse<ServerRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayResponse::Data(ServerRecord::new(
            self.name,
            format!("{host}:{port}"),
        )))
    }

    async fn get_server_players(
        &self,
        _host: &str,
        _port: u16,
        _token: &CancellationToken,
    ) -> Result<GatewayResponse<Vec<PlayerRecord>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GatewayResponse::Unsupported)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// A service over a stub gateway and the given query double
pub fn service_with(query: &CountingQuery) -> sampq_core::ServerListService {
    sampq_core::ServerListService::new(
        Arc::new(StubGateway::new("stub", Vec::new())),
        Arc::new(query.clone()),
    )
}
