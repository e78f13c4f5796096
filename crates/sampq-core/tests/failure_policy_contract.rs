//! Architectural Contract Test: Failure Policy
//!
//! Constraints verified:
//! - A failed live query yields an absent result, never a fabricated record
//! - The unknown sentinel is substituted only on request
//! - Cancellation is distinct from every other failure
//! - Bulk refresh yields one record per address and stops on cancellation

mod common;

use common::*;
use sampq_core::model::UNKNOWN_SERVER_NAME;
use sampq_core::{CancellationToken, Error};
use std::time::Duration;
use tokio_stream::StreamExt;

#[tokio::test]
async fn timeout_yields_none_at_orchestration_layer() {
    let query = CountingQuery::new(QueryBehavior::Timeout);
    let service = service_with(&query);
    let token = CancellationToken::new();

    let result = service.get_full_server_info("127.0.0.1", 7777, &token).await;

    assert!(matches!(result, Ok(None)));
    assert_eq!(query.call_count(), 1, "no retries at the orchestration layer");
}

#[tokio::test]
async fn timeout_yields_unknown_sentinel_on_request() {
    let query = CountingQuery::new(QueryBehavior::Timeout);
    let service = service_with(&query);
    let token = CancellationToken::new();

    let record = service
        .get_server_info_or_unknown("127.0.0.1:7777", &token)
        .await
        .unwrap();

    assert!(record.is_unknown());
    assert_eq!(record.name(), UNKNOWN_SERVER_NAME);
    assert_eq!(record.ping(), 0);
    assert_eq!(record.address(), "127.0.0.1:7777");
}

#[tokio::test]
async fn end_to_end_record_passes_through() {
    let query = CountingQuery::responding("Test Server", 5, 50);
    let service = service_with(&query);
    let token = CancellationToken::new();

    let record = service
        .get_server_info_or_unknown("127.0.0.1:7777", &token)
        .await
        .unwrap();

    assert_eq!(record.name(), "Test Server");
    assert_eq!(record.players_count(), 5);
    assert_eq!(record.max_players(), 50);
    assert!(!record.password());
}

#[tokio::test]
async fn cancellation_is_not_swallowed() {
    let query = CountingQuery::new(QueryBehavior::Hang);
    let service = service_with(&query);
    let token = CancellationToken::new();

    let canceller = {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        })
    };

    let result = service.get_server_players("127.0.0.1", 7777, &token).await;
    canceller.await.unwrap();

    assert!(matches!(result, Err(Error::Cancelled)));
}

#[tokio::test]
async fn cancelled_token_is_checked_at_entry() {
    let query = CountingQuery::responding("Test Server", 5, 50);
    let service = service_with(&query);
    let token = CancellationToken::new();
    token.cancel();

    let result = service.get_server_info("127.0.0.1", 7777, &token).await;

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(query.call_count(), 0);
}

#[tokio::test]
async fn refresh_yields_one_record_per_address() {
    let query = CountingQuery::responding("Live", 3, 30);
    let service = service_with(&query);
    let token = CancellationToken::new();

    let addresses = vec![
        "10.0.0.1:7777".to_string(),
        "10.0.0.2".to_string(),
        "10.0.0.3:80".to_string(),
    ];
    let records: Vec<_> = service.refresh(addresses, &token).collect().await;

    assert_eq!(records.len(), 3);
    let unknown: Vec<_> = records.iter().filter(|r| r.is_unknown()).collect();
    assert_eq!(unknown.len(), 1, "out-of-window port yields the sentinel");
    assert_eq!(unknown[0].address(), "10.0.0.3:80");
    assert_eq!(query.call_count(), 2);
}

#[tokio::test]
async fn refresh_ends_when_cancelled() {
    let query = CountingQuery::new(QueryBehavior::Hang);
    let service = service_with(&query);
    let token = CancellationToken::new();

    let stream = service.refresh(vec!["10.0.0.1:7777".to_string(); 4], &token);
    token.cancel();

    let records: Vec<_> = tokio::time::timeout(Duration::from_secs(2), stream.collect::<Vec<_>>())
        .await
        .expect("stream ends after cancellation");
    assert!(records.is_empty());
}
