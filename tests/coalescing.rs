//! End-to-end coalescing tests through the consumer facades.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rpc_failover::config::{CoalescerConfig, PoolConfig, TransportConfig};
use rpc_failover::facade::{GraphClient, RpcReader};
use rpc_failover::pool::EndpointPool;
use rpc_failover::resilience::RetryDelay;
use rpc_failover::transport::Transport;

mod common;

async fn reader_over_backend(hits: Arc<AtomicU32>, body: String) -> RpcReader {
    let addr = common::start_rpc_backend(move || {
        let hits = hits.clone();
        let body = body.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            // Hold the response briefly so concurrent callers overlap.
            tokio::time::sleep(Duration::from_millis(50)).await;
            (200, body)
        }
    })
    .await;

    let pool = Arc::new(
        EndpointPool::new(PoolConfig {
            endpoints: vec![common::endpoint(addr, "mock", 1)],
            ..PoolConfig::default()
        })
        .unwrap(),
    );
    let transport = Arc::new(Transport::new(
        pool,
        TransportConfig {
            timeout_ms: 2_000,
            retry_count: 0,
            retry_delay: RetryDelay::Fixed { delay_ms: 10 },
        },
    ));
    RpcReader::new(transport, CoalescerConfig::default())
}

#[tokio::test]
async fn test_concurrent_block_number_reads_share_one_round_trip() {
    let hits = Arc::new(AtomicU32::new(0));
    let reader = reader_over_backend(hits.clone(), common::rpc_result("0x1b4")).await;

    // Scenario B: five callers inside the dedup window.
    let futures: Vec<_> = (0..5).map(|_| reader.block_number()).collect();
    let results = futures_util::future::join_all(futures).await;

    assert_eq!(hits.load(Ordering::SeqCst), 1, "one network round trip");
    for result in results {
        assert_eq!(result.unwrap(), 0x1b4);
    }
}

#[tokio::test]
async fn test_distinct_requests_are_not_coalesced() {
    let hits = Arc::new(AtomicU32::new(0));
    let reader = reader_over_backend(hits.clone(), common::rpc_result("0x5")).await;

    let (block, balance) = tokio::join!(
        reader.block_number(),
        reader.balance("0x00000000000000000000000000000000000000aa"),
    );
    assert_eq!(block.unwrap(), 0x5);
    assert_eq!(balance.unwrap(), 0x5);
    assert_eq!(hits.load(Ordering::SeqCst), 2, "different keys, different calls");
}

#[tokio::test]
async fn test_failed_read_does_not_poison_next_call() {
    let hits = Arc::new(AtomicU32::new(0));
    let h = hits.clone();
    let addr = common::start_rpc_backend(move || {
        let h = h.clone();
        async move {
            // First call fails, later calls succeed.
            if h.fetch_add(1, Ordering::SeqCst) == 0 {
                (500, "Internal Server Error".to_string())
            } else {
                (200, common::rpc_result("0x7"))
            }
        }
    })
    .await;

    let pool = Arc::new(
        EndpointPool::new(PoolConfig {
            endpoints: vec![common::endpoint(addr, "flaky", 1)],
            ..PoolConfig::default()
        })
        .unwrap(),
    );
    let transport = Arc::new(Transport::new(
        pool,
        TransportConfig {
            timeout_ms: 2_000,
            retry_count: 0,
            retry_delay: RetryDelay::Fixed { delay_ms: 10 },
        },
    ));
    let reader = RpcReader::new(transport, CoalescerConfig::default());

    assert!(reader.block_number().await.is_err());
    assert_eq!(reader.block_number().await.unwrap(), 0x7);
}

#[tokio::test]
async fn test_graph_queries_coalesce_and_surface_errors() {
    let hits = Arc::new(AtomicU32::new(0));
    let h = hits.clone();
    let addr = common::start_rpc_backend(move || {
        let h = h.clone();
        async move {
            h.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            (200, r#"{"data":{"players":[{"id":"0xaa","score":"12"}]}}"#.to_string())
        }
    })
    .await;

    let url = url::Url::parse(&format!("http://{}", addr)).unwrap();
    let client = GraphClient::new(url, Duration::from_secs(2), CoalescerConfig::default());

    let query = "query Players { players { id score } }";
    let futures: Vec<_> = (0..3)
        .map(|_| client.query(query, serde_json::json!({})))
        .collect();
    let results = futures_util::future::join_all(futures).await;

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    for result in results {
        let data = result.unwrap();
        assert_eq!(data["players"][0]["id"], "0xaa");
    }

    // GraphQL-level errors come back as QueryError::Graph, uncached.
    let err_addr = common::start_rpc_backend(|| async {
        (200, r#"{"errors":[{"message":"bad query"}]}"#.to_string())
    })
    .await;
    let err_url = url::Url::parse(&format!("http://{}", err_addr)).unwrap();
    let err_client = GraphClient::new(err_url, Duration::from_secs(2), CoalescerConfig::default());
    let error = err_client.query("query Broken { nope }", serde_json::json!({})).await;
    assert!(error.unwrap_err().to_string().contains("bad query"));
}
