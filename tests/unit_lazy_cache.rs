mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::memory_client;
use lazykv::{Client, StoreBackend, StoreError, Stored};

/// Polls until the store holds `expect` under `key`, or fails after a second.
///
/// The background refresh is unordered relative to the caller, so tests
/// assert eventual convergence rather than exact timing.
async fn wait_for_value(client: &Client, key: &str, expect: i32) {
    for _ in 0..100 {
        let stored: Stored<i32> = client.get_by_key(key).await.unwrap();
        if stored.found && stored.data == expect {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("store never converged to {expect} under `{key}`");
}

#[tokio::test]
async fn test_miss_produces_returns_and_populates() {
    let (client, _) = memory_client();

    let value: i32 = client
        .lazy_cache("cache", || async { Ok(3) })
        .await
        .unwrap();
    assert_eq!(value, 3);

    // the miss path writes before returning
    let stored: Stored<i32> = client.get_by_key("cache").await.unwrap();
    assert!(stored.found);
    assert_eq!(stored.data, 3);
}

#[tokio::test]
async fn test_hit_returns_stale_value_and_refreshes_behind() {
    let (client, _) = memory_client();

    // populate through a miss
    let first: i32 = client
        .lazy_cache("cache2", || async { Ok(3) })
        .await
        .unwrap();
    assert_eq!(first, 3);

    // the hit serves the stale value, never the fresh one
    let second: i32 = client
        .lazy_cache("cache2", || async { Ok(4) })
        .await
        .unwrap();
    assert_eq!(second, 3);

    // the fresh value lands eventually
    wait_for_value(&client, "cache2", 4).await;
}

#[tokio::test]
async fn test_miss_producer_failure_rejects_and_leaves_store_empty() {
    let (client, _) = memory_client();

    let err = client
        .lazy_cache::<i32, _, _>("cache3", || async {
            Err(anyhow::anyhow!("upstream unavailable"))
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Producer(_)));

    let stored: Stored<i32> = client.get_by_key("cache3").await.unwrap();
    assert!(!stored.found);
}

#[tokio::test]
async fn test_hit_producer_failure_is_contained() {
    let (client, _) = memory_client();

    let _: i32 = client
        .lazy_cache("cache4", || async { Ok(3) })
        .await
        .unwrap();

    // the refresh fails in the background; the caller still gets the stale
    // value and the call itself never errors
    let value: i32 = client
        .lazy_cache("cache4", || async {
            Err(anyhow::anyhow!("producer blew up"))
        })
        .await
        .unwrap();
    assert_eq!(value, 3);

    // give the spawned refresh time to run and fail
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stored: Stored<i32> = client.get_by_key("cache4").await.unwrap();
    assert!(stored.found);
    assert_eq!(stored.data, 3);
}

#[tokio::test]
async fn test_hit_does_not_block_on_a_slow_producer() {
    let (client, _) = memory_client();

    let _: i32 = client
        .lazy_cache("cache5", || async { Ok(3) })
        .await
        .unwrap();

    let started = std::time::Instant::now();
    let value: i32 = client
        .lazy_cache("cache5", || async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok(4)
        })
        .await
        .unwrap();

    assert_eq!(value, 3);
    assert!(
        started.elapsed() < Duration::from_secs(1),
        "hit path waited on the producer"
    );
}

#[tokio::test]
async fn test_concurrent_misses_each_invoke_the_producer() {
    let (client, _) = memory_client();
    let calls = Arc::new(AtomicUsize::new(0));

    let make_producer = |value: i32| {
        let calls = calls.clone();
        move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            // linger so the two misses overlap
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(value)
        }
    };

    let (a, b) = tokio::join!(
        client.lazy_cache("cache6", make_producer(7)),
        client.lazy_cache("cache6", make_producer(8)),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    // no coordination across callers: both producers run
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(a, 7);
    assert_eq!(b, 8);

    // last writer wins; the store holds one of the two
    let stored: Stored<i32> = client.get_by_key("cache6").await.unwrap();
    assert!(stored.found);
    assert!(stored.data == 7 || stored.data == 8);
}

#[tokio::test]
async fn test_corrupt_cached_payload_propagates_not_treated_as_miss() {
    let (client, store) = memory_client();
    let calls = Arc::new(AtomicUsize::new(0));

    store.set("cache7", "{oops".to_string()).await.unwrap();

    let counted = calls.clone();
    let err = client
        .lazy_cache::<i32, _, _>("cache7", move || async move {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(9)
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Decode { .. }));
    // the producer must not run when the lookup itself failed
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_lazy_cache_works_with_structured_values() {
    let (client, _) = memory_client();

    let produced = common::record("fresh", 42);
    let value = client
        .lazy_cache("cache8", move || async move { Ok(produced) })
        .await
        .unwrap();
    assert_eq!(value.name, "fresh");

    // stored form is self-describing
    let stored: Stored<common::TestRecord> = client.get_by_key("cache8").await.unwrap();
    assert_eq!(stored.data.key, "cache8");
    assert_eq!(stored.data.count, 42);
}
