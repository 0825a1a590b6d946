/// Session Pool Concurrency Tests
///
/// Exhaustion, FIFO hand-off, shutdown of waiters and load with recycling

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use warmpool::pool::{PoolConfig, ResourcePool};
use warmpool::session::MockSessionFactory;
use warmpool::WarmPoolError;

fn shared_pool(config: PoolConfig) -> Arc<ResourcePool<MockSessionFactory>> {
    Arc::new(ResourcePool::new(
        config,
        MockSessionFactory::new().with_execute_delay(Duration::ZERO),
    ))
}

#[tokio::test]
async fn third_concurrent_acquire_is_exhausted() {
    let pool = shared_pool(PoolConfig::new(2));
    pool.start().await.unwrap();

    let timeout = Duration::from_millis(10);
    let start = Instant::now();
    let (a, b, c) = tokio::join!(
        pool.acquire(timeout),
        pool.acquire(timeout),
        pool.acquire(timeout)
    );
    let elapsed = start.elapsed();

    let results = [a, b, c];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let exhausted = results
        .iter()
        .filter(|r| matches!(r, Err(WarmPoolError::PoolExhausted { .. })))
        .count();

    assert_eq!(successes, 2);
    assert_eq!(exhausted, 1);
    assert!(
        elapsed < Duration::from_millis(500),
        "exhaustion should be reported near the timeout, took {:?}",
        elapsed
    );

    let ids: HashSet<_> = results
        .iter()
        .filter_map(|r| r.as_ref().ok().map(|(_, id)| id.clone()))
        .collect();
    assert_eq!(ids.len(), 2, "two callers must never share an entry");

    pool.stop().await;
}

#[tokio::test]
async fn entries_are_served_in_release_order() {
    let pool = shared_pool(PoolConfig::new(2));
    pool.start().await.unwrap();

    let (_a, id_a) = pool.acquire(Duration::from_secs(1)).await.unwrap();
    let (_b, id_b) = pool.acquire(Duration::from_secs(1)).await.unwrap();

    pool.release(&id_b).await;
    pool.release(&id_a).await;

    let (_first, first) = pool.acquire(Duration::from_secs(1)).await.unwrap();
    let (_second, second) = pool.acquire(Duration::from_secs(1)).await.unwrap();
    assert_eq!(first, id_b);
    assert_eq!(second, id_a);

    pool.stop().await;
}

#[tokio::test]
async fn waiter_receives_released_entry() {
    let pool = shared_pool(PoolConfig::new(1));
    pool.start().await.unwrap();

    let (_session, id) = pool.acquire(Duration::from_secs(1)).await.unwrap();

    let waiter_pool = Arc::clone(&pool);
    let waiter = tokio::spawn(async move { waiter_pool.acquire(Duration::from_secs(5)).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    pool.release(&id).await;

    let (_session, received) = waiter.await.unwrap().unwrap();
    assert_eq!(received, id);

    pool.stop().await;
}

#[tokio::test]
async fn timed_out_waiter_does_not_swallow_entry() {
    let pool = shared_pool(PoolConfig::new(1));
    pool.start().await.unwrap();

    let (_session, id) = pool.acquire(Duration::from_secs(1)).await.unwrap();
    let result = pool.acquire(Duration::from_millis(5)).await;
    assert!(matches!(result, Err(WarmPoolError::PoolExhausted { .. })));

    pool.release(&id).await;
    let (_session, again) = pool.acquire(Duration::from_millis(50)).await.unwrap();
    assert_eq!(again, id);

    pool.stop().await;
}

#[tokio::test]
async fn stop_wakes_blocked_acquirers() {
    let pool = shared_pool(PoolConfig::new(1));
    pool.start().await.unwrap();
    let (_session, _id) = pool.acquire(Duration::from_secs(1)).await.unwrap();

    let waiter_pool = Arc::clone(&pool);
    let waiter = tokio::spawn(async move {
        let start = Instant::now();
        let result = waiter_pool.acquire(Duration::from_secs(30)).await;
        (result, start.elapsed())
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    pool.stop().await;

    let (result, waited) = waiter.await.unwrap();
    assert!(matches!(result, Err(WarmPoolError::PoolNotRunning)));
    assert!(waited < Duration::from_secs(5));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn load_with_recycling_preserves_capacity() {
    let pool = shared_pool(PoolConfig::new(4).max_executions(3));
    let counters = pool.factory().counters();
    pool.start().await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..200 {
        let pool = Arc::clone(&pool);
        tasks.push(tokio::spawn(async move {
            let (_session, id) = pool.acquire(Duration::from_secs(10)).await?;
            tokio::task::yield_now().await;
            pool.release(&id).await;
            Ok::<_, WarmPoolError>(())
        }));
    }

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stats = pool.stats().await;
    assert_eq!(stats.available, 4);
    assert_eq!(stats.in_use, 0);
    assert_eq!(counters.live(), 4);
    assert!(counters.created() > 4, "sessions should have been recycled");

    pool.stop().await;
    assert_eq!(counters.live(), 0);
    assert_eq!(counters.double_closed(), 0);
}

#[tokio::test]
#[ignore] // Stress test - run with --ignored
async fn pool_handles_thousand_concurrent_cycles() {
    let pool = shared_pool(PoolConfig::new(8).max_executions(50));
    pool.start().await.unwrap();

    let start = Instant::now();
    let mut tasks = Vec::new();
    for _ in 0..1000 {
        let pool = Arc::clone(&pool);
        tasks.push(tokio::spawn(async move {
            let (_session, id) = pool.acquire(Duration::from_secs(30)).await?;
            tokio::time::sleep(Duration::from_micros(100)).await;
            pool.release(&id).await;
            Ok::<_, WarmPoolError>(())
        }));
    }

    let mut completed = 0;
    for task in tasks {
        if matches!(task.await, Ok(Ok(()))) {
            completed += 1;
        }
    }

    let elapsed = start.elapsed();
    println!("=== Acquire/Release Cycle Test ===");
    println!("Completed: {}", completed);
    println!("Elapsed: {:?}", elapsed);
    println!("Throughput: {:.2} ops/sec", 1000.0 / elapsed.as_secs_f64());

    assert_eq!(completed, 1000);
    pool.stop().await;
}
