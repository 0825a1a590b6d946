use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use std::time::Duration;
use warmpool::pool::{PoolConfig, ResourcePool};
use warmpool::session::MockSessionFactory;

fn build_pool(runtime: &tokio::runtime::Runtime) -> Arc<ResourcePool<MockSessionFactory>> {
    let pool = Arc::new(ResourcePool::new(
        PoolConfig::new(8).max_executions(u64::MAX),
        MockSessionFactory::new(),
    ));
    runtime
        .block_on(pool.start())
        .expect("start bench pool");
    pool
}

fn bench_acquire_release(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let pool = build_pool(&runtime);

    c.bench_function("acquire_release_uncontended", |b| {
        b.to_async(&runtime).iter(|| {
            let pool = Arc::clone(&pool);
            async move {
                let (session, id) = pool
                    .acquire(Duration::from_secs(1))
                    .await
                    .expect("acquire");
                black_box(session);
                pool.release(&id).await;
            }
        });
    });

    c.bench_function("acquire_release_contended_32", |b| {
        b.to_async(&runtime).iter(|| {
            let pool = Arc::clone(&pool);
            async move {
                let tasks: Vec<_> = (0..32)
                    .map(|_| {
                        let pool = Arc::clone(&pool);
                        tokio::spawn(async move {
                            let (_session, id) = pool
                                .acquire(Duration::from_secs(5))
                                .await
                                .expect("acquire");
                            pool.release(&id).await;
                        })
                    })
                    .collect();
                for task in tasks {
                    task.await.expect("bench task");
                }
            }
        });
    });

    runtime.block_on(pool.stop());
}

criterion_group!(benches, bench_acquire_release);
criterion_main!(benches);
