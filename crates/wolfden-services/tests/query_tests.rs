//! Query executor behavior tests: caching, retries, timeouts,
//! single-flight coalescing, and batch semantics

mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use support::{MockBackend, menu_item};
use wolfden_domain::QueryOptions;
use wolfden_domain::error::{BackendError, ErrorCategory};
use wolfden_domain::ports::{BackendClient, CacheStore};
use wolfden_services::ServiceLayer;
use wolfden_services::cache::MemoryCacheStore;
use wolfden_services::config::ServiceConfig;
use wolfden_services::errors::ErrorReporter;
use wolfden_services::query::{DomainQueries, QueryExecutor};

fn executor() -> (Arc<QueryExecutor>, Arc<dyn CacheStore>, Arc<ErrorReporter>) {
    executor_with_defaults(QueryOptions::default())
}

fn executor_with_defaults(
    defaults: QueryOptions,
) -> (Arc<QueryExecutor>, Arc<dyn CacheStore>, Arc<ErrorReporter>) {
    let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
    let reporter = Arc::new(ErrorReporter::new());
    let executor = Arc::new(QueryExecutor::new(
        Arc::clone(&cache),
        Arc::clone(&reporter),
        defaults,
    ));
    (executor, cache, reporter)
}

#[tokio::test]
async fn cache_hit_short_circuits_the_thunk() {
    let (executor, _cache, _) = executor();
    let calls = Arc::new(AtomicUsize::new(0));

    let options = QueryOptions::cached("users_7").with_ttl(Duration::from_secs(60));
    let run = |calls: Arc<AtomicUsize>| {
        move || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BackendError>("profile".to_string())
            }
        }
    };

    let first = executor
        .execute("get_user", options.clone(), run(Arc::clone(&calls)))
        .await
        .unwrap();
    let second = executor
        .execute("get_user", options, run(Arc::clone(&calls)))
        .await
        .unwrap();

    assert_eq!(first, "profile");
    assert_eq!(second, "profile");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn eligible_failures_retry_with_exponential_backoff() {
    let (executor, _, _) = executor();
    let calls = Arc::new(AtomicUsize::new(0));
    let thunk_calls = Arc::clone(&calls);

    let started = tokio::time::Instant::now();
    let value: i32 = executor
        .execute(
            "flaky_read",
            QueryOptions::uncached().with_retries(2),
            move || {
                let calls = Arc::clone(&thunk_calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(BackendError::new("connection timeout"))
                    } else {
                        Ok(17)
                    }
                }
            },
        )
        .await
        .unwrap();

    assert_eq!(value, 17);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // Backoff 2^1 + 2^2 seconds, unjittered
    assert_eq!(started.elapsed(), Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn ineligible_failure_is_not_retried() {
    let (executor, _, _) = executor();
    let calls = Arc::new(AtomicUsize::new(0));
    let thunk_calls = Arc::clone(&calls);

    let started = tokio::time::Instant::now();
    let err = executor
        .execute(
            "guarded_write",
            QueryOptions::uncached().with_retries(2),
            move || {
                let calls = Arc::clone(&thunk_calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(BackendError::new("permission denied for table"))
                }
            },
        )
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(err.category, ErrorCategory::Database);
}

#[tokio::test(start_paused = true)]
async fn losing_the_timeout_race_cancels_the_thunk() {
    let (executor, cache, _) = executor();

    let err = executor
        .execute::<String, _, _>(
            "slow_read",
            QueryOptions::cached("users_9")
                .with_timeout(Duration::from_secs(1))
                .with_retries(0),
            move || async move {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok("late value".to_string())
            },
        )
        .await
        .unwrap_err();

    assert!(err.message.contains("timeout"));
    assert!(err.retryable);

    // The dropped future can never complete and resurrect the cache
    tokio::time::advance(Duration::from_secs(30)).await;
    assert_eq!(cache.len().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_identical_misses_share_one_call() {
    let (executor, _, _) = executor();
    let calls = Arc::new(AtomicUsize::new(0));

    let run = |calls: Arc<AtomicUsize>| {
        move || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, BackendError>(vec![1, 2, 3])
            }
        }
    };
    let options = QueryOptions::cached("wolf-pack-members_all").with_ttl(Duration::from_secs(30));

    let (a, b) = tokio::join!(
        executor.execute("wolfpack_members", options.clone(), run(Arc::clone(&calls))),
        executor.execute("wolfpack_members", options.clone(), run(Arc::clone(&calls))),
    );

    assert_eq!(a.unwrap(), vec![1, 2, 3]);
    assert_eq!(b.unwrap(), vec![1, 2, 3]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn batch_returns_successes_and_aggregates_failures() {
    let (executor, _, reporter) = executor();

    let results = executor
        .batch_execute(
            "feed_warmup",
            vec![
                Box::pin(async { Ok::<i32, BackendError>(1) }),
                Box::pin(async { Err(BackendError::new("row missing")) }),
                Box::pin(async { Ok(3) }),
            ],
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.contains(&1));
    assert!(results.contains(&3));

    let recent = reporter.recent_errors(10);
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].category, ErrorCategory::BusinessLogic);
    assert!(recent[0].message.contains("1 of 3"));
}

#[tokio::test]
async fn domain_wrapper_caches_menu_reads() {
    let (executor, _, _) = executor();
    let backend = Arc::new(MockBackend::new());
    backend.menu_items.lock().unwrap().push(menu_item("mule"));
    let queries = DomainQueries::new(executor, Arc::clone(&backend) as Arc<dyn BackendClient>);

    let first = queries.menu_items(None).await.unwrap();
    let second = queries.menu_items(None).await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(backend.list_menu_items_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn mutation_invalidates_cached_user_reads() {
    let (executor, _, _) = executor();
    let backend = Arc::new(MockBackend::new());
    backend.seed_profile(support::profile("wolfie", wolfden_domain::Role::Member));
    let queries = DomainQueries::new(executor, Arc::clone(&backend) as Arc<dyn BackendClient>);

    let user = queries.get_user("user-wolfie").await.unwrap();
    queries.get_user("user-wolfie").await.unwrap();
    assert_eq!(backend.get_user_calls.load(Ordering::SeqCst), 1);

    queries
        .update_user(
            &user.id,
            wolfden_domain::records::UserUpdate {
                display_name: Some("Night Howl".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    // The write invalidated users_*, so the next read misses cache
    let reloaded = queries.get_user("user-wolfie").await.unwrap();
    assert_eq!(reloaded.display_name, "Night Howl");
    assert_eq!(backend.get_user_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn configured_timeout_applies_to_domain_reads() {
    let mut config = ServiceConfig::default();
    config.query.timeout_ms = 1;
    config.query.retries = 0;

    let backend = Arc::new(MockBackend::new());
    backend.menu_items.lock().unwrap().push(menu_item("mule"));
    *backend.menu_items_delay.lock().unwrap() = Duration::from_millis(200);

    let layer = ServiceLayer::initialize(
        config,
        Arc::clone(&backend) as Arc<dyn BackendClient>,
        None,
    )
    .await
    .unwrap();

    let err = layer.queries.menu_items(None).await.unwrap_err();
    assert!(err.message.contains("timeout after 1 ms"));
    assert_eq!(err.category, ErrorCategory::Database);
}

#[tokio::test(start_paused = true)]
async fn configured_retry_budget_is_the_executor_default() {
    let (executor, _, _) = executor_with_defaults(QueryOptions::default().with_retries(1));
    let calls = Arc::new(AtomicUsize::new(0));
    let thunk_calls = Arc::clone(&calls);

    let err = executor
        .execute(
            "flaky_read",
            executor.options(),
            move || {
                let calls = Arc::clone(&thunk_calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(BackendError::new("connection reset"))
                }
            },
        )
        .await
        .unwrap_err();

    // One initial attempt plus the single configured retry
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(err.category, ErrorCategory::Database);
}

#[tokio::test(start_paused = true)]
async fn oversized_retry_budgets_keep_backoff_bounded() {
    let (executor, _, _) = executor();
    let calls = Arc::new(AtomicUsize::new(0));
    let thunk_calls = Arc::clone(&calls);

    let value: i32 = executor
        .execute(
            "stubborn_read",
            QueryOptions::uncached().with_retries(80),
            move || {
                let calls = Arc::clone(&thunk_calls);
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 65 {
                        Err(BackendError::new("connection reset"))
                    } else {
                        Ok(9)
                    }
                }
            },
        )
        .await
        .unwrap();

    assert_eq!(value, 9);
    assert_eq!(calls.load(Ordering::SeqCst), 66);
}

#[tokio::test]
async fn change_events_map_tables_to_cache_domains() {
    let (executor, cache, _) = executor();
    let backend = Arc::new(MockBackend::new());
    backend.menu_items.lock().unwrap().push(menu_item("mule"));
    let queries = DomainQueries::new(executor, Arc::clone(&backend) as Arc<dyn BackendClient>);

    queries.menu_items(None).await.unwrap();
    assert_eq!(cache.len().await.unwrap(), 1);

    let removed = queries.handle_change_event("menu_items").await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(cache.len().await.unwrap(), 0);

    assert_eq!(queries.handle_change_event("unrelated").await.unwrap(), 0);
}
