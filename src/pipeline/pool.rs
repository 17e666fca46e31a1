//! Concurrency-bounded task runner.
//!
//! Runs an async handler over N items with at most K invocations in flight,
//! returning results aligned with input order. K workers share one cursor,
//! here a queue of unclaimed `(index, item)` pairs, and each loops "claim
//! next index, invoke handler, store result at that index" until the cursor
//! is exhausted. The pool resolves only once every worker has wound down.
//!
//! Scheduling is cooperative: workers are plain futures joined inside the
//! caller's task, so "parallelism" comes from overlapping the handlers'
//! suspension points (the external render call), not from threads. A
//! multi-threaded reimplementation would need an atomic cursor or a
//! channel-distributed queue; the queue mutex here is held only across the
//! claim itself, never across an await of the handler.
//!
//! On a handler error the pool stops handing out new work, lets in-flight
//! siblings finish, and propagates the first error observed; callers treat a
//! pool-wide failure as terminal for that batch.

use futures::future::join_all;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// Run `handler` over `items` with at most `limit` calls in flight.
///
/// The handler receives the item's original index alongside the item; the
/// returned vector is aligned with input order regardless of completion
/// order. `limit` is clamped to `1..=items.len()`.
pub async fn run_limited<T, R, E, F, Fut>(
    items: Vec<T>,
    limit: usize,
    handler: F,
) -> Result<Vec<R>, E>
where
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let total = items.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let limit = limit.max(1).min(total);
    debug!(total, workers = limit, "starting bounded pool");

    let queue: Mutex<VecDeque<(usize, T)>> = Mutex::new(items.into_iter().enumerate().collect());
    let results: Mutex<Vec<(usize, R)>> = Mutex::new(Vec::with_capacity(total));
    let failed = AtomicBool::new(false);

    let queue_ref = &queue;
    let results_ref = &results;
    let failed_ref = &failed;
    let handler_ref = &handler;

    let workers = (0..limit).map(|_| async move {
        loop {
            if failed_ref.load(Ordering::Relaxed) {
                return Ok(());
            }
            let claimed = queue_ref.lock().await.pop_front();
            let Some((index, item)) = claimed else {
                return Ok(());
            };
            match handler_ref(index, item).await {
                Ok(result) => results_ref.lock().await.push((index, result)),
                Err(err) => {
                    failed_ref.store(true, Ordering::Relaxed);
                    return Err(err);
                }
            }
        }
    });

    let outcomes = join_all(workers).await;
    for outcome in outcomes {
        outcome?;
    }

    let mut results = results.into_inner();
    results.sort_by_key(|(index, _)| *index);
    Ok(results.into_iter().map(|(_, result)| result).collect())
}
