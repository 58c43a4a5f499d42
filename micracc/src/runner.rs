//! Bounded concurrency runner
//!
//! Pure scheduling primitive: runs a job-producing function with at most
//! `max_concurrency` invocations outstanding, until the producer yields
//! `Produced::Done`. Knows nothing about what the jobs do and performs
//! no logging.

use futures::stream::{FuturesOrdered, StreamExt};
use std::future::Future;

/// One producer invocation's result: a value, or end of stream.
///
/// The sentinel is an explicit variant rather than an `Option` so that
/// exhaustion is unambiguous even for producers whose item type is
/// itself optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Produced<T> {
    /// A completed job
    Value(T),
    /// No more work; already-outstanding jobs are drained, then the
    /// runner returns
    Done,
}

/// Run `produce` with at most `max_concurrency` jobs outstanding.
///
/// The in-flight queue is drained oldest-first: a finished slot is
/// refilled based on queue position, not completion order. If a newer
/// job finishes before an older one, the runner still waits on the older
/// job before scheduling a replacement. That under-utilizes the bound in
/// the worst case but keeps request issue order predictable for engines
/// that pool resources internally; completion-order refill has caused
/// stalls against such engines. Keep it this way.
///
/// The first job error propagates immediately; remaining in-flight
/// futures are dropped. A producer that never yields `Done` runs
/// forever; callers bound their own ranges.
pub async fn run_bounded<F, Fut, T, E>(mut produce: F, max_concurrency: usize) -> Result<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Produced<T>, E>>,
{
    let max = max_concurrency.max(1);
    let mut in_flight = FuturesOrdered::new();

    loop {
        while in_flight.len() < max {
            in_flight.push_back(produce());
        }

        // FuturesOrdered polls every queued job but yields strictly in
        // insertion order, so this await is "wait for the oldest".
        match in_flight.next().await {
            Some(Ok(Produced::Done)) => break,
            Some(Ok(Produced::Value(_))) => {}
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }

    // Stream exhausted; let the jobs scheduled before the sentinel
    // arrived run to completion.
    while let Some(completed) = in_flight.next().await {
        completed?;
    }

    Ok(())
}
