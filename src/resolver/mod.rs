//! Bounded-concurrency date-range resolution.
//!
//! [`DateRangeResolver::resolve`] expands a [`DateRange`] into one unit of work per
//! day, runs every unit on its own task behind a [`ConcurrencyLimiter`], and
//! gathers the results back into chronological order.
//!
//! # Failure semantics
//!
//! - The first failure *observed* (completion order, not date order) finalizes the
//!   outcome. Which failure wins when several days fail is therefore a race.
//! - On failure, units still waiting for a limiter slot are never invoked, units
//!   in flight see their cancellation token fire, and every worker task is
//!   aborted. Permits are released on drop, so no slot outlives the resolution.
//! - Dropping the `resolve` future has the same effect as a failure.

use crate::error::{ResolveError, Result};
use crate::types::{DateRange, WorkUnit};
use chrono::NaiveDate;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

mod limiter;

pub use limiter::{ConcurrencyLimiter, LimiterPermit};

/// What a worker reports back for its unit
enum UnitOutcome<T> {
    Finished(Result<T>),
    Panicked(String),
}

struct UnitReport<T> {
    unit: WorkUnit,
    outcome: UnitOutcome<T>,
}

/// Fans a date range out into per-day units under a fixed concurrency cap.
///
/// The limiter belongs to the resolver instance: every resolution running
/// through the same resolver shares its slots.
#[derive(Clone, Debug)]
pub struct DateRangeResolver {
    limiter: ConcurrencyLimiter,
}

impl DateRangeResolver {
    /// Create a resolver allowing at most `concurrency_limit` units in flight
    pub fn new(concurrency_limit: usize) -> Result<Self> {
        Ok(Self::with_limiter(ConcurrencyLimiter::new(
            concurrency_limit,
        )?))
    }

    /// Create a resolver around an existing limiter
    pub fn with_limiter(limiter: ConcurrencyLimiter) -> Self {
        Self { limiter }
    }

    /// The limiter gating unit invocations
    pub fn limiter(&self) -> &ConcurrencyLimiter {
        &self.limiter
    }

    /// Resolve every day of `range` through `unit_fn`.
    ///
    /// `unit_fn` receives the day and a cancellation token that fires when the
    /// resolution is abandoned. On success the result holds exactly
    /// `range.len()` values, value `i` belonging to `range.start() + i` days.
    ///
    /// Cancelling `parent` ends the resolution with [`ResolveError::Cancelled`].
    pub async fn resolve<T, F, Fut>(
        &self,
        range: DateRange,
        parent: &CancellationToken,
        unit_fn: F,
    ) -> std::result::Result<Vec<T>, ResolveError>
    where
        T: Send + 'static,
        F: Fn(NaiveDate, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let total = range.len();
        let cancel = parent.child_token();
        // Fires on every exit path, including this future being dropped
        let _cancel_on_exit = cancel.clone().drop_guard();

        tracing::debug!(
            from = %range.start(),
            to = %range.end(),
            days = total,
            limit = self.limiter.capacity(),
            "Resolving date range"
        );

        let unit_fn = Arc::new(unit_fn);
        // Room for every report, so a finished worker never waits on the collector
        let (report_tx, mut report_rx) = mpsc::channel::<UnitReport<T>>(total);
        let mut workers = JoinSet::new();

        for unit in range.units() {
            workers.spawn(run_unit(
                unit,
                self.limiter.clone(),
                cancel.clone(),
                Arc::clone(&unit_fn),
                report_tx.clone(),
            ));
        }
        drop(report_tx);

        let mut slots: Vec<Option<T>> = std::iter::repeat_with(|| None).take(total).collect();
        let mut filled = 0;

        while filled < total {
            let report = tokio::select! {
                biased;
                _ = parent.cancelled() => {
                    tracing::debug!(days = total, filled, "Date range resolution cancelled");
                    return Err(ResolveError::Cancelled);
                }
                report = report_rx.recv() => report,
            };

            // All workers gone with slots still empty: they were cancelled under us
            let Some(UnitReport { unit, outcome }) = report else {
                return Err(ResolveError::Cancelled);
            };

            match outcome {
                UnitOutcome::Finished(Ok(value)) => {
                    slots[unit.offset] = Some(value);
                    filled += 1;
                }
                UnitOutcome::Finished(Err(source)) => {
                    tracing::warn!(
                        date = %unit.date,
                        offset = unit.offset,
                        error = %source,
                        "Unit failed, abandoning remaining days"
                    );
                    return Err(ResolveError::Unit {
                        date: unit.date,
                        source: Box::new(source),
                    });
                }
                UnitOutcome::Panicked(reason) => {
                    tracing::error!(date = %unit.date, reason = %reason, "Unit worker panicked");
                    return Err(ResolveError::TaskFailed {
                        date: unit.date,
                        reason,
                    });
                }
            }
        }

        tracing::debug!(days = total, "Date range resolved");
        Ok(slots.into_iter().flatten().collect())
    }
}

/// Worker body for one day: wait for a slot, run the unit, report.
async fn run_unit<T, F, Fut>(
    unit: WorkUnit,
    limiter: ConcurrencyLimiter,
    cancel: CancellationToken,
    unit_fn: Arc<F>,
    report_tx: mpsc::Sender<UnitReport<T>>,
) where
    F: Fn(NaiveDate, CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let Some(permit) = limiter.acquire(&cancel).await else {
        tracing::trace!(date = %unit.date, "Unit skipped, resolution already finalized");
        return;
    };

    tracing::trace!(date = %unit.date, offset = unit.offset, "Unit started");

    let call = AssertUnwindSafe(async { unit_fn(unit.date, cancel.clone()).await })
        .catch_unwind();
    let outcome = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = call => match result {
            Ok(result) => UnitOutcome::Finished(result),
            Err(panic) => UnitOutcome::Panicked(panic_message(panic.as_ref())),
        },
    };

    // Stop siblings from starting before the collector gets to this report
    if !matches!(outcome, UnitOutcome::Finished(Ok(_))) {
        cancel.cancel();
    }

    // The collector may have finalized and dropped its receiver already
    let _ = report_tx.send(UnitReport { unit, outcome }).await;
    permit.release();
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unit of work panicked".to_string()
    }
}
