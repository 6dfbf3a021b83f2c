use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

use super::provider::MetricsProvider;
use super::snapshot::Snapshot;
use crate::error::{MonitorError, Result};

/// Validated duration/interval pair for one sampling session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplePlan {
    duration: Duration,
    interval: Duration,
}

impl SamplePlan {
    pub fn new(duration_secs: f64, interval_secs: f64) -> Result<Self> {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(MonitorError::InvalidArgument(format!(
                "duration must be >= 0 seconds, got {duration_secs}"
            )));
        }
        if !interval_secs.is_finite() || interval_secs <= 0.0 {
            return Err(MonitorError::InvalidArgument(format!(
                "interval must be > 0 seconds, got {interval_secs}"
            )));
        }
        let duration = Duration::try_from_secs_f64(duration_secs).map_err(|_| {
            MonitorError::InvalidArgument(format!("duration {duration_secs}s is out of range"))
        })?;
        let interval = Duration::try_from_secs_f64(interval_secs).map_err(|_| {
            MonitorError::InvalidArgument(format!("interval {interval_secs}s is out of range"))
        })?;
        if interval.is_zero() {
            return Err(MonitorError::InvalidArgument(format!(
                "interval {interval_secs}s is below timer resolution"
            )));
        }
        Ok(SamplePlan { duration, interval })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound on captures: one per offset `0, interval, 2*interval, ...` that is still
    /// within the duration, i.e. `floor(duration / interval) + 1`.
    ///
    /// A trailing partial interval does not earn an extra capture, so 7s at 5s gives two
    /// (at 0s and 5s) and any interval longer than the duration gives exactly one. Slow
    /// captures can end a session earlier than this; see [`Sampler::run`].
    pub fn capture_count(&self) -> u64 {
        let steps = self.duration.as_nanos() / self.interval.as_nanos();
        u64::try_from(steps).unwrap_or(u64::MAX - 1) + 1
    }

    /// Whether a capture starting `offset` into the session still belongs to it.
    ///
    /// Half an interval of slack absorbs timer latency, so the capture due exactly at
    /// `duration` is not lost to a few milliseconds of drift.
    pub fn admits(&self, offset: Duration) -> bool {
        offset <= self.duration.saturating_add(self.interval / 2)
    }
}

/// Snapshots gathered by one [`Sampler::run`], in capture order.
#[derive(Debug, Default)]
pub struct Session {
    pub snapshots: Vec<Snapshot>,
    pub skipped: usize,
    pub cancelled: bool,
}

pub struct Sampler<P> {
    provider: P,
}

impl<P: MetricsProvider> Sampler<P> {
    pub fn new(provider: P) -> Self {
        Sampler { provider }
    }

    pub fn into_inner(self) -> P {
        self.provider
    }

    /// Runs one session.
    ///
    /// Captures alternate with waits; each wait ends `interval` after the previous capture
    /// started, or immediately if that capture overran. Missed ticks are not made up. No
    /// capture starts outside the duration window (see [`SamplePlan::admits`]), so at most
    /// [`SamplePlan::capture_count`] are taken. A failed capture is logged and skipped.
    /// Setting `shutdown` to `true` stops the loop between captures and returns what was
    /// collected so far.
    pub async fn run<F>(
        &mut self,
        plan: &SamplePlan,
        shutdown: &mut watch::Receiver<bool>,
        mut on_capture: F,
    ) -> Session
    where
        F: FnMut(&Snapshot),
    {
        let planned = plan.capture_count();
        let mut session = Session::default();
        let session_start = Instant::now();

        tracing::info!(
            duration_secs = plan.duration.as_secs_f64(),
            interval_secs = plan.interval.as_secs_f64(),
            planned,
            "starting sampling session"
        );

        for index in 0..planned {
            if *shutdown.borrow() {
                session.cancelled = true;
                break;
            }
            let started = Instant::now();
            match self.provider.capture() {
                Ok(snapshot) => {
                    tracing::debug!(index, timestamp = %snapshot.timestamp, "captured snapshot");
                    on_capture(&snapshot);
                    session.snapshots.push(snapshot);
                }
                Err(err) => {
                    tracing::warn!(index, error = %err, "capture failed, skipping");
                    session.skipped += 1;
                }
            }

            if index + 1 == planned {
                break;
            }

            // An overrun capture pushes the next one to "now"; never start past the window.
            let next_at = (started + plan.interval).max(Instant::now());
            if !plan.admits(next_at - session_start) {
                tracing::debug!(index, "duration window elapsed, stopping early");
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown_requested(shutdown) => {
                    session.cancelled = true;
                    break;
                }
                _ = sleep_until(next_at) => {}
            }
        }

        if session.cancelled {
            tracing::info!(
                captured = session.snapshots.len(),
                "sampling cancelled, keeping partial session"
            );
        }
        session
    }
}

async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        // Sender gone without a stop request: never resolve.
        std::future::pending::<()>().await;
    }
}
