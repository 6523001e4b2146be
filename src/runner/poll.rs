//! Readiness polling
//!
//! Replaces fixed "wait then check" sleeps with polling against an explicit
//! readiness predicate, bounded by a timeout. The interval carries jitter so
//! concurrent scenario processes don't probe in lockstep.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// How a condition is polled: probe interval, overall deadline, and the
/// jitter ratio (0.0..=1.0) applied to each interval.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
    pub jitter_ratio: f64,
}

impl PollPolicy {
    /// Default probe cadence for a given deadline.
    pub fn within(timeout: Duration) -> Self {
        Self {
            interval: Duration::from_millis(100),
            timeout,
            jitter_ratio: 0.2,
        }
    }

    /// Interval with symmetric random jitter applied.
    fn jittered_interval(&self) -> Duration {
        if self.jitter_ratio <= 0.0 {
            return self.interval;
        }
        let ratio = self.jitter_ratio.clamp(0.0, 1.0);
        let millis = self.interval.as_millis() as f64;
        let spread = millis * ratio;
        let low = (millis - spread).max(1.0);
        let high = millis + spread;
        let sampled = rand::random::<f64>() * (high - low) + low;
        Duration::from_millis(sampled.round() as u64)
    }
}

/// Why a poll ended without the condition holding.
#[derive(Error, Debug)]
pub enum PollError<E> {
    #[error("condition not met within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Probe(E),
}

/// Poll `probe` until it yields a value or the policy's deadline passes.
/// The probe is always attempted at least once; a probe error aborts the
/// poll immediately.
pub async fn poll_until<T, E, F, Fut>(policy: &PollPolicy, mut probe: F) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let start = tokio::time::Instant::now();
    loop {
        match probe().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => return Err(PollError::Probe(e)),
        }
        if start.elapsed() >= policy.timeout {
            return Err(PollError::Timeout(start.elapsed()));
        }
        tokio::time::sleep(policy.jittered_interval()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn resolves_once_condition_holds() {
        let attempts = AtomicUsize::new(0);
        let policy = PollPolicy::within(Duration::from_secs(5));

        let value = poll_until(&policy, || {
            let n = attempts.fetch_add(1, Ordering::Relaxed);
            async move { Ok::<_, ()>((n >= 2).then_some(n)) }
        })
        .await
        .unwrap();

        assert_eq!(value, 2);
        assert_eq!(attempts.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_condition_never_holds() {
        let policy = PollPolicy::within(Duration::from_millis(500));
        let result: Result<(), _> =
            poll_until(&policy, || async { Ok::<_, ()>(None) }).await;
        assert!(matches!(result, Err(PollError::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_error_aborts_immediately() {
        let attempts = AtomicUsize::new(0);
        let policy = PollPolicy::within(Duration::from_secs(5));

        let result: Result<(), _> = poll_until(&policy, || {
            attempts.fetch_add(1, Ordering::Relaxed);
            async { Err("boom") }
        })
        .await;

        assert!(matches!(result, Err(PollError::Probe("boom"))));
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn jitter_stays_within_spread() {
        let policy = PollPolicy {
            interval: Duration::from_millis(100),
            timeout: Duration::from_secs(1),
            jitter_ratio: 0.2,
        };
        for _ in 0..50 {
            let interval = policy.jittered_interval();
            assert!(interval >= Duration::from_millis(80));
            assert!(interval <= Duration::from_millis(120));
        }
    }

    #[test]
    fn zero_jitter_keeps_interval() {
        let policy = PollPolicy {
            interval: Duration::from_millis(100),
            timeout: Duration::from_secs(1),
            jitter_ratio: 0.0,
        };
        assert_eq!(policy.jittered_interval(), Duration::from_millis(100));
    }
}
