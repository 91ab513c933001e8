//! Scheduler engine: fires registered jobs at fixed intervals.
//!
//! Jobs run one at a time on the task that calls [`Scheduler::run`]. A
//! firing is awaited to completion before the next due time is looked at, so
//! a job never overlaps itself or another job. Sleeping uses tokio timers,
//! so an idle scheduler costs nothing.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use watchbell_core::Result;

/// A periodic job body.
#[async_trait]
pub trait Job: Send {
    fn name(&self) -> &str;

    /// Run one cycle. An error means "no new artifact this cycle"; it is
    /// logged and the job keeps its schedule.
    async fn fire(&mut self) -> Result<()>;
}

struct ScheduledJob {
    job: Box<dyn Job>,
    interval: Duration,
    next_due: Instant,
}

/// Counters returned when the scheduler stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub firings: u64,
    pub failures: u64,
}

#[derive(Default)]
pub struct Scheduler {
    jobs: Vec<ScheduledJob>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `job` to fire after `initial_delay`, then every `interval`.
    pub fn schedule<J: Job + 'static>(&mut self, job: J, interval: Duration, initial_delay: Duration) {
        let interval = if interval.is_zero() {
            tracing::warn!("⚠️ Job '{}' has a zero interval, using 1s", job.name());
            Duration::from_secs(1)
        } else {
            interval
        };
        tracing::info!(
            "📅 Job scheduled: '{}' (every {}s, first in {}s)",
            job.name(),
            interval.as_secs(),
            initial_delay.as_secs()
        );
        self.jobs.push(ScheduledJob {
            job: Box::new(job),
            interval,
            next_due: saturating_after(Instant::now(), initial_delay),
        });
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Drive all jobs until `shutdown` resolves.
    ///
    /// Shutdown while waiting returns immediately; shutdown during a firing
    /// lets that firing finish first.
    pub async fn run<F>(mut self, shutdown: F) -> SchedulerStats
    where
        F: Future<Output = ()>,
    {
        let mut stats = SchedulerStats::default();
        tokio::pin!(shutdown);

        tracing::info!("⏰ Scheduler started with {} job(s)", self.jobs.len());

        loop {
            // Ties go to the job registered first.
            let Some((idx, due)) = self
                .jobs
                .iter()
                .enumerate()
                .min_by_key(|(_, j)| j.next_due)
                .map(|(i, j)| (i, j.next_due))
            else {
                shutdown.as_mut().await;
                break;
            };

            tokio::select! {
                biased;
                _ = shutdown.as_mut() => break,
                _ = tokio::time::sleep_until(due) => {}
            }

            let entry = &mut self.jobs[idx];
            stats.firings += 1;
            tracing::debug!("🔔 Job triggered: '{}'", entry.job.name());
            if let Err(e) = entry.job.fire().await {
                stats.failures += 1;
                tracing::warn!("⚠️ Job '{}' failed: {e}", entry.job.name());
            }

            // A firing that overran its next slot pushes the schedule back
            // instead of firing again straight away.
            let finished = Instant::now();
            let mut next = saturating_after(due, entry.interval);
            if next <= finished {
                next = saturating_after(finished, entry.interval);
            }
            entry.next_due = next;
        }

        tracing::info!(
            "⏹️ Scheduler stopped ({} firings, {} failed)",
            stats.firings,
            stats.failures
        );
        stats
    }
}

/// About thirty years: far enough to mean "never" for a daemon.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn saturating_after(base: Instant, delay: Duration) -> Instant {
    base.checked_add(delay).unwrap_or_else(|| base + FAR_FUTURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use watchbell_core::WatchbellError;

    /// Records the offset of every completed firing.
    struct Recorder {
        name: &'static str,
        start: Instant,
        work: Duration,
        fail: bool,
        log: Arc<Mutex<Vec<(&'static str, u64)>>>,
    }

    #[async_trait]
    impl Job for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        async fn fire(&mut self) -> Result<()> {
            if !self.work.is_zero() {
                tokio::time::sleep(self.work).await;
            }
            let at = (Instant::now() - self.start).as_secs();
            self.log.lock().unwrap().push((self.name, at));
            if self.fail {
                return Err(WatchbellError::Fetch("upstream 502".into()));
            }
            Ok(())
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<(&'static str, u64)>>>) -> Recorder {
        Recorder {
            name,
            start: Instant::now(),
            work: Duration::ZERO,
            fail: false,
            log: log.clone(),
        }
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_delay_then_interval() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.schedule(recorder("status", &log), secs(10), secs(5));

        let stats = scheduler.run(tokio::time::sleep(secs(30))).await;

        assert_eq!(stats.firings, 3);
        let offsets: Vec<u64> = log.lock().unwrap().iter().map(|(_, at)| *at).collect();
        assert_eq!(offsets, vec![5, 15, 25]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_job_keeps_its_schedule() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        let mut job = recorder("flaky", &log);
        job.fail = true;
        scheduler.schedule(job, secs(10), Duration::ZERO);

        let stats = scheduler.run(tokio::time::sleep(secs(25))).await;

        assert_eq!(stats, SchedulerStats { firings: 3, failures: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_firing_does_not_burst() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        let mut job = recorder("slow", &log);
        job.work = secs(15);
        scheduler.schedule(job, secs(10), Duration::ZERO);

        let stats = scheduler.run(tokio::time::sleep(secs(50))).await;

        // 0..15 overran the 10s slot, so the next starts at 25 (ends 40),
        // not immediately at 15.
        let offsets: Vec<u64> = log.lock().unwrap().iter().map(|(_, at)| *at).collect();
        assert_eq!(offsets, vec![15, 40]);
        assert_eq!(stats.firings, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_lets_current_firing_finish() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let start = Instant::now();
        let mut scheduler = Scheduler::new();
        let mut job = recorder("capture", &log);
        job.work = secs(20);
        scheduler.schedule(job, secs(60), secs(5));

        // Shutdown at 10s, mid-firing (5..25).
        let stats = scheduler.run(tokio::time::sleep(secs(10))).await;

        assert_eq!(stats.firings, 1);
        assert_eq!(log.lock().unwrap().as_slice(), &[("capture", 25)]);
        assert!(Instant::now() - start >= secs(25));
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_interleave_by_due_time() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.schedule(recorder("a", &log), secs(10), Duration::ZERO);
        scheduler.schedule(recorder("b", &log), secs(15), secs(5));

        scheduler.run(tokio::time::sleep(secs(21))).await;

        assert_eq!(
            log.lock().unwrap().as_slice(),
            &[("a", 0), ("b", 5), ("a", 10), ("a", 20), ("b", 20)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_delay_never_fires() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        scheduler.schedule(recorder("idle", &log), Duration::MAX, Duration::MAX);

        let stats = scheduler.run(tokio::time::sleep(secs(60))).await;

        assert_eq!(stats.firings, 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_jobs_waits_for_shutdown() {
        let stats = Scheduler::new().run(tokio::time::sleep(secs(1))).await;
        assert_eq!(stats, SchedulerStats::default());
    }
}
