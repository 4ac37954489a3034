//! Daily digest timer.
//!
//! Sleeps until 08:00 tomorrow in a fixed UTC+5:30 offset, fires the job, and
//! repeats for the life of the process.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use log::{debug, info, warn};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::GlanceError;

const FIRE_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;
const FIRE_HOUR: u32 = 8;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// What runs on each fire.
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    async fn fire(&self) -> Result<(), GlanceError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Sleeping,
    Firing,
}

pub fn fire_offset() -> Result<FixedOffset> {
    FixedOffset::east_opt(FIRE_OFFSET_SECS)
        .ok_or_else(|| anyhow!("invalid UTC offset {FIRE_OFFSET_SECS}s"))
}

/// 08:00 on the day after `now`'s calendar date in the fire offset.
pub fn next_fire(now: DateTime<Utc>) -> Result<DateTime<FixedOffset>> {
    let offset = fire_offset()?;
    let tomorrow = now
        .with_timezone(&offset)
        .date_naive()
        .succ_opt()
        .context("no calendar day after current date")?;
    let at = NaiveTime::from_hms_opt(FIRE_HOUR, 0, 0).context("invalid fire time")?;

    tomorrow
        .and_time(at)
        .and_local_timezone(offset)
        .single()
        .context("fire time is not representable in the fixed offset")
}

pub struct DailyScheduler {
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    job: Arc<dyn ScheduledJob>,
    state: Mutex<SchedulerState>,
}

impl DailyScheduler {
    pub fn new(
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
        job: Arc<dyn ScheduledJob>,
    ) -> Self {
        Self {
            clock,
            sleeper,
            job,
            state: Mutex::new(SchedulerState::Sleeping),
        }
    }

    pub fn with_system_time(job: Arc<dyn ScheduledJob>) -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(TokioSleeper), job)
    }

    #[cfg(test)]
    pub fn state(&self) -> SchedulerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: SchedulerState) {
        debug!("Daily scheduler {state:?}");
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// One full cycle: wait out the delay to the next fire, then run the job.
    ///
    /// Job failures are logged and swallowed; only a broken date computation is an error.
    pub async fn tick(&self) -> Result<DateTime<FixedOffset>> {
        self.set_state(SchedulerState::Sleeping);
        let now = self.clock.now();
        let next = next_fire(now)?;
        let delay = (next.with_timezone(&Utc) - now).to_std().unwrap_or(Duration::ZERO);
        debug!("Next daily digest at {next} (in {}s)", delay.as_secs());

        self.sleeper.sleep(delay).await;

        self.set_state(SchedulerState::Firing);
        info!("Daily digest firing");
        if let Err(e) = self.job.fire().await {
            warn!("Scheduled digest failed: {e}");
        }
        self.set_state(SchedulerState::Sleeping);

        Ok(next)
    }

    pub async fn run(&self) {
        loop {
            if let Err(e) = self.tick().await {
                // Only reachable at the end of the calendar; back off rather than spin.
                warn!("Could not schedule daily digest: {e:#}");
                self.sleeper.sleep(Duration::from_secs(24 * 3600)).await;
            }
        }
    }

    pub fn spawn(self) -> ScheduleHandle {
        let stop = Arc::new(Notify::new());
        let stop_signal = Arc::clone(&stop);

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = self.run() => {}
                _ = stop_signal.notified() => {
                    debug!("Daily scheduler stopped");
                }
            }
        });

        ScheduleHandle { stop, task }
    }
}

/// Owner of a spawned scheduler. Dropping it leaves the task running.
#[derive(Debug)]
pub struct ScheduleHandle {
    stop: Arc<Notify>,
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    pub async fn cancel(self) {
        self.stop.notify_one();
        if let Err(e) = self.task.await {
            warn!("Daily scheduler task ended abnormally: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Time only moves when the scheduler sleeps.
    struct ManualClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn at(now: DateTime<Utc>) -> Arc<Self> {
            Arc::new(Self { now: Mutex::new(now) })
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    #[async_trait]
    impl Sleeper for ManualClock {
        async fn sleep(&self, duration: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += chrono::Duration::from_std(duration).unwrap();
        }
    }

    struct RecordingJob {
        clock: Arc<ManualClock>,
        fired_at: Mutex<Vec<DateTime<Utc>>>,
        fail: bool,
    }

    #[async_trait]
    impl ScheduledJob for RecordingJob {
        async fn fire(&self) -> Result<(), GlanceError> {
            self.fired_at.lock().unwrap().push(self.clock.now());
            if self.fail {
                Err(GlanceError::delivery("connection refused"))
            } else {
                Ok(())
            }
        }
    }

    fn scheduler(start: DateTime<Utc>, fail: bool) -> (DailyScheduler, Arc<RecordingJob>) {
        let clock = ManualClock::at(start);
        let job = Arc::new(RecordingJob {
            clock: Arc::clone(&clock),
            fired_at: Mutex::new(Vec::new()),
            fail,
        });
        let scheduler = DailyScheduler::new(clock.clone(), clock, job.clone());
        (scheduler, job)
    }

    fn ist() -> FixedOffset {
        fire_offset().unwrap()
    }

    #[test]
    fn next_fire_is_eight_am_the_following_day() {
        // 15:30 on the 19th in UTC+5:30.
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
        let next = next_fire(now).unwrap();
        assert_eq!(next, ist().with_ymd_and_hms(2026, 10, 20, 8, 0, 0).unwrap());
        assert_eq!(next.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 10, 20, 2, 30, 0).unwrap());
    }

    #[test]
    fn next_fire_uses_the_offset_date_not_the_utc_date() {
        // 20:00 UTC on the 19th is already 01:30 on the 20th in UTC+5:30.
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 20, 0, 0).unwrap();
        let next = next_fire(now).unwrap();
        assert_eq!(next, ist().with_ymd_and_hms(2026, 10, 21, 8, 0, 0).unwrap());
    }

    #[test]
    fn before_eight_still_targets_tomorrow() {
        // 07:00 on the 19th in UTC+5:30; today's 08:00 is skipped.
        let now = ist().with_ymd_and_hms(2026, 10, 19, 7, 0, 0).unwrap().with_timezone(&Utc);
        let next = next_fire(now).unwrap();
        assert_eq!(next, ist().with_ymd_and_hms(2026, 10, 20, 8, 0, 0).unwrap());
    }

    #[test]
    fn next_fire_crosses_month_and_year_ends() {
        let now = ist().with_ymd_and_hms(2026, 12, 31, 12, 0, 0).unwrap().with_timezone(&Utc);
        let next = next_fire(now).unwrap();
        assert_eq!(next, ist().with_ymd_and_hms(2027, 1, 1, 8, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn consecutive_fires_are_a_day_apart() {
        let start = Utc.with_ymd_and_hms(2026, 10, 19, 10, 17, 42).unwrap();
        let (scheduler, job) = scheduler(start, false);

        for _ in 0..4 {
            scheduler.tick().await.unwrap();
        }

        let fired = job.fired_at.lock().unwrap().clone();
        assert_eq!(fired.len(), 4);
        for at in &fired {
            let local = at.with_timezone(&ist());
            assert_eq!((local.hour(), local.minute(), local.second()), (8, 0, 0));
        }
        for pair in fired.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= chrono::Duration::minutes(23 * 60 + 59));
            assert!(gap <= chrono::Duration::minutes(24 * 60 + 1));
        }
        assert_eq!(fired[0], Utc.with_ymd_and_hms(2026, 10, 20, 2, 30, 0).unwrap());
    }

    #[tokio::test]
    async fn failed_fire_does_not_stop_the_loop() {
        let start = Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap();
        let (scheduler, job) = scheduler(start, true);

        scheduler.tick().await.unwrap();
        scheduler.tick().await.unwrap();

        assert_eq!(job.fired_at.lock().unwrap().len(), 2);
        assert_eq!(scheduler.state(), SchedulerState::Sleeping);
    }

    struct CountingJob(AtomicUsize);

    #[async_trait]
    impl ScheduledJob for CountingJob {
        async fn fire(&self) -> Result<(), GlanceError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_scheduler_fires_with_tokio_time_and_cancels() {
        let job = Arc::new(CountingJob(AtomicUsize::new(0)));
        let clock = ManualClock::at(Utc.with_ymd_and_hms(2026, 10, 19, 10, 0, 0).unwrap());
        // Real tokio sleep under a paused runtime; the manual clock only supplies `now`.
        let scheduler = DailyScheduler::new(clock, Arc::new(TokioSleeper), job.clone());
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_secs(17 * 3600)).await;
        assert_eq!(job.0.load(Ordering::SeqCst), 1);

        handle.cancel().await;

        // The next wake would have been 16.5h after the first fire.
        tokio::time::sleep(Duration::from_secs(48 * 3600)).await;
        assert_eq!(job.0.load(Ordering::SeqCst), 1);
    }
}
