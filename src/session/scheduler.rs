use crate::foundation::core::Fps;
use crate::session::engine::Engine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Fixed-cadence tick timing with drift correction.
///
/// Tick `n` ideally starts at `init + n * interval`. Sleeping is always computed against
/// that absolute schedule, never relative to the previous tick, so jitter does not
/// accumulate.
#[derive(Debug, Clone)]
pub struct Pacer {
    init: Instant,
    interval: Duration,
    tick_count: u64,
}

impl Pacer {
    /// Shortest sleep handed out when a tick finished on time.
    pub const MIN_SLEEP: Duration = Duration::from_millis(1);

    /// Schedule anchored at `init`, one slot every `interval`.
    pub fn new(init: Instant, interval: Duration) -> Self {
        Self {
            init,
            interval,
            tick_count: 0,
        }
    }

    /// Index of the slot the next tick occupies.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Ideal start of tick `n`.
    pub fn ideal_start(&self, n: u64) -> Instant {
        let nanos = self.interval.as_nanos().saturating_mul(u128::from(n));
        self.init + Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Account for a tick that finished at `now` and return how long to wait.
    ///
    /// Finishing past the next slot's start drops that slot: the count skips ahead by two
    /// and the wait is zero. Otherwise the wait reaches the next slot, floored at
    /// [`Pacer::MIN_SLEEP`].
    pub fn after_tick(&mut self, now: Instant) -> Duration {
        let next = self.ideal_start(self.tick_count + 1);
        if now > next {
            self.tick_count += 2;
            return Duration::ZERO;
        }
        self.tick_count += 1;
        next.saturating_duration_since(now).max(Self::MIN_SLEEP)
    }
}

/// Options for [`run`].
#[derive(Clone, Debug)]
pub struct SchedulerOpts {
    /// Tick rate.
    pub fps: Fps,
    /// Stop after this many ticks.
    pub max_ticks: Option<u64>,
    /// Log tick statistics every this many ticks.
    pub report_every: Option<u64>,
}

impl Default for SchedulerOpts {
    fn default() -> Self {
        Self {
            fps: Fps::STAGE,
            max_ticks: None,
            report_every: None,
        }
    }
}

/// Loop statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Ticks that overran their slot.
    pub overruns: u64,
}

/// Drive `engine` at a fixed cadence on the calling thread.
///
/// Returns when `stop` is set, the engine processes a shutdown command or `max_ticks`
/// is reached. Pending state is flushed to the store before returning.
pub fn run(engine: &mut Engine, opts: &SchedulerOpts, stop: &AtomicBool) -> RunStats {
    let mut pacer = Pacer::new(Instant::now(), opts.fps.interval());
    let mut stats = RunStats::default();
    tracing::info!(fps = opts.fps.as_f64(), "scheduler started");

    loop {
        if stop.load(Ordering::Relaxed) || engine.is_shutdown() {
            break;
        }
        if opts.max_ticks.is_some_and(|max| stats.ticks >= max) {
            break;
        }

        engine.tick();
        stats.ticks += 1;

        if let Some(every) = opts.report_every
            && every > 0
            && stats.ticks % every == 0
        {
            tracing::info!(ticks = stats.ticks, overruns = stats.overruns, "tick stats");
        }

        let wait = pacer.after_tick(Instant::now());
        if wait.is_zero() {
            stats.overruns += 1;
            tracing::debug!(slot = pacer.tick_count(), "tick overran its slot; dropping one");
        } else if !engine.is_shutdown() {
            std::thread::sleep(wait);
        }
    }

    if let Err(err) = engine.flush() {
        tracing::warn!(error = %err, "final state save failed");
    }
    tracing::info!(ticks = stats.ticks, overruns = stats.overruns, "scheduler stopped");
    stats
}

#[cfg(test)]
#[path = "../../tests/unit/session/scheduler.rs"]
mod tests;
