//! Frame clock emulating the transceiver clock from the wall clock
//!
//! Each elapsed TDMA frame runs exactly one router tick. After a stall the
//! missed frames are caught up back to back instead of being skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use gsm_config::SharedConfig;
use gsm_core::frame_number::FRAME_DURATION_US;
use gsm_core::FrameNumber;
use gsm_core::gsm_entities::GsmEntity;

use crate::MessageRouter;
use crate::sched::SchedBs;

/// Ticks due at once beyond which the clock reports itself late
const MAX_FRAMES_LATE: u64 = 2;

/// Counts frames elapsed since a start instant
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    /// Frames handed out by `poll` so far
    frames_done: u64,
}

impl FrameClock {
    pub fn new(start: Instant) -> Self {
        Self { start, frames_done: 0 }
    }

    /// Frames elapsed at `now`; a frame counts once more than half of it has passed
    fn frames_due(&self, now: Instant) -> u64 {
        let elapsed_us = now.saturating_duration_since(self.start).as_micros() as u64;
        (2 * elapsed_us + FRAME_DURATION_US - 1) / (2 * FRAME_DURATION_US)
    }

    /// Returns the number of ticks to run now and marks them done
    pub fn poll(&mut self, now: Instant) -> u64 {
        let due = self.frames_due(now);
        let n = due.saturating_sub(self.frames_done);
        if n > MAX_FRAMES_LATE + 1 {
            tracing::warn!("clock: {} frames late, catching up", n - 1);
        }
        self.frames_done += n;
        n
    }

    /// Instant at which the next frame becomes due
    pub fn next_deadline(&self) -> Instant {
        let us = self.frames_done * FRAME_DURATION_US + FRAME_DURATION_US / 2 + 1;
        self.start + Duration::from_micros(us)
    }

    pub fn frames_done(&self) -> u64 {
        self.frames_done
    }
}

fn notify_sched(router: &mut MessageRouter, running: bool, fn_: FrameNumber) {
    let Some(entity) = router.get_entity(GsmEntity::Sched) else {
        return;
    };
    if let Some(sched) = entity.as_any_mut().downcast_mut::<SchedBs>() {
        if running { sched.clock_started(fn_) } else { sched.clock_stopped() }
    }
}

/// Runs the stack paced by the wall clock until `running` is cleared
pub fn run_realtime(router: &mut MessageRouter, config: &SharedConfig, running: Arc<AtomicBool>) {
    let start_fn = router.get_fn();
    config.state_write().clock_running = true;
    notify_sched(router, true, start_fn);
    tracing::info!(frame = %start_fn, "run_realtime: clock started");

    let mut clock = FrameClock::new(Instant::now());
    while running.load(Ordering::SeqCst) {
        for _ in 0..clock.poll(Instant::now()) {
            router.run_frame();
        }
        // Sleep until the next frame; a timer channel fires once at the deadline
        let _ = crossbeam_channel::at(clock.next_deadline()).recv();
    }

    config.state_write().clock_running = false;
    notify_sched(router, false, router.get_fn());
    tracing::info!(frame = %router.get_fn(), "run_realtime: clock stopped after {} frames", clock.frames_done());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(start: Instant, us: u64) -> Instant {
        start + Duration::from_micros(us)
    }

    #[test]
    fn test_half_frame_rounding() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        assert_eq!(clock.poll(start), 0);
        assert_eq!(clock.poll(at(start, FRAME_DURATION_US / 2)), 0);
        assert_eq!(clock.poll(at(start, FRAME_DURATION_US / 2 + 1)), 1);
        assert_eq!(clock.poll(at(start, FRAME_DURATION_US)), 0);
        assert_eq!(clock.poll(at(start, FRAME_DURATION_US * 3 / 2 + 1)), 1);
        assert_eq!(clock.frames_done(), 2);
    }

    #[test]
    fn test_catch_up_runs_every_frame() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        assert_eq!(clock.poll(at(start, FRAME_DURATION_US)), 1);
        // Stalled for ten frames
        assert_eq!(clock.poll(at(start, FRAME_DURATION_US * 11)), 10);
        assert_eq!(clock.frames_done(), 11);
        // Never runs backwards
        assert_eq!(clock.poll(at(start, FRAME_DURATION_US * 5)), 0);
    }

    #[test]
    fn test_next_deadline() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        let d = clock.next_deadline();
        assert_eq!(clock.poll(d), 1);
        let d2 = clock.next_deadline();
        assert_eq!(d2.duration_since(d), Duration::from_micros(FRAME_DURATION_US));
        assert_eq!(clock.poll(d2 - Duration::from_micros(1)), 0);
        assert_eq!(clock.poll(d2), 1);
    }
}
