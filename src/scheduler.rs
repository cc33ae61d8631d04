//! Frame scheduling.
//!
//! The session never loops on its own: it asks a [`Scheduler`] for the next
//! tick and cancels it when the game ends. A cancelled handle is removed
//! synchronously, so `take_due` can never hand it back.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

impl TickHandle
{
    pub fn id(self) -> u64
    {
        self.0
    }
}

/// A due tick. `timestamp` is measured from the scheduler's epoch, like an
/// animation-frame callback timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick
{
    pub handle: TickHandle,
    pub timestamp: Duration,
}

pub trait Scheduler
{
    fn request_tick(&mut self) -> TickHandle;
    fn cancel_tick(&mut self, handle: TickHandle);
    /// Removes and returns every pending tick that is due now.
    fn take_due(&mut self) -> Vec<Tick>;
}

/// Deterministic scheduler for tests: pending ticks become due when the clock
/// is advanced.
#[derive(Debug, Default)]
pub struct ManualScheduler
{
    next_id: u64,
    now: Duration,
    pending: Vec<TickHandle>,
    due: Vec<Tick>,
    cancelled: Vec<TickHandle>,
}

impl ManualScheduler
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// Moves the clock forward and marks every pending tick as due.
    pub fn advance(&mut self, dt: Duration)
    {
        self.now += dt;
        let now = self.now;
        self.due.extend(
            self.pending
                .drain(..)
                .map(|handle| Tick {
                    handle,
                    timestamp: now,
                }),
        );
    }

    pub fn pending(&self) -> &[TickHandle]
    {
        &self.pending
    }

    pub fn cancelled(&self) -> &[TickHandle]
    {
        &self.cancelled
    }
}

impl Scheduler for ManualScheduler
{
    fn request_tick(&mut self) -> TickHandle
    {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        self.pending.push(handle);
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle)
    {
        self.pending.retain(|pending| *pending != handle);
        self.due.retain(|tick| tick.handle != handle);
        self.cancelled.push(handle);
    }

    fn take_due(&mut self) -> Vec<Tick>
    {
        std::mem::take(&mut self.due)
    }
}

/// Wall-clock scheduler used by the terminal hub: a pending tick is due once
/// `interval` has passed since the previous delivery.
#[derive(Debug)]
pub struct FrameScheduler
{
    epoch: Instant,
    interval: Duration,
    last_delivery: Option<Instant>,
    next_id: u64,
    pending: Option<TickHandle>,
}

impl FrameScheduler
{
    pub fn new(interval: Duration) -> Self
    {
        Self {
            epoch: Instant::now(),
            interval,
            last_delivery: None,
            next_id: 0,
            pending: None,
        }
    }

    /// How long the caller may block before the pending tick is due.
    pub fn time_until_due(&self) -> Option<Duration>
    {
        self.pending?;
        let Some(last) = self.last_delivery else {
            return Some(Duration::ZERO);
        };
        Some(self.interval.saturating_sub(last.elapsed()))
    }
}

impl Scheduler for FrameScheduler
{
    fn request_tick(&mut self) -> TickHandle
    {
        self.next_id += 1;
        let handle = TickHandle(self.next_id);
        // One frame loop at a time: a new request replaces the old one.
        self.pending = Some(handle);
        handle
    }

    fn cancel_tick(&mut self, handle: TickHandle)
    {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }

    fn take_due(&mut self) -> Vec<Tick>
    {
        let Some(handle) = self.pending else {
            return Vec::new();
        };
        let now = Instant::now();
        let ready = self
            .last_delivery
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if !ready {
            return Vec::new();
        }
        self.pending = None;
        self.last_delivery = Some(now);
        vec![Tick {
            handle,
            timestamp: now.saturating_duration_since(self.epoch),
        }]
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn manual_ticks_fire_only_after_advance()
    {
        let mut scheduler = ManualScheduler::new();
        let handle = scheduler.request_tick();
        assert!(scheduler.take_due().is_empty());

        scheduler.advance(Duration::from_millis(16));
        let due = scheduler.take_due();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].handle, handle);
        assert_eq!(due[0].timestamp, Duration::from_millis(16));
        assert!(scheduler.take_due().is_empty());
    }

    #[test]
    fn cancelled_ticks_never_fire()
    {
        let mut scheduler = ManualScheduler::new();
        let stale = scheduler.request_tick();
        scheduler.advance(Duration::from_millis(16));
        // Cancel after it became due but before it was taken.
        scheduler.cancel_tick(stale);
        let fresh = scheduler.request_tick();
        scheduler.advance(Duration::from_millis(16));

        let due = scheduler.take_due();
        assert_eq!(due.iter().map(|tick| tick.handle).collect::<Vec<_>>(), vec![fresh]);
        assert_eq!(scheduler.cancelled(), &[stale]);
    }

    #[test]
    fn frame_scheduler_first_tick_is_immediate()
    {
        let mut scheduler = FrameScheduler::new(Duration::from_secs(60));
        let handle = scheduler.request_tick();
        assert_eq!(scheduler.time_until_due(), Some(Duration::ZERO));
        let due = scheduler.take_due();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].handle, handle);

        // Next one waits for the interval.
        scheduler.request_tick();
        assert!(scheduler.take_due().is_empty());
    }

    #[test]
    fn frame_scheduler_cancel_clears_pending()
    {
        let mut scheduler = FrameScheduler::new(Duration::from_millis(1));
        let handle = scheduler.request_tick();
        scheduler.cancel_tick(handle);
        assert_eq!(scheduler.time_until_due(), None);
        assert!(scheduler.take_due().is_empty());
    }
}
