use std::time::Duration;

#[derive(Debug, Clone)]
struct Timer<K>
{
    key: K,
    remaining: Duration,
    period: Option<Duration>,
}

/// Timers owned by a single game module and driven by its `update`.
///
/// Nothing outside the module can fire them, and `cancel_all` (called from
/// teardown) drops every one of them.
#[derive(Debug, Clone)]
pub struct Timers<K>
{
    timers: Vec<Timer<K>>,
}

impl<K> Default for Timers<K>
{
    fn default() -> Self
    {
        Self { timers: Vec::new() }
    }
}

impl<K: Copy> Timers<K>
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn once(&mut self, delay: Duration, key: K)
    {
        self.push(delay, None, key);
    }

    pub fn every(&mut self, period: Duration, key: K)
    {
        self.push(period, Some(period), key);
    }

    fn push(&mut self, remaining: Duration, period: Option<Duration>, key: K)
    {
        self.timers.push(Timer {
            key,
            remaining,
            period,
        });
    }

    pub fn cancel_all(&mut self)
    {
        self.timers.clear();
    }

    pub fn len(&self) -> usize
    {
        self.timers.len()
    }

    /// Advances every timer and returns the keys that fired, in firing order.
    ///
    /// A periodic timer fires once per elapsed period, so a long frame can
    /// report the same key more than once.
    pub fn advance(&mut self, dt: Duration) -> Vec<K>
    {
        let mut fired: Vec<(Duration, K)> = Vec::new();
        for timer in &mut self.timers {
            let mut budget = dt;
            let mut consumed = Duration::ZERO;
            while budget >= timer.remaining {
                budget -= timer.remaining;
                consumed += timer.remaining;
                fired.push((consumed, timer.key));
                match timer.period {
                    Some(period) if !period.is_zero() => timer.remaining = period,
                    _ => {
                        timer.remaining = Duration::ZERO;
                        timer.period = None;
                        break;
                    }
                }
            }
            if timer.period.is_some() || !timer.remaining.is_zero() {
                timer.remaining -= budget;
            }
        }
        self.timers
            .retain(|timer| timer.period.is_some() || !timer.remaining.is_zero());
        fired.sort_by_key(|(at, _)| *at);
        fired.into_iter().map(|(_, key)| key).collect()
    }
}

/// Countdown for time-boxed rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTimer
{
    elapsed: Duration,
    limit: Duration,
}

impl RoundTimer
{
    pub fn new(limit: Duration) -> Self
    {
        Self {
            elapsed: Duration::ZERO,
            limit,
        }
    }

    pub fn reset(&mut self)
    {
        self.elapsed = Duration::ZERO;
    }

    pub fn remaining(&self) -> Duration
    {
        self.limit.saturating_sub(self.elapsed)
    }

    pub fn is_up(&self) -> bool
    {
        self.elapsed >= self.limit
    }

    /// Stops accumulating once the limit is reached.
    pub fn tick(&mut self, dt: Duration)
    {
        if !self.is_up() {
            self.elapsed = self.elapsed.saturating_add(dt).min(self.limit);
        }
    }
}
