//! Countdown Driver.
//!
//! Owns a registry of named circular countdowns. At most one countdown is
//! active per key: `reset` on an occupied key cancels the prior one first,
//! so the last `reset` always wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::phase::{phase_degrees, DEFAULT_TOTAL_DURATION_SECS};
use crate::traits::CountdownSurface;

/// Default period between two ticks.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);
/// Shortest accepted tick period; shorter ones are raised to it.
pub const MIN_TICK: Duration = Duration::from_millis(1);

type Registry = Arc<StdMutex<HashMap<String, ActiveCountdown>>>;

/// Proof of one `reset` call.
///
/// A later `reset` of the same key produces a new generation; cancelling
/// through an outdated ticket is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownTicket {
    key: String,
    generation: u64,
}

impl CountdownTicket {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct ActiveCountdown {
    generation: u64,
    remaining: Arc<AtomicI64>,
    task: JoinHandle<()>,
}

/// Drives the circular countdown visuals of a [`CountdownSurface`].
pub struct CountdownDriver {
    surface: Arc<dyn CountdownSurface>,
    total_duration_secs: u32,
    tick: Duration,
    registry: Registry,
    next_generation: AtomicU64,
}

impl CountdownDriver {
    /// Create a driver with a 30 second total duration and a 1 second tick.
    pub fn new(surface: Arc<dyn CountdownSurface>) -> Self {
        Self {
            surface,
            total_duration_secs: DEFAULT_TOTAL_DURATION_SECS,
            tick: DEFAULT_TICK,
            registry: Arc::new(StdMutex::new(HashMap::new())),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Set the duration a full circle represents.
    pub fn with_total_duration(mut self, secs: u32) -> Self {
        self.total_duration_secs = secs;
        self
    }

    /// Set the period between two ticks, at least [`MIN_TICK`].
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(MIN_TICK);
        self
    }

    pub fn total_duration_secs(&self) -> u32 {
        self.total_duration_secs
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Restart the countdown for `key` at `ttl_seconds`.
    ///
    /// Cancels any existing countdown for the key, draws the new phase
    /// immediately, then ticks once per period until the TTL reaches zero.
    /// A TTL of zero or less draws a full circle and stops on the first tick.
    ///
    /// The surface is never called with the registry locked, so it may
    /// query the driver while drawing.
    pub fn reset(&self, key: &str, ttl_seconds: i64) -> CountdownTicket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let ticket = CountdownTicket {
            key: key.to_string(),
            generation,
        };

        if let Some(prior) = self.lock().remove(key) {
            prior.task.abort();
            debug!(key, generation = prior.generation, "Replaced active countdown");
        }

        self.update_now(key, ttl_seconds);

        let mut registry = self.lock();
        match self.start(key, ttl_seconds, generation) {
            Some(active) => {
                // A reset that raced in while drawing loses to this one.
                if let Some(displaced) = registry.insert(key.to_string(), active) {
                    displaced.task.abort();
                }
            }
            None => {
                warn!(key, "No async runtime available, countdown drawn but not ticking");
            }
        }

        ticket
    }

    /// Draw the phase for `ttl_seconds` without waiting for a tick.
    fn update_now(&self, key: &str, ttl_seconds: i64) {
        let degrees = phase_degrees(ttl_seconds, self.total_duration_secs);
        if !self.surface.draw_countdown(key, degrees) {
            debug!(key, "Countdown visual not mounted, skipping draw");
        }
    }

    fn start(&self, key: &str, ttl_seconds: i64, generation: u64) -> Option<ActiveCountdown> {
        let runtime = Handle::try_current().ok()?;
        let remaining = Arc::new(AtomicI64::new(ttl_seconds.max(0)));

        let task = runtime.spawn(run_ticks(
            key.to_string(),
            generation,
            Arc::clone(&remaining),
            Arc::clone(&self.surface),
            Arc::clone(&self.registry),
            self.total_duration_secs,
            self.tick,
        ));

        Some(ActiveCountdown {
            generation,
            remaining,
            task,
        })
    }

    /// Cancel the countdown for `key`, whoever started it.
    pub fn cancel(&self, key: &str) -> bool {
        match self.lock().remove(key) {
            Some(active) => {
                active.task.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel the countdown `ticket` refers to, if it is still the active one.
    pub fn cancel_owned(&self, ticket: &CountdownTicket) -> bool {
        let mut registry = self.lock();
        let owned = registry
            .get(&ticket.key)
            .is_some_and(|active| active.generation == ticket.generation);
        if !owned {
            return false;
        }
        if let Some(active) = registry.remove(&ticket.key) {
            active.task.abort();
        }
        true
    }

    /// Cancel every countdown. Returns how many were active.
    pub fn cancel_all(&self) -> usize {
        let mut registry = self.lock();
        let count = registry.len();
        for (_, active) in registry.drain() {
            active.task.abort();
        }
        count
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn active_count(&self) -> usize {
        self.lock().len()
    }

    /// Seconds left on the active countdown for `key`.
    pub fn remaining_ttl(&self, key: &str) -> Option<i64> {
        self.lock()
            .get(key)
            .map(|active| active.remaining.load(Ordering::SeqCst))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ActiveCountdown>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for CountdownDriver {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn run_ticks(
    key: String,
    generation: u64,
    remaining: Arc<AtomicI64>,
    surface: Arc<dyn CountdownSurface>,
    registry: Registry,
    total_duration_secs: u32,
    tick: Duration,
) {
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        // Draw the current TTL, then count it down.
        let current = remaining.load(Ordering::SeqCst);
        surface.draw_countdown(&key, phase_degrees(current, total_duration_secs));
        let left = remaining.fetch_sub(1, Ordering::SeqCst) - 1;

        if left <= 0 {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            if registry
                .get(&key)
                .is_some_and(|active| active.generation == generation)
            {
                registry.remove(&key);
            }
            debug!(key = %key, generation, "Countdown expired");
            break;
        }
    }
}
