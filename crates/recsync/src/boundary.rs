//! Wall-clock boundary detection.
//!
//! A [`BoundaryWindow`] is a daily span of local wall-clock time. A
//! [`BoundaryTracker`] turns a sequence of clock samples into edge events,
//! emitting exactly one event per transition into or out of the window.
//! [`BoundaryWatcher`] samples a [`Clock`] on a fixed period and broadcasts
//! those events to any number of listeners.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, NaiveTime, TimeZone};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::BoundaryConfig;

/// Capacity of the event channel; slow listeners lag past this.
const EVENT_CAPACITY: usize = 16;

/// An edge crossing of a boundary window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryEvent {
    Entered,
    Exited,
}

impl fmt::Display for BoundaryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryEvent::Entered => write!(f, "entered"),
            BoundaryEvent::Exited => write!(f, "exited"),
        }
    }
}

/// A daily window of local wall-clock time, start inclusive, end exclusive.
///
/// A window whose end is before its start wraps past midnight
/// (`22:00..02:00`). A window whose end equals its start is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl BoundaryWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// The hour after midnight, `00:00..01:00`.
    pub fn midnight_hour() -> Self {
        Self::new(NaiveTime::MIN, NaiveTime::MIN + chrono::TimeDelta::hours(1))
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn wraps(&self) -> bool {
        self.end < self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Whether a wall-clock time falls inside the window.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.wraps() {
            time >= self.start || time < self.end
        } else {
            self.start <= time && time < self.end
        }
    }

    /// Whether an instant falls inside the window, in its own time zone.
    pub fn contains_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> bool {
        self.contains(at.time())
    }

    /// Time remaining from `now` until the next transition.
    ///
    /// Returns `None` for an empty window, which never transitions.
    /// Durations follow the wall clock, so a daylight-saving shift between
    /// now and the transition is not accounted for.
    pub fn countdown<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<Countdown> {
        if self.is_empty() {
            return None;
        }

        let local = now.naive_local();
        let (target, next) = if self.contains(local.time()) {
            (self.end, BoundaryEvent::Exited)
        } else {
            (self.start, BoundaryEvent::Entered)
        };

        let mut at = local.date().and_time(target);
        if at <= local {
            at += chrono::TimeDelta::days(1);
        }

        let remaining = (at - local).to_std().unwrap_or_default();
        Some(Countdown { next, remaining })
    }
}

impl Default for BoundaryWindow {
    fn default() -> Self {
        Self::midnight_hour()
    }
}

impl fmt::Display for BoundaryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%H:%M:%S"),
            self.end.format("%H:%M:%S")
        )
    }
}

/// Time left until the next boundary transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    /// The event the transition will produce.
    pub next: BoundaryEvent,
    /// Wall-clock time until it happens.
    pub remaining: Duration,
}

impl Countdown {
    /// Human-readable remaining time, such as `1h 2m 3s`.
    ///
    /// Zero components are left out; less than a second reads `0s`.
    pub fn label(&self) -> String {
        let total = self.remaining.as_secs();
        let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

        let parts: Vec<String> = [(hours, "h"), (minutes, "m"), (seconds, "s")]
            .into_iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, unit)| format!("{}{}", n, unit))
            .collect();

        if parts.is_empty() {
            "0s".to_string()
        } else {
            parts.join(" ")
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Edge detector over clock samples.
///
/// The tracker starts with no known state, so the first observation always
/// produces an event announcing which side of the window the clock is on.
#[derive(Debug, Clone)]
pub struct BoundaryTracker {
    window: BoundaryWindow,
    inside: Option<bool>,
}

impl BoundaryTracker {
    pub fn new(window: BoundaryWindow) -> Self {
        Self {
            window,
            inside: None,
        }
    }

    pub fn window(&self) -> &BoundaryWindow {
        &self.window
    }

    /// The last observed state, if any sample was taken.
    pub fn in_boundary(&self) -> Option<bool> {
        self.inside
    }

    /// Record a clock sample, returning the edge it crosses, if any.
    pub fn observe<Tz: TimeZone>(&mut self, at: &DateTime<Tz>) -> Option<BoundaryEvent> {
        self.transition(self.window.contains_at(at))
    }

    /// Record a precomputed inside/outside state.
    pub fn transition(&mut self, inside: bool) -> Option<BoundaryEvent> {
        if self.inside == Some(inside) {
            return None;
        }
        self.inside = Some(inside);
        Some(if inside {
            BoundaryEvent::Entered
        } else {
            BoundaryEvent::Exited
        })
    }

    /// Forget the last state; the next sample emits again.
    pub fn reset(&mut self) {
        self.inside = None;
    }
}

/// A source of the current local time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<FixedOffset> + Send + Sync + 'static,
{
    fn now(&self) -> DateTime<FixedOffset> {
        self()
    }
}

/// Periodic sampler that broadcasts boundary events.
///
/// Listeners should [`subscribe`](Self::subscribe) before calling
/// [`spawn`](Self::spawn) so they also receive the initial announcement.
pub struct BoundaryWatcher {
    window: BoundaryWindow,
    tick: Duration,
    clock: Arc<dyn Clock>,
    sender: broadcast::Sender<BoundaryEvent>,
}

impl BoundaryWatcher {
    pub fn new(config: &BoundaryConfig, clock: impl Clock) -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            window: config.window(),
            tick: config.tick(),
            clock: Arc::new(clock),
            sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoundaryEvent> {
        self.sender.subscribe()
    }

    /// Start sampling on the current tokio runtime.
    pub fn spawn(self) -> WatcherHandle {
        let sender = self.sender.clone();
        let task = tokio::spawn(run(self.window, self.tick, self.clock, self.sender));
        WatcherHandle { sender, task }
    }
}

impl fmt::Debug for BoundaryWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundaryWatcher")
            .field("window", &self.window)
            .field("tick", &self.tick)
            .finish_non_exhaustive()
    }
}

async fn run(
    window: BoundaryWindow,
    tick: Duration,
    clock: Arc<dyn Clock>,
    sender: broadcast::Sender<BoundaryEvent>,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tracker = BoundaryTracker::new(window);

    debug!(window = %window, ?tick, "boundary watcher started");

    loop {
        interval.tick().await;
        let now = clock.now();
        if let Some(event) = tracker.observe(&now) {
            info!(%event, window = %window, at = %now, "boundary transition");
            // No listeners is not an error.
            let _ = sender.send(event);
        }
    }
}

/// A running [`BoundaryWatcher`]. Dropping the handle stops sampling.
#[derive(Debug)]
pub struct WatcherHandle {
    sender: broadcast::Sender<BoundaryEvent>,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<BoundaryEvent> {
        self.sender.subscribe()
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
