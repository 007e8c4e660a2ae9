//! Boundary watcher delivery under paused tokio time.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use recsync::{BoundaryConfig, BoundaryEvent, BoundaryWatcher};
use tokio::sync::broadcast::error::TryRecvError;

/// A settable clock shared between the test and the watcher.
#[derive(Clone)]
struct ManualClock(Arc<Mutex<DateTime<FixedOffset>>>);

impl ManualClock {
    fn at(h: u32, m: u32, s: u32) -> Self {
        Self(Arc::new(Mutex::new(time(h, m, s))))
    }

    fn set(&self, h: u32, m: u32, s: u32) {
        *self.0.lock().unwrap() = time(h, m, s);
    }

    fn advance(&self, secs: i64) {
        let mut now = self.0.lock().unwrap();
        *now += TimeDelta::seconds(secs);
    }

    fn reader(&self) -> impl Fn() -> DateTime<FixedOffset> + Send + Sync + 'static {
        let inner = Arc::clone(&self.0);
        move || *inner.lock().unwrap()
    }
}

fn time(h: u32, m: u32, s: u32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(0).unwrap();
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
        .and_local_timezone(offset)
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_watcher_announces_then_emits_each_edge_once() {
    let clock = ManualClock::at(23, 59, 58);
    let watcher = BoundaryWatcher::new(&BoundaryConfig::default(), clock.reader());
    let mut events = watcher.subscribe();
    let _handle = watcher.spawn();

    // First sample announces the current side.
    assert_eq!(events.recv().await.unwrap(), BoundaryEvent::Exited);

    clock.set(0, 0, 0);
    assert_eq!(events.recv().await.unwrap(), BoundaryEvent::Entered);

    // Many samples inside the window produce nothing.
    for _ in 0..30 {
        clock.advance(60);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

    clock.set(1, 0, 0);
    assert_eq!(events.recv().await.unwrap(), BoundaryEvent::Exited);

    for _ in 0..10 {
        clock.advance(1);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test(start_paused = true)]
async fn test_stopped_watcher_closes_channel() {
    let clock = ManualClock::at(12, 0, 0);
    let watcher = BoundaryWatcher::new(&BoundaryConfig::default(), clock.reader());
    let mut events = watcher.subscribe();
    let handle = watcher.spawn();

    assert_eq!(events.recv().await.unwrap(), BoundaryEvent::Exited);

    handle.stop();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(matches!(events.try_recv(), Err(TryRecvError::Closed)));
}
