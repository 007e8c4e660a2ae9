//! Configuration for the sync layer.

use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use recsync_core::Priority;

use crate::boundary::BoundaryWindow;

/// Defaults applied by [`RecordClient`](crate::RecordClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Page-size hint sent with every query page. `None` leaves the choice
    /// to the store.
    pub page_size: Option<u32>,

    /// Priority of batches built by `save` and `save_batch`.
    pub save_priority: Priority,

    /// Priority of batches built by `delete_by_id` and `delete_batch`.
    pub delete_priority: Priority,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            page_size: None,
            save_priority: Priority::High,
            delete_priority: Priority::Normal,
        }
    }
}

/// Configuration of a boundary watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoundaryConfig {
    /// Start of the window, inclusive, local wall clock.
    pub start: NaiveTime,

    /// End of the window, exclusive. An end before the start wraps past
    /// midnight; an end equal to the start gives an empty window.
    pub end: NaiveTime,

    /// Sampling period in milliseconds.
    pub tick_ms: u64,
}

impl BoundaryConfig {
    pub fn window(&self) -> BoundaryWindow {
        BoundaryWindow::new(self.start, self.end)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        let window = BoundaryWindow::default();
        Self {
            start: window.start(),
            end: window.end(),
            tick_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.save_priority, Priority::High);
        assert_eq!(config.delete_priority, Priority::Normal);
        assert!(config.page_size.is_none());
    }

    #[test]
    fn boundary_defaults_to_midnight_hour() {
        let config = BoundaryConfig::default();
        assert_eq!(config.start, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        assert_eq!(config.end, NaiveTime::from_hms_opt(1, 0, 0).unwrap());
        assert_eq!(config.tick(), Duration::from_secs(1));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: BoundaryConfig =
            serde_json::from_value(serde_json::json!({ "start": "22:30:00", "end": "06:00:00" }))
                .unwrap();
        assert_eq!(config.tick_ms, 1000);
        assert!(config.window().wraps());

        let client: ClientConfig =
            serde_json::from_value(serde_json::json!({ "pageSize": 50 })).unwrap();
        assert_eq!(client.page_size, Some(50));
        assert_eq!(client.save_priority, Priority::High);
    }
}
