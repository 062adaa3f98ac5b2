//! Background process message protocol
//!
//! Closed tagged unions for everything exchanged between foreground
//! observers and the background process. Both serialize to the JSON shape
//! the protocol uses on the wire: commands carry a `"cmd"` tag, events a
//! `"type"` tag, and field names are camelCase.
//!
//! ```text
//! {"cmd":"scheduleNextBackup","delayMs":300000}
//! {"type":"progress","done":3,"total":10,"currentFile":"img/a.jpg"}
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::result::SyncResult;

/// Inbound command sent to the background process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum Command {
    /// Arm (or re-arm) the one-shot backup timer
    #[serde(rename_all = "camelCase")]
    ScheduleNextBackup { delay_ms: u64 },
    /// Disarm the pending backup timer
    StopBackup,
    /// Start periodic file counting; `None` reuses the previous folders
    #[serde(rename_all = "camelCase")]
    StartWatch {
        #[serde(default)]
        dir_handles: Option<Vec<PathBuf>>,
    },
    /// Stop periodic file counting
    StopWatch,
    /// Count files under the given folders once
    #[serde(rename_all = "camelCase")]
    Count {
        #[serde(default)]
        dir_handles: Vec<PathBuf>,
    },
}

/// Payload of a `done` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventResult {
    /// Summary of a synchronization run
    Sync(SyncResult),
    /// Number of files found by a count or watch scan
    Count { count: u64 },
}

/// Outbound event broadcast to every observer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// The backup timer fired; an observer should start a sync
    TriggerBackup,
    /// A run (or a watch) started
    Started,
    /// A run or the pending timer was stopped
    Stopped,
    /// Upload progress inside a batch
    #[serde(rename_all = "camelCase")]
    Progress {
        done: u64,
        total: u64,
        current_file: String,
    },
    /// A run or a count finished
    Done { result: EventResult },
    /// Something went wrong; the background process keeps running
    Error { message: String },
    /// The periodic watch loop was started
    WatchStarted,
    /// The periodic watch loop was stopped
    WatchStopped,
}

impl Event {
    pub fn error(message: impl Into<String>) -> Self {
        Event::Error {
            message: message.into(),
        }
    }

    pub fn sync_done(result: SyncResult) -> Self {
        Event::Done {
            result: EventResult::Sync(result),
        }
    }

    pub fn count_done(count: u64) -> Self {
        Event::Done {
            result: EventResult::Count { count },
        }
    }

    /// Wire name of the event, as found in the `"type"` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Event::TriggerBackup => "triggerBackup",
            Event::Started => "started",
            Event::Stopped => "stopped",
            Event::Progress { .. } => "progress",
            Event::Done { .. } => "done",
            Event::Error { .. } => "error",
            Event::WatchStarted => "watchStarted",
            Event::WatchStopped => "watchStopped",
        }
    }

    pub fn to_json(&self) -> String {
        // Serializing plain enums/structs without maps keyed by non-strings
        // cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| format!(r#"{{"type":"{}"}}"#, self.kind()))
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
