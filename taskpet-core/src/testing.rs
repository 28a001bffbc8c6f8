//! Testing utilities.
//!
//! `MockTaskSource` returns scripted snapshots so service behavior can be
//! tested deterministically, without a live task tracker.

use crate::tasks::{CompletedTask, SourceError, TaskSource};
use async_trait::async_trait;
use std::sync::Mutex;

/// One scripted response from a mock task source.
#[derive(Debug, Clone)]
pub enum MockSnapshot {
    /// The source reports these completed tasks.
    Tasks(Vec<CompletedTask>),

    /// The source is unreachable.
    Unavailable(String),
}

/// A task source that replays scripted snapshots in order.
///
/// Once the script is exhausted, the last snapshot repeats (an empty
/// script reports no completed tasks).
pub struct MockTaskSource {
    script: Mutex<Script>,
}

struct Script {
    snapshots: Vec<MockSnapshot>,
    index: usize,
}

impl MockTaskSource {
    pub fn new(snapshots: Vec<MockSnapshot>) -> Self {
        Self {
            script: Mutex::new(Script {
                snapshots,
                index: 0,
            }),
        }
    }

    /// A source that always reports the same completed tasks.
    pub fn fixed(tasks: Vec<CompletedTask>) -> Self {
        Self::new(vec![MockSnapshot::Tasks(tasks)])
    }

    /// A source that always fails.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(vec![MockSnapshot::Unavailable(message.into())])
    }
}

#[async_trait]
impl TaskSource for MockTaskSource {
    async fn list_completed(&self) -> Result<Vec<CompletedTask>, SourceError> {
        let mut script = self.script.lock().unwrap();
        let snapshot = if script.index < script.snapshots.len() {
            let snapshot = script.snapshots[script.index].clone();
            script.index += 1;
            snapshot
        } else {
            script
                .snapshots
                .last()
                .cloned()
                .unwrap_or(MockSnapshot::Tasks(Vec::new()))
        };

        match snapshot {
            MockSnapshot::Tasks(tasks) => Ok(tasks),
            MockSnapshot::Unavailable(message) => Err(SourceError::Unavailable(message)),
        }
    }
}

/// Build a completed task with a fixed timestamp.
pub fn completed_task(id: &str) -> CompletedTask {
    CompletedTask {
        id: id.to_string(),
        completed_at: "2024-05-01T12:00:00.000Z".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_replays_then_repeats_last() {
        let source = MockTaskSource::new(vec![
            MockSnapshot::Tasks(vec![completed_task("t1")]),
            MockSnapshot::Tasks(vec![completed_task("t1"), completed_task("t2")]),
        ]);

        assert_eq!(source.list_completed().await.unwrap().len(), 1);
        assert_eq!(source.list_completed().await.unwrap().len(), 2);
        // Exhausted: last snapshot repeats
        assert_eq!(source.list_completed().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let source = MockTaskSource::unavailable("connection refused");
        let err = source.list_completed().await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
