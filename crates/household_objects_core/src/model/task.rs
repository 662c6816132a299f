//! Experiment task queued for grasp-planning workers.
//!
//! # Invariants
//! - A task moves `ToRun -> Running -> Completed | Error`.
//! - Only `Running` tasks carry a `worker`; finished tasks keep it for audit.

use super::{require_non_empty, RecordId, ValidationError};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Waiting for a worker.
    ToRun,
    /// Claimed by exactly one worker.
    Running,
    Completed,
    Error,
}

impl TaskStatus {
    /// Storage representation used by the `task.task_status` column.
    pub fn as_db_str(self) -> &'static str {
        match self {
            Self::ToRun => "TO_RUN",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
        }
    }

    pub fn from_db_str(value: &str) -> Option<Self> {
        match value {
            "TO_RUN" => Some(Self::ToRun),
            "RUNNING" => Some(Self::Running),
            "COMPLETED" => Some(Self::Completed),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Queue entry describing one experiment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: RecordId,
    /// Experiment kind, interpreted by workers.
    pub task_type: String,
    pub status: TaskStatus,
    pub outcome_name: Option<String>,
    pub outcome_description: Option<String>,
    /// Identifier of the worker that claimed the task.
    pub worker: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
}

/// Final report a worker files for a claimed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// Must be `Completed` or `Error`.
    pub status: TaskStatus,
    pub name: String,
    pub description: Option<String>,
}

impl TaskOutcome {
    pub fn completed(name: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Completed,
            name: name.into(),
            description: None,
        }
    }

    pub fn failed(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            status: TaskStatus::Error,
            name: name.into(),
            description: Some(description.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("outcome_name", &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::TaskStatus;

    #[test]
    fn status_storage_strings_roundtrip() {
        for status in [
            TaskStatus::ToRun,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Error,
        ] {
            assert_eq!(TaskStatus::from_db_str(status.as_db_str()), Some(status));
        }
        assert_eq!(TaskStatus::from_db_str("to_run"), None);
    }
}
