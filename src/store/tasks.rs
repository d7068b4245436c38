use crate::models::analysis::AnalysisResult;
use crate::models::task::{Task, TaskStatus};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

const INITIAL_MESSAGE: &str = "Initializing analysis...";
const COMPLETED_MESSAGE: &str = "Analysis complete!";
const FAILED_MESSAGE: &str = "Analysis failed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("Task not found")]
    NotFound(String),

    #[error("Task {id} already finished ({status:?})")]
    Finished { id: String, status: TaskStatus },
}

/// Task table driving the `starting -> analyzing -> completed | failed` machine.
///
/// A passive store: progress ordering is up to the caller, and terminal
/// tasks reject every further transition.
pub trait TaskTracker: Send + Sync {
    fn create(&self) -> String;

    /// A fresh task that is already complete, for cache hits.
    fn create_completed(&self, result: AnalysisResult, message: &str) -> String;

    fn advance(&self, id: &str, progress: u8, message: &str) -> Result<(), TaskError>;

    fn complete(&self, id: &str, result: AnalysisResult) -> Result<(), TaskError>;

    fn fail(&self, id: &str, error: &str) -> Result<(), TaskError>;

    fn get(&self, id: &str) -> Result<Task, TaskError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTaskTracker {
    tasks: Mutex<HashMap<String, Task>>,
}

impl InMemoryTaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Task>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert(&self, task: Task) -> String {
        let id = task.id.clone();
        self.lock().insert(id.clone(), task);
        id
    }

    /// Applies `update` to a live task; terminal and unknown tasks are left untouched.
    fn transition<F>(&self, id: &str, update: F) -> Result<(), TaskError>
    where
        F: FnOnce(&mut Task),
    {
        let mut tasks = self.lock();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        if task.status.is_terminal() {
            return Err(TaskError::Finished {
                id: id.to_string(),
                status: task.status,
            });
        }
        update(task);
        Ok(())
    }
}

impl TaskTracker for InMemoryTaskTracker {
    fn create(&self) -> String {
        self.insert(Task {
            id: Uuid::new_v4().to_string(),
            status: TaskStatus::Starting,
            progress: 0,
            message: INITIAL_MESSAGE.to_string(),
            result: None,
            error: None,
        })
    }

    fn create_completed(&self, result: AnalysisResult, message: &str) -> String {
        self.insert(Task {
            id: Uuid::new_v4().to_string(),
            status: TaskStatus::Completed,
            progress: 100,
            message: message.to_string(),
            result: Some(result),
            error: None,
        })
    }

    fn advance(&self, id: &str, progress: u8, message: &str) -> Result<(), TaskError> {
        self.transition(id, |task| {
            task.status = TaskStatus::Analyzing;
            task.progress = progress.min(100);
            task.message = message.to_string();
        })
    }

    fn complete(&self, id: &str, result: AnalysisResult) -> Result<(), TaskError> {
        self.transition(id, |task| {
            task.status = TaskStatus::Completed;
            task.progress = 100;
            task.message = COMPLETED_MESSAGE.to_string();
            task.result = Some(result);
        })
    }

    fn fail(&self, id: &str, error: &str) -> Result<(), TaskError> {
        self.transition(id, |task| {
            task.status = TaskStatus::Failed;
            task.progress = 0;
            task.message = FAILED_MESSAGE.to_string();
            task.error = Some(error.to_string());
        })
    }

    fn get(&self, id: &str) -> Result<Task, TaskError> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    fn len(&self) -> usize {
        self.lock().len()
    }
}
