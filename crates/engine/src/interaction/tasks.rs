use std::collections::{BTreeMap, HashSet};

use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: String,
    title: String,
    done: bool,
    requires: Vec<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            done: false,
            requires: Vec::new(),
        }
    }

    pub fn requires<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn prerequisites(&self) -> &[String] {
        &self.requires
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskGraphError {
    #[error("duplicate task id `{id}`")]
    DuplicateId { id: String },
}

/// A prerequisite id that names no task in the graph. The owning task can
/// never be completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedPrerequisite {
    pub task: String,
    pub missing: String,
}

/// Ordered task list with prerequisite gating.
///
/// Insertion order is progression order. `done` only moves false to true.
/// `current` is display state and never gates completion.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    current: usize,
}

impl TaskGraph {
    pub fn new(tasks: Vec<Task>) -> Result<Self, TaskGraphError> {
        let mut seen = HashSet::new();
        for task in &tasks {
            if !seen.insert(task.id.as_str()) {
                return Err(TaskGraphError::DuplicateId {
                    id: task.id.clone(),
                });
            }
        }

        let graph = Self { tasks, current: 0 };
        for unresolved in graph.unresolved_prerequisites() {
            warn!(
                task = %unresolved.task,
                missing = %unresolved.missing,
                "task_prerequisite_unresolved"
            );
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    pub fn is_done(&self, id: &str) -> bool {
        self.get(id).is_some_and(Task::is_done)
    }

    pub fn can_complete(&self, id: &str) -> bool {
        match self.get(id) {
            Some(task) => task.requires.iter().all(|required| self.is_done(required)),
            None => false,
        }
    }

    /// Titles of the prerequisites of `id` that are not done yet.
    pub fn missing_prerequisites(&self, id: &str) -> Vec<String> {
        let Some(task) = self.get(id) else {
            return Vec::new();
        };
        task.requires
            .iter()
            .filter(|required| !self.is_done(required))
            .map(|required| {
                self.get(required)
                    .map(|task| task.title.clone())
                    .unwrap_or_else(|| required.clone())
            })
            .collect()
    }

    pub fn complete(&mut self, id: &str) -> bool {
        let Some(index) = self.index_of(id) else {
            debug!(task = id, "task_unknown");
            return false;
        };
        if self.tasks[index].done {
            return false;
        }
        if !self.can_complete(id) {
            debug!(task = id, "task_prerequisites_incomplete");
            return false;
        }

        self.tasks[index].done = true;
        self.current = (index + 1).min(self.tasks.len().saturating_sub(1));
        let (done, total) = self.progress();
        info!(task = id, done, total, "task_completed");
        true
    }

    pub fn progress(&self) -> (usize, usize) {
        let done = self.tasks.iter().filter(|task| task.done).count();
        (done, self.tasks.len())
    }

    pub fn all_done(&self) -> bool {
        self.tasks.iter().all(Task::is_done)
    }

    pub fn current(&self) -> Option<&Task> {
        self.tasks.get(self.current)
    }

    pub fn next_incomplete(&self) -> Option<&Task> {
        self.tasks.iter().find(|task| !task.done)
    }

    pub fn unresolved_prerequisites(&self) -> Vec<UnresolvedPrerequisite> {
        self.tasks
            .iter()
            .flat_map(|task| {
                task.requires
                    .iter()
                    .filter(|required| self.get(required).is_none())
                    .map(|required| UnresolvedPrerequisite {
                        task: task.id.clone(),
                        missing: required.clone(),
                    })
            })
            .collect()
    }

    /// Replaces titles for known ids and returns how many were applied.
    pub fn apply_title_overrides(&mut self, overrides: &BTreeMap<String, String>) -> usize {
        let mut applied = 0;
        for (id, title) in overrides {
            match self.tasks.iter_mut().find(|task| &task.id == id) {
                Some(task) => {
                    task.title = title.clone();
                    applied += 1;
                }
                None => warn!(task = %id, "task_override_unknown"),
            }
        }
        applied
    }
}
