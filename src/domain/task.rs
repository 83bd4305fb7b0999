//! Task selection and the run state machine.

use crate::domain::error::QuantError;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Pipeline stages. Ordering is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Task {
    Acquire,
    Optimize,
    Features,
    Labels,
}

impl Task {
    pub const ALL: [Task; 4] = [Task::Acquire, Task::Optimize, Task::Features, Task::Labels];

    pub fn name(self) -> &'static str {
        match self {
            Task::Acquire => "acquire",
            Task::Optimize => "optimize",
            Task::Features => "features",
            Task::Labels => "labels",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Task {
    type Err = QuantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "acquire" => Ok(Task::Acquire),
            "optimize" => Ok(Task::Optimize),
            "features" => Ok(Task::Features),
            "labels" => Ok(Task::Labels),
            other => Err(QuantError::InvalidTaskSet {
                reason: format!("unknown task '{other}'"),
            }),
        }
    }
}

/// A validated, non-empty set of tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSet {
    tasks: BTreeSet<Task>,
}

impl TaskSet {
    pub fn all() -> Self {
        Self {
            tasks: Task::ALL.into_iter().collect(),
        }
    }

    /// Parse user task tokens. `all` must appear alone; stray `=` characters are ignored.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, QuantError> {
        let cleaned: Vec<String> = tokens
            .iter()
            .map(|t| t.as_ref().replace('=', "").trim().to_ascii_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        if cleaned.is_empty() {
            return Err(QuantError::InvalidTaskSet {
                reason: "no tasks given".into(),
            });
        }

        if cleaned.iter().any(|t| t == "all") {
            if cleaned.len() > 1 {
                return Err(QuantError::InvalidTaskSet {
                    reason: "'all' cannot be combined with other tasks".into(),
                });
            }
            return Ok(Self::all());
        }

        let tasks = cleaned
            .iter()
            .map(|t| t.parse::<Task>())
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { tasks })
    }

    pub fn contains(&self, task: Task) -> bool {
        self.tasks.contains(&task)
    }

    /// Tasks in execution order.
    pub fn iter(&self) -> impl Iterator<Item = Task> + '_ {
        self.tasks.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl fmt::Display for TaskSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Task::name).collect();
        f.write_str(&names.join(","))
    }
}

/// Progress of a run. Advances monotonically as stages complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Created,
    Acquired,
    Searched,
    FeaturesBuilt,
    LabelsBuilt,
}

impl RunState {
    pub fn after(task: Task) -> Self {
        match task {
            Task::Acquire => RunState::Acquired,
            Task::Optimize => RunState::Searched,
            Task::Features => RunState::FeaturesBuilt,
            Task::Labels => RunState::LabelsBuilt,
        }
    }
}
