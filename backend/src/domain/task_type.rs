//! Daily task types and the selector that picks one per assignment.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Kind of activity a daily task asks the user to photograph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Pet at mealtime.
    Eating,
    /// Pet asleep.
    Sleeping,
    /// Pet at play.
    Playing,
}

impl TaskType {
    /// Every task type, in storage order.
    pub const ALL: [Self; 3] = [Self::Eating, Self::Sleeping, Self::Playing];

    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eating => "eating",
            Self::Sleeping => "sleeping",
            Self::Playing => "playing",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored task type is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task type: {0}")]
pub struct ParseTaskTypeError(String);

impl FromStr for TaskType {
    type Err = ParseTaskTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|task_type| task_type.as_str() == s)
            .ok_or_else(|| ParseTaskTypeError(s.to_owned()))
    }
}

/// Chooses the task type for a new assignment.
///
/// The choice is cosmetic; streak logic never inspects it.
pub trait TaskTypeSelector: Send + Sync {
    /// Pick a task type for one new assignment.
    fn select(&self) -> TaskType;
}

/// Uniform random selection, drawn independently on every call.
///
/// # Examples
/// ```
/// use petcare_backend::domain::{RandomTaskTypeSelector, TaskType, TaskTypeSelector};
///
/// let picked = RandomTaskTypeSelector.select();
/// assert!(TaskType::ALL.contains(&picked));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomTaskTypeSelector;

impl TaskTypeSelector for RandomTaskTypeSelector {
    fn select(&self) -> TaskType {
        let index = rand::thread_rng().gen_range(0..TaskType::ALL.len());
        TaskType::ALL.get(index).copied().unwrap_or(TaskType::Eating)
    }
}

/// Always returns the same task type.
#[derive(Debug, Clone, Copy)]
pub struct FixedTaskTypeSelector(pub TaskType);

impl TaskTypeSelector for FixedTaskTypeSelector {
    fn select(&self) -> TaskType {
        self.0
    }
}
