//! Locally-owned tasks, as persisted in the document store

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::identity::OwnerKey;


/// The identifier of a task document. It is assigned by the store on creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId {
    content: String,
}

impl TaskId {
    /// Generate a random TaskId
    pub fn random() -> Self {
        Self { content: uuid::Uuid::new_v4().to_string() }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}

impl From<String> for TaskId {
    fn from(content: String) -> Self {
        Self { content }
    }
}
impl From<&str> for TaskId {
    fn from(content: &str) -> Self {
        Self { content: content.to_string() }
    }
}
impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.content)
    }
}


/// The column a task is displayed in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Every status, in board order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// The next status along the `todo → in_progress → done → todo` cycle
    pub fn next(self) -> Self {
        match self {
            TaskStatus::Todo => TaskStatus::InProgress,
            TaskStatus::InProgress => TaskStatus::Done,
            TaskStatus::Done => TaskStatus::Todo,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "todo"),
            TaskStatus::InProgress => write!(f, "in progress"),
            TaskStatus::Done => write!(f, "done"),
        }
    }
}


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Med,
    Low,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Med
    }
}


/// A task owned by the signed-in identity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: String,
    #[serde(default)]
    description: String,
    status: TaskStatus,
    priority: Priority,
    owner_key: OwnerKey,
    created_at: DateTime<Utc>,
    /// A short advisory annotation, that may be attached by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ai_insight: Option<String>,
}

impl Task {
    /// Build the task stored under `id` out of a draft
    pub fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            status: draft.status,
            priority: draft.priority,
            owner_key: draft.owner_key,
            created_at: draft.created_at,
            ai_insight: draft.ai_insight,
        }
    }

    pub fn id(&self) -> &TaskId           { &self.id          }
    pub fn title(&self) -> &str           { &self.title       }
    pub fn description(&self) -> &str     { &self.description }
    pub fn status(&self) -> TaskStatus    { self.status       }
    pub fn priority(&self) -> Priority    { self.priority     }
    pub fn owner_key(&self) -> &OwnerKey  { &self.owner_key   }
    pub fn created_at(&self) -> &DateTime<Utc>  { &self.created_at }
    pub fn ai_insight(&self) -> Option<&str>    { self.ai_insight.as_deref() }

    /// Apply a patch. Only document stores are supposed to call this: the task store never mutates its snapshot.
    pub(crate) fn apply(&mut self, patch: &TaskPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(insight) = &patch.ai_insight {
            self.ai_insight = Some(insight.clone());
        }
    }
}


/// The input of a task creation, as filled in the editor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
}

impl NewTask {
    /// A new task with the editor defaults (`todo`, `med` priority)
    pub fn new<S: ToString, T: ToString>(title: S, description: T) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            status: TaskStatus::default(),
            priority: Priority::default(),
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}


/// A record about to be inserted into the document store (it has no id yet)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub owner_key: OwnerKey,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_insight: Option<String>,
}

impl TaskDraft {
    /// Stamp an editor input with its owner and the current time
    pub fn stamped(input: NewTask, owner_key: OwnerKey) -> Self {
        Self {
            title: input.title.trim().to_string(),
            description: input.description,
            status: input.status,
            priority: input.priority,
            owner_key,
            created_at: Utc::now(),
            ai_insight: None,
        }
    }
}


/// A partial update of a task document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_insight: Option<String>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self { status: Some(status), ..Self::default() }
    }
}
