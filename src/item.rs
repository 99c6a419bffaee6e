//! Board items: either a local task or a read-only external one

use crate::external::ExternalItem;
use crate::task::{Priority, Task, TaskId, TaskStatus};


/// Where a board item comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Owned by the task store: it can be advanced or deleted
    Local,
    /// Owned by the external provider: read-only
    External,
}


#[derive(Clone, Debug, PartialEq)]
pub enum FusedTask {
    Local(Task),
    External(ExternalItem),
}

/// Returns `task.$property_name()` or `item.$field_name`, depending on whether self is local or external
macro_rules! synthetise_common_getter {
    ($property_name:ident, $field_name:ident, $return_type:ty) => {
        pub fn $property_name(&self) -> $return_type {
            match self {
                FusedTask::Local(t) => t.$property_name(),
                FusedTask::External(e) => &e.$field_name,
            }
        }
    }
}

impl FusedTask {
    synthetise_common_getter!(title, title, &str);

    pub fn provenance(&self) -> Provenance {
        match self {
            FusedTask::Local(_) => Provenance::Local,
            FusedTask::External(_) => Provenance::External,
        }
    }

    /// The identifier, unique within its provenance
    pub fn id(&self) -> &str {
        match self {
            FusedTask::Local(t) => t.id().as_str(),
            FusedTask::External(e) => &e.id,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            FusedTask::Local(t) => Some(t.description()).filter(|d| d.is_empty() == false),
            FusedTask::External(e) => e.notes.as_deref(),
        }
    }

    /// The board column of this item
    pub fn status(&self) -> TaskStatus {
        match self {
            FusedTask::Local(t) => t.status(),
            FusedTask::External(e) => e.status.board_status(),
        }
    }

    /// External items carry no priority, they are shown as `med`
    pub fn priority(&self) -> Priority {
        match self {
            FusedTask::Local(t) => t.priority(),
            FusedTask::External(_) => Priority::Med,
        }
    }

    /// Whether the advance/delete controls are enabled for this item
    pub fn is_mutable(&self) -> bool {
        self.provenance() == Provenance::Local
    }

    /// The id to issue task store mutations with. This is `None` for read-only items.
    pub fn local_id(&self) -> Option<&TaskId> {
        match self {
            FusedTask::Local(t) => Some(t.id()),
            FusedTask::External(_) => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, FusedTask::Local(_))
    }

    pub fn is_external(&self) -> bool {
        matches!(self, FusedTask::External(_))
    }
}
