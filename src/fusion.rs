//! Merge local tasks and external items into the three board columns

use crate::external::ExternalItem;
use crate::item::FusedTask;
use crate::task::{Task, TaskStatus};


/// The board: one column per status
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Board {
    pub todo: Vec<FusedTask>,
    pub in_progress: Vec<FusedTask>,
    pub done: Vec<FusedTask>,
}

impl Board {
    pub fn column(&self, status: TaskStatus) -> &[FusedTask] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Vec<FusedTask> {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Done => &mut self.done,
        }
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every item, column after column
    pub fn iter(&self) -> impl Iterator<Item = &FusedTask> + '_ {
        TaskStatus::ALL.iter().flat_map(move |status| self.column(*status).iter())
    }

    fn push(&mut self, item: FusedTask) {
        let status = item.status();
        self.column_mut(status).push(item);
    }
}

/// Build the board.
///
/// Within a column, local tasks come first in snapshot order, then external items in fetch order.
pub fn fuse(local: &[Task], external: &[ExternalItem]) -> Board {
    let mut board = Board::default();
    for task in local {
        board.push(FusedTask::Local(task.clone()));
    }
    for item in external {
        board.push(FusedTask::External(item.clone()));
    }
    board
}
