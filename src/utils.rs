///! Some utility functions

use crate::fusion::Board;
use crate::integration::IntegrationData;
use crate::item::FusedTask;
use crate::task::TaskStatus;

/// A debug utility that pretty-prints a board
pub fn print_board(board: &Board) {
    for status in TaskStatus::ALL.iter() {
        let column = board.column(*status);
        println!("{} ({})", status.to_string().to_uppercase(), column.len());
        for item in column {
            print_task(item);
        }
    }
}

pub fn print_task(item: &FusedTask) {
    let provenance = if item.is_local() { " " } else { "G" };
    let lock = if item.is_mutable() { " " } else { "🔒" };
    println!("    {}{} {}\t{}", provenance, lock, item.title(), item.id());
}

/// A debug utility that pretty-prints what the integration fetched
pub fn print_integration(data: &IntegrationData) {
    println!("EVENTS ({})", data.events.len());
    for event in &data.events {
        let day = if event.is_all_day() { "all day" } else { "" };
        println!("    {}\t{}", event.summary, day);
    }
    println!("MAIL ({})", data.mail.len());
    for thread in &data.mail {
        println!("    {}\t{}", thread.from, thread.subject);
    }
}
