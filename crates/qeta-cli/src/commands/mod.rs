//! Command handlers

pub mod answer;
pub mod attachment;
pub mod config;
pub mod question;
pub mod stats;
pub mod tag;

use anyhow::{anyhow, Error};
use clap::ValueEnum;

/// Vote direction accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    Up,
    Down,
    /// Keep the vote but make it neutral
    Clear,
}

impl Direction {
    pub fn score(self) -> i32 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
            Direction::Clear => 0,
        }
    }
}

/// The store answers missing and foreign rows the same way
fn not_found(kind: &str, id: i64) -> Error {
    anyhow!("{} {} not found (or not yours to change)", kind, id)
}
