//! Daily reminder and hour distributor for logging work against issue-tracker tickets.
//! A small daemon reminds you at the end of the day, the cli splits your hours over the tickets
//! you worked on and logs them.
//!

pub mod cli;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod fs;
pub mod settings;
pub mod tracker;
pub mod utils;
