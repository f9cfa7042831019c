//! CLI argument parsing and interactive prompt commands

pub mod args;
pub mod commands;

pub use args::{Args, Command, DebugArgs, LogFormat, PickArgs, TestStepArgs};
pub use commands::{DebugCommand, PickerCommand};
