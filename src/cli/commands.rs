//! Commands typed at the interactive prompts

use std::str::FromStr;

use crate::errors::ChainpulseError;

/// A line typed at the debugger prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    Next,
    Reset,
    Context,
    Status,
    Help,
    Quit,
}

impl FromStr for DebugCommand {
    type Err = ChainpulseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        match line.trim() {
            "n" | "next" => Ok(DebugCommand::Next),
            "r" | "reset" => Ok(DebugCommand::Reset),
            "c" | "context" => Ok(DebugCommand::Context),
            "s" | "status" => Ok(DebugCommand::Status),
            "h" | "help" | "?" => Ok(DebugCommand::Help),
            "q" | "quit" | "exit" => Ok(DebugCommand::Quit),
            other => Err(ChainpulseError::Argument(format!("Unknown command '{}' (try 'help')", other))),
        }
    }
}

pub const DEBUG_HELP: &str = "\
  n, next     run the next step
  r, reset    clear the context and start over
  c, context  show the accumulated context
  s, status   show the session summary
  q, quit     leave the debugger";

/// A line typed at the picker prompt. Node numbers are the `[n]` shown in
/// the tree; selection numbers are 1-based as listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerCommand {
    Toggle(usize),
    ToggleKey(usize),
    Expand(usize),
    Rename { selection: usize, variable_name: String },
    Remove(usize),
    Preview(String),
    Show,
    Commit,
    Help,
    Quit,
}

fn number(word: Option<&str>, what: &str) -> Result<usize, ChainpulseError> {
    word.and_then(|w| w.parse().ok())
        .ok_or_else(|| ChainpulseError::Argument(format!("Expected a {} number", what)))
}

fn selection_number(word: Option<&str>) -> Result<usize, ChainpulseError> {
    match number(word, "selection")? {
        0 => Err(ChainpulseError::Argument("Selections are numbered from 1".to_string())),
        n => Ok(n - 1),
    }
}

impl FromStr for PickerCommand {
    type Err = ChainpulseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if let Ok(node) = line.parse::<usize>() {
            return Ok(PickerCommand::Toggle(node));
        }

        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        match command {
            "k" | "key" => Ok(PickerCommand::ToggleKey(number(words.next(), "node")?)),
            "e" | "expand" => Ok(PickerCommand::Expand(number(words.next(), "node")?)),
            "name" => {
                let selection = selection_number(words.next())?;
                let variable_name = words.collect::<Vec<_>>().join("_");
                if variable_name.is_empty() {
                    return Err(ChainpulseError::Argument("Expected a variable name".to_string()));
                }
                Ok(PickerCommand::Rename { selection, variable_name })
            }
            "rm" => Ok(PickerCommand::Remove(selection_number(words.next())?)),
            "p" | "preview" => match words.next() {
                Some(path) => Ok(PickerCommand::Preview(path.to_string())),
                None => Err(ChainpulseError::Argument("Expected a path".to_string())),
            },
            "" | "ls" => Ok(PickerCommand::Show),
            "commit" => Ok(PickerCommand::Commit),
            "h" | "help" | "?" => Ok(PickerCommand::Help),
            "q" | "quit" | "exit" => Ok(PickerCommand::Quit),
            other => Err(ChainpulseError::Argument(format!("Unknown command '{}' (try 'help')", other))),
        }
    }
}

pub const PICKER_HELP: &str = "\
  <n>            pick or unpick the value of node n, containers whole
  k <n>          pick or unpick the key of node n
  e <n>          expand or collapse node n
  name <i> <var> rename selection i
  rm <i>         remove selection i
  p <path>       preview the value at a path
  ls             show the tree again
  commit         merge the selections into the extraction rules
  q              quit";
