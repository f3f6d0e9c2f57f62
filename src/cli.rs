//! Command parsing for the interactive shell.
//!
//! The shell reads one line at a time and turns it into a [`Command`] that the
//! `ham_remote` binary executes against a connected environment. Dot-commands
//! act on the environment itself; the bare words act on databases and
//! transactions.
//!
//! # Example
//! ```rust
//! use ham_remote::Command;
//!
//! let cmd: Command = "rename 1 2".try_into().unwrap();
//! assert_eq!(cmd, Command::Rename { old: 1, new: 2 });
//! ```
use std::io::{self, BufRead, Write};

use thiserror::Error;

use crate::param::ParamId;

/// Capacity used by `.names` when none is given.
pub const DEFAULT_NAMES_CAPACITY: usize = 32;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("unrecognized command '{0}'")]
    UnrecognizedCommand(String),

    #[error("invalid '{command}' command, {reason}")]
    InvalidCommandArguments { command: String, reason: String },

    #[error("no command provided")]
    Empty,

    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

/// Shell commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `.exit`
    Exit,
    /// `.names [capacity]`
    Names(usize),
    /// `.params <name>...`
    Params(Vec<ParamId>),
    /// `.flush`
    Flush,
    Create(u16),
    Open(u16),
    Close(u16),
    Erase(u16),
    Rename { old: u16, new: u16 },
    Begin(Option<String>),
    Commit,
    Abort,
}

fn invalid(command: &str, reason: &str) -> CommandError {
    CommandError::InvalidCommandArguments {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

fn db_name(command: &str, arg: Option<&str>) -> Result<u16, CommandError> {
    arg.ok_or_else(|| invalid(command, "requires a database name. Example: open 1"))?
        .parse::<u16>()
        .map_err(|_| invalid(command, "database names are integers between 0 and 65535"))
}

impl TryFrom<&str> for Command {
    type Error = CommandError;

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(CommandError::Empty);
        };
        let args: Vec<&str> = parts.collect();

        let command = match head.to_lowercase().as_str() {
            ".exit" => Command::Exit,
            ".flush" => Command::Flush,
            ".names" => match args.first() {
                None => Command::Names(DEFAULT_NAMES_CAPACITY),
                Some(arg) => Command::Names(
                    arg.parse()
                        .map_err(|_| invalid(head, "capacity must be a non-negative integer"))?,
                ),
            },
            ".params" => {
                if args.is_empty() {
                    return Err(invalid(
                        head,
                        "requires parameter names. Example: .params pagesize",
                    ));
                }
                let ids = args
                    .iter()
                    .map(|arg| arg.parse::<ParamId>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| invalid(head, &e.to_string()))?;
                Command::Params(ids)
            }
            "create" => Command::Create(db_name(head, args.first().copied())?),
            "open" => Command::Open(db_name(head, args.first().copied())?),
            "close" => Command::Close(db_name(head, args.first().copied())?),
            "erase" => Command::Erase(db_name(head, args.first().copied())?),
            "rename" => {
                if args.len() != 2 {
                    return Err(invalid(
                        head,
                        "requires two database names. Example: rename 1 2",
                    ));
                }
                Command::Rename {
                    old: db_name(head, Some(args[0]))?,
                    new: db_name(head, Some(args[1]))?,
                }
            }
            "begin" => Command::Begin(args.first().map(|name| name.to_string())),
            "commit" => Command::Commit,
            "abort" => Command::Abort,
            _ => return Err(CommandError::UnrecognizedCommand(head.to_string())),
        };
        Ok(command)
    }
}

/// Prompts for and parses one command.
///
/// Returns `Ok(None)` once the reader is exhausted.
pub fn prompt<R, W>(mut reader: R, mut writer: W) -> Result<Option<Command>, CommandError>
where
    R: BufRead,
    W: Write,
{
    write!(&mut writer, "> ")?;
    writer.flush()?;

    let mut line = String::default();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Command::try_from(line.as_str()).map(Some)
}
