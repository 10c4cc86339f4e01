use crate::errors::Error;
use crate::tree::Tree;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

static COMMAND_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?P<verb>[A-Za-z]+)(?:\s+(?P<args>.*?))?\s*;?\s*$").unwrap());

const NOT_FOUND: &str = "Couldn't find key in tree.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `insert <key> <value...>`
    Insert { key: String, value: String },
    /// `query <key>`
    Query { key: String },
    /// `delete <key>`
    Delete { key: String },
    /// `print`
    Print,
    /// `load <path>`: one `key:value` pair per line.
    Load { path: PathBuf },
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Insert { key, value } => write!(f, "insert {} {}", key, value),
            Command::Query { key } => write!(f, "query {}", key),
            Command::Delete { key } => write!(f, "delete {}", key),
            Command::Print => write!(f, "print"),
            Command::Load { path } => write!(f, "load {}", path.display()),
        }
    }
}

/// Parses one input line.
///
/// # Errors
/// Returns `Error::InvalidOperation` for an unknown verb or wrong arguments.
pub fn parse(line: &str) -> Result<Command, Error> {
    let caps = COMMAND_REGEX
        .captures(line)
        .ok_or_else(|| err!(InvalidOperation, "Cannot parse command '{}'", line.trim()))?;
    let verb = caps["verb"].to_lowercase();
    let args = caps.name("args").map(|m| m.as_str()).unwrap_or("");

    match verb.as_str() {
        "insert" => match args.split_once(char::is_whitespace) {
            Some((key, value)) if !value.trim().is_empty() => Ok(Command::Insert {
                key: key.to_string(),
                value: value.trim().to_string(),
            }),
            _ => Err(err!(InvalidOperation, "Usage: insert <key> <value>")),
        },
        "query" => Ok(Command::Query {
            key: single_arg(args, "query <key>")?,
        }),
        "delete" => Ok(Command::Delete {
            key: single_arg(args, "delete <key>")?,
        }),
        "print" if args.is_empty() => Ok(Command::Print),
        "print" => Err(err!(InvalidOperation, "Usage: print")),
        "load" if !args.is_empty() => Ok(Command::Load {
            path: PathBuf::from(args),
        }),
        "load" => Err(err!(InvalidOperation, "Usage: load <path>")),
        other => Err(err!(InvalidOperation, "Unknown command '{}'", other)),
    }
}

fn single_arg(args: &str, usage: &str) -> Result<String, Error> {
    let mut parts = args.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(arg), None) => Ok(arg.to_string()),
        _ => Err(err!(InvalidOperation, "Usage: {}", usage)),
    }
}

/// Runs `command` against `tree` and returns the text to show.
pub fn execute(tree: &dyn Tree, command: Command) -> Result<String, Error> {
    debug!(%command, "Executing command...");
    match command {
        Command::Insert { key, value } => {
            tree.insert(&key, &value)?;
            Ok("OK".to_string())
        }
        Command::Query { key } => Ok(found(tree.query(&key)?)),
        Command::Delete { key } => Ok(found(tree.delete(&key)?)),
        Command::Print => tree.print(),
        Command::Load { path } => {
            let count = load(tree, &path)?;
            Ok(format!("Loaded {} entries.", count))
        }
    }
}

fn found(value: Option<String>) -> String {
    match value {
        Some(v) => format!("Value: {}", v),
        None => NOT_FOUND.to_string(),
    }
}

/// Inserts every `key:value` line of the file at `path`, in file order, and
/// returns how many were inserted. The value is everything after the first
/// `:`. Blank lines are skipped.
///
/// The whole file is checked before anything is inserted.
///
/// # Errors
/// Returns `Error::Io` if the file cannot be read and
/// `Error::InvalidOperation` naming the first line without a `:`.
pub fn load(tree: &dyn Tree, path: &Path) -> Result<usize, Error> {
    let content = fs::read_to_string(path)?;
    let mut pairs = Vec::new();
    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some(pair) => pairs.push(pair),
            None => {
                return Err(err!(
                    InvalidOperation,
                    "Line {} of '{}' is not 'key:value'",
                    n + 1,
                    path.display()
                ))
            }
        }
    }

    for (key, value) in &pairs {
        tree.insert(key, value)?;
    }
    info!(path = %path.display(), entries = pairs.len(), "Loaded file.");
    Ok(pairs.len())
}
