/// Terminal output for the command runner.
use crossterm::{
    style::{self, Stylize},
    tty::IsTty,
    QueueableCommand,
};
use std::io::{self, Write};

const NAME: &str = env!("CARGO_PKG_NAME");

/// True when stdin is an interactive terminal.
pub fn is_interactive() -> bool {
    io::stdin().is_tty()
}

pub fn print_prompt(tree: &str) -> io::Result<()> {
    let mut out = io::stdout();
    out.queue(style::PrintStyledContent(format!("{}:{}> ", NAME, tree).bold()))?;
    out.flush()
}

/// Writes `s` to stdout, one line at a time.
pub fn echo_lines(s: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    for l in s.lines() {
        out.queue(style::Print(l))?;
        out.queue(style::Print("\n"))?;
    }
    out.flush()
}

/// Writes `s` to stderr, in red when stderr is a terminal.
pub fn echo_error(s: &str) -> io::Result<()> {
    let mut err = io::stderr();
    if err.is_tty() {
        err.queue(style::PrintStyledContent(s.red()))?;
    } else {
        err.queue(style::Print(s))?;
    }
    err.queue(style::Print("\n"))?;
    err.flush()
}

#[macro_export]
macro_rules! echo {
    ($($arg:tt)*) => {{
        // A closed stdout leaves nothing to report to.
        let _ = $crate::console::echo_lines(&format!($($arg)*));
    }};
}

#[macro_export]
macro_rules! echo_err {
    ($($arg:tt)*) => {{
        let _ = $crate::console::echo_error(&format!($($arg)*));
    }};
}
