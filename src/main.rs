use clap::Parser;
use cloudtree::command;
use cloudtree::config::{Backend, Config};
use cloudtree::console;
use cloudtree::errors::Error;
use cloudtree::session::Session;
use cloudtree::storage::ReadyOptions;
use cloudtree::{echo, echo_err};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(
    name = "cloudtree",
    version = VERSION,
    about = "Binary search tree stored node-by-node in a key-value store."
)]
struct Cli {
    /// Name of the tree (one collection per tree).
    #[arg(env = "CLOUDTREE_TREE")]
    tree: String,

    #[arg(long, value_enum, default_value_t = Backend::File, env = "CLOUDTREE_BACKEND")]
    backend: Backend,

    /// Directory for the file backend [default: ~/.cloudtree].
    #[arg(long, env = "CLOUDTREE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Milliseconds between collection readiness checks.
    #[arg(long, default_value_t = 200)]
    ready_poll_ms: u64,

    /// Readiness checks before giving up.
    #[arg(long, default_value_t = 50)]
    ready_max_polls: u32,

    /// Execute a command. May be repeated; stdin is not read when given.
    #[arg(short, long = "command")]
    command: Vec<String>,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::new(&self.tree);
        config.backend = self.backend;
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        config.ready = ReadyOptions {
            poll_interval: Duration::from_millis(self.ready_poll_ms),
            max_polls: self.ready_max_polls,
        };
        config
    }
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            echo_err!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let session = Session::open(&cli.config())?;

    if !cli.command.is_empty() {
        for line in &cli.command {
            run_line(&session, line)?;
        }
        return Ok(());
    }

    let interactive = console::is_interactive();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if interactive {
            console::print_prompt(&cli.tree)?;
        }
        match lines.next() {
            Some(line) => run_line(&session, &line?)?,
            None => return Ok(()),
        }
    }
}

/// Parse errors are reported and skipped; execution errors end the run.
fn run_line(session: &Session, line: &str) -> Result<(), Error> {
    if line.trim().is_empty() {
        return Ok(());
    }
    let command = match command::parse(line) {
        Ok(c) => c,
        Err(e) => {
            echo_err!("{}", e);
            return Ok(());
        }
    };
    let output = command::execute(session.tree.as_ref(), command)?;
    echo!("{}", output);
    Ok(())
}
