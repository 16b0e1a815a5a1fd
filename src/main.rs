use std::path::PathBuf;

use clap::{ArgAction, Parser};
use lbd::{Config, Layout, Reply, Session};
use rustyline::{error::ReadlineError, DefaultEditor};

// Each FILE is evaluated line by line and the value of its last line printed.
// Without FILE, terms are read interactively.
#[derive(Parser, Debug)]
#[command(name = "lbd", version, disable_version_flag = true)]
struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    _version: Option<bool>,

    /// Give up after N beta steps per term
    #[arg(long, value_name = "N")]
    fuel: Option<usize>,

    /// Print one application argument per line
    #[arg(long)]
    indent: bool,

    /// Reject free names that were not declared with `sym` or `def`
    #[arg(long)]
    strict: bool,

    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(fuel) = self.fuel {
            config.fuel = Some(fuel);
        }
        if self.indent {
            config.layout = Layout::Indented;
        }
        if self.strict {
            config.auto_declare = false;
        }
    }
}

fn repl(session: &mut Session) -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new()?;
    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }
        match session.run_line(&line) {
            Ok(Reply::Value(m)) => {
                println!("{m}");
                println!("{}", session.prettify(&m));
            }
            Ok(Reply::Listing(listing)) => print!("{listing}"),
            Ok(Reply::Nothing) => {}
            Ok(Reply::Quit) => return Ok(()),
            Err(e) => eprintln!("{e:#}"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    cli.apply(&mut config);

    let mut session = Session::new(config);
    if cli.files.is_empty() {
        return repl(&mut session);
    }
    for path in &cli.files {
        if let Some(m) = session.load_file(path)? {
            println!("{}", session.prettify(&m));
        }
    }
    Ok(())
}
