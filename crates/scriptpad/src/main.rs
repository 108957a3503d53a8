use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scriptpad_config::AppConfig;
use scriptpad_core::{offset_for, HighlightDriver, OutputEvent, ProcessRunner};

mod render;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Scratch script editor engine: highlight, run, and locate diagnostics.
#[derive(Parser, Debug)]
#[command(name = "scriptpad", version, about)]
struct Cli {
    /// Config file to use instead of `scriptpad.json` next to the executable.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a script with syntax colors.
    Highlight { file: PathBuf },

    /// Run a script, streaming its output, then list its diagnostics.
    Run {
        file: PathBuf,

        /// Interpreter to use instead of the configured one.
        #[arg(long)]
        interpreter: Option<String>,
    },

    /// Print the char offset of a 1-based row and column.
    Locate {
        file: PathBuf,
        row: usize,
        column: usize,
    },
}

fn read_script(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn highlight(config: &AppConfig, file: &Path) -> Result<ExitCode> {
    let text = read_script(file)?;
    let spans = HighlightDriver::from_config(config).highlight_all(&text);
    let mut stdout = std::io::stdout().lock();
    if stdout.is_terminal() {
        write!(stdout, "{}", render::highlighted(&text, &spans))?;
    } else {
        write!(stdout, "{text}")?;
    }
    Ok(ExitCode::SUCCESS)
}

fn print_events(events: Vec<OutputEvent>, colored: bool) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    for event in events {
        match event {
            OutputEvent::Append(chunk) if colored => {
                write!(stdout, "{}", render::output_chunk(&chunk))?
            }
            OutputEvent::Append(chunk) => write!(stdout, "{}", chunk.text)?,
            OutputEvent::Clear if colored => write!(stdout, "\x1b[2J\x1b[H")?,
            OutputEvent::Clear => writeln!(stdout, "--- output cleared ---")?,
        }
    }
    stdout.flush()?;
    Ok(())
}

fn run(mut config: AppConfig, file: &Path, interpreter: Option<String>) -> Result<ExitCode> {
    let text = read_script(file)?;
    if let Some(interpreter) = interpreter {
        config.runner.interpreter = interpreter;
    }
    let colored = std::io::stdout().is_terminal();

    let mut runner = ProcessRunner::from_config(&config)?;
    runner.run(&text)?;
    while runner.is_running() {
        print_events(runner.pump_timeout(POLL_INTERVAL), colored)?;
    }
    print_events(runner.pump(), colored)?;

    for record in runner.diagnostics() {
        println!(
            "{}:{}:{} {} at offset {}: {}",
            file.display(),
            record.row,
            record.column,
            record.severity,
            offset_for(record.row, record.column, &text),
            record.message.lines().next().unwrap_or_default()
        );
    }

    Ok(if runner.did_error_happen() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn locate(file: &Path, row: usize, column: usize) -> Result<ExitCode> {
    let text = read_script(file)?;
    println!("{}", offset_for(row, column, &text));
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so they never mix with script output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = cli.config.unwrap_or_else(AppConfig::config_path);
    let config = AppConfig::load_or_create(&config_path);
    tracing::debug!("Using config {}", config_path.display());

    match cli.command {
        Command::Highlight { file } => highlight(&config, &file),
        Command::Run { file, interpreter } => run(config, &file, interpreter),
        Command::Locate { file, row, column } => locate(&file, row, column),
    }
}
