//! Arbor - scripted replay driver
//!
//! Replays a keystroke script into a fresh editor session and prints the
//! resulting buffer together with any open draft diagnostics.

use anyhow::{bail, Context as _, Result};
use arbor_core::{EditAction, EditorConfig, KeyEvent, Module, Position};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Arbor command-line arguments
#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Replay keystroke scripts against the Arbor structure editor")]
#[command(version)]
struct Args {
    /// Script to replay (reads stdin when omitted)
    script: Option<PathBuf>,

    /// Extra script lines run after the script, e.g. -e 'type print('
    #[arg(short = 'e', long = "step")]
    steps: Vec<String>,

    /// Configuration file
    #[arg(short, long, env = "ARBOR_CONFIG")]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

/// One line of a replay script
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Type(String),
    Key(KeyEvent),
    Click(Position),
    Insert(String),
    /// 1-based fix number on the draft at the cursor, or the first draft
    Fix(usize),
}

fn parse_step(line: &str) -> Result<Option<Step>> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let (command, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
    let step = match command {
        // keep trailing spaces, they are keystrokes too
        "type" => Step::Type(rest.to_string()),
        "key" => Step::Key(rest.trim().parse()?),
        "click" => {
            let mut numbers = rest.split_whitespace().map(str::parse::<usize>);
            match (numbers.next(), numbers.next()) {
                (Some(Ok(line)), Some(Ok(column))) => Step::Click(Position::new(line, column)),
                _ => bail!("click needs a line and a column: {:?}", line),
            }
        }
        "insert" => Step::Insert(rest.trim().to_string()),
        "fix" => Step::Fix(
            rest.trim()
                .parse()
                .with_context(|| format!("fix needs a number: {:?}", line))?,
        ),
        other => bail!("unknown script command {:?}", other),
    };
    Ok(Some(step))
}

fn run_step(module: &mut Module, step: &Step) -> Result<()> {
    debug!("Replaying {:?}", step);
    match step {
        Step::Type(text) => {
            module.type_text(text);
        }
        Step::Key(event) => {
            module.press_with(*event);
        }
        Step::Click(position) => {
            module.click(*position);
        }
        Step::Insert(definition) => {
            let outcome = module.execute(EditAction::InsertConstruct {
                definition: definition.clone(),
            });
            if let Some(reason) = outcome.reason {
                warn!("insert {} refused: {}", definition, reason);
            }
        }
        Step::Fix(number) => {
            let index = number
                .checked_sub(1)
                .context("fixes are numbered from 1")?;
            let construct = module
                .session()
                .validator()
                .draft_at(None)
                .or_else(|| module.drafts().first().map(|record| record.construct))
                .context("no draft record to fix")?;
            let outcome = module.execute(EditAction::ApplyDraftFix { construct, fix: index });
            if let Some(reason) = outcome.reason {
                warn!("fix {} refused: {}", number, reason);
            }
        }
    }
    Ok(())
}

fn print_result(module: &Module, json: bool) -> Result<()> {
    if json {
        let drafts: Vec<serde_json::Value> = module
            .drafts()
            .iter()
            .map(|record| {
                serde_json::json!({
                    "construct": record.construct,
                    "message": record.message,
                    "fixes": record.fixes.iter().map(|fix| fix.label.clone()).collect::<Vec<_>>(),
                })
            })
            .collect();
        let context = module.context();
        let report = serde_json::json!({
            "text": module.buffer_text(),
            "cursor": { "line": context.line(), "column": context.column() },
            "drafts": drafts,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", module.buffer_text());
    for record in module.drafts() {
        println!("! {}", record.message);
        for (number, fix) in record.fixes.iter().enumerate() {
            println!("    {}. {}", number + 1, fix.label);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let filter = EnvFilter::new(format!("arbor={0},arbor_core={0}", level.as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = match &args.config {
        Some(path) => EditorConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => EditorConfig::default(),
    };

    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?,
        None if args.steps.is_empty() => {
            let mut input = String::new();
            std::io::stdin().read_to_string(&mut input)?;
            input
        }
        None => String::new(),
    };

    let mut steps = Vec::new();
    for (number, line) in script.lines().chain(args.steps.iter().map(String::as_str)).enumerate() {
        if let Some(step) = parse_step(line).with_context(|| format!("script line {}", number + 1))? {
            steps.push(step);
        }
    }
    info!("Replaying {} script steps", steps.len());

    let mut module = Module::new(config);
    for step in &steps {
        run_step(&mut module, step)?;
    }
    print_result(&module, args.json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::Key;

    #[test]
    fn test_parse_script_lines() {
        assert_eq!(parse_step("# comment").unwrap(), None);
        assert_eq!(parse_step("").unwrap(), None);
        assert_eq!(
            parse_step("type while ").unwrap(),
            Some(Step::Type("while ".to_string()))
        );
        assert_eq!(
            parse_step("key Shift+Tab").unwrap(),
            Some(Step::Key(KeyEvent::shift(Key::Tab)))
        );
        assert_eq!(
            parse_step("click 2 5").unwrap(),
            Some(Step::Click(Position::new(2, 5)))
        );
        assert_eq!(parse_step("fix 1").unwrap(), Some(Step::Fix(1)));
        assert!(parse_step("click 2").is_err());
        assert!(parse_step("jump 3").is_err());
    }

    #[test]
    fn test_replay_applies_fix() {
        let mut module = Module::new(EditorConfig::default());
        for line in ["type total", "key Right", "fix 1"] {
            let step = parse_step(line).unwrap().unwrap();
            run_step(&mut module, &step).unwrap();
        }
        assert_eq!(module.buffer_text(), "total = ___");
        assert!(module.drafts().is_empty());
    }
}
