//! # motionlightctl: offline verifier for motionlight rule documents
//!
//! Loads a YAML rules document, compiles it and answers three questions:
//! - `single <light_group>`: the full truth table of one light group
//! - `unassigned`: every uncovered combination across all light groups
//! - `evaluate <light_group>`: which rule and profile apply right now
//!
//! Exits with a failure status when a verification finds unassigned
//! combinations, so it can gate a configuration change in CI.
//!
//! ## Dependency rule
//! This is the only crate that performs IO. No domain logic belongs here.

mod config;
mod loader;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use motionlight_app::compiler::{self, Config as Compiled};
use motionlight_app::evaluator::Evaluator;
use motionlight_app::report::{SortOrder, unassigned_table};
use motionlight_app::verifier::Verifier;
use motionlight_domain::state::{STATE_SEPARATOR, StateValue, UserStates};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "motionlightctl")]
#[command(version)]
#[command(about = "Verify that motion-light rules cover every room, occupancy and person state")]
struct Cli {
    /// Rules document (YAML).
    config_file: PathBuf,

    /// Tool settings file.
    #[arg(long, env = "MOTIONLIGHT_SETTINGS", default_value = config::DEFAULT_PATH)]
    settings: PathBuf,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the truth table for a single light group.
    Single {
        light_group: String,

        /// Row order, overriding `report.sort`.
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },

    /// Search all light groups for unassigned states.
    Unassigned,

    /// Evaluate a light group against concrete states.
    Evaluate {
        light_group: String,

        #[arg(long)]
        room: String,

        #[arg(long)]
        occupancy: String,

        /// Individual state as `name=state`; repeatable. Comma-separate
        /// several states.
        #[arg(long = "state", value_parser = parse_person_state)]
        states: Vec<(String, StateValue)>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Room,
    Occupancy,
    Enumeration,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Room => Self::Room,
            SortArg::Occupancy => Self::Occupancy,
            SortArg::Enumeration => Self::Enumeration,
        }
    }
}

fn parse_person_state(value: &str) -> Result<(String, StateValue), String> {
    let (name, state) = value
        .split_once('=')
        .ok_or_else(|| format!("expected name=state, found '{value}'"))?;
    if name.is_empty() || state.is_empty() {
        return Err(format!("expected name=state, found '{value}'"));
    }
    let state = if state.contains(STATE_SEPARATOR) {
        StateValue::Set(state.split(STATE_SEPARATOR).map(ToString::to_string).collect())
    } else {
        StateValue::from(state)
    };
    Ok((name.to_string(), state))
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = Config::load(&cli.settings)
        .with_context(|| format!("failed to load settings from {}", cli.settings.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(settings.env_filter()?)
        .with_writer(std::io::stderr)
        .init();
    if cli.no_color {
        colored::control::set_override(false);
    }

    let document = loader::load_document(&cli.config_file)?;
    let compiled = compiler::compile(&document).with_context(|| {
        format!("invalid rules document {}", cli.config_file.display())
    })?;

    match cli.command {
        Command::Single { light_group, sort } => {
            let sort = sort.map_or(settings.report.sort, SortOrder::from);
            single(&compiled, &light_group, sort, &settings.report.unassigned_label)
        }
        Command::Unassigned => unassigned(&compiled),
        Command::Evaluate {
            light_group,
            room,
            occupancy,
            states,
        } => evaluate(&compiled, &light_group, &room, &occupancy, states.into_iter().collect()),
    }
}

fn single(
    compiled: &Compiled,
    light_group: &str,
    sort: SortOrder,
    unassigned_label: &str,
) -> anyhow::Result<ExitCode> {
    let binding = compiled
        .binding(light_group)
        .with_context(|| format!("unknown light group '{light_group}'"))?;
    let mut report = Verifier::new(compiled).verify(binding)?;
    report.sort(sort);

    print!(
        "{}",
        report
            .table(unassigned_label)
            .render(|line| line.red().to_string())
    );
    Ok(exit_status(report.is_complete()))
}

fn unassigned(compiled: &Compiled) -> anyhow::Result<ExitCode> {
    let reports = Verifier::new(compiled).verify_all(compiled.bindings.values())?;
    let table = unassigned_table(&reports);
    if table.is_empty() {
        println!("{}", "every light group covers every combination".green());
        return Ok(ExitCode::SUCCESS);
    }
    print!("{}", table.render(ToString::to_string));
    Ok(exit_status(false))
}

fn evaluate(
    compiled: &Compiled,
    light_group: &str,
    room: &str,
    occupancy: &str,
    people: UserStates,
) -> anyhow::Result<ExitCode> {
    let binding = compiled
        .binding(light_group)
        .with_context(|| format!("unknown light group '{light_group}'"))?;
    let evaluation = Evaluator::new(compiled).evaluate(binding, room, occupancy, &people)?;

    match evaluation.rule {
        Some(rule) => println!("rule: {}", rule.state_name),
        None => println!("rule: {}", "none".red()),
    }
    println!(
        "light_profile: {}",
        evaluation.light_profile.unwrap_or("none")
    );
    Ok(exit_status(evaluation.rule.is_some()))
}

fn exit_status(covered: bool) -> ExitCode {
    if covered {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
