//! dupsweep - duplicate file finder
//!
//! Lists every file under a directory grouped by size, finds files with
//! identical content among same-size files by BLAKE3 hashing, numbers the
//! duplicates and deletes the numbers the user picks.
//!
//! The core is the [`pipeline`]: [`scanner`] → [`duplicates`] →
//! [`actions`]. [`run_app`] is the command-line front end on top of it.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod scanner;
pub mod signal;

use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::actions::DeleteConfig;
use crate::cli::{Cli, OutputFormat};
use crate::config::{ConfigError, Configuration, Settings};
use crate::duplicates::{ResolvedTarget, SelectionError, SelectionPolicy, SortOrder};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::pipeline::{PipelineOptions, RunReport, Stage};
use crate::progress::Progress;
use crate::prompt::Prompter;
use crate::signal::ShutdownHandler;

/// Run the application for parsed arguments.
///
/// # Errors
///
/// Returns an error for fatal problems: no root given, an unreadable root,
/// a rejected `--delete` selection, malformed settings or closed stdin while
/// prompting. Per-file failures are reported through the exit code instead.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let root = cli
        .path
        .clone()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or(ConfigError::MissingRoot)?;

    let settings = Settings::load().context("Failed to load settings")?;
    let shutdown = signal::install_handler()?;
    let options = pipeline_options(&cli, &settings, &shutdown);

    if cli.is_interactive() {
        let mut prompter = Prompter::stdio();
        run_interactive(&cli, &settings, root, &options, &mut prompter)
    } else {
        run_batch(&cli, &settings, root, &options)
    }
}

/// Merge CLI flags over settings into stage options.
fn pipeline_options(cli: &Cli, settings: &Settings, shutdown: &ShutdownHandler) -> PipelineOptions {
    let delete = if cli.trash || settings.trash {
        DeleteConfig::trash()
    } else {
        DeleteConfig::default()
    };
    let hide_progress = cli.quiet || cli.output == OutputFormat::Json;

    PipelineOptions {
        io_threads: cli.io_threads.unwrap_or(settings.io_threads),
        skip_hidden: cli.skip_hidden || settings.skip_hidden,
        delete,
        selection: SelectionPolicy {
            keep_one: cli.keep_one || settings.keep_one,
        },
        shutdown_flag: Some(shutdown.get_flag()),
        progress: Some(Arc::new(Progress::new(hide_progress))),
    }
}

fn text_output(cli: &Cli) -> TextOutput {
    TextOutput::new(!cli.no_color && io::stdout().is_terminal())
}

/// Everything comes from flags and settings; nothing is asked.
fn run_batch(
    cli: &Cli,
    settings: &Settings,
    root: PathBuf,
    options: &PipelineOptions,
) -> anyhow::Result<ExitCode> {
    let config = Configuration::builder()
        .root(Some(root))
        .extension_filter(cli.extension.clone())
        .sort_order(cli.sort.or(settings.sort_order).unwrap_or_default())
        .check_duplicates(cli.wants_duplicates())
        .delete_confirmed(cli.delete.is_some())
        .selected_numbers(cli.delete.clone().unwrap_or_default())
        .build()?;
    log::debug!("Batch run with {:?}", config);

    let report = pipeline::run(&config, options).context("Duplicate search failed")?;
    let exit_code = report.exit_code();

    let mut stdout = io::stdout().lock();
    match cli.output {
        OutputFormat::Json => {
            JsonOutput::new(config.root(), &report, exit_code).write_to(&mut stdout)?;
        }
        OutputFormat::Text => {
            let text = text_output(cli);
            text.write_size_listing(&mut stdout, &report.partition)?;
            if let Some(duplicates) = report.duplicate_report() {
                text.write_duplicates(&mut stdout, duplicates)?;
                if !cli.quiet {
                    text.write_duplicate_summary(&mut stdout, duplicates)?;
                }
            }
            if let Some(deletion) = &report.deletion {
                text.write_deletion(&mut stdout, deletion)?;
            }
            stdout.flush()?;
            text.write_skipped(&mut io::stderr(), skipped_files(&report))?;
        }
    }

    Ok(exit_code)
}

/// Ask for whatever the flags left open, stage by stage.
fn run_interactive<R: BufRead, W: Write>(
    cli: &Cli,
    settings: &Settings,
    root: PathBuf,
    options: &PipelineOptions,
    prompter: &mut Prompter<R, W>,
) -> anyhow::Result<ExitCode> {
    let extension = match &cli.extension {
        Some(ext) => Some(ext.clone()),
        None => prompter.read_extension()?,
    };
    let sort_order: SortOrder = match cli.sort.or(settings.sort_order) {
        Some(order) => order,
        None => prompter.read_sort_order()?,
    };

    let config = Configuration::builder()
        .root(Some(root))
        .extension_filter(extension)
        .sort_order(sort_order)
        .check_duplicates(cli.wants_duplicates())
        .delete_confirmed(cli.delete.is_some())
        .selected_numbers(cli.delete.clone().unwrap_or_default())
        .build()?;
    log::debug!("Interactive run with {:?}", config);

    let text = text_output(cli);
    let mut stdout = io::stdout();

    let outcome = pipeline::scan(&config, options).context("Duplicate search failed")?;
    let mut report = RunReport::bucketed(outcome, config.sort_order());
    text.write_size_listing(&mut stdout, &report.partition)?;
    stdout.flush()?;

    if report.interrupted {
        return finish(&text, &report);
    }
    if !config.check_duplicates() && !prompter.read_check_duplicates()? {
        return finish(&text, &report);
    }

    report.record_index(pipeline::index(&report.partition, options));

    let targets = {
        let Some(index) = report.index.as_ref() else {
            return finish(&text, &report);
        };
        text.write_duplicates(&mut stdout, index.report())?;
        if !cli.quiet {
            text.write_duplicate_summary(&mut stdout, index.report())?;
        }
        stdout.flush()?;

        if report.interrupted || index.report().is_empty() {
            return finish(&text, &report);
        }

        if config.delete_confirmed() {
            pipeline::resolve(index, config.selected_numbers(), options)?
        } else if prompter.read_delete_confirmation()? {
            ask_for_targets(prompter, index, options)?
        } else {
            return finish(&text, &report);
        }
    };
    report.stage = Stage::Resolved;

    let deletion = pipeline::delete(&targets, options);
    text.write_deletion(&mut stdout, &deletion)?;
    stdout.flush()?;
    report.record_deletion(deletion);

    finish(&text, &report)
}

/// Re-ask until a selection resolves; only the keep-one guard can still
/// reject numbers the prompter already checked.
fn ask_for_targets<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    index: &duplicates::DuplicateIndex,
    options: &PipelineOptions,
) -> anyhow::Result<Vec<ResolvedTarget>> {
    loop {
        let numbers = prompter.read_selection(index)?;
        match pipeline::resolve(index, &numbers, options) {
            Ok(targets) => return Ok(targets),
            Err(err @ SelectionError::AllCopiesSelected { .. }) => {
                eprintln!("{err}");
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn finish(text: &TextOutput, report: &RunReport) -> anyhow::Result<ExitCode> {
    text.write_skipped(&mut io::stderr(), skipped_files(report))?;
    log::info!("Run finished at stage {:?}", report.stage);
    Ok(report.exit_code())
}

fn skipped_files(report: &RunReport) -> usize {
    report.scan_errors.len() + report.index.as_ref().map_or(0, |i| i.errors().len())
}
