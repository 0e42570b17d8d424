//! Gradebook: a small student-record store with flat-file persistence.
//!
//! Records (id, name, subject, three scores, derived average and letter
//! grade) live in an ordered in-memory [`core::store::RecordStore`] and
//! are persisted to a pipe-delimited text file that is rewritten on every
//! save and fully re-parsed on every load.
//!
//! # Examples
//!
//! ```bash
//! # Interactive menu
//! gradebook
//!
//! # One-shot commands
//! gradebook add "Ada Lovelace" Math 95 88 91
//! gradebook list
//! gradebook edit S1000 --score1 99
//! gradebook convert --to jsonl --out students.jsonl
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: records, store, codecs, persistence, config, journal
//! - [`menu`]: the interactive numbered menu
//! - [`cli`]: clap definitions

pub mod cli;
pub mod core;
pub mod menu;

use clap::Parser;
use crate::cli::{Cli, Command, OutputFormat};
use crate::core::codec::Diagnostic;
use crate::core::config::{self, CONFIG_FILE_NAME, Config};
use crate::core::error::GradebookError;
use crate::core::record::{NewStudent, RecordPatch, StudentRecord};
use crate::core::session::{Session, SessionSettings};
use crate::core::time::command_envelope;
use crate::core::tui::{self, ItemStatus};
use serde_json::json;
use std::io;
use std::path::Path;

/// Merges the config file with command-line overrides.
pub fn resolve_settings(cli: &Cli, cwd: &Path) -> Result<SessionSettings, GradebookError> {
    let config_path = match &cli.config {
        Some(path) => cwd.join(path),
        None => cwd.join(CONFIG_FILE_NAME),
    };
    if cli.config.is_some() && !config_path.exists() {
        return Err(GradebookError::ConfigError(format!(
            "config file {} does not exist",
            config_path.display()
        )));
    }
    let mut cfg: Config = config::load_config(&config_path)?;
    if let Some(file) = &cli.file {
        cfg.data_file = file.clone();
    }
    if let Some(encoding) = cli.encoding {
        cfg.encoding = encoding;
    }
    if cli.recompute {
        cfg.recompute_on_load = true;
    }
    if cli.no_journal {
        cfg.journal = false;
    }
    Ok(SessionSettings::from_config(&cfg, cwd))
}

pub fn run() -> Result<(), GradebookError> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;
    let settings = resolve_settings(&cli, &cwd)?;
    let format = cli.format;
    let force = cli.force;

    let (mut session, diagnostics) = Session::open(settings)?;
    tui::print_diagnostics(&diagnostics);
    let command = cli.command.unwrap_or(Command::Menu);
    run_command(&mut session, command, format, &diagnostics, force)
}

/// Auto-saving rewrites the whole file, so lines the load dropped or cut
/// down would be lost without notice.
fn ensure_lossless_save(
    session: &Session,
    diagnostics: &[Diagnostic],
    force: bool,
) -> Result<(), GradebookError> {
    let lost = diagnostics.iter().filter(|d| d.is_loss()).count();
    if lost == 0 || force {
        return Ok(());
    }
    Err(GradebookError::ValidationError(format!(
        "{} line(s) of {} did not load intact and would be lost on save; fix the file or rerun with --force",
        lost,
        session.data_path().display()
    )))
}

fn emit(format: OutputFormat, cmd: &str, extra: serde_json::Value, text: impl FnOnce()) {
    match format {
        OutputFormat::Json => {
            let envelope = command_envelope(cmd, "ok", extra);
            println!(
                "{}",
                serde_json::to_string_pretty(&envelope).unwrap_or_default()
            );
        }
        OutputFormat::Text => text(),
    }
}

fn print_warnings(warnings: &[String]) {
    for w in warnings {
        tui::print_status_line(w, ItemStatus::Warn);
    }
}

fn run_command(
    session: &mut Session,
    command: Command,
    format: OutputFormat,
    diagnostics: &[Diagnostic],
    force: bool,
) -> Result<(), GradebookError> {
    if matches!(
        command,
        Command::Add { .. } | Command::Edit { .. } | Command::Delete { .. }
    ) {
        ensure_lossless_save(session, diagnostics, force)?;
    }
    match command {
        Command::Menu => {
            tui::render_banner("STUDENT GRADEBOOK");
            let stdin = io::stdin();
            menu::Menu::new(session, stdin.lock(), io::stdout()).run()?;
        }
        Command::Add {
            name,
            subject,
            score1,
            score2,
            score3,
        } => {
            let (record, warnings) =
                session.add(NewStudent::new(name, subject, [score1, score2, score3]))?;
            session.save()?;
            emit(
                format,
                "add",
                json!({
                    "record": record,
                    "warnings": warnings,
                    "diagnostics": diagnostics,
                }),
                || {
                    print_warnings(&warnings);
                    tui::print_status_line(
                        &format!(
                            "Added {} (average {:.2}, grade {})",
                            record.id, record.average, record.grade
                        ),
                        ItemStatus::Created,
                    );
                },
            );
        }
        Command::List => {
            let records = session.store.all();
            emit(
                format,
                "list",
                json!({ "records": records, "diagnostics": diagnostics }),
                || tui::print_records("--- Student Records ---", records),
            );
        }
        Command::Show { id } => {
            let record = session
                .store
                .find_by_id(&id)
                .ok_or_else(|| GradebookError::NotFound(format!("student {}", id)))?;
            emit(format, "show", json!({ "record": record }), || {
                print!("{}", tui::render_record(record))
            });
        }
        Command::Search { query } => {
            let hits: Vec<StudentRecord> = session
                .store
                .find_by_name_substring(&query)
                .into_iter()
                .cloned()
                .collect();
            emit(
                format,
                "search",
                json!({ "query": query, "records": hits }),
                || tui::print_records("--- Matching Students ---", &hits),
            );
        }
        Command::Edit {
            id,
            name,
            subject,
            score1,
            score2,
            score3,
        } => {
            let patch = RecordPatch {
                name,
                subject,
                score1,
                score2,
                score3,
            };
            if patch.is_empty() {
                return Err(GradebookError::ValidationError(
                    "nothing to change: pass at least one of --name, --subject, --score1/2/3"
                        .to_string(),
                ));
            }
            let (record, warnings) = session.edit(&id, patch)?;
            session.save()?;
            emit(
                format,
                "edit",
                json!({
                    "record": record,
                    "warnings": warnings,
                    "diagnostics": diagnostics,
                }),
                || {
                    print_warnings(&warnings);
                    tui::print_status_line(
                        &format!(
                            "Updated {} (average {:.2}, grade {})",
                            record.id, record.average, record.grade
                        ),
                        ItemStatus::Updated,
                    );
                },
            );
        }
        Command::Delete { id } => {
            let removed = session.delete(&id)?;
            session.save()?;
            emit(
                format,
                "delete",
                json!({ "record": removed, "diagnostics": diagnostics }),
                || {
                    tui::print_status_line(&format!("Deleted {}", removed.id), ItemStatus::Removed)
                },
            );
        }
        Command::Stats => {
            let summary = session.store.summary();
            emit(format, "stats", json!({ "summary": summary }), || {
                print!("{}", tui::render_summary(&summary))
            });
        }
        Command::Convert { to, out } => {
            session.save_as(&out, to)?;
            emit(
                format,
                "convert",
                json!({
                    "out": out.display().to_string(),
                    "encoding": to,
                    "records": session.store.len(),
                    "diagnostics": diagnostics,
                }),
                || {
                    tui::print_status_line(
                        &format!(
                            "Wrote {} record(s) to {} as {}",
                            session.store.len(),
                            out.display(),
                            to
                        ),
                        ItemStatus::Saved,
                    )
                },
            );
        }
    }
    Ok(())
}
