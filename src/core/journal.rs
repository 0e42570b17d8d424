//! Append-only JSONL journal of store operations.
//!
//! Every add/edit/delete/save/load driven through the CLI or the menu
//! leaves one line here, next to the data file.

use crate::core::error::GradebookError;
use crate::core::time::{new_event_id, now_epoch_z};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEvent {
    pub event_id: String,
    pub ts: String,
    pub op: String,
    pub request: Value,
    pub response: Value,
}

impl JournalEvent {
    pub fn new(op: &str, request: Value, response: Value) -> Self {
        JournalEvent {
            event_id: new_event_id(),
            ts: now_epoch_z(),
            op: op.to_string(),
            request,
            response,
        }
    }
}

/// `students.txt` -> `students.txt.journal.jsonl`
pub fn journal_path(data_path: &Path) -> PathBuf {
    let mut name = data_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".journal.jsonl");
    data_path.with_file_name(name)
}

#[derive(Debug, Clone)]
pub struct Journal {
    path: Option<PathBuf>,
}

impl Journal {
    pub fn for_data_file(data_path: &Path) -> Self {
        Journal {
            path: Some(journal_path(data_path)),
        }
    }

    pub fn disabled() -> Self {
        Journal { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn append(&self, event: &JournalEvent) -> Result<(), GradebookError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(GradebookError::IoError)?;
        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json).map_err(GradebookError::IoError)?;
        Ok(())
    }

    /// Journal writes never fail the operation being journaled.
    pub fn record(&self, op: &str, request: Value, response: Value) {
        let event = JournalEvent::new(op, request, response);
        if let Err(e) = self.append(&event) {
            use colored::Colorize;
            eprintln!("{} journal write failed: {}", "warning:".yellow(), e);
        }
    }

    pub fn last_events(&self, n: usize) -> Result<Vec<JournalEvent>, GradebookError> {
        let Some(path) = &self.path else {
            return Ok(vec![]);
        };
        if !path.exists() {
            return Ok(vec![]);
        }
        let content = std::fs::read_to_string(path).map_err(GradebookError::IoError)?;
        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        lines[start..]
            .iter()
            .map(|l| serde_json::from_str(l).map_err(GradebookError::from))
            .collect()
    }
}
