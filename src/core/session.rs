//! A loaded store bound to its backing file.
//!
//! `Session` is what the CLI and the interactive menu drive: it owns the
//! `RecordStore`, knows where and how to persist it, and journals each
//! operation.

use crate::core::codec::{DELIMITER, DecodeOptions, Diagnostic, Encoding, FlatFileCodec};
use crate::core::config::Config;
use crate::core::error::GradebookError;
use crate::core::journal::Journal;
use crate::core::persistence;
use crate::core::record::{NewStudent, RecordPatch, StudentRecord};
use crate::core::store::RecordStore;
use serde_json::json;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub data_path: PathBuf,
    pub encoding: Encoding,
    pub decode: DecodeOptions,
    pub reject_delimiter: bool,
    pub journal: bool,
}

impl SessionSettings {
    pub fn from_config(config: &Config, base: &Path) -> Self {
        SessionSettings {
            data_path: config.data_path(base),
            encoding: config.encoding,
            decode: config.decode_options(),
            reject_delimiter: config.reject_delimiter,
            journal: config.journal,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    pub store: RecordStore,
    settings: SessionSettings,
    journal: Journal,
}

impl Session {
    /// Loads the data file (absent is fine) and returns the load diagnostics.
    pub fn open(settings: SessionSettings) -> Result<(Session, Vec<Diagnostic>), GradebookError> {
        let journal = if settings.journal {
            Journal::for_data_file(&settings.data_path)
        } else {
            Journal::disabled()
        };
        let (store, diagnostics) =
            persistence::load_store(&settings.data_path, settings.encoding, settings.decode)?;
        journal.record(
            "load",
            json!({
                "path": settings.data_path.display().to_string(),
                "encoding": settings.encoding,
            }),
            json!({ "records": store.len(), "diagnostics": diagnostics }),
        );
        Ok((
            Session {
                store,
                settings,
                journal,
            },
            diagnostics,
        ))
    }

    pub fn data_path(&self) -> &Path {
        &self.settings.data_path
    }

    /// Free-text fields that would break the flat format, as warnings.
    /// Errors instead when `reject_delimiter` is set.
    pub fn check_free_text(
        &self,
        name: &str,
        subject: &str,
    ) -> Result<Vec<String>, GradebookError> {
        if self.settings.encoding != Encoding::Flat {
            return Ok(vec![]);
        }
        let hits = FlatFileCodec::delimiter_collisions(name, subject);
        if hits.is_empty() {
            return Ok(vec![]);
        }
        if self.settings.reject_delimiter {
            return Err(GradebookError::ValidationError(format!(
                "{} must not contain '{}'",
                hits.join(" and "),
                DELIMITER
            )));
        }
        Ok(hits
            .iter()
            .map(|field| {
                format!(
                    "{} contains '{}' and will not load back cleanly from the flat file",
                    field,
                    DELIMITER
                )
            })
            .collect())
    }

    pub fn add(
        &mut self,
        student: NewStudent,
    ) -> Result<(StudentRecord, Vec<String>), GradebookError> {
        let warnings = self.check_free_text(&student.name, &student.subject)?;
        let request = json!({
            "name": student.name,
            "subject": student.subject,
            "scores": student.scores,
        });
        let record = self.store.add(student)?.clone();
        self.journal.record("add", request, json!(record));
        Ok((record, warnings))
    }

    pub fn edit(
        &mut self,
        id: &str,
        patch: RecordPatch,
    ) -> Result<(StudentRecord, Vec<String>), GradebookError> {
        let warnings = self.check_free_text(
            patch.name.as_deref().unwrap_or(""),
            patch.subject.as_deref().unwrap_or(""),
        )?;
        let request = json!({
            "id": id,
            "name": patch.name,
            "subject": patch.subject,
            "score1": patch.score1,
            "score2": patch.score2,
            "score3": patch.score3,
        });
        let record = self.store.edit(id, patch)?.clone();
        self.journal.record("edit", request, json!(record));
        Ok((record, warnings))
    }

    pub fn delete(&mut self, id: &str) -> Result<StudentRecord, GradebookError> {
        let removed = self.store.delete(id)?;
        self.journal
            .record("delete", json!({ "id": id }), json!(removed));
        Ok(removed)
    }

    pub fn save(&self) -> Result<(), GradebookError> {
        self.save_as(&self.settings.data_path, self.settings.encoding)
    }

    pub fn save_as(&self, path: &Path, encoding: Encoding) -> Result<(), GradebookError> {
        let result = persistence::save_store(&self.store, path, encoding);
        self.journal.record(
            "save",
            json!({ "path": path.display().to_string(), "encoding": encoding }),
            match &result {
                Ok(()) => json!({ "status": "ok", "records": self.store.len() }),
                Err(e) => json!({ "status": "error", "error": e.to_string() }),
            },
        );
        result
    }

    /// Re-reads the data file into the current store.
    pub fn reload(&mut self) -> Result<Vec<Diagnostic>, GradebookError> {
        let diagnostics = persistence::load_into(
            &mut self.store,
            &self.settings.data_path,
            self.settings.encoding,
            self.settings.decode,
        )?;
        self.journal.record(
            "load",
            json!({ "path": self.settings.data_path.display().to_string() }),
            json!({ "records": self.store.len(), "diagnostics": diagnostics }),
        );
        Ok(diagnostics)
    }
}
