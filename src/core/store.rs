//! In-memory record store.
//!
//! `RecordStore` owns the ordered collection of student records and the
//! counter that mints new ids. Insertion order is the display order, and
//! ids are unique across the collection at all times.

use crate::core::error::GradebookError;
use crate::core::record::{Grade, NewStudent, RecordPatch, StudentRecord};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

pub const ID_PREFIX: char = 'S';
pub const FIRST_ID: u64 = 1000;

static MINTED_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[Ss]([0-9]+)$").unwrap());

/// Numeric suffix of an `S<digits>` id, if it has that shape and fits in a `u64`.
pub fn id_suffix(id: &str) -> Option<u64> {
    MINTED_ID
        .captures(id)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// Seed for `"S" + counter` ids. Only ever moves forward; `None` once the
/// `u64` suffix space is used up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCounter {
    next: Option<u64>,
}

impl Default for IdCounter {
    fn default() -> Self {
        IdCounter {
            next: Some(FIRST_ID),
        }
    }
}

impl IdCounter {
    pub fn peek(&self) -> Option<String> {
        self.next.map(|n| format!("{}{}", ID_PREFIX, n))
    }

    pub fn mint(&mut self) -> Option<String> {
        let id = self.peek()?;
        self.next = self.next.and_then(|n| n.checked_add(1));
        Some(id)
    }

    pub fn advance_past(&mut self, suffix: u64) {
        self.next = match (self.next, suffix.checked_add(1)) {
            (Some(current), Some(floor)) => Some(current.max(floor)),
            _ => None,
        };
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub count: usize,
    pub class_average: Option<f64>,
    pub grades: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<StudentRecord>,
    counter: IdCounter,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Id the next `add` will most likely receive, `None` when no ids are left.
    pub fn peek_next_id(&self) -> Option<String> {
        self.counter.peek()
    }

    pub fn all(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn add(&mut self, student: NewStudent) -> Result<&StudentRecord, GradebookError> {
        student.validate()?;

        let id = self.mint_unused_id()?;

        let NewStudent {
            name,
            subject,
            scores,
        } = student;
        self.records
            .push(StudentRecord::new(id, name, subject, scores));
        Ok(&self.records[self.records.len() - 1])
    }

    pub fn find_by_id(&self, id: &str) -> Option<&StudentRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Case-insensitive substring match on the name, in collection order.
    pub fn find_by_name_substring(&self, query: &str) -> Vec<&StudentRecord> {
        let needle = query.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn edit(&mut self, id: &str, patch: RecordPatch) -> Result<&StudentRecord, GradebookError> {
        let idx = self
            .position(id)
            .ok_or_else(|| GradebookError::NotFound(format!("student {}", id)))?;
        patch.validate()?;

        let record = &mut self.records[idx];
        let rescore = patch.touches_scores();
        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(subject) = patch.subject {
            record.subject = subject;
        }
        if let Some(s) = patch.score1 {
            record.score1 = s;
        }
        if let Some(s) = patch.score2 {
            record.score2 = s;
        }
        if let Some(s) = patch.score3 {
            record.score3 = s;
        }
        if rescore {
            record.recompute();
        }
        Ok(&self.records[idx])
    }

    pub fn delete(&mut self, id: &str) -> Result<StudentRecord, GradebookError> {
        let idx = self
            .position(id)
            .ok_or_else(|| GradebookError::NotFound(format!("student {}", id)))?;
        Ok(self.records.remove(idx))
    }

    /// Swap in a whole collection as loaded from disk. Derived fields are
    /// taken as given; the id counter is not touched.
    pub fn replace_all(&mut self, records: Vec<StudentRecord>) -> Result<(), GradebookError> {
        let mut seen = HashSet::with_capacity(records.len());
        for r in &records {
            if !seen.insert(r.id.as_str()) {
                return Err(GradebookError::ValidationError(format!(
                    "duplicate student id {}",
                    r.id
                )));
            }
        }
        self.records = records;
        Ok(())
    }

    /// Moves the counter past the largest `S<digits>` suffix in `records`.
    /// Ids of any other shape are ignored.
    pub fn advance_id_counter_past(&mut self, records: &[StudentRecord]) {
        if let Some(max) = records.iter().filter_map(|r| id_suffix(&r.id)).max() {
            self.counter.advance_past(max);
        }
    }

    pub fn summary(&self) -> StoreSummary {
        let mut grades: BTreeMap<String, usize> = Grade::ALL
            .iter()
            .map(|g| (g.to_string(), 0))
            .collect();
        for r in &self.records {
            *grades.entry(r.grade.to_string()).or_insert(0) += 1;
        }
        let class_average = if self.records.is_empty() {
            None
        } else {
            let total: f64 = self.records.iter().map(|r| r.average).sum();
            Some(total / self.records.len() as f64)
        };
        StoreSummary {
            count: self.records.len(),
            class_average,
            grades,
        }
    }

    /// Each collision is with a distinct stored record, so at most `len + 1`
    /// mints are needed.
    fn mint_unused_id(&mut self) -> Result<String, GradebookError> {
        for _ in 0..=self.records.len() {
            let id = self.counter.mint().ok_or_else(|| {
                GradebookError::ValidationError("student id space is exhausted".to_string())
            })?;
            if self.position(&id).is_none() {
                return Ok(id);
            }
        }
        Err(GradebookError::ValidationError(
            "could not find an unused student id".to_string(),
        ))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }
}
