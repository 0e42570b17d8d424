//! Student record shape and the score/grade rules every record obeys.

use crate::core::error::GradebookError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Letter grade derived from an average score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::F];

    /// First matching threshold wins; a boundary value belongs to the higher grade.
    pub fn from_average(avg: f64) -> Grade {
        if avg >= 90.0 {
            Grade::A
        } else if avg >= 80.0 {
            Grade::B
        } else if avg >= 70.0 {
            Grade::C
        } else if avg >= 60.0 {
            Grade::D
        } else {
            Grade::F
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Grade::A => 'A',
            Grade::B => 'B',
            Grade::C => 'C',
            Grade::D => 'D',
            Grade::F => 'F',
        }
    }

    pub fn from_char(c: char) -> Option<Grade> {
        match c.to_ascii_uppercase() {
            'A' => Some(Grade::A),
            'B' => Some(Grade::B),
            'C' => Some(Grade::C),
            'D' => Some(Grade::D),
            'F' => Some(Grade::F),
            _ => None,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

pub fn average_of(score1: f64, score2: f64, score3: f64) -> f64 {
    (score1 + score2 + score3) / 3.0
}

/// Rejects NaN and anything outside `[0, 100]`.
pub fn validate_score(label: &str, score: f64) -> Result<f64, GradebookError> {
    if score.is_nan() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(GradebookError::ValidationError(format!(
            "{} must be between {} and {}, got {}",
            label, MIN_SCORE, MAX_SCORE, score
        )));
    }
    Ok(score)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub subject: String,
    pub score1: f64,
    pub score2: f64,
    pub score3: f64,
    pub average: f64,
    pub grade: Grade,
}

impl StudentRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        subject: impl Into<String>,
        scores: [f64; 3],
    ) -> Self {
        let mut record = StudentRecord {
            id: id.into(),
            name: name.into(),
            subject: subject.into(),
            score1: scores[0],
            score2: scores[1],
            score3: scores[2],
            average: 0.0,
            grade: Grade::F,
        };
        record.recompute();
        record
    }

    pub fn scores(&self) -> [f64; 3] {
        [self.score1, self.score2, self.score3]
    }

    /// Re-derive `average` and `grade` from the three scores.
    pub fn recompute(&mut self) {
        self.average = average_of(self.score1, self.score2, self.score3);
        self.grade = Grade::from_average(self.average);
    }

    /// True when the stored `average`/`grade` disagree with the scores.
    /// Averages are compared with a small tolerance since persisted text may be rounded.
    pub fn derived_is_stale(&self) -> bool {
        let expected = average_of(self.score1, self.score2, self.score3);
        (self.average - expected).abs() > 1e-6 || self.grade != Grade::from_average(self.average)
    }
}

/// Input for `RecordStore::add`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub name: String,
    pub subject: String,
    pub scores: [f64; 3],
}

impl NewStudent {
    pub fn new(name: impl Into<String>, subject: impl Into<String>, scores: [f64; 3]) -> Self {
        NewStudent {
            name: name.into(),
            subject: subject.into(),
            scores,
        }
    }

    pub fn validate(&self) -> Result<(), GradebookError> {
        for (i, score) in self.scores.iter().enumerate() {
            validate_score(&format!("score{}", i + 1), *score)?;
        }
        Ok(())
    }
}

/// Fields to change in `RecordStore::edit`; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub score1: Option<f64>,
    pub score2: Option<f64>,
    pub score3: Option<f64>,
}

impl RecordPatch {
    pub fn touches_scores(&self) -> bool {
        self.score1.is_some() || self.score2.is_some() || self.score3.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.subject.is_none() && !self.touches_scores()
    }

    pub fn validate(&self) -> Result<(), GradebookError> {
        for (label, score) in [
            ("score1", self.score1),
            ("score2", self.score2),
            ("score3", self.score3),
        ] {
            if let Some(s) = score {
                validate_score(label, s)?;
            }
        }
        Ok(())
    }
}
