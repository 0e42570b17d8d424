//! Text encodings for the record store.
//!
//! `FlatFileCodec` reads and writes the pipe-delimited line format
//! (`id|name|subject|score1|score2|score3|average|grade`) and accepts the
//! older comma-delimited variant on read. `JsonLinesCodec` writes one JSON
//! object per line and survives any free text. Both are tolerant on read:
//! a bad line becomes a `Diagnostic` and decoding continues.

use crate::core::error::GradebookError;
use crate::core::record::{Grade, StudentRecord};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const DELIMITER: char = '|';
pub const LEGACY_DELIMITER: char = ',';
pub const FIELD_COUNT: usize = 8;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Flat,
    #[value(name = "jsonl")]
    #[serde(rename = "jsonl")]
    JsonLines,
}

impl Encoding {
    pub fn serialize(self, records: &[StudentRecord]) -> Result<String, GradebookError> {
        match self {
            Encoding::Flat => Ok(FlatFileCodec::serialize(records)),
            Encoding::JsonLines => JsonLinesCodec::serialize(records),
        }
    }

    pub fn deserialize(self, text: &str, opts: DecodeOptions) -> Decoded {
        match self {
            Encoding::Flat => FlatFileCodec::deserialize(text, opts),
            Encoding::JsonLines => JsonLinesCodec::deserialize(text, opts),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Flat => write!(f, "flat"),
            Encoding::JsonLines => write!(f, "jsonl"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Recompute `average`/`grade` from the scores instead of trusting the file.
    pub recompute: bool,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        DecodeOptions { recompute: true }
    }
}

/// Non-fatal findings from a load. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    StartingFresh { path: String },
    Malformed { line: usize, reason: String },
    Recovered { line: usize, discarded: Vec<String> },
    DerivedDrift { line: usize, id: String },
    Recomputed { line: usize, id: String },
    DuplicateId { line: usize, id: String },
}

impl Diagnostic {
    /// Diagnostics that mean a line's content did not make it into the store intact.
    pub fn is_loss(&self) -> bool {
        matches!(
            self,
            Diagnostic::Malformed { .. }
                | Diagnostic::Recovered { .. }
                | Diagnostic::DuplicateId { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::StartingFresh { path } => {
                write!(f, "no previous data at {}, starting fresh", path)
            }
            Diagnostic::Malformed { line, reason } => {
                write!(f, "line {}: skipped malformed line ({})", line, reason)
            }
            Diagnostic::Recovered { line, discarded } => write!(
                f,
                "line {}: recovered from extra delimiters, discarded {:?}",
                line, discarded
            ),
            Diagnostic::DerivedDrift { line, id } => write!(
                f,
                "line {}: {} has average/grade that do not match its scores",
                line, id
            ),
            Diagnostic::Recomputed { line, id } => {
                write!(f, "line {}: {} average/grade recomputed from scores", line, id)
            }
            Diagnostic::DuplicateId { line, id } => {
                write!(f, "line {}: duplicate id {} skipped", line, id)
            }
        }
    }
}

impl From<GradebookError> for Diagnostic {
    fn from(err: GradebookError) -> Self {
        match err {
            GradebookError::MalformedLine { line, reason } => Diagnostic::Malformed { line, reason },
            other => Diagnostic::Malformed {
                line: 0,
                reason: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub records: Vec<StudentRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Decoded {
    /// Post-processing shared by every encoding: duplicate ids and derived-field drift.
    fn accept(
        &mut self,
        line: usize,
        mut record: StudentRecord,
        opts: DecodeOptions,
        seen: &mut HashSet<String>,
    ) {
        if !seen.insert(record.id.clone()) {
            self.diagnostics.push(Diagnostic::DuplicateId {
                line,
                id: record.id,
            });
            return;
        }
        if record.derived_is_stale() {
            if opts.recompute {
                record.recompute();
                self.diagnostics.push(Diagnostic::Recomputed {
                    line,
                    id: record.id.clone(),
                });
            } else {
                self.diagnostics.push(Diagnostic::DerivedDrift {
                    line,
                    id: record.id.clone(),
                });
            }
        }
        self.records.push(record);
    }
}

pub struct FlatFileCodec;

impl FlatFileCodec {
    pub fn serialize(records: &[StudentRecord]) -> String {
        let mut out = String::new();
        for r in records {
            out.push_str(&Self::encode_line(r));
            out.push('\n');
        }
        out
    }

    pub fn encode_line(r: &StudentRecord) -> String {
        let d = DELIMITER;
        format!(
            "{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}{d}{}",
            r.id, r.name, r.subject, r.score1, r.score2, r.score3, r.average, r.grade
        )
    }

    pub fn deserialize(text: &str, opts: DecodeOptions) -> Decoded {
        let mut decoded = Decoded::default();
        let mut seen = HashSet::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.trim().is_empty() {
                continue;
            }
            match Self::decode_line(line_no, line) {
                Ok((record, discarded)) => {
                    if !discarded.is_empty() {
                        decoded.diagnostics.push(Diagnostic::Recovered {
                            line: line_no,
                            discarded,
                        });
                    }
                    decoded.accept(line_no, record, opts, &mut seen);
                }
                Err(err) => decoded.diagnostics.push(err.into()),
            }
        }
        decoded
    }

    /// Parses one non-blank line. The delimiter is chosen per line: `|` when
    /// present, else `,`. With more than eight fields the first three and the
    /// last five are kept and the middle is returned as discarded.
    pub fn decode_line(
        line_no: usize,
        line: &str,
    ) -> Result<(StudentRecord, Vec<String>), GradebookError> {
        let delim = if line.contains(DELIMITER) {
            DELIMITER
        } else {
            LEGACY_DELIMITER
        };
        let fields: Vec<&str> = line.split(delim).collect();
        if fields.len() < FIELD_COUNT {
            return Err(GradebookError::MalformedLine {
                line: line_no,
                reason: format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
            });
        }

        let tail = &fields[fields.len() - 5..];
        let discarded: Vec<String> = fields[3..fields.len() - 5]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let number = |label: &str, raw: &str| -> Result<f64, GradebookError> {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| GradebookError::MalformedLine {
                    line: line_no,
                    reason: format!("{} is not a number: {:?}", label, raw),
                })
        };

        let mut grade_chars = tail[4].trim().chars();
        let grade = match (grade_chars.next(), grade_chars.next()) {
            (Some(c), None) => Grade::from_char(c),
            _ => None,
        }
        .ok_or_else(|| GradebookError::MalformedLine {
            line: line_no,
            reason: format!("invalid grade: {:?}", tail[4]),
        })?;

        let record = StudentRecord {
            id: fields[0].trim().to_string(),
            name: fields[1].to_string(),
            subject: fields[2].to_string(),
            score1: number("score1", tail[0])?,
            score2: number("score2", tail[1])?,
            score3: number("score3", tail[2])?,
            average: number("average", tail[3])?,
            grade,
        };
        if record.id.is_empty() {
            return Err(GradebookError::MalformedLine {
                line: line_no,
                reason: "empty id".to_string(),
            });
        }
        Ok((record, discarded))
    }

    /// Names the free-text fields that contain the flat delimiter.
    pub fn delimiter_collisions(name: &str, subject: &str) -> Vec<&'static str> {
        let mut hits = Vec::new();
        if name.contains(DELIMITER) {
            hits.push("name");
        }
        if subject.contains(DELIMITER) {
            hits.push("subject");
        }
        hits
    }
}

pub struct JsonLinesCodec;

impl JsonLinesCodec {
    pub fn serialize(records: &[StudentRecord]) -> Result<String, GradebookError> {
        let mut out = String::new();
        for r in records {
            out.push_str(&serde_json::to_string(r)?);
            out.push('\n');
        }
        Ok(out)
    }

    pub fn deserialize(text: &str, opts: DecodeOptions) -> Decoded {
        let mut decoded = Decoded::default();
        let mut seen = HashSet::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            if raw.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<StudentRecord>(raw) {
                Ok(record) if record.id.trim().is_empty() => {
                    decoded.diagnostics.push(Diagnostic::Malformed {
                        line: line_no,
                        reason: "empty id".to_string(),
                    });
                }
                Ok(record) => decoded.accept(line_no, record, opts, &mut seen),
                Err(e) => decoded.diagnostics.push(Diagnostic::Malformed {
                    line: line_no,
                    reason: e.to_string(),
                }),
            }
        }
        decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, name: &str, scores: [f64; 3]) -> StudentRecord {
        StudentRecord::new(id, name, "Math", scores)
    }

    #[test]
    fn serialize_writes_fields_in_order() {
        let text = FlatFileCodec::serialize(&[rec("S1000", "Ada", [90.0, 80.5, 72.5])]);
        assert_eq!(text, "S1000|Ada|Math|90|80.5|72.5|81|B\n");
    }

    #[test]
    fn flat_round_trip_is_exact() {
        let records = vec![
            rec("S1000", "Ada Lovelace", [99.5, 87.25, 100.0]),
            rec("S1001", "Bo", [0.0, 33.3, 66.7]),
        ];
        let text = FlatFileCodec::serialize(&records);
        let decoded = FlatFileCodec::deserialize(&text, DecodeOptions::default());
        assert_eq!(decoded.records, records);
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn blank_lines_are_skipped_silently() {
        let text = "\n   \nS1|A|M|90|90|90|90|A\r\n\n";
        let decoded = FlatFileCodec::deserialize(text, DecodeOptions::default());
        assert_eq!(decoded.records.len(), 1);
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn short_line_is_reported_malformed() {
        let text = "S1|A|M|90|90|90|90|A\nS2|B|M|80|80\n";
        let decoded = FlatFileCodec::deserialize(text, DecodeOptions::default());
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.diagnostics.len(), 1);
        assert!(matches!(decoded.diagnostics[0], Diagnostic::Malformed { line: 2, .. }));
    }

    #[test]
    fn legacy_comma_line_is_accepted() {
        let decoded = FlatFileCodec::deserialize("S7,Ann,Art,70,80,90,80,B\n", DecodeOptions::default());
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.records[0].name, "Ann");
        assert_eq!(decoded.records[0].grade, Grade::B);
    }

    #[test]
    fn delimiter_choice_is_per_line() {
        let text = "S1|Smith, Jo|Art|70|80|90|80|B\nS2,Lee,Art,70,80,90,80,B\n";
        let decoded = FlatFileCodec::deserialize(text, DecodeOptions::default());
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(decoded.records[0].name, "Smith, Jo");
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn extra_legacy_fields_keep_first_three_and_last_five() {
        let text = "S3,Doe,Jane,History,Modern,70,80,90,80,B\n";
        let decoded = FlatFileCodec::deserialize(text, DecodeOptions::default());
        assert_eq!(decoded.records.len(), 1);
        let r = &decoded.records[0];
        assert_eq!(r.id, "S3");
        assert_eq!(r.name, "Doe");
        assert_eq!(r.subject, "Jane");
        assert_eq!(r.scores(), [70.0, 80.0, 90.0]);
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::Recovered {
                line: 1,
                discarded: vec!["History".to_string(), "Modern".to_string()],
            }]
        );
    }

    #[test]
    fn bad_number_or_grade_skips_line() {
        let text = "S1|A|M|ninety|90|90|90|A\nS2|B|M|90|90|90|90|Q\nS3|C|M|90|90|90|90|\n";
        let decoded = FlatFileCodec::deserialize(text, DecodeOptions::default());
        assert!(decoded.records.is_empty());
        assert_eq!(decoded.diagnostics.len(), 3);
        assert!(decoded.diagnostics.iter().all(Diagnostic::is_loss));
    }

    #[test]
    fn grade_must_be_a_single_letter() {
        let text = "S1|A|M|90|90|90|90|Apple\nS2|B|M|90|90|90|90| a \n";
        let decoded = FlatFileCodec::deserialize(text, DecodeOptions::default());
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.records[0].id, "S2");
        assert_eq!(decoded.records[0].grade, Grade::A);
        assert!(matches!(
            decoded.diagnostics.as_slice(),
            [Diagnostic::Malformed { line: 1, .. }]
        ));
    }

    #[test]
    fn trusting_mode_keeps_stale_fields_and_flags_drift() {
        let text = "S1|A|M|50|50|50|95|A\n";
        let decoded = FlatFileCodec::deserialize(text, DecodeOptions::default());
        assert_eq!(decoded.records[0].average, 95.0);
        assert_eq!(decoded.records[0].grade, Grade::A);
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::DerivedDrift {
                line: 1,
                id: "S1".to_string()
            }]
        );
    }

    #[test]
    fn strict_mode_recomputes_derived_fields() {
        let text = "S1|A|M|50|50|50|95|A\n";
        let decoded = FlatFileCodec::deserialize(text, DecodeOptions::strict());
        assert_eq!(decoded.records[0].average, 50.0);
        assert_eq!(decoded.records[0].grade, Grade::F);
        assert!(matches!(decoded.diagnostics[0], Diagnostic::Recomputed { line: 1, .. }));
    }

    #[test]
    fn duplicate_ids_keep_the_first_line() {
        let text = "S1|First|M|90|90|90|90|A\nS1|Second|M|90|90|90|90|A\n";
        let decoded = FlatFileCodec::deserialize(text, DecodeOptions::default());
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.records[0].name, "First");
        assert!(matches!(decoded.diagnostics[0], Diagnostic::DuplicateId { line: 2, .. }));
    }

    #[test]
    fn delimiter_collisions_name_the_fields() {
        assert!(FlatFileCodec::delimiter_collisions("Ada", "Math").is_empty());
        assert_eq!(FlatFileCodec::delimiter_collisions("A|da", "Ma|th"), vec!["name", "subject"]);
    }

    #[test]
    fn jsonl_survives_delimiters_in_free_text() {
        let records = vec![rec("S1", "Pipe | Comma, Person", [91.0, 92.0, 93.0])];
        let text = JsonLinesCodec::serialize(&records).unwrap();
        let decoded = JsonLinesCodec::deserialize(&text, DecodeOptions::default());
        assert_eq!(decoded.records, records);
        assert!(decoded.diagnostics.is_empty());
    }

    #[test]
    fn jsonl_reports_garbage_lines() {
        let good = JsonLinesCodec::serialize(&[rec("S1", "A", [1.0, 2.0, 3.0])]).unwrap();
        let text = format!("{}not json\n", good);
        let decoded = JsonLinesCodec::deserialize(&text, DecodeOptions::default());
        assert_eq!(decoded.records.len(), 1);
        assert!(matches!(decoded.diagnostics[0], Diagnostic::Malformed { line: 2, .. }));
    }
}
