use crate::core::codec::Diagnostic;
use crate::core::record::{Grade, StudentRecord};
use crate::core::store::StoreSummary;
use std::env;

const MIN_BOX_WIDTH: usize = 40;
const MAX_BOX_WIDTH: usize = 60;

const ID_COL: usize = 8;
const NAME_COL: usize = 20;
const SUBJECT_COL: usize = 14;
const SCORE_COL: usize = 9;
const AVG_COL: usize = 9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemStatus {
    Created,
    Updated,
    Removed,
    Saved,
    Info,
    Warn,
}

impl ItemStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            ItemStatus::Created => "✨",
            ItemStatus::Updated => "🔄",
            ItemStatus::Removed => "🗑",
            ItemStatus::Saved => "💾",
            ItemStatus::Info => "💡",
            ItemStatus::Warn => "⚠️",
        }
    }
}

pub fn terminal_width() -> usize {
    env::var("TERM_WIDTH")
        .ok()
        .and_then(|w| w.parse().ok())
        .or_else(|| env::var("COLUMNS").ok().and_then(|c| c.parse().ok()))
        .unwrap_or(80)
}

fn effective_width() -> usize {
    terminal_width().clamp(MIN_BOX_WIDTH, MAX_BOX_WIDTH)
}

pub fn box_top(width: usize) -> String {
    format!("╔{}╗", "═".repeat(width.saturating_sub(2)))
}

pub fn box_bottom(width: usize) -> String {
    format!("╚{}╝", "═".repeat(width.saturating_sub(2)))
}

pub fn box_row(content: &str, width: usize) -> String {
    let content_len = content.chars().count();
    let padding = width.saturating_sub(2).saturating_sub(content_len);
    let left_pad = padding / 2;
    let right_pad = padding - left_pad;
    format!(
        "║{}{}{}║",
        " ".repeat(left_pad),
        content,
        " ".repeat(right_pad)
    )
}

pub fn render_banner(title: &str) {
    use colored::Colorize;

    let width = effective_width();
    println!("{}", box_top(width).bright_cyan());
    println!("{}", box_row(title, width).bright_cyan().bold());
    println!("{}", box_bottom(width).bright_cyan());
}

/// Bound a free-text cell to `max_chars`, marking truncation with `...`.
pub fn fit_cell(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let keep = max_chars.saturating_sub(3);
    let preview: String = collapsed.chars().take(keep).collect();
    format!("{}...", preview)
}

pub fn render_table(records: &[StudentRecord]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<id$}{:<name$}{:<subj$}{:<sc$}{:<sc$}{:<sc$}{:<avg$}{}\n",
        "ID",
        "Name",
        "Subject",
        "Score1",
        "Score2",
        "Score3",
        "Average",
        "Grade",
        id = ID_COL,
        name = NAME_COL,
        subj = SUBJECT_COL,
        sc = SCORE_COL,
        avg = AVG_COL,
    ));
    let rule_len = ID_COL + NAME_COL + SUBJECT_COL + SCORE_COL * 3 + AVG_COL + 5;
    out.push_str(&"-".repeat(rule_len));
    out.push('\n');
    for r in records {
        out.push_str(&format!(
            "{:<id$}{:<name$}{:<subj$}{:<sc$}{:<sc$}{:<sc$}{:<avg$.2}{}\n",
            fit_cell(&r.id, ID_COL - 1),
            fit_cell(&r.name, NAME_COL - 1),
            fit_cell(&r.subject, SUBJECT_COL - 1),
            r.score1,
            r.score2,
            r.score3,
            r.average,
            r.grade,
            id = ID_COL,
            name = NAME_COL,
            subj = SUBJECT_COL,
            sc = SCORE_COL,
            avg = AVG_COL,
        ));
    }
    out
}

pub fn print_records(title: &str, records: &[StudentRecord]) {
    use colored::Colorize;

    if records.is_empty() {
        println!("{}", "No student records found.".bright_black());
        return;
    }
    println!();
    println!("{}", title.bold());
    print!("{}", render_table(records));
}

pub fn render_record(r: &StudentRecord) -> String {
    format!(
        "ID:      {}\nName:    {}\nSubject: {}\nScores:  {}, {}, {}\nAverage: {:.2}\nGrade:   {}\n",
        r.id, r.name, r.subject, r.score1, r.score2, r.score3, r.average, r.grade
    )
}

pub fn render_summary(summary: &StoreSummary) -> String {
    let mut out = format!("Students: {}\n", summary.count);
    match summary.class_average {
        Some(avg) => out.push_str(&format!("Class average: {:.2}\n", avg)),
        None => out.push_str("Class average: n/a\n"),
    }
    for g in Grade::ALL {
        let key = g.to_string();
        let n = summary.grades.get(&key).copied().unwrap_or(0);
        out.push_str(&format!("  {}: {}\n", key, n));
    }
    out
}

pub fn print_status_line(message: &str, status: ItemStatus) {
    use colored::Colorize;

    let icon = status.icon();
    match status {
        ItemStatus::Created | ItemStatus::Saved => {
            println!("{} {}", icon.bright_green(), message.bright_white());
        }
        ItemStatus::Updated | ItemStatus::Removed => {
            println!("{} {}", icon.bright_yellow(), message.bright_white());
        }
        ItemStatus::Info => {
            println!("{} {}", icon.cyan(), message.bright_white());
        }
        ItemStatus::Warn => {
            eprintln!("{} {}", icon.bright_yellow(), message.yellow());
        }
    }
}

/// Load findings go to stderr; anything that lost or distrusted data is a warning.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    use colored::Colorize;

    for d in diagnostics {
        if d.is_loss() || matches!(d, Diagnostic::DerivedDrift { .. }) {
            print_status_line(&d.to_string(), ItemStatus::Warn);
        } else {
            eprintln!("{} {}", ItemStatus::Info.icon().cyan(), d);
        }
    }
}
