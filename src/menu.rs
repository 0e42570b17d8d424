//! Interactive numbered menu over a `Session`.
//!
//! Reads from any `BufRead` and writes to any `Write` so it can be driven
//! from tests. End of input behaves like choosing Exit.

use crate::core::error::GradebookError;
use crate::core::record::{NewStudent, RecordPatch, validate_score};
use crate::core::session::Session;
use crate::core::tui;
use colored::Colorize;
use std::io::{self, BufRead, Write};

const MENU: &str = "\n=== Student Grade Management System ===
1. Add Student
2. List Students
3. Search Student
4. Edit Student
5. Delete Student
6. Save to File
7. Load from File
8. Exit
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Add,
    List,
    Search,
    Edit,
    Delete,
    Save,
    Load,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<MenuChoice> {
        match input.trim() {
            "1" => Some(MenuChoice::Add),
            "2" => Some(MenuChoice::List),
            "3" => Some(MenuChoice::Search),
            "4" => Some(MenuChoice::Edit),
            "5" => Some(MenuChoice::Delete),
            "6" => Some(MenuChoice::Save),
            "7" => Some(MenuChoice::Load),
            "8" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

pub struct Menu<'a, R: BufRead, W: Write> {
    session: &'a mut Session,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(session: &'a mut Session, input: R, out: W) -> Self {
        Menu {
            session,
            input,
            out,
        }
    }

    pub fn run(&mut self) -> Result<(), GradebookError> {
        loop {
            write!(self.out, "{}", MENU)?;
            let Some(line) = self.prompt("Enter your choice: ")? else {
                writeln!(self.out)?;
                return Ok(());
            };
            match MenuChoice::parse(&line) {
                Some(MenuChoice::Exit) => {
                    writeln!(self.out, "Exiting program. Goodbye!")?;
                    return Ok(());
                }
                Some(choice) => {
                    if !self.dispatch(choice)? {
                        writeln!(self.out)?;
                        return Ok(());
                    }
                }
                None => writeln!(self.out, "{}", "Invalid choice. Try again.".red())?,
            }
        }
    }

    /// Returns `false` when input ran out mid-operation.
    fn dispatch(&mut self, choice: MenuChoice) -> Result<bool, GradebookError> {
        match choice {
            MenuChoice::Add => self.add(),
            MenuChoice::List => {
                self.list()?;
                Ok(true)
            }
            MenuChoice::Search => self.search(),
            MenuChoice::Edit => self.edit(),
            MenuChoice::Delete => self.delete(),
            MenuChoice::Save => {
                match self.session.save() {
                    Ok(()) => writeln!(
                        self.out,
                        "{} Data saved to {} successfully.",
                        tui::ItemStatus::Saved.icon(),
                        self.session.data_path().display()
                    )?,
                    Err(e) => writeln!(self.out, "{} {}", "Error:".red(), e)?,
                }
                Ok(true)
            }
            MenuChoice::Load => {
                match self.session.reload() {
                    Ok(diags) => {
                        for d in &diags {
                            writeln!(self.out, "{} {}", "note:".yellow(), d)?;
                        }
                        writeln!(
                            self.out,
                            "Loaded {} record(s) from {}.",
                            self.session.store.len(),
                            self.session.data_path().display()
                        )?;
                    }
                    Err(e) => writeln!(self.out, "{} {}", "Error:".red(), e)?,
                }
                Ok(true)
            }
            MenuChoice::Exit => Ok(false),
        }
    }

    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Prompts until a score in range is entered. An empty answer returns
    /// `Some(None)` when `allow_keep` is set.
    fn prompt_score(&mut self, label: &str, allow_keep: bool) -> io::Result<Option<Option<f64>>> {
        loop {
            let Some(raw) = self.prompt(label)? else {
                return Ok(None);
            };
            let raw = raw.trim();
            if raw.is_empty() && allow_keep {
                return Ok(Some(None));
            }
            match raw.parse::<f64>() {
                Ok(v) => match validate_score(label.trim_end_matches([' ', ':']), v) {
                    Ok(v) => return Ok(Some(Some(v))),
                    Err(e) => writeln!(self.out, "{}", e.to_string().red())?,
                },
                Err(_) => writeln!(self.out, "{}", "Please enter a number.".red())?,
            }
        }
    }

    fn add(&mut self) -> Result<bool, GradebookError> {
        let Some(name) = self.prompt("\nEnter student name: ")? else {
            return Ok(false);
        };
        let Some(subject) = self.prompt("Enter subject: ")? else {
            return Ok(false);
        };
        let mut scores = [0.0; 3];
        for (i, slot) in scores.iter_mut().enumerate() {
            match self.prompt_score(&format!("Enter score {}: ", i + 1), false)? {
                Some(Some(v)) => *slot = v,
                _ => return Ok(false),
            }
        }

        match self.session.add(NewStudent::new(name, subject, scores)) {
            Ok((record, warnings)) => {
                for w in warnings {
                    writeln!(self.out, "{} {}", "warning:".yellow(), w)?;
                }
                writeln!(
                    self.out,
                    "{} Student added with ID {} (average {:.2}, grade {}).",
                    tui::ItemStatus::Created.icon(),
                    record.id,
                    record.average,
                    record.grade
                )?;
            }
            Err(e) => writeln!(self.out, "{} {}", "Error:".red(), e)?,
        }
        Ok(true)
    }

    fn list(&mut self) -> Result<(), GradebookError> {
        let records = self.session.store.all();
        if records.is_empty() {
            writeln!(self.out, "\nNo student records found.")?;
        } else {
            writeln!(self.out, "\n--- Student Records ---")?;
            write!(self.out, "{}", tui::render_table(records))?;
        }
        Ok(())
    }

    fn search(&mut self) -> Result<bool, GradebookError> {
        let Some(query) = self.prompt("\nEnter student ID or name: ")? else {
            return Ok(false);
        };
        let query = query.trim();
        if let Some(record) = self.session.store.find_by_id(query) {
            write!(self.out, "{}", tui::render_record(record))?;
            return Ok(true);
        }
        let hits: Vec<_> = self
            .session
            .store
            .find_by_name_substring(query)
            .into_iter()
            .cloned()
            .collect();
        if hits.is_empty() {
            writeln!(self.out, "No matching students.")?;
        } else {
            write!(self.out, "{}", tui::render_table(&hits))?;
        }
        Ok(true)
    }

    fn edit(&mut self) -> Result<bool, GradebookError> {
        let Some(id) = self.prompt("\nEnter student ID to edit: ")? else {
            return Ok(false);
        };
        let id = id.trim().to_string();
        let Some(current) = self.session.store.find_by_id(&id).cloned() else {
            writeln!(self.out, "{} Student {} not found.", "Error:".red(), id)?;
            return Ok(true);
        };
        writeln!(self.out, "Press Enter to keep the current value.")?;

        let Some(name) = self.prompt(&format!("Name [{}]: ", current.name))? else {
            return Ok(false);
        };
        let Some(subject) = self.prompt(&format!("Subject [{}]: ", current.subject))? else {
            return Ok(false);
        };
        let mut patch = RecordPatch {
            name: Some(name).filter(|s| !s.trim().is_empty()),
            subject: Some(subject).filter(|s| !s.trim().is_empty()),
            ..Default::default()
        };
        let currents = current.scores();
        for (i, current_score) in currents.iter().enumerate() {
            let label = format!("Score {} [{}]: ", i + 1, current_score);
            let Some(answer) = self.prompt_score(&label, true)? else {
                return Ok(false);
            };
            match i {
                0 => patch.score1 = answer,
                1 => patch.score2 = answer,
                _ => patch.score3 = answer,
            }
        }

        if patch.is_empty() {
            writeln!(self.out, "Nothing changed.")?;
            return Ok(true);
        }
        match self.session.edit(&id, patch) {
            Ok((record, warnings)) => {
                for w in warnings {
                    writeln!(self.out, "{} {}", "warning:".yellow(), w)?;
                }
                writeln!(
                    self.out,
                    "{} Student {} updated (average {:.2}, grade {}).",
                    tui::ItemStatus::Updated.icon(),
                    record.id,
                    record.average,
                    record.grade
                )?;
            }
            Err(e) => writeln!(self.out, "{} {}", "Error:".red(), e)?,
        }
        Ok(true)
    }

    fn delete(&mut self) -> Result<bool, GradebookError> {
        let Some(id) = self.prompt("\nEnter student ID to delete: ")? else {
            return Ok(false);
        };
        let id = id.trim().to_string();
        let Some(current) = self.session.store.find_by_id(&id) else {
            writeln!(self.out, "{} Student {} not found.", "Error:".red(), id)?;
            return Ok(true);
        };
        let question = format!("Delete {} ({})? [y/N]: ", current.name, current.id);
        let Some(answer) = self.prompt(&question)? else {
            return Ok(false);
        };
        if !matches!(answer.trim(), "y" | "Y" | "yes" | "YES") {
            writeln!(self.out, "Delete cancelled.")?;
            return Ok(true);
        }
        let removed = self.session.delete(&id)?;
        writeln!(
            self.out,
            "{} Student {} deleted.",
            tui::ItemStatus::Removed.icon(),
            removed.id
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::session::SessionSettings;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn run_script(session: &mut Session, script: &str) -> String {
        let mut out = Vec::new();
        Menu::new(session, Cursor::new(script.as_bytes().to_vec()), &mut out)
            .run()
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn session(dir: &std::path::Path) -> Session {
        let mut settings = SessionSettings::from_config(&Config::default(), dir);
        settings.journal = false;
        Session::open(settings).unwrap().0
    }

    #[test]
    fn parse_choices() {
        assert_eq!(MenuChoice::parse(" 1 "), Some(MenuChoice::Add));
        assert_eq!(MenuChoice::parse("8"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("9"), None);
        assert_eq!(MenuChoice::parse("add"), None);
    }

    #[test]
    fn add_reprompts_on_bad_score_then_lists() {
        let tmp = tempdir().unwrap();
        let mut s = session(tmp.path());
        let out = run_script(&mut s, "1\nAda\nMath\n120\nabc\n90\n90\n90\n2\n8\n");
        assert_eq!(s.store.len(), 1);
        assert!(out.contains("Please enter a number."));
        assert!(out.contains("Student added with ID S1000"));
        assert!(out.contains("--- Student Records ---"));
        assert!(out.contains("Exiting program. Goodbye!"));
    }

    #[test]
    fn edit_keeps_blank_fields() {
        let tmp = tempdir().unwrap();
        let mut s = session(tmp.path());
        s.add(NewStudent::new("Ada", "Math", [60.0, 60.0, 60.0]))
            .unwrap();
        run_script(&mut s, "4\nS1000\n\n\n95\n\n\n8\n");
        let r = s.store.find_by_id("S1000").unwrap();
        assert_eq!(r.name, "Ada");
        assert_eq!(r.subject, "Math");
        assert_eq!(r.scores(), [95.0, 60.0, 60.0]);
        assert_eq!(r.grade.as_char(), 'C');
    }

    #[test]
    fn delete_requires_confirmation() {
        let tmp = tempdir().unwrap();
        let mut s = session(tmp.path());
        s.add(NewStudent::new("Ada", "Math", [60.0, 60.0, 60.0]))
            .unwrap();
        let out = run_script(&mut s, "5\nS1000\nn\n5\nS9999\n8\n");
        assert!(out.contains("Delete cancelled."));
        assert!(out.contains("Student S9999 not found."));
        assert_eq!(s.store.len(), 1);

        run_script(&mut s, "5\nS1000\ny\n8\n");
        assert!(s.store.is_empty());
    }

    #[test]
    fn save_then_load_round_trips_through_file() {
        let tmp = tempdir().unwrap();
        let mut s = session(tmp.path());
        run_script(&mut s, "1\nAda\nMath\n90\n80\n70\n6\n5\nS1000\ny\n7\n2\n8\n");
        assert_eq!(s.store.len(), 1);
        assert_eq!(s.store.all()[0].name, "Ada");
        let saved = std::fs::read_to_string(tmp.path().join("students.txt")).unwrap();
        assert_eq!(saved, "S1000|Ada|Math|90|80|70|80|B\n");
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let tmp = tempdir().unwrap();
        let mut s = session(tmp.path());
        run_script(&mut s, "1\nAda\n");
        assert!(s.store.is_empty());
    }
}
