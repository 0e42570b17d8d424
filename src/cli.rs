//! CLI struct definitions for the gradebook command-line interface.
//!
//! All clap-derived types live here. Dispatch lives in `lib.rs`.

use crate::core::codec::Encoding;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(
    name = "gradebook",
    version = env!("CARGO_PKG_VERSION"),
    about = "Manage student records: scores, averages and letter grades, persisted to a flat text file."
)]
pub struct Cli {
    /// Config file (defaults to ./gradebook.toml when present).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    /// Data file, overriding the config.
    #[clap(long, short = 'f', global = true)]
    pub file: Option<PathBuf>,
    /// Encoding of the data file.
    #[clap(long, global = true, value_enum)]
    pub encoding: Option<Encoding>,
    /// Recompute average and grade from the scores when loading.
    #[clap(long, global = true)]
    pub recompute: bool,
    /// Do not append to the operation journal.
    #[clap(long, global = true)]
    pub no_journal: bool,
    /// Let add/edit/delete save even when the load skipped or altered lines.
    #[clap(long, global = true)]
    pub force: bool,
    /// Output format for command results.
    #[clap(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the interactive menu (default).
    Menu,
    /// Add a student and save.
    Add {
        #[clap(value_name = "NAME")]
        name: String,
        #[clap(value_name = "SUBJECT")]
        subject: String,
        #[clap(allow_negative_numbers = true)]
        score1: f64,
        #[clap(allow_negative_numbers = true)]
        score2: f64,
        #[clap(allow_negative_numbers = true)]
        score3: f64,
    },
    /// List all students in insertion order.
    List,
    /// Show one student by ID.
    Show {
        #[clap(value_name = "ID")]
        id: String,
    },
    /// Case-insensitive search on student names.
    Search {
        #[clap(value_name = "QUERY")]
        query: String,
    },
    /// Change a student's fields and save. Omitted fields keep their value.
    Edit {
        #[clap(value_name = "ID")]
        id: String,
        #[clap(long)]
        name: Option<String>,
        #[clap(long)]
        subject: Option<String>,
        #[clap(long, allow_negative_numbers = true)]
        score1: Option<f64>,
        #[clap(long, allow_negative_numbers = true)]
        score2: Option<f64>,
        #[clap(long, allow_negative_numbers = true)]
        score3: Option<f64>,
    },
    /// Delete a student by ID and save.
    Delete {
        #[clap(value_name = "ID")]
        id: String,
    },
    /// Class average and grade distribution.
    Stats,
    /// Write the loaded records to another file in the given encoding.
    Convert {
        #[clap(long, value_enum)]
        to: Encoding,
        #[clap(long)]
        out: PathBuf,
    },
}
