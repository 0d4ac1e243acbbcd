//! Operator-facing output and prompting
//!
//! Passes report what they are about to do (before/after summaries) and ask
//! the operator for missing values through the [`Ui`] trait:
//! - [`ConsoleUi`] writes to the terminal and reads answers from stdin
//! - [`SilentUi`] prints nothing and skips every question

use crossterm::style::Stylize;
use std::io::{self, BufRead, Write};

use crate::store::Record;

const RULE_WIDTH: usize = 100;

/// Trait for UI implementations - allows both a terminal and silent/test modes
pub trait Ui {
    /// Start of a pass or builder
    fn section(&mut self, title: &str);
    fn log(&mut self, message: &str);
    /// Show the record a question is about
    fn show_record(&mut self, record: &Record);
    /// Ask a free-text question. `None` means the operator skipped it.
    fn ask(&mut self, question: &str) -> io::Result<Option<String>>;
}

/// Terminal UI
pub struct ConsoleUi<R> {
    input: R,
}

impl ConsoleUi<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }
}

impl<R: BufRead> ConsoleUi<R> {
    pub fn with_input(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> Ui for ConsoleUi<R> {
    fn section(&mut self, title: &str) {
        let fill = "=".repeat(RULE_WIDTH.saturating_sub(title.len()));
        println!("\n{} {}", title.bold().cyan(), fill.dark_grey());
    }

    fn log(&mut self, message: &str) {
        println!("{}", message);
    }

    fn show_record(&mut self, record: &Record) {
        match serde_json::to_string_pretty(record) {
            Ok(text) => println!("\n{}", text.white()),
            Err(_) => println!("\n{:?}", record),
        }
    }

    fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        print!("{}", question.yellow());
        io::stdout().flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let answer = line.trim();
        if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(answer.to_string()))
        }
    }
}

/// Silent UI implementation for testing and non-interactive use
#[derive(Default)]
pub struct SilentUi;

impl SilentUi {
    pub fn new() -> Self {
        Self
    }
}

impl Ui for SilentUi {
    fn section(&mut self, _title: &str) {}
    fn log(&mut self, _message: &str) {}
    fn show_record(&mut self, _record: &Record) {}
    fn ask(&mut self, _question: &str) -> io::Result<Option<String>> {
        Ok(None)
    }
}
