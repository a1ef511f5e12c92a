//! Interactive questions on stdin/stdout.
//!
//! Every prompt retries in a loop until it gets an acceptable answer. End of
//! input is reported as [`io::ErrorKind::UnexpectedEof`] so a closed stdin
//! cannot spin forever.

use std::io::{self, BufRead, Write};

use crate::config::ConfigError;
use crate::duplicates::{DuplicateIndex, SortOrder};

/// Console prompter over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    /// Prompter bound to the process stdin and stdout.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Wrap a reader and a writer.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the writer (used by tests to inspect what was printed).
    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        writeln!(self.output, "{question}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Ask for the name suffix filter. An empty answer means no filter.
    pub fn read_extension(&mut self) -> io::Result<Option<String>> {
        let answer = self.ask("Enter file format:")?;
        let answer = answer.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }

    /// Ask for the size ordering: `1` descending, `2` ascending.
    pub fn read_sort_order(&mut self) -> io::Result<SortOrder> {
        writeln!(self.output, "\nSize sorting options:")?;
        writeln!(self.output, "1. {}", SortOrder::Descending)?;
        writeln!(self.output, "2. {}", SortOrder::Ascending)?;

        loop {
            match parse_sort_choice(&self.ask("\nEnter a sorting option (number):")?) {
                Ok(order) => return Ok(order),
                Err(e) => {
                    log::debug!("{e}");
                    writeln!(self.output, "\nWrong option")?;
                }
            }
        }
    }

    /// Ask whether to check for duplicates; only `yes` or `no` are accepted.
    pub fn read_check_duplicates(&mut self) -> io::Result<bool> {
        loop {
            match parse_yes_no("duplicate check", &self.ask("\nCheck for duplicates? 'yes' or 'no'")?) {
                Ok(answer) => return Ok(answer),
                Err(e) => {
                    log::debug!("{e}");
                    writeln!(self.output, "\nWrong option")?;
                }
            }
        }
    }

    /// Ask whether to delete files. Anything but `yes` declines.
    pub fn read_delete_confirmation(&mut self) -> io::Result<bool> {
        Ok(self.ask("\nDelete files?")?.trim() == "yes")
    }

    /// Ask for record numbers until every one of them exists in `index`.
    ///
    /// Returns the numbers in the order typed, repeats included; the
    /// selection resolver collapses repeats.
    pub fn read_selection(&mut self, index: &DuplicateIndex) -> io::Result<Vec<usize>> {
        loop {
            let answer = self.ask(
                "\nEnter file numbers to delete (space separated integers corresponding to the file):",
            )?;
            match parse_numbers(&answer) {
                Some(numbers) if numbers.iter().all(|&n| index.record(n).is_some()) => {
                    return Ok(numbers);
                }
                _ => writeln!(self.output, "\nWrong format")?,
            }
        }
    }
}

fn parse_sort_choice(answer: &str) -> Result<SortOrder, ConfigError> {
    match answer.trim() {
        "1" => Ok(SortOrder::Descending),
        "2" => Ok(SortOrder::Ascending),
        other => Err(ConfigError::InvalidOption {
            option: "sort order",
            value: other.to_string(),
        }),
    }
}

fn parse_yes_no(option: &'static str, answer: &str) -> Result<bool, ConfigError> {
    match answer.trim() {
        "yes" => Ok(true),
        "no" => Ok(false),
        other => Err(ConfigError::InvalidOption {
            option,
            value: other.to_string(),
        }),
    }
}

/// Split on whitespace and parse every token as a positive integer.
/// `None` for an empty answer or any token that is not a number.
fn parse_numbers(answer: &str) -> Option<Vec<usize>> {
    let numbers: Option<Vec<usize>> = answer
        .split_whitespace()
        .map(|token| token.parse::<usize>().ok())
        .collect();
    numbers.filter(|n| !n.is_empty())
}
