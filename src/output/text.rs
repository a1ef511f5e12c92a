//! Human-readable listing.
//!
//! ```text
//! 5 bytes
//! /data/a.txt
//! /data/b.txt
//! /data/c.txt
//!
//! 5 bytes
//! Hash: ea8f163d...
//! 1. /data/a.txt
//! 2. /data/b.txt
//!
//! Total freed up space: 5 bytes
//! ```

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::{Paint, Style};

use crate::actions::DeletionResult;
use crate::duplicates::{DuplicateReport, SizePartition};

const HEADER: Style = Style::new().bold();
const HASH: Style = Style::new().cyan();
const GOOD: Style = Style::new().green().bold();
const BAD: Style = Style::new().red();
const MUTED: Style = Style::new().dim();

/// Writes the text listing to any writer.
#[derive(Debug, Clone, Copy)]
pub struct TextOutput {
    color: bool,
}

impl TextOutput {
    /// Create a formatter; `color` enables ANSI styling.
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn styled(&self, text: &str, style: Style) -> String {
        if self.color {
            text.paint(style).to_string()
        } else {
            text.to_string()
        }
    }

    /// Every scanned file, grouped under `N bytes` headers in partition order.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_size_listing<W: Write>(
        &self,
        writer: &mut W,
        partition: &SizePartition,
    ) -> io::Result<()> {
        for bucket in partition.buckets() {
            writeln!(writer)?;
            writeln!(writer, "{}", self.styled(&format!("{} bytes", bucket.size), HEADER))?;
            for path in &bucket.paths {
                writeln!(writer, "{}", path.display())?;
            }
        }
        Ok(())
    }

    /// Numbered duplicate groups; one size header covers all groups of that size.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_duplicates<W: Write>(
        &self,
        writer: &mut W,
        report: &DuplicateReport,
    ) -> io::Result<()> {
        if report.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "{}", self.styled("No duplicates found", MUTED))?;
            return Ok(());
        }

        let mut current_size = None;
        for group in &report.groups {
            if current_size != Some(group.size) {
                current_size = Some(group.size);
                writeln!(writer)?;
                writeln!(writer, "{}", self.styled(&format!("{} bytes", group.size), HEADER))?;
            }
            writeln!(
                writer,
                "{}",
                self.styled(&format!("Hash: {}", group.digest_hex()), HASH)
            )?;
            for record in &group.records {
                writeln!(writer, "{}. {}", record.number, record.path.display())?;
            }
        }
        Ok(())
    }

    /// One-line summary of the duplicate report.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_duplicate_summary<W: Write>(
        &self,
        writer: &mut W,
        report: &DuplicateReport,
    ) -> io::Result<()> {
        let line = format!(
            "{} duplicate group(s), {} file(s), {} reclaimable",
            report.group_count(),
            report.record_count(),
            ByteSize::b(report.wasted_space())
        );
        writeln!(writer)?;
        writeln!(writer, "{}", self.styled(&line, MUTED))
    }

    /// Freed-space total followed by any per-file failures.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_deletion<W: Write>(
        &self,
        writer: &mut W,
        result: &DeletionResult,
    ) -> io::Result<()> {
        for failure in &result.failures {
            writeln!(
                writer,
                "{}",
                self.styled(&format!("Could not delete: {}", failure.error), BAD)
            )?;
        }
        writeln!(writer)?;
        writeln!(
            writer,
            "{}",
            self.styled(
                &format!("Total freed up space: {} bytes", result.freed_bytes),
                GOOD
            )
        )
    }

    /// Note about files skipped during scanning or hashing.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_skipped<W: Write>(&self, writer: &mut W, skipped: usize) -> io::Result<()> {
        if skipped == 0 {
            return Ok(());
        }
        writeln!(
            writer,
            "{}",
            self.styled(
                &format!("{skipped} file(s) could not be read and were skipped (see -v)"),
                BAD
            )
        )
    }
}
