// ── Import report ──
//
// Append-only accumulator for a run: counts applied rows and keeps every
// failed and skipped row with its reason, in input order, for the two
// output tables written once the run is over.

use serde::Serialize;

use crate::reconcile::Outcome;
use crate::row::Row;

/// Column appended to both output tables.
pub const REASON_COLUMN: &str = "reason";

/// A row together with why it was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRow {
    pub row: Row,
    pub reason: String,
}

/// Per-run totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Classified results of one import run.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    headers: Vec<String>,
    applied: usize,
    failed: Vec<ClassifiedRow>,
    skipped: Vec<ClassifiedRow>,
}

impl ImportReport {
    /// Start a report for input with the given header columns.
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }

    /// Record one row's outcome.
    pub fn record(&mut self, row: Row, outcome: &Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Skipped { reason } => self.skipped.push(ClassifiedRow {
                row,
                reason: reason.clone(),
            }),
            Outcome::Failed { reason } => self.failed.push(ClassifiedRow {
                row,
                reason: reason.clone(),
            }),
        }
    }

    pub fn failed(&self) -> &[ClassifiedRow] {
        &self.failed
    }

    pub fn skipped(&self) -> &[ClassifiedRow] {
        &self.skipped
    }

    pub fn summary(&self) -> Summary {
        Summary {
            total: self.applied + self.skipped.len() + self.failed.len(),
            applied: self.applied,
            skipped: self.skipped.len(),
            failed: self.failed.len(),
        }
    }

    /// Input headers followed by the `reason` column.
    pub fn output_headers(&self) -> Vec<&str> {
        self.headers
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(REASON_COLUMN))
            .collect()
    }

    /// Output records for a set of classified rows, aligned with
    /// [`output_headers`](Self::output_headers).
    pub fn records<'a>(
        &'a self,
        rows: &'a [ClassifiedRow],
    ) -> impl Iterator<Item = Vec<&'a str>> + 'a {
        rows.iter().map(|c| {
            c.row
                .values_for(&self.headers)
                .chain(std::iter::once(c.reason.as_str()))
                .collect()
        })
    }
}
