//! Run statistics
//!
//! Tallies what a harvest run did and reports it once the run finishes.

use crate::record::Record;
use chrono::{DateTime, Utc};

/// Summary of one harvest run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// URL groups processed (seed chains or catalogue pages)
    pub groups: u64,

    /// Pages fetched and extracted
    pub pages_visited: u64,

    /// Rows written to the output
    pub records_written: u64,

    /// Rows carrying an Error field
    pub records_with_errors: u64,

    pub downloads_saved: u64,
    pub downloads_failed: u64,

    /// Groups whose walk ended on an unreachable page or a cursor loop
    pub groups_cut_short: u64,
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            groups: 0,
            pages_visited: 0,
            records_written: 0,
            records_with_errors: 0,
            downloads_saved: 0,
            downloads_failed: 0,
            groups_cut_short: 0,
        }
    }

    /// Adds one flushed group's records
    pub fn record_group(&mut self, records: &[Record]) {
        self.groups += 1;
        self.records_written += records.len() as u64;
        self.records_with_errors += records.iter().filter(|r| r.has_error()).count() as u64;
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, if the run has finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Share of written records without an error, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.records_written == 0 {
            return 0.0;
        }
        let clean = self.records_written - self.records_with_errors;
        (clean as f64 / self.records_written as f64) * 100.0
    }

    /// Logs the summary
    pub fn log(&self) {
        tracing::info!(
            "Run finished: {} groups, {} pages, {} records ({} with errors, {:.2}% clean)",
            self.groups,
            self.pages_visited,
            self.records_written,
            self.records_with_errors,
            self.success_rate()
        );
        if self.downloads_saved + self.downloads_failed > 0 {
            tracing::info!(
                "Downloads: {} saved, {} not saved",
                self.downloads_saved,
                self.downloads_failed
            );
        }
        if self.groups_cut_short > 0 {
            tracing::warn!("{} groups stopped early", self.groups_cut_short);
        }
        if let Some(secs) = self.duration_seconds() {
            tracing::info!("Elapsed: {} seconds ({:.2} minutes)", secs, secs as f64 / 60.0);
        }
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}
