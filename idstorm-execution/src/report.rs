//! Run report

use crate::driver::{RoundStats, RunStats, Termination};
use crate::error::ExecutionError;
use idstorm_core::OperationKind;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

/// Machine-readable run summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub operation: OperationKind,
    pub target: String,
    pub scenario: String,
    pub total_records: u64,
    pub rounds: u32,
    pub success_count: u64,
    pub already_done_count: u64,
    pub retried_count: u64,
    pub fatal_count: u64,
    pub unresolved_count: u64,
    pub elapsed_seconds: f64,
    /// Records per second; `None` when no time elapsed
    pub throughput: Option<f64>,
    pub termination: Termination,
    pub per_round: Vec<RoundStats>,
}

/// Build the report for a finished run
pub fn summarize(stats: &RunStats, elapsed: Duration) -> RunReport {
    let elapsed_seconds = elapsed.as_secs_f64();
    let throughput = if elapsed_seconds > 0.0 {
        Some(stats.total_records as f64 / elapsed_seconds)
    } else {
        None
    };

    RunReport {
        operation: stats.operation,
        target: String::new(),
        scenario: String::new(),
        total_records: stats.total_records,
        rounds: stats.rounds,
        success_count: stats.success,
        already_done_count: stats.already_done,
        retried_count: stats.retried,
        fatal_count: stats.fatal,
        unresolved_count: stats.unresolved,
        elapsed_seconds,
        throughput,
        termination: stats.termination,
        per_round: stats.per_round.clone(),
    }
}

impl RunReport {
    /// Label the report with the target and impairment scenario
    pub fn labelled(mut self, target: impl Into<String>, scenario: impl Into<String>) -> Self {
        self.target = target.into();
        self.scenario = scenario.into();
        self
    }

    pub fn is_complete(&self) -> bool {
        self.termination.is_complete()
    }

    pub fn to_json(&self) -> Result<String, ExecutionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON form to `path`
    pub fn write_json(&self, path: &Path) -> Result<(), ExecutionError> {
        let mut json = self.to_json()?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Plain-text block for terminals
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let throughput = match self.throughput {
            Some(value) => format!("{:.2} records/s", value),
            None => "n/a".to_string(),
        };

        // Writing into a String cannot fail
        let _ = writeln!(out, "Operation:      {}", self.operation);
        if !self.target.is_empty() {
            let _ = writeln!(out, "Target:         {}", self.target);
        }
        if !self.scenario.is_empty() {
            let _ = writeln!(out, "Scenario:       {}", self.scenario);
        }
        let _ = writeln!(out, "Records:        {}", self.total_records);
        let _ = writeln!(out, "Rounds:         {}", self.rounds);
        let _ = writeln!(out, "Success:        {}", self.success_count);
        let _ = writeln!(out, "Already done:   {}", self.already_done_count);
        let _ = writeln!(out, "Retried:        {}", self.retried_count);
        let _ = writeln!(out, "Fatal:          {}", self.fatal_count);
        if self.unresolved_count > 0 {
            let _ = writeln!(out, "  unresolved:   {}", self.unresolved_count);
        }
        let _ = writeln!(out, "Elapsed:        {:.2}s", self.elapsed_seconds);
        let _ = writeln!(out, "Throughput:     {}", throughput);
        let _ = writeln!(out, "Termination:    {}", self.termination);

        if self.per_round.len() > 1 {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{:>6} {:>8} {:>8} {:>8} {:>8} {:>6} {:>9}",
                "round", "pending", "success", "done", "retried", "fatal", "time"
            );
            for round in &self.per_round {
                let _ = writeln!(
                    out,
                    "{:>6} {:>8} {:>8} {:>8} {:>8} {:>6} {:>8.2}s",
                    round.round,
                    round.pending,
                    round.success,
                    round.already_done,
                    round.retried,
                    round.fatal,
                    round.elapsed_ms as f64 / 1000.0
                );
            }
        }

        out
    }
}
