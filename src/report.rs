//! Run results: statistics, the JSON report, and mutant fingerprints
//!
//! The JSON layout (camelCase field names, mutants grouped by fate) is the
//! interchange format consumed by dashboards, so field names are pinned by
//! tests. Skipped and duplicated mutants are counted but not listed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{MutationError, Result};
use crate::runner::Outcome;

/// Aggregate counters for one run.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_mutants_count: u64,
    pub killed_count: u64,
    pub escaped_count: u64,
    pub error_count: u64,
    pub skipped_count: u64,
    pub time_out_count: u64,
    pub msi: f64,
    #[serde(skip)]
    pub duplicated_count: u64,
}

impl Stats {
    /// Mutation score indicator. Timed-out mutants prove nothing about the
    /// test suite, so they stay out of both sides of the ratio.
    pub fn score(&self) -> f64 {
        let caught = self.killed_count + self.error_count + self.skipped_count;
        let total = caught + self.escaped_count;
        if total == 0 {
            return 0.0;
        }
        caught as f64 / total as f64
    }
}

/// One mutation in the report: what changed, where.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutator {
    pub mutator_name: String,
    pub original_source_code: String,
    pub mutated_source_code: String,
    pub original_file_path: String,
    pub original_start_line: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mutant {
    pub mutator: Mutator,
    pub diff: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub process_output: String,
}

/// Full report for one run, built up mutant by mutant and finalized by
/// [`Report::calculate`].
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub stats: Stats,
    pub escaped: Vec<Mutant>,
    pub timeouted: Vec<Mutant>,
    pub killed: Vec<Mutant>,
    pub errored: Vec<Mutant>,
}

impl Report {
    pub fn new() -> Self {
        Report::default()
    }

    /// Record one executed mutant under its fate.
    pub fn record(&mut self, outcome: Outcome, mutant: Mutant) {
        match outcome {
            Outcome::Killed => {
                self.stats.killed_count += 1;
                self.killed.push(mutant);
            }
            Outcome::Escaped => {
                self.stats.escaped_count += 1;
                self.escaped.push(mutant);
            }
            Outcome::TimedOut => {
                self.stats.time_out_count += 1;
                self.timeouted.push(mutant);
            }
            Outcome::Errored => {
                self.stats.error_count += 1;
                self.errored.push(mutant);
            }
            Outcome::Skipped => {
                self.stats.skipped_count += 1;
            }
            Outcome::Duplicated => {
                self.stats.duplicated_count += 1;
            }
        }
    }

    /// Finalize totals and the score.
    pub fn calculate(&mut self) {
        self.stats.total_mutants_count = self.stats.killed_count
            + self.stats.escaped_count
            + self.stats.error_count
            + self.stats.skipped_count
            + self.stats.time_out_count;
        self.stats.msi = self.stats.score();
    }

    /// The one-line verdict printed at the end of every run.
    pub fn summary_line(&self) -> String {
        format!(
            "The mutation score is {:.6} ({} passed, {} failed, {} duplicated, {} skipped, total is {})",
            self.stats.msi,
            self.stats.killed_count,
            self.stats.escaped_count,
            self.stats.duplicated_count,
            self.stats.skipped_count,
            self.stats.total_mutants_count,
        )
    }

    /// Colored console summary.
    pub fn print_summary(&self) {
        println!();
        println!("{}", "Mutation Testing Summary".bold());
        println!("{}", "-".repeat(40));
        println!("Total mutants:  {}", self.stats.total_mutants_count);
        println!("Killed:         {}", self.stats.killed_count);
        println!("Escaped:        {}", self.stats.escaped_count);
        if self.stats.time_out_count > 0 {
            println!("Timed out:      {}", self.stats.time_out_count);
        }
        if self.stats.error_count > 0 {
            println!("Errored:        {}", self.stats.error_count);
        }
        if self.stats.skipped_count > 0 {
            println!("Skipped:        {}", self.stats.skipped_count);
        }
        if self.stats.duplicated_count > 0 {
            println!("Duplicated:     {}", self.stats.duplicated_count);
        }

        let line = self.summary_line();
        let colored = if self.stats.msi >= 0.9 {
            line.green().bold()
        } else if self.stats.msi >= 0.7 {
            line.yellow().bold()
        } else {
            line.red().bold()
        };
        println!();
        println!("{colored}");
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| MutationError::ConfigError {
            message: format!("failed to serialize report: {e}"),
        })
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?).map_err(|e| MutationError::WriteError {
            file: path.to_path_buf(),
            error: e.to_string(),
        })
    }
}

/// Content fingerprint of a mutated rendering, used for deduplication and
/// blacklisting. Hex-encoded SHA-256, 64 characters.
pub fn fingerprint(rendered: &str) -> String {
    let digest = Sha256::digest(rendered.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Fingerprints that must not be executed again: entries loaded from
/// blacklist files plus everything seen earlier in the current run.
#[derive(Debug, Default)]
pub struct Blacklist {
    entries: HashSet<String>,
}

impl Blacklist {
    /// Load fingerprints from files, one 64-character hex digest per line.
    /// Malformed lines are reported and skipped.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let mut blacklist = Blacklist::default();
        for path in paths {
            let content =
                std::fs::read_to_string(path).map_err(|e| MutationError::FileReadError {
                    file: path.clone(),
                    error: e.to_string(),
                })?;
            for (i, line) in content.lines().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.len() == 64 && line.chars().all(|c| c.is_ascii_hexdigit()) {
                    blacklist.entries.insert(line.to_ascii_lowercase());
                } else {
                    eprintln!(
                        "Warning: {}:{} is not a SHA-256 digest, ignoring",
                        path.display(),
                        i + 1
                    );
                }
            }
        }
        Ok(blacklist)
    }

    pub fn contains(&self, digest: &str) -> bool {
        self.entries.contains(digest)
    }

    /// Returns false when the digest was already present.
    pub fn insert(&mut self, digest: String) -> bool {
        self.entries.insert(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mutant(name: &str) -> Mutant {
        Mutant {
            mutator: Mutator {
                mutator_name: name.to_string(),
                original_source_code: "a + b".to_string(),
                mutated_source_code: "a - b".to_string(),
                original_file_path: "src/lib.rs".to_string(),
                original_start_line: 3,
            },
            diff: "-a + b\n+a - b\n".to_string(),
            process_output: String::new(),
        }
    }

    #[test]
    fn test_score_is_caught_over_decided() {
        let mut report = Report::new();
        for _ in 0..9 {
            report.record(Outcome::Killed, mutant("arithmetic/base"));
        }
        for _ in 0..9 {
            report.record(Outcome::Escaped, mutant("arithmetic/base"));
        }
        report.calculate();
        assert_eq!(report.stats.msi, 0.5);
        assert_eq!(report.stats.total_mutants_count, 18);
    }

    #[test]
    fn test_score_of_empty_run_is_zero() {
        let mut report = Report::new();
        report.calculate();
        assert_eq!(report.stats.msi, 0.0);
    }

    #[test]
    fn test_timeouts_do_not_move_the_score() {
        let mut report = Report::new();
        report.record(Outcome::Killed, mutant("a"));
        report.record(Outcome::Escaped, mutant("b"));
        report.calculate();
        let base = report.stats.msi;

        report.record(Outcome::TimedOut, mutant("c"));
        report.calculate();
        assert_eq!(report.stats.msi, base);
        assert_eq!(report.stats.time_out_count, 1);
    }

    #[test]
    fn test_json_field_names() {
        let mut report = Report::new();
        report.record(Outcome::Escaped, mutant("numbers/incrementer"));
        report.calculate();

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value["stats"]["totalMutantsCount"].is_u64());
        assert!(value["stats"]["killedCount"].is_u64());
        assert!(value["stats"]["timeOutCount"].is_u64());
        assert!(value["stats"]["msi"].is_f64() || value["stats"]["msi"].is_u64());
        assert!(value["stats"].get("duplicatedCount").is_none());

        let escaped = &value["escaped"][0];
        assert_eq!(escaped["mutator"]["mutatorName"], "numbers/incrementer");
        assert_eq!(escaped["mutator"]["originalStartLine"], 3);
        assert!(escaped["mutator"]["originalSourceCode"].is_string());
        assert!(escaped["diff"].is_string());
        // empty process output is omitted
        assert!(escaped.get("processOutput").is_none());
    }

    #[test]
    fn test_summary_line_format() {
        let mut report = Report::new();
        report.record(Outcome::Killed, mutant("a"));
        report.record(Outcome::Escaped, mutant("b"));
        report.record(Outcome::Duplicated, mutant("b"));
        report.calculate();
        assert_eq!(
            report.summary_line(),
            "The mutation score is 0.500000 (1 passed, 1 failed, 1 duplicated, 0 skipped, total is 2)"
        );
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = fingerprint("");
        assert_eq!(
            fp,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_ne!(fingerprint("fn f() {}"), fp);
    }

    #[test]
    fn test_blacklist_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blacklist");
        let valid = fingerprint("fn f() {}");
        std::fs::write(&path, format!("{valid}\nnot-a-digest\n1234\n")).unwrap();

        let blacklist = Blacklist::load(&[path]).unwrap();
        assert!(blacklist.contains(&valid));
        assert!(!blacklist.contains("not-a-digest"));
        assert!(!blacklist.contains("1234"));
    }

    #[test]
    fn test_blacklist_insert_detects_duplicates() {
        let mut blacklist = Blacklist::default();
        let fp = fingerprint("fn f() {}");
        assert!(blacklist.insert(fp.clone()));
        assert!(!blacklist.insert(fp));
    }
}
