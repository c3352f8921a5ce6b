//! Mutation testing for Rust source files
//!
//! Discovers small, reversible edits to a parsed source file (swapping
//! binary operators, removing statements, forcing loop exits, ...), applies
//! them one at a time, runs the test suite against each mutant, and reports
//! which mutants the tests caught.
//!
//! The pipeline:
//!
//! 1. [`targets`] expands CLI arguments into source files.
//! 2. [`unit`] parses each file and assigns every interesting node a stable
//!    pre-order id.
//! 3. [`engine::plan`] offers every node to every registered operator,
//!    subject to [`annotation`] exclusions and [`filter`] vetoes.
//! 4. [`engine::Walker`] applies and reverts each planned mutation in a
//!    strict alternation.
//! 5. [`runner::Executor`] decides each mutant's fate, built-in via
//!    `cargo test` or delegated to an external command.
//! 6. [`report::Report`] aggregates outcomes and renders the JSON document
//!    and console summary.

pub mod annotation;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod mutation;
pub mod operators;
pub mod registry;
pub mod report;
pub mod runner;
pub mod targets;
pub mod unit;

// Re-export main types at crate root
pub use annotation::{Exclusions, Processor};
pub use config::Config;
pub use engine::{plan, AppliedMutation, PlannedMutation, Walker};
pub use error::{MutationError, Result};
pub use filter::{NodeFilter, SkipCapacityArgs};
pub use mutation::MutationSpec;
pub use operators::Operator;
pub use registry::Registry;
pub use report::{fingerprint, Blacklist, Mutant, Mutator, Report, Stats};
pub use runner::{ExecResult, Executor, Outcome};
pub use unit::SourceUnit;
