//! Mutant execution
//!
//! Two execution modes decide a mutant's fate. Built-in mode swaps the
//! mutant over the original file, runs `cargo test` in the package
//! directory, and classifies the result directly. Delegated mode hands the
//! decision to an external command, passing context through `MUTATE_*`
//! environment variables and reading the verdict from the exit code:
//! 0 escaped, 1 killed, 2 skipped, anything else errored.
//!
//! Either way the original file is back in place when execution returns,
//! even on panic.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::{MutationError, Result};

/// Fate of one executed mutant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Tests failed: the mutation was detected
    Killed,
    /// Tests passed: the mutation went unnoticed
    Escaped,
    /// The mutant did not compile, or the command asked to skip it
    Skipped,
    /// Tests ran past the deadline and were killed
    TimedOut,
    /// The command failed in a way that is neither kill nor skip
    Errored,
    /// An identical mutant was already executed; nothing was run
    Duplicated,
}

impl Outcome {
    /// Counts toward the score numerator: the mutant did not survive.
    pub fn is_caught(self) -> bool {
        matches!(self, Outcome::Killed | Outcome::Skipped | Outcome::Errored)
    }
}

/// Result of executing one mutant.
#[derive(Debug)]
pub struct ExecResult {
    pub outcome: Outcome,
    /// Captured test output (built-in mode only; delegated commands inherit
    /// the console)
    pub output: String,
    pub duration: Duration,
}

/// Execution settings shared by every mutant of a run.
#[derive(Debug, Clone)]
pub struct Executor {
    /// External command; `None` selects built-in `cargo test`
    pub exec_command: Option<String>,
    pub timeout_secs: u64,
    pub verbose: bool,
    pub debug: bool,
    /// Test the whole workspace instead of a single package
    pub test_recursive: bool,
}

impl Executor {
    /// Execute one mutant. `mutant_path` holds the mutated rendering on
    /// disk; `original_path` is the file under test inside `package_dir`.
    pub fn run(
        &self,
        original_path: &Path,
        mutant_path: &Path,
        package_dir: &Path,
    ) -> Result<ExecResult> {
        match &self.exec_command {
            Some(command) => self.run_delegated(command, original_path, mutant_path, package_dir),
            None => self.run_builtin(original_path, mutant_path, package_dir),
        }
    }

    fn run_builtin(
        &self,
        original_path: &Path,
        mutant_path: &Path,
        package_dir: &Path,
    ) -> Result<ExecResult> {
        let mutated =
            std::fs::read_to_string(mutant_path).map_err(|e| MutationError::FileReadError {
                file: mutant_path.to_path_buf(),
                error: e.to_string(),
            })?;

        let mut guard = SwapGuard::swap(original_path, &mutated)?;

        let start = Instant::now();
        let mut cmd = Command::new("cargo");
        cmd.arg("test").arg("--no-fail-fast");
        if self.test_recursive {
            cmd.arg("--workspace");
        }
        if !self.verbose {
            cmd.arg("--quiet");
        }
        cmd.current_dir(package_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let waited = spawn_and_wait(cmd, Duration::from_secs(self.timeout_secs));
        guard.restore()?;

        let duration = start.elapsed();
        match waited? {
            Waited::TimedOut => Ok(ExecResult {
                outcome: Outcome::TimedOut,
                output: String::new(),
                duration,
            }),
            Waited::Exited { success, output, .. } => Ok(ExecResult {
                outcome: classify_test_output(success, &output),
                output,
                duration,
            }),
        }
    }

    fn run_delegated(
        &self,
        command: &str,
        original_path: &Path,
        mutant_path: &Path,
        package_dir: &Path,
    ) -> Result<ExecResult> {
        let mut parts = command.split_whitespace();
        let Some(program) = parts.next() else {
            return Err(MutationError::TestExecutionError {
                error: "empty exec command".to_string(),
            });
        };

        let start = Instant::now();
        let mut cmd = Command::new(program);
        cmd.args(parts)
            .env("MUTATE_CHANGED", mutant_path)
            .env("MUTATE_ORIGINAL", original_path)
            .env("MUTATE_PACKAGE", package_dir)
            .env("MUTATE_TIMEOUT", self.timeout_secs.to_string())
            .env("MUTATE_DEBUG", bool_env(self.debug))
            .env("MUTATE_VERBOSE", bool_env(self.verbose))
            .env("TEST_RECURSIVE", bool_env(self.test_recursive));

        let waited = spawn_and_wait(cmd, Duration::from_secs(self.timeout_secs))?;
        let duration = start.elapsed();

        let outcome = match waited {
            Waited::TimedOut => Outcome::TimedOut,
            Waited::Exited { code, .. } => match code {
                Some(0) => Outcome::Escaped,
                Some(1) => Outcome::Killed,
                Some(2) => Outcome::Skipped,
                _ => Outcome::Errored,
            },
        };

        Ok(ExecResult {
            outcome,
            output: String::new(),
            duration,
        })
    }
}

fn bool_env(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

/// Built-in classification: a failing run is a kill unless the compiler
/// rejected the mutant outright.
fn classify_test_output(success: bool, output: &str) -> Outcome {
    if success {
        Outcome::Escaped
    } else if output.contains("error[E")
        || output.contains("could not compile")
        || output.contains("aborting due to")
    {
        Outcome::Skipped
    } else {
        Outcome::Killed
    }
}

enum Waited {
    Exited {
        success: bool,
        code: Option<i32>,
        output: String,
    },
    TimedOut,
}

fn spawn_and_wait(mut cmd: Command, timeout: Duration) -> Result<Waited> {
    let mut child = cmd.spawn().map_err(|e| MutationError::TestExecutionError {
        error: format!("failed to spawn {:?}: {e}", cmd.get_program()),
    })?;

    // piped output must be drained while the child runs, or a chatty test
    // suite fills the pipe buffer, blocks, and masquerades as a timeout
    let stdout = child.stdout.take().map(drain_in_background);
    let stderr = child.stderr.take().map(drain_in_background);

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let output = join_drained(stdout, stderr);
                return Ok(Waited::Exited {
                    success: status.success(),
                    code: status.code(),
                    output,
                });
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    join_drained(stdout, stderr);
                    return Ok(Waited::TimedOut);
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                return Err(MutationError::TestExecutionError {
                    error: format!("failed to wait on child: {e}"),
                });
            }
        }
    }
}

fn drain_in_background<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = pipe.read_to_string(&mut buf);
        buf
    })
}

fn join_drained(stdout: Option<JoinHandle<String>>, stderr: Option<JoinHandle<String>>) -> String {
    let mut output = stdout.and_then(|h| h.join().ok()).unwrap_or_default();
    if let Some(handle) = stderr {
        if let Ok(err) = handle.join() {
            output.push('\n');
            output.push_str(&err);
        }
    }
    output
}

/// Holds the original file content while the mutant occupies its path.
/// Dropping the guard restores the original even if execution panicked;
/// `restore` does the same but surfaces write errors.
struct SwapGuard {
    path: std::path::PathBuf,
    original: Vec<u8>,
    restored: bool,
}

impl SwapGuard {
    fn swap(path: &Path, mutated: &str) -> Result<Self> {
        let original = std::fs::read(path).map_err(|e| MutationError::FileReadError {
            file: path.to_path_buf(),
            error: e.to_string(),
        })?;
        std::fs::write(path, mutated).map_err(|e| MutationError::WriteError {
            file: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Ok(SwapGuard {
            path: path.to_path_buf(),
            original,
            restored: false,
        })
    }

    fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        std::fs::write(&self.path, &self.original).map_err(|e| MutationError::WriteError {
            file: self.path.to_path_buf(),
            error: e.to_string(),
        })?;
        self.restored = true;
        Ok(())
    }
}

impl Drop for SwapGuard {
    fn drop(&mut self) {
        if !self.restored {
            if let Err(e) = std::fs::write(&self.path, &self.original) {
                eprintln!(
                    "WARNING: failed to restore original file {}: {e}",
                    self.path.display()
                );
            }
        }
    }
}

/// Unified diff between the original and mutated renderings.
pub fn diff(original: &str, mutated: &str) -> String {
    similar::TextDiff::from_lines(original, mutated)
        .unified_diff()
        .context_radius(3)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn script(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("verdict.sh");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "{body}").unwrap();
        path
    }

    fn delegated(command: String, timeout_secs: u64) -> Outcome {
        let executor = Executor {
            exec_command: Some(command),
            timeout_secs,
            verbose: false,
            debug: false,
            test_recursive: false,
        };
        executor
            .run(Path::new("original.rs"), Path::new("mutant.rs"), Path::new("."))
            .unwrap()
            .outcome
    }

    #[test]
    fn test_delegated_exit_code_table() {
        let dir = tempfile::tempdir().unwrap();
        for (body, expected) in [
            ("exit 0", Outcome::Escaped),
            ("exit 1", Outcome::Killed),
            ("exit 2", Outcome::Skipped),
            ("exit 3", Outcome::Errored),
        ] {
            let path = script(dir.path(), body);
            assert_eq!(
                delegated(format!("sh {}", path.display()), 5),
                expected,
                "{body}"
            );
        }
    }

    #[test]
    fn test_delegated_timeout_kills_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(dir.path(), "sleep 10");
        assert_eq!(delegated(format!("sh {}", path.display()), 1), Outcome::TimedOut);
    }

    #[test]
    fn test_delegated_receives_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(
            dir.path(),
            "[ -n \"$MUTATE_CHANGED\" ] && [ -n \"$MUTATE_ORIGINAL\" ] \
             && [ \"$TEST_RECURSIVE\" = \"false\" ] && exit 2\nexit 3",
        );
        assert_eq!(delegated(format!("sh {}", path.display()), 5), Outcome::Skipped);
    }

    #[test]
    fn test_large_output_does_not_stall_exit() {
        // more output than a pipe buffer holds; the child must still be
        // reaped and classified by its exit code, not the deadline
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg("dd if=/dev/zero bs=1024 count=256 2>/dev/null | tr '\\0' 'x'; exit 1")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        match spawn_and_wait(cmd, Duration::from_secs(3)).unwrap() {
            Waited::Exited {
                success, output, ..
            } => {
                assert!(!success);
                assert!(output.len() >= 256 * 1024);
            }
            Waited::TimedOut => panic!("child stalled on a full pipe"),
        }
    }

    #[test]
    fn test_builtin_classification() {
        assert_eq!(classify_test_output(true, ""), Outcome::Escaped);
        assert_eq!(
            classify_test_output(false, "test failed: assertion `left == right`"),
            Outcome::Killed
        );
        assert_eq!(
            classify_test_output(false, "error[E0308]: mismatched types"),
            Outcome::Skipped
        );
        assert_eq!(
            classify_test_output(false, "error: could not compile `demo`"),
            Outcome::Skipped
        );
    }

    #[test]
    fn test_swap_guard_restores_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.rs");
        std::fs::write(&path, "original").unwrap();

        {
            let _guard = SwapGuard::swap(&path, "mutated").unwrap();
            assert_eq!(std::fs::read_to_string(&path).unwrap(), "mutated");
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn test_swap_guard_restore_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.rs");
        std::fs::write(&path, "original").unwrap();

        let mut guard = SwapGuard::swap(&path, "mutated").unwrap();
        guard.restore().unwrap();
        guard.restore().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn test_diff_marks_changed_lines() {
        let original = "fn f() -> i32 {\n    1 + 2\n}\n";
        let mutated = "fn f() -> i32 {\n    1 - 2\n}\n";
        let d = diff(original, mutated);
        assert!(d.contains("-    1 + 2"));
        assert!(d.contains("+    1 - 2"));
    }

    #[test]
    fn test_outcome_scoring_side() {
        assert!(Outcome::Killed.is_caught());
        assert!(Outcome::Skipped.is_caught());
        assert!(Outcome::Errored.is_caught());
        assert!(!Outcome::Escaped.is_caught());
        assert!(!Outcome::TimedOut.is_caught());
        assert!(!Outcome::Duplicated.is_caught());
    }
}
