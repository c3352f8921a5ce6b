//! End-to-end run over a fixed fixture, driven through the binary with a
//! stub verdict command. Pins the full outcome tuple and checks that
//! repeated runs are identical.

use std::path::{Path, PathBuf};
use std::process::Command;

// Mutations, in walk order:
//   add:    a + b -> a - b                (arithmetic/base)
//   double: x * 2 -> x / 2                (arithmetic/base)
//           2 -> 1, 2 -> 3                (numbers/decrementer, /incrementer)
//   chores: remove either tidy(); call    (statement/remove, x2 -> 1 duplicate)
const FIXTURE: &str = "\
fn add(a: i32, b: i32) -> i32 {
    a + b
}

fn double(x: i32) -> i32 {
    x * 2
}

fn chores() {
    tidy();
    tidy();
}

fn tidy() {}
";

// Lets exactly the `a - b` mutant escape; everything else is killed.
const VERDICT: &str = "grep -q 'a - b' \"$MUTATE_CHANGED\" && exit 0\nexit 1\n";

const SUMMARY: &str =
    "The mutation score is 0.800000 (4 passed, 1 failed, 1 duplicated, 0 skipped, total is 5)";

fn run_once(dir: &Path) -> (String, serde_json::Value) {
    let source = dir.join("fixture.rs");
    let script = dir.join("verdict.sh");
    std::fs::write(&source, FIXTURE).unwrap();
    std::fs::write(&script, VERDICT).unwrap();

    let output = Command::new(PathBuf::from(env!("CARGO_BIN_EXE_mutiny")))
        .arg(&source)
        .arg("--exec")
        .arg(format!("sh {}", script.display()))
        .arg("--exec-timeout")
        .arg("30")
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .output()
        .unwrap();

    // escaped mutants are reported, not turned into a failing exit code
    assert!(
        output.status.success(),
        "run failed with {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let report = std::fs::read_to_string(dir.join("report.json")).unwrap();
    (stdout, serde_json::from_str(&report).unwrap())
}

fn summary_line(stdout: &str) -> &str {
    stdout
        .lines()
        .find(|l| l.starts_with("The mutation score is"))
        .expect("summary line missing")
}

#[test]
fn test_fixture_run_pins_outcome_tuple() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, report) = run_once(dir.path());

    assert_eq!(summary_line(&stdout), SUMMARY, "full output:\n{stdout}");

    let stats = &report["stats"];
    assert_eq!(stats["totalMutantsCount"], 5);
    assert_eq!(stats["killedCount"], 4);
    assert_eq!(stats["escapedCount"], 1);
    assert_eq!(stats["skippedCount"], 0);
    assert_eq!(stats["errorCount"], 0);
    assert_eq!(stats["timeOutCount"], 0);
    assert_eq!(stats["msi"], 0.8);

    // the one escaped mutant is the arithmetic swap in `add`
    assert_eq!(report["escaped"][0]["mutator"]["mutatorName"], "arithmetic/base");
    assert!(report["escaped"][0]["mutator"]["mutatedSourceCode"]
        .as_str()
        .unwrap()
        .contains("a - b"));
}

#[test]
fn test_repeated_runs_are_identical() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let (stdout_a, report_a) = run_once(first.path());
    let (stdout_b, report_b) = run_once(second.path());

    assert_eq!(summary_line(&stdout_a), summary_line(&stdout_b));
    // file paths differ between runs, the aggregated stats must not
    assert_eq!(report_a["stats"], report_b["stats"]);
}
