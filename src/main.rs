//! CLI for mutation testing

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use colored::Colorize;
use regex::Regex;

use mutiny::report::{fingerprint, Blacklist, Mutant, Mutator, Report};
use mutiny::runner::{diff, Executor, Outcome};
use mutiny::{
    engine, targets, Config, Processor, Registry, SkipCapacityArgs, SourceUnit, Walker,
};

#[derive(Parser)]
#[command(name = "mutiny")]
#[command(author, version, about = "AST-based mutation testing for Rust source files", long_about = None)]
struct Cli {
    /// Files or directories to mutate
    targets: Vec<PathBuf>,

    /// Path to a YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Debug output (implies --verbose)
    #[arg(long)]
    debug: bool,

    /// List the built-in mutation operators and exit
    #[arg(long)]
    list_mutators: bool,

    /// List the discovered target files and exit
    #[arg(long)]
    list_files: bool,

    /// Print the syntax tree of every target file and exit
    #[arg(long)]
    print_ast: bool,

    /// Disable operators by exact name or trailing-* prefix (repeatable)
    #[arg(long = "disable", value_name = "PATTERN")]
    disable: Vec<String>,

    /// Only mutate functions whose name matches this regex
    #[arg(long = "match", value_name = "REGEX")]
    match_pattern: Option<String>,

    /// File of mutant fingerprints that must not be executed (repeatable)
    #[arg(long = "blacklist", value_name = "FILE")]
    blacklist: Vec<PathBuf>,

    /// External command deciding each mutant's fate via its exit code
    #[arg(long, value_name = "COMMAND")]
    exec: Option<String>,

    /// Discover and save mutants without executing anything
    #[arg(long)]
    no_exec: bool,

    /// Seconds before a test run is killed
    #[arg(long, default_value_t = 10, value_name = "SECONDS")]
    exec_timeout: u64,

    /// Run tests for the whole workspace instead of a single package
    #[arg(long)]
    test_recursive: bool,

    /// Keep the temporary mutant folder after the run
    #[arg(long)]
    do_not_remove_tmp_folder: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {e:#}", "Error".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let verbose = cli.verbose || cli.debug;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut registry = Registry::builtin();
    registry.disable(&cli.disable);

    if cli.list_mutators {
        for name in registry.list() {
            println!("{name}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    if registry.is_empty() {
        bail!("all mutation operators are disabled");
    }
    if cli.targets.is_empty() {
        bail!("no files or directories to mutate were given");
    }

    let files = targets::discover(&cli.targets, &config)?;
    if cli.list_files {
        for file in &files {
            println!("{}", file.display());
        }
        return Ok(ExitCode::SUCCESS);
    }
    if files.is_empty() {
        bail!("no Rust source files found in the given targets");
    }

    if cli.print_ast {
        for file in &files {
            let unit = SourceUnit::parse_file(file)?;
            println!("{:#?}", unit.ast);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let matcher = cli
        .match_pattern
        .as_deref()
        .map(Regex::new)
        .transpose()
        .context("invalid --match pattern")?;

    let mut blacklist = Blacklist::load(&cli.blacklist)?;
    let processor = Processor::with_global_filters(&config.disable_regexps);
    let executor = Executor {
        exec_command: cli.exec.clone(),
        timeout_secs: cli.exec_timeout,
        verbose,
        debug: cli.debug,
        test_recursive: cli.test_recursive,
    };

    let tmp = tempfile::Builder::new()
        .prefix("mutiny-")
        .tempdir()
        .context("failed to create temporary mutant folder")?;
    let tmp_dir = if cli.do_not_remove_tmp_folder {
        let path = tmp.keep();
        println!("Mutants are kept in {}", path.display());
        path
    } else {
        tmp.path().to_path_buf()
    };

    let mut report = Report::new();
    let mut executed_any = false;

    for file in &files {
        let unit = SourceUnit::parse_file(file)?;
        if let Some(reason) = targets::skip_reason(&unit.source, &config) {
            if verbose {
                println!("Skip {}: {reason}", file.display());
            }
            continue;
        }

        let exclusions = processor.collect(&unit);
        let capacity_filter = SkipCapacityArgs::collect(&unit);
        let filters: [&dyn mutiny::NodeFilter; 1] = [&capacity_filter];
        let plan = engine::plan(&unit, &registry, &exclusions, &filters, matcher.as_ref());

        if verbose {
            println!("Found {} mutations for {}", plan.len(), file.display());
        }

        let package_dir = find_package_dir(file);
        let mut walker = Walker::new(unit, plan);
        let mut mutant_no = 0usize;

        while let Some(applied) = walker.next_mutation()? {
            let digest = fingerprint(&applied.rendered);
            if !blacklist.insert(digest) {
                if verbose {
                    println!(
                        "{} {} at {}:{}",
                        "DUPLICATE".dimmed(),
                        applied.operator,
                        file.display(),
                        applied.line
                    );
                }
                report.record(Outcome::Duplicated, Mutant::default());
                walker.revert()?;
                continue;
            }

            let mutant_path = tmp_dir.join(mutant_file_name(file, mutant_no));
            mutant_no += 1;
            std::fs::write(&mutant_path, &applied.rendered).with_context(|| {
                format!("failed to save mutant to {}", mutant_path.display())
            })?;

            if cli.no_exec {
                if verbose {
                    println!("Saved mutant to {}", mutant_path.display());
                }
                walker.revert()?;
                continue;
            }

            let result = executor.run(file, &mutant_path, &package_dir)?;
            executed_any = true;

            let mutant = Mutant {
                mutator: Mutator {
                    mutator_name: applied.operator.to_string(),
                    original_source_code: walker.original().to_string(),
                    mutated_source_code: applied.rendered.clone(),
                    original_file_path: file.display().to_string(),
                    original_start_line: applied.line as u64,
                },
                diff: diff(walker.original(), &applied.rendered),
                process_output: result.output.clone(),
            };

            if !config.silent_mode {
                print_verdict(result.outcome, &mutant, applied.operator, file, applied.line);
            }
            report.record(result.outcome, mutant);
            walker.revert()?;
        }
    }

    if cli.no_exec || !executed_any {
        println!("Cannot do a mutation testing summary since no mutant was executed.");
        return Ok(ExitCode::SUCCESS);
    }

    report.calculate();
    if !config.silent_mode {
        report.print_summary();
    }
    report.write_json(Path::new("report.json"))?;
    if config.json_output {
        println!("{}", report.to_json()?);
    }

    // escaped mutants are the report's verdict, not a process failure
    Ok(ExitCode::SUCCESS)
}

fn print_verdict(outcome: Outcome, mutant: &Mutant, operator: &str, file: &Path, line: usize) {
    let location = format!("{} at {}:{}", operator, file.display(), line);
    match outcome {
        Outcome::Killed => println!("{} {location}", "PASS".green().bold()),
        Outcome::Escaped => {
            println!("{} {location}", "FAIL".red().bold());
            print!("{}", mutant.diff);
        }
        Outcome::Skipped => println!("{} {location}", "SKIP".yellow().bold()),
        Outcome::TimedOut => println!("{} {location}", "TIMEOUT".yellow().bold()),
        Outcome::Errored => println!("{} {location}", "ERROR".red().bold()),
        Outcome::Duplicated => {}
    }
}

/// The directory whose `Cargo.toml` owns this file, falling back to the
/// current directory.
fn find_package_dir(file: &Path) -> PathBuf {
    let mut dir = file.parent();
    while let Some(d) = dir {
        if d.join("Cargo.toml").is_file() {
            return d.to_path_buf();
        }
        dir = d.parent();
    }
    PathBuf::from(".")
}

/// Flat, collision-free mutant file name inside the tmp folder.
fn mutant_file_name(file: &Path, index: usize) -> String {
    let flattened = file
        .display()
        .to_string()
        .replace(['/', '\\', ':'], "_")
        .trim_start_matches('_')
        .to_string();
    format!("{flattened}.{index}")
}
