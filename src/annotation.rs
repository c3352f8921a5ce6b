//! Annotation-based mutation exclusions
//!
//! Three comment markers suppress mutations, plus one global scope from the
//! config file:
//!
//! - `// mutiny-disable-func` in the comment/attribute block directly above
//!   a function excludes every node inside it, for every operator.
//! - `// mutiny-disable-regexp <pattern> [op, op...]` excludes all nodes
//!   whose start or end line matches the pattern anywhere in the file.
//! - `// mutiny-disable-next-line [op, op...]` excludes nodes on the line
//!   immediately below the comment.
//! - `disable_regexps` config entries behave like the regexp marker but
//!   apply to every source unit.
//!
//! An omitted operator list means all operators (`*`).

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::filter::NodeFilter;
use crate::unit::{NodeId, SourceUnit};

pub const FUNC_MARKER: &str = "// mutiny-disable-func";
pub const REGEXP_MARKER: &str = "// mutiny-disable-regexp";
pub const NEXT_LINE_MARKER: &str = "// mutiny-disable-next-line";

const WILDCARD: &str = "*";

/// The set of operator names one annotation suppresses.
#[derive(Debug, Clone)]
pub struct OperatorSet {
    names: Vec<String>,
}

impl OperatorSet {
    fn wildcard() -> Self {
        OperatorSet {
            names: vec![WILDCARD.to_string()],
        }
    }

    /// Parse a comma-separated operator list; empty input means wildcard.
    fn parse(list: &str) -> Self {
        let names: Vec<String> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if names.is_empty() {
            OperatorSet::wildcard()
        } else {
            OperatorSet { names }
        }
    }

    fn matches(&self, operator: &str) -> bool {
        self.names.iter().any(|n| n == operator || n == WILDCARD)
    }
}

type ExclusionTable = HashMap<NodeId, Vec<OperatorSet>>;

/// Builds per-unit exclusion tables. Holds only the process-wide
/// configuration (compiled global patterns); everything per-file lives in
/// the `Exclusions` value returned by [`Processor::collect`].
pub struct Processor {
    global: Vec<(Regex, OperatorSet)>,
}

impl Processor {
    pub fn new() -> Self {
        Processor { global: Vec::new() }
    }

    /// Configure the global regex scope from `<pattern> [op, op...]`
    /// entries. Invalid patterns are reported and dropped.
    pub fn with_global_filters(patterns: &[String]) -> Self {
        let mut global = Vec::new();
        for entry in patterns {
            let (pattern, ops) = split_annotation(entry);
            match Regex::new(pattern) {
                Ok(re) => global.push((re, ops)),
                Err(e) => {
                    eprintln!("Warning: invalid regex in global filter {pattern:?}: {e}");
                }
            }
        }
        Processor { global }
    }

    /// One pass over the unit's comments and functions, producing the
    /// read-only lookup tables consulted during the walk.
    pub fn collect(&self, unit: &SourceUnit) -> Exclusions {
        let mut ex = Exclusions::default();
        let lines: Vec<&str> = unit.source.lines().collect();

        self.collect_functions(unit, &lines, &mut ex);
        self.collect_comments(unit, &lines, &mut ex);
        self.collect_global(unit, &lines, &mut ex);

        // Statement-removal operators act on a block's statement list, not
        // on the annotated statement node itself, so regex- and next-line
        // exclusions are mirrored into a statement-keyed side table. Built
        // fresh for every unit.
        for (id, sets) in ex.regex.iter().chain(ex.line.iter()) {
            ex.stmts.entry(*id).or_default().extend(sets.iter().cloned());
        }

        ex
    }

    fn collect_functions(&self, unit: &SourceUnit, lines: &[&str], ex: &mut Exclusions) {
        for f in &unit.index.functions {
            if function_annotated(lines, f.start_line) {
                ex.functions.extend(f.ids.clone().map(NodeId));
            }
        }
    }

    fn collect_comments(&self, unit: &SourceUnit, lines: &[&str], ex: &mut Exclusions) {
        for (i, raw) in lines.iter().enumerate() {
            let line_no = i + 1;
            let comment = raw.trim_start();

            if let Some(rest) = comment.strip_prefix(REGEXP_MARKER) {
                let (pattern, ops) = split_annotation(rest.trim());
                if pattern.is_empty() {
                    continue;
                }
                match Regex::new(pattern) {
                    Ok(re) => {
                        let matched = matching_lines(lines, &re);
                        record(&mut ex.regex, unit, &matched, &ops);
                    }
                    Err(e) => {
                        eprintln!("Warning: invalid regex in annotation {pattern:?}: {e}");
                    }
                }
            } else if let Some(rest) = comment.strip_prefix(NEXT_LINE_MARKER) {
                let ops = OperatorSet::parse(rest.trim());
                record(&mut ex.line, unit, &[line_no + 1], &ops);
            }
        }
    }

    fn collect_global(&self, unit: &SourceUnit, lines: &[&str], ex: &mut Exclusions) {
        for (re, ops) in &self.global {
            let matched = matching_lines(lines, re);
            if !matched.is_empty() {
                record(&mut ex.global, unit, &matched, ops);
            }
        }
    }
}

impl Default for Processor {
    fn default() -> Self {
        Processor::new()
    }
}

/// Per-unit exclusion tables; read-only after collection.
#[derive(Debug, Default)]
pub struct Exclusions {
    /// Wildcard exclusions from function-scope annotations
    functions: HashSet<NodeId>,
    regex: ExclusionTable,
    line: ExclusionTable,
    global: ExclusionTable,
    /// Propagated copy of `regex` + `line` for statement-removal operators
    stmts: ExclusionTable,
}

impl Exclusions {
    /// Consulted for statements inside blocks targeted by
    /// statement-removal-style operators.
    pub fn should_skip_stmt(&self, id: NodeId, operator: &str) -> bool {
        table_matches(&self.stmts, id, operator)
    }
}

impl NodeFilter for Exclusions {
    fn should_skip(&self, id: NodeId, operator: &str) -> bool {
        self.functions.contains(&id)
            || table_matches(&self.regex, id, operator)
            || table_matches(&self.line, id, operator)
            || table_matches(&self.global, id, operator)
    }
}

fn table_matches(table: &ExclusionTable, id: NodeId, operator: &str) -> bool {
    table
        .get(&id)
        .is_some_and(|sets| sets.iter().any(|s| s.matches(operator)))
}

fn record(table: &mut ExclusionTable, unit: &SourceUnit, lines: &[usize], ops: &OperatorSet) {
    for id in unit.index.nodes_touching_lines(lines) {
        table.entry(id).or_default().push(ops.clone());
    }
}

fn matching_lines(lines: &[&str], re: &Regex) -> Vec<usize> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, l)| re.is_match(l))
        .map(|(i, _)| i + 1)
        .collect()
}

/// Split `<pattern> [op, op...]` into the pattern and its operator set.
fn split_annotation(entry: &str) -> (&str, OperatorSet) {
    match entry.split_once(char::is_whitespace) {
        Some((pattern, list)) => (pattern, OperatorSet::parse(list)),
        None => (entry, OperatorSet::wildcard()),
    }
}

/// True when the contiguous comment/attribute block directly above
/// `fn_start_line` contains the function marker.
fn function_annotated(lines: &[&str], fn_start_line: usize) -> bool {
    let mut line = fn_start_line.saturating_sub(1);
    while line >= 1 {
        let text = lines[line - 1].trim_start();
        if text.starts_with(FUNC_MARKER) {
            return true;
        }
        if text.starts_with("//") || text.starts_with("#[") || text.starts_with("#!") {
            line -= 1;
            continue;
        }
        break;
    }
    false
}
