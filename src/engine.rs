//! Mutation discovery and the walk over a source unit
//!
//! Discovery is a single pre-order pass: every indexed node is offered to
//! every registered operator, node-outer and registration-order-inner, so
//! the resulting plan is deterministic for a given file and registry. The
//! `Walker` then drives the plan as a strict apply/revert alternation; any
//! caller that breaks the alternation gets a `ProtocolError` rather than a
//! silently corrupted tree.

use std::ops::Range;

use regex::Regex;
use syn::visit::{self, Visit};

use crate::annotation::Exclusions;
use crate::error::{MutationError, Result};
use crate::filter::NodeFilter;
use crate::mutation::{self, MutationSpec, Undo};
use crate::operators::Site;
use crate::registry::Registry;
use crate::unit::{NodeId, SourceUnit};

/// One discovered mutation: the operator that proposed it plus the edit.
#[derive(Debug, Clone)]
pub struct PlannedMutation {
    pub operator: &'static str,
    pub spec: MutationSpec,
}

/// Discover every mutation in the unit, in walk order. `matcher` restricts
/// discovery to functions whose name it matches.
pub fn plan(
    unit: &SourceUnit,
    registry: &Registry,
    exclusions: &Exclusions,
    filters: &[&dyn NodeFilter],
    matcher: Option<&Regex>,
) -> Vec<PlannedMutation> {
    let allowed: Option<Vec<Range<u32>>> = matcher.map(|re| {
        unit.index
            .functions
            .iter()
            .filter(|f| re.is_match(&f.name))
            .map(|f| f.ids.clone())
            .collect()
    });

    let mut builder = PlanBuilder {
        next: 0,
        unit,
        registry,
        exclusions,
        filters,
        allowed,
        plan: Vec::new(),
    };
    builder.visit_file(&unit.ast);
    builder.plan
}

/// Number of mutations discovery would produce, without applying any.
pub fn count(
    unit: &SourceUnit,
    registry: &Registry,
    exclusions: &Exclusions,
    filters: &[&dyn NodeFilter],
    matcher: Option<&Regex>,
) -> usize {
    plan(unit, registry, exclusions, filters, matcher).len()
}

/// Offers sites to operators while assigning pre-order ids. The counting
/// discipline mirrors `unit::IndexBuilder` and `mutation::Editor`.
struct PlanBuilder<'a> {
    next: u32,
    unit: &'a SourceUnit,
    registry: &'a Registry,
    exclusions: &'a Exclusions,
    filters: &'a [&'a dyn NodeFilter],
    allowed: Option<Vec<Range<u32>>>,
    plan: Vec<PlannedMutation>,
}

impl PlanBuilder<'_> {
    fn bump(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    fn offer(&mut self, site: Site) {
        let id = site.id();
        if let Some(ranges) = &self.allowed {
            if !ranges.iter().any(|r| r.contains(&id.0)) {
                return;
            }
        }

        for op in self.registry.operators() {
            if self.exclusions.should_skip(id, op.name()) {
                continue;
            }
            if self.filters.iter().any(|f| f.should_skip(id, op.name())) {
                continue;
            }
            for spec in op.mutations(&self.unit.info, &site) {
                // removal edits target the block, but the annotation scope
                // belongs to the removed statement's own line
                if let MutationSpec::RemoveStmt { stmt, .. } = &spec {
                    if self.exclusions.should_skip_stmt(*stmt, op.name()) {
                        continue;
                    }
                }
                self.plan.push(PlannedMutation {
                    operator: op.name(),
                    spec,
                });
            }
        }
    }
}

impl<'ast> Visit<'ast> for PlanBuilder<'_> {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.bump();
        visit::visit_item_fn(self, node);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.bump();
        visit::visit_impl_item_fn(self, node);
    }

    fn visit_block(&mut self, node: &'ast syn::Block) {
        let id = self.bump();
        let stmt_ids = self
            .unit
            .index
            .stmt_ids(id)
            .map(<[NodeId]>::to_vec)
            .unwrap_or_default();
        self.offer(Site::Block {
            id,
            block: node,
            stmt_ids: &stmt_ids,
        });
        for stmt in &node.stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, node: &'ast syn::Stmt) {
        let id = self.bump();
        self.offer(Site::Stmt { id, stmt: node });
        visit::visit_stmt(self, node);
    }

    fn visit_expr(&mut self, node: &'ast syn::Expr) {
        let id = self.bump();
        self.offer(Site::Expr { id, expr: node });
        visit::visit_expr(self, node);
    }

    fn visit_arm(&mut self, node: &'ast syn::Arm) {
        let id = self.bump();
        self.offer(Site::Arm { id, arm: node });
        visit::visit_arm(self, node);
    }
}

/// A mutation that is currently applied to the walker's tree.
#[derive(Debug)]
pub struct AppliedMutation {
    pub operator: &'static str,
    /// 1-indexed start line of the mutated node in the original file
    pub line: usize,
    /// Canonical rendering of the whole unit with the mutation applied
    pub rendered: String,
}

enum WalkerState {
    Idle,
    Mutated(Undo),
    Closed,
}

/// Drives a plan over an owned source unit. At most one mutation is live at
/// a time: `next_mutation` and `revert` must strictly alternate.
pub struct Walker {
    unit: SourceUnit,
    original: String,
    plan: Vec<PlannedMutation>,
    pos: usize,
    state: WalkerState,
}

impl Walker {
    pub fn new(unit: SourceUnit, plan: Vec<PlannedMutation>) -> Self {
        let original = unit.render();
        Walker {
            unit,
            original,
            plan,
            pos: 0,
            state: WalkerState::Idle,
        }
    }

    /// Canonical rendering of the unmutated unit.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn unit(&self) -> &SourceUnit {
        &self.unit
    }

    pub fn total(&self) -> usize {
        self.plan.len()
    }

    /// Apply the next planned mutation. Returns `None` once the plan is
    /// exhausted; the walker is closed from then on.
    pub fn next_mutation(&mut self) -> Result<Option<AppliedMutation>> {
        match self.state {
            WalkerState::Mutated(_) => {
                return Err(MutationError::ProtocolError {
                    reason: "next mutation requested while one is still applied".to_string(),
                });
            }
            WalkerState::Closed => return Ok(None),
            WalkerState::Idle => {}
        }

        let Some(planned) = self.plan.get(self.pos) else {
            self.state = WalkerState::Closed;
            return Ok(None);
        };
        self.pos += 1;

        let undo = mutation::apply(&mut self.unit.ast, &planned.spec)?;
        let line = self
            .unit
            .index
            .line_range(planned.spec.reported_node())
            .map(|(start, _)| start)
            .unwrap_or(0);
        let operator = planned.operator;
        let rendered = self.unit.render();
        self.state = WalkerState::Mutated(undo);

        Ok(Some(AppliedMutation {
            operator,
            line,
            rendered,
        }))
    }

    /// Undo the currently applied mutation, restoring the tree.
    pub fn revert(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, WalkerState::Idle) {
            WalkerState::Mutated(undo) => mutation::revert(&mut self.unit.ast, undo),
            other => {
                self.state = other;
                Err(MutationError::ProtocolError {
                    reason: "revert requested with no mutation applied".to_string(),
                })
            }
        }
    }
}
