//! Structural node filters
//!
//! Filters veto mutation sites by structure rather than by annotation. The
//! built-in one excludes capacity arguments: mutating the argument of a
//! `with_capacity` call only changes an allocation hint, so every such
//! mutant is behaviorally equivalent and would inflate the escaped count.

use std::collections::HashSet;

use syn::visit::{self, Visit};
use syn::Expr;

use crate::unit::{NodeId, SourceUnit};

/// A veto on mutation sites, consulted before operators are offered a node.
pub trait NodeFilter {
    fn should_skip(&self, id: NodeId, operator: &str) -> bool;
}

/// Skips the argument subtrees of `with_capacity` calls, both the
/// associated-function form (`Vec::with_capacity(n)`) and the method form.
pub struct SkipCapacityArgs {
    skipped: HashSet<NodeId>,
}

impl SkipCapacityArgs {
    pub fn collect(unit: &SourceUnit) -> Self {
        let mut marker = Marker {
            next: 0,
            inside: 0,
            pending: HashSet::new(),
            skipped: HashSet::new(),
        };
        marker.visit_file(&unit.ast);
        SkipCapacityArgs {
            skipped: marker.skipped,
        }
    }
}

impl NodeFilter for SkipCapacityArgs {
    fn should_skip(&self, id: NodeId, _operator: &str) -> bool {
        self.skipped.contains(&id)
    }
}

/// Mirrors the index's pre-order counting while tracking whether the walk is
/// inside a capacity argument. Arguments are matched by pointer identity:
/// entering a capacity call marks its argument expressions as pending, and
/// the walk flags everything underneath them.
struct Marker {
    next: u32,
    inside: u32,
    pending: HashSet<usize>,
    skipped: HashSet<NodeId>,
}

impl Marker {
    fn enter(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        if self.inside > 0 {
            self.skipped.insert(id);
        }
        id
    }
}

fn addr(expr: &Expr) -> usize {
    expr as *const Expr as usize
}

fn capacity_args(expr: &Expr) -> Option<impl Iterator<Item = &Expr>> {
    match expr {
        Expr::MethodCall(mc) if mc.method == "with_capacity" => Some(mc.args.iter()),
        Expr::Call(call) => match call.func.as_ref() {
            Expr::Path(p)
                if p.path
                    .segments
                    .last()
                    .is_some_and(|s| s.ident == "with_capacity") =>
            {
                Some(call.args.iter())
            }
            _ => None,
        },
        _ => None,
    }
}

impl<'ast> Visit<'ast> for Marker {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.enter();
        visit::visit_item_fn(self, node);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.enter();
        visit::visit_impl_item_fn(self, node);
    }

    fn visit_block(&mut self, node: &'ast syn::Block) {
        self.enter();
        for stmt in &node.stmts {
            self.visit_stmt(stmt);
        }
    }

    fn visit_stmt(&mut self, node: &'ast syn::Stmt) {
        self.enter();
        visit::visit_stmt(self, node);
    }

    fn visit_expr(&mut self, node: &'ast syn::Expr) {
        let is_arg = self.pending.remove(&addr(node));
        if is_arg {
            self.inside += 1;
        }
        self.enter();
        if let Some(args) = capacity_args(node) {
            for arg in args {
                self.pending.insert(addr(arg));
            }
        }
        visit::visit_expr(self, node);
        if is_arg {
            self.inside -= 1;
        }
    }

    fn visit_arm(&mut self, node: &'ast syn::Arm) {
        self.enter();
        visit::visit_arm(self, node);
    }
}
