//! Reversible mutations over the syntax tree
//!
//! A `MutationSpec` is a closed description of one edit, keyed by the
//! `NodeId` of the shallowest node it modifies. Applying a spec returns an
//! `Undo` value; reverting the undo restores the tree byte-for-byte (in its
//! canonical rendering). Because every spec targets the shallowest modified
//! node, pre-order ids at or before the target stay valid while the mutation
//! is live, so revert always finds its node.

use syn::visit_mut::{self, VisitMut};
use syn::{BinOp, Expr, Stmt};

use crate::error::{MutationError, Result};
use crate::unit::NodeId;

/// One reversible edit, produced by an operator during discovery.
#[derive(Debug, Clone)]
pub enum MutationSpec {
    /// Swap the operator of a binary expression
    SwapBinOp { target: NodeId, to: BinOp },
    /// Replace an expression wholesale
    ReplaceExpr { target: NodeId, with: Expr },
    /// Replace the condition of a `while` loop
    ReplaceWhileCond { target: NodeId, with: Expr },
    /// Replace the body of a match arm
    ReplaceArmBody { target: NodeId, with: Expr },
    /// Remove the statement at `index` from a block; `stmt` is the removed
    /// statement's own id, used by the statement-level exclusion tables
    RemoveStmt {
        block: NodeId,
        index: usize,
        stmt: NodeId,
    },
    /// Prepend `break;` to a `for` loop body
    PrependLoopBreak { target: NodeId },
}

impl MutationSpec {
    /// The shallowest node the edit touches; filters consult this id.
    pub fn target(&self) -> NodeId {
        match self {
            MutationSpec::SwapBinOp { target, .. }
            | MutationSpec::ReplaceExpr { target, .. }
            | MutationSpec::ReplaceWhileCond { target, .. }
            | MutationSpec::ReplaceArmBody { target, .. }
            | MutationSpec::PrependLoopBreak { target } => *target,
            MutationSpec::RemoveStmt { block, .. } => *block,
        }
    }

    /// The node whose source line is reported for this mutation.
    pub fn reported_node(&self) -> NodeId {
        match self {
            MutationSpec::RemoveStmt { stmt, .. } => *stmt,
            _ => self.target(),
        }
    }
}

/// Inverse of an applied `MutationSpec`.
#[derive(Debug)]
pub enum Undo {
    BinOp { target: NodeId, op: BinOp },
    Expr { target: NodeId, expr: Expr },
    WhileCond { target: NodeId, cond: Expr },
    ArmBody { target: NodeId, body: Expr },
    ReinsertStmt {
        block: NodeId,
        index: usize,
        stmt: Stmt,
    },
    StripLoopBreak { target: NodeId },
}

/// Apply a mutation to the tree, returning its inverse.
pub fn apply(ast: &mut syn::File, spec: &MutationSpec) -> Result<Undo> {
    let action = match spec.clone() {
        MutationSpec::SwapBinOp { target, to } => EditAction::SwapBinOp { target, to },
        MutationSpec::ReplaceExpr { target, with } => EditAction::ReplaceExpr { target, with },
        MutationSpec::ReplaceWhileCond { target, with } => {
            EditAction::ReplaceWhileCond { target, with }
        }
        MutationSpec::ReplaceArmBody { target, with } => {
            EditAction::ReplaceArmBody { target, with }
        }
        MutationSpec::RemoveStmt { block, index, .. } => EditAction::RemoveStmt { block, index },
        MutationSpec::PrependLoopBreak { target } => EditAction::PrependLoopBreak { target },
    };

    match run_editor(ast, action)? {
        Edited::Undoable(undo) => Ok(undo),
        Edited::Reverted => Err(MutationError::FailedToApply {
            reason: "revert-only edit used as a mutation".to_string(),
        }),
    }
}

/// Revert a previously applied mutation.
pub fn revert(ast: &mut syn::File, undo: Undo) -> Result<()> {
    let action = match undo {
        Undo::BinOp { target, op } => EditAction::SwapBinOp { target, to: op },
        Undo::Expr { target, expr } => EditAction::ReplaceExpr { target, with: expr },
        Undo::WhileCond { target, cond } => EditAction::ReplaceWhileCond { target, with: cond },
        Undo::ArmBody { target, body } => EditAction::ReplaceArmBody { target, with: body },
        Undo::ReinsertStmt { block, index, stmt } => {
            EditAction::InsertStmt { block, index, stmt }
        }
        Undo::StripLoopBreak { target } => EditAction::StripLoopBreak { target },
    };

    run_editor(ast, action).map(|_| ())
}

/// What an edit left behind: a live mutation that can be undone, or the
/// restored original. Revert-only edits (`InsertStmt`, `StripLoopBreak`)
/// have no meaningful inverse, so they report `Reverted` instead.
#[derive(Debug)]
enum Edited {
    Undoable(Undo),
    Reverted,
}

fn run_editor(ast: &mut syn::File, action: EditAction) -> Result<Edited> {
    let target = action.target();
    let mut editor = Editor {
        next: 0,
        action: Some(action),
        result: None,
        error: None,
    };
    editor.visit_file_mut(ast);

    if let Some(reason) = editor.error {
        return Err(MutationError::FailedToApply { reason });
    }
    editor.result.ok_or_else(|| MutationError::FailedToApply {
        reason: format!("node {:?} not found during edit", target),
    })
}

#[derive(Debug)]
enum EditAction {
    SwapBinOp { target: NodeId, to: BinOp },
    ReplaceExpr { target: NodeId, with: Expr },
    ReplaceWhileCond { target: NodeId, with: Expr },
    ReplaceArmBody { target: NodeId, with: Expr },
    RemoveStmt { block: NodeId, index: usize },
    InsertStmt {
        block: NodeId,
        index: usize,
        stmt: Stmt,
    },
    PrependLoopBreak { target: NodeId },
    StripLoopBreak { target: NodeId },
}

impl EditAction {
    fn target(&self) -> NodeId {
        match self {
            EditAction::SwapBinOp { target, .. }
            | EditAction::ReplaceExpr { target, .. }
            | EditAction::ReplaceWhileCond { target, .. }
            | EditAction::ReplaceArmBody { target, .. }
            | EditAction::PrependLoopBreak { target }
            | EditAction::StripLoopBreak { target } => *target,
            EditAction::RemoveStmt { block, .. } | EditAction::InsertStmt { block, .. } => *block,
        }
    }
}

/// Navigates to a `NodeId` and performs one edit. The id counting here must
/// mirror `unit::IndexBuilder` exactly: same node types, same order.
struct Editor {
    next: u32,
    action: Option<EditAction>,
    result: Option<Edited>,
    error: Option<String>,
}

impl Editor {
    fn bump(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    fn finished(&self) -> bool {
        self.action.is_none()
    }

    fn is_target(&self, id: NodeId) -> bool {
        self.action
            .as_ref()
            .map(|a| a.target() == id)
            .unwrap_or(false)
    }

    fn fail(&mut self, reason: String) {
        self.error = Some(reason);
    }

    fn edit_expr(&mut self, node: &mut Expr) {
        let action = self.action.take().expect("action present at target");
        match action {
            EditAction::SwapBinOp { target, to } => match node {
                Expr::Binary(b) => {
                    let old = b.op;
                    b.op = to;
                    self.result = Some(Edited::Undoable(Undo::BinOp { target, op: old }));
                }
                _ => self.fail("SwapBinOp target is not a binary expression".to_string()),
            },
            EditAction::ReplaceExpr { target, with } => {
                let old = std::mem::replace(node, with);
                self.result = Some(Edited::Undoable(Undo::Expr { target, expr: old }));
            }
            EditAction::ReplaceWhileCond { target, with } => match node {
                Expr::While(w) => {
                    let old = std::mem::replace(&mut *w.cond, with);
                    self.result = Some(Edited::Undoable(Undo::WhileCond { target, cond: old }));
                }
                _ => self.fail("ReplaceWhileCond target is not a while loop".to_string()),
            },
            EditAction::PrependLoopBreak { target } => match node {
                Expr::ForLoop(f) => {
                    f.body.stmts.insert(0, syn::parse_quote!(break;));
                    self.result = Some(Edited::Undoable(Undo::StripLoopBreak { target }));
                }
                _ => self.fail("PrependLoopBreak target is not a for loop".to_string()),
            },
            EditAction::StripLoopBreak { .. } => match node {
                Expr::ForLoop(f) if !f.body.stmts.is_empty() => {
                    f.body.stmts.remove(0);
                    self.result = Some(Edited::Reverted);
                }
                _ => self.fail("StripLoopBreak target has no statement to strip".to_string()),
            },
            other => self.fail(format!("{other:?} targeted an expression node")),
        }
    }

    fn edit_block(&mut self, node: &mut syn::Block) {
        let action = self.action.take().expect("action present at target");
        match action {
            EditAction::RemoveStmt { block, index } => {
                if index < node.stmts.len() {
                    let stmt = node.stmts.remove(index);
                    self.result = Some(Edited::Undoable(Undo::ReinsertStmt { block, index, stmt }));
                } else {
                    self.fail(format!("statement index {index} out of bounds"));
                }
            }
            EditAction::InsertStmt { index, stmt, .. } => {
                if index <= node.stmts.len() {
                    node.stmts.insert(index, stmt);
                    self.result = Some(Edited::Reverted);
                } else {
                    self.fail(format!("statement index {index} out of bounds"));
                }
            }
            other => self.fail(format!("{other:?} targeted a block node")),
        }
    }

    fn edit_arm(&mut self, node: &mut syn::Arm) {
        let action = self.action.take().expect("action present at target");
        match action {
            EditAction::ReplaceArmBody { target, with } => {
                let old = std::mem::replace(&mut *node.body, with);
                self.result = Some(Edited::Undoable(Undo::ArmBody { target, body: old }));
            }
            other => self.fail(format!("{other:?} targeted a match arm")),
        }
    }
}

impl VisitMut for Editor {
    fn visit_item_fn_mut(&mut self, node: &mut syn::ItemFn) {
        self.bump();
        if self.finished() {
            return;
        }
        visit_mut::visit_item_fn_mut(self, node);
    }

    fn visit_impl_item_fn_mut(&mut self, node: &mut syn::ImplItemFn) {
        self.bump();
        if self.finished() {
            return;
        }
        visit_mut::visit_impl_item_fn_mut(self, node);
    }

    fn visit_block_mut(&mut self, node: &mut syn::Block) {
        let id = self.bump();
        if self.finished() {
            return;
        }
        if self.is_target(id) {
            self.edit_block(node);
            return;
        }
        visit_mut::visit_block_mut(self, node);
    }

    fn visit_stmt_mut(&mut self, node: &mut Stmt) {
        self.bump();
        if self.finished() {
            return;
        }
        visit_mut::visit_stmt_mut(self, node);
    }

    fn visit_expr_mut(&mut self, node: &mut Expr) {
        let id = self.bump();
        if self.finished() {
            return;
        }
        if self.is_target(id) {
            self.edit_expr(node);
            return;
        }
        visit_mut::visit_expr_mut(self, node);
    }

    fn visit_arm_mut(&mut self, node: &mut syn::Arm) {
        let id = self.bump();
        if self.finished() {
            return;
        }
        if self.is_target(id) {
            self.edit_arm(node);
            return;
        }
        visit_mut::visit_arm_mut(self, node);
    }
}
