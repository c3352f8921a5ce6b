//! Built-in mutation operators
//!
//! Operators are stateless and identified by a dotted name such as
//! `arithmetic/base`. Each declines nodes it does not recognize by returning
//! an empty list.

use syn::{Arm, Block, Expr, Stmt};

use crate::mutation::MutationSpec;
use crate::unit::{NodeId, UnitInfo};

pub mod arithmetic;
pub mod branch;
pub mod conditional;
pub mod loops;
pub mod numbers;
pub mod statement;

/// A mutable site offered to operators during discovery. The id is the
/// node's pre-order position in the unit's index.
pub enum Site<'a> {
    Expr { id: NodeId, expr: &'a Expr },
    Stmt { id: NodeId, stmt: &'a Stmt },
    Block {
        id: NodeId,
        block: &'a Block,
        stmt_ids: &'a [NodeId],
    },
    Arm { id: NodeId, arm: &'a Arm },
}

impl Site<'_> {
    pub fn id(&self) -> NodeId {
        match self {
            Site::Expr { id, .. }
            | Site::Stmt { id, .. }
            | Site::Block { id, .. }
            | Site::Arm { id, .. } => *id,
        }
    }
}

/// A mutation operator: given a site and the unit's metadata, proposes zero
/// or more reversible edits.
pub trait Operator {
    fn name(&self) -> &'static str;
    fn mutations(&self, info: &UnitInfo, site: &Site) -> Vec<MutationSpec>;
}

/// All built-in operators in registration order. The order is fixed
/// (alphabetical by dotted name) so mutation discovery is reproducible.
pub fn builtin() -> Vec<Box<dyn Operator>> {
    vec![
        Box::new(arithmetic::AssignInvert),
        Box::new(arithmetic::Assignment),
        Box::new(arithmetic::Base),
        Box::new(arithmetic::Bitwise),
        Box::new(branch::Case),
        Box::new(conditional::Negated),
        Box::new(loops::Break),
        Box::new(loops::Condition),
        Box::new(loops::RangeBreak),
        Box::new(numbers::Decrementer),
        Box::new(numbers::Incrementer),
        Box::new(statement::Remove),
    ]
}
