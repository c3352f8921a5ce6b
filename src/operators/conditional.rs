//! Conditional operators: comparison negation

use syn::{BinOp, Expr};

use super::{Operator, Site};
use crate::mutation::MutationSpec;
use crate::unit::UnitInfo;

/// `conditional/negated`: negate comparisons, including the boundary
/// (`> ↔ <=`, `< ↔ >=`, `== ↔ !=`).
pub struct Negated;

impl Operator for Negated {
    fn name(&self) -> &'static str {
        "conditional/negated"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Expr {
            id,
            expr: Expr::Binary(b),
        } = site
        else {
            return Vec::new();
        };

        let to = match b.op {
            BinOp::Gt(_) => BinOp::Le(Default::default()),
            BinOp::Lt(_) => BinOp::Ge(Default::default()),
            BinOp::Ge(_) => BinOp::Lt(Default::default()),
            BinOp::Le(_) => BinOp::Gt(Default::default()),
            BinOp::Eq(_) => BinOp::Ne(Default::default()),
            BinOp::Ne(_) => BinOp::Eq(Default::default()),
            _ => return Vec::new(),
        };

        vec![MutationSpec::SwapBinOp { target: *id, to }]
    }
}
