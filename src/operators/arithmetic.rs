//! Arithmetic operators: base math, bitwise, and compound assignment

use syn::{BinOp, Expr, ExprAssign};

use super::{Operator, Site};
use crate::mutation::MutationSpec;
use crate::unit::UnitInfo;

fn swap(site: &Site, to: BinOp) -> Vec<MutationSpec> {
    vec![MutationSpec::SwapBinOp {
        target: site.id(),
        to,
    }]
}

/// `arithmetic/base`: invert base arithmetic (`+ ↔ -`, `* ↔ /`, `% → *`).
pub struct Base;

impl Operator for Base {
    fn name(&self) -> &'static str {
        "arithmetic/base"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Expr {
            expr: Expr::Binary(b),
            ..
        } = site
        else {
            return Vec::new();
        };

        let to = match b.op {
            BinOp::Add(_) => BinOp::Sub(Default::default()),
            BinOp::Sub(_) => BinOp::Add(Default::default()),
            BinOp::Mul(_) => BinOp::Div(Default::default()),
            BinOp::Div(_) => BinOp::Mul(Default::default()),
            BinOp::Rem(_) => BinOp::Mul(Default::default()),
            _ => return Vec::new(),
        };

        swap(site, to)
    }
}

/// `arithmetic/bitwise`: swap bitwise operators (`& ↔ |`, `^ → &`, shifts).
pub struct Bitwise;

impl Operator for Bitwise {
    fn name(&self) -> &'static str {
        "arithmetic/bitwise"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Expr {
            expr: Expr::Binary(b),
            ..
        } = site
        else {
            return Vec::new();
        };

        let to = match b.op {
            BinOp::BitAnd(_) => BinOp::BitOr(Default::default()),
            BinOp::BitOr(_) => BinOp::BitAnd(Default::default()),
            BinOp::BitXor(_) => BinOp::BitAnd(Default::default()),
            BinOp::Shl(_) => BinOp::Shr(Default::default()),
            BinOp::Shr(_) => BinOp::Shl(Default::default()),
            _ => return Vec::new(),
        };

        swap(site, to)
    }
}

/// `arithmetic/assignment`: reduce compound assignment to plain assignment
/// (`a += b` → `a = b`).
pub struct Assignment;

impl Operator for Assignment {
    fn name(&self) -> &'static str {
        "arithmetic/assignment"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Expr {
            id,
            expr: Expr::Binary(b),
        } = site
        else {
            return Vec::new();
        };

        if !is_compound_assign(&b.op) {
            return Vec::new();
        }

        let plain = Expr::Assign(ExprAssign {
            attrs: Vec::new(),
            left: b.left.clone(),
            eq_token: Default::default(),
            right: b.right.clone(),
        });

        vec![MutationSpec::ReplaceExpr {
            target: *id,
            with: plain,
        }]
    }
}

/// `arithmetic/assign_invert`: invert compound assignment (`+= ↔ -=`,
/// `*= ↔ /=`, `%= → *=`).
pub struct AssignInvert;

impl Operator for AssignInvert {
    fn name(&self) -> &'static str {
        "arithmetic/assign_invert"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Expr {
            expr: Expr::Binary(b),
            ..
        } = site
        else {
            return Vec::new();
        };

        let to = match b.op {
            BinOp::AddAssign(_) => BinOp::SubAssign(Default::default()),
            BinOp::SubAssign(_) => BinOp::AddAssign(Default::default()),
            BinOp::MulAssign(_) => BinOp::DivAssign(Default::default()),
            BinOp::DivAssign(_) => BinOp::MulAssign(Default::default()),
            BinOp::RemAssign(_) => BinOp::MulAssign(Default::default()),
            _ => return Vec::new(),
        };

        swap(site, to)
    }
}

fn is_compound_assign(op: &BinOp) -> bool {
    matches!(
        op,
        BinOp::AddAssign(_)
            | BinOp::SubAssign(_)
            | BinOp::MulAssign(_)
            | BinOp::DivAssign(_)
            | BinOp::RemAssign(_)
            | BinOp::BitAndAssign(_)
            | BinOp::BitOrAssign(_)
            | BinOp::BitXorAssign(_)
            | BinOp::ShlAssign(_)
            | BinOp::ShrAssign(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::testutil::expr_mutations;

    #[test]
    fn test_base_swaps_each_operator() {
        for (source, expected) in [
            ("a + b", BinOp::Sub(Default::default())),
            ("a - b", BinOp::Add(Default::default())),
            ("a * b", BinOp::Div(Default::default())),
            ("a / b", BinOp::Mul(Default::default())),
            ("a % b", BinOp::Mul(Default::default())),
        ] {
            let specs = expr_mutations(&Base, source);
            assert_eq!(specs.len(), 1, "for {source}");
            match &specs[0] {
                MutationSpec::SwapBinOp { to, .. } => assert_eq!(*to, expected),
                other => panic!("unexpected spec {other:?}"),
            }
        }
    }

    #[test]
    fn test_base_declines_unrelated_nodes() {
        assert!(expr_mutations(&Base, "a == b").is_empty());
        assert!(expr_mutations(&Base, "foo()").is_empty());
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(expr_mutations(&Bitwise, "a & b").len(), 1);
        assert_eq!(expr_mutations(&Bitwise, "a << b").len(), 1);
        assert!(expr_mutations(&Bitwise, "a + b").is_empty());
    }

    #[test]
    fn test_assignment_reduces_to_plain() {
        let specs = expr_mutations(&Assignment, "a += b");
        assert_eq!(specs.len(), 1);
        assert!(matches!(
            &specs[0],
            MutationSpec::ReplaceExpr {
                with: Expr::Assign(_),
                ..
            }
        ));
        // plain assignment is not a candidate
        assert!(expr_mutations(&Assignment, "a == b").is_empty());
    }

    #[test]
    fn test_assign_invert() {
        assert_eq!(expr_mutations(&AssignInvert, "a += b").len(), 1);
        assert_eq!(expr_mutations(&AssignInvert, "a %= b").len(), 1);
        assert!(expr_mutations(&AssignInvert, "a &= b").is_empty());
    }
}
