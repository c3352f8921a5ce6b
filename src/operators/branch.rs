//! Branch operators: match arm body removal

use syn::Expr;

use super::{Operator, Site};
use crate::mutation::MutationSpec;
use crate::unit::UnitInfo;

/// `branch/case`: replace a match arm's body with `()`, simulating a
/// forgotten case.
pub struct Case;

impl Operator for Case {
    fn name(&self) -> &'static str {
        "branch/case"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Arm { id, arm } = site else {
            return Vec::new();
        };

        if is_already_empty(&arm.body) {
            return Vec::new();
        }

        vec![MutationSpec::ReplaceArmBody {
            target: *id,
            with: syn::parse_quote!(()),
        }]
    }
}

fn is_already_empty(body: &Expr) -> bool {
    match body {
        Expr::Tuple(t) => t.elems.is_empty(),
        Expr::Block(b) => b.block.stmts.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::testutil::info;
    use crate::unit::NodeId;

    fn arm_mutations(source: &str) -> Vec<MutationSpec> {
        let expr: Expr = syn::parse_str(source).unwrap();
        let Expr::Match(m) = expr else {
            panic!("expected match expression");
        };
        Case.mutations(
            &info(),
            &Site::Arm {
                id: NodeId(0),
                arm: &m.arms[0],
            },
        )
    }

    #[test]
    fn test_replaces_arm_body() {
        let specs = arm_mutations("match x { 0 => on_zero(), _ => {} }");
        assert_eq!(specs.len(), 1);
        assert!(matches!(specs[0], MutationSpec::ReplaceArmBody { .. }));
    }

    #[test]
    fn test_declines_already_empty_arms() {
        assert!(arm_mutations("match x { 0 => (), _ => {} }").is_empty());
        assert!(arm_mutations("match x { 0 => {}, _ => on_other() }").is_empty());
    }
}
