//! Loop operators: break/continue swap, condition falsification, early break

use syn::Expr;

use super::{Operator, Site};
use crate::mutation::MutationSpec;
use crate::unit::UnitInfo;

/// `loop/break`: swap `break` and `continue`. Labeled or value-carrying
/// breaks are left alone because the swap would not type-check.
pub struct Break;

impl Operator for Break {
    fn name(&self) -> &'static str {
        "loop/break"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Expr { id, expr } = site else {
            return Vec::new();
        };

        let with: Expr = match expr {
            Expr::Break(b) if b.expr.is_none() && b.label.is_none() => {
                syn::parse_quote!(continue)
            }
            Expr::Continue(c) if c.label.is_none() => syn::parse_quote!(break),
            _ => return Vec::new(),
        };

        vec![MutationSpec::ReplaceExpr { target: *id, with }]
    }
}

/// `loop/condition`: force a `while` loop with a binary condition to never
/// run (`while a < b` → `while false`).
pub struct Condition;

impl Operator for Condition {
    fn name(&self) -> &'static str {
        "loop/condition"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Expr {
            id,
            expr: Expr::While(w),
        } = site
        else {
            return Vec::new();
        };

        if !matches!(&*w.cond, Expr::Binary(_)) {
            return Vec::new();
        }

        vec![MutationSpec::ReplaceWhileCond {
            target: *id,
            with: syn::parse_quote!(false),
        }]
    }
}

/// `loop/range_break`: make a `for` loop exit on its first iteration by
/// prepending `break;` to the body.
pub struct RangeBreak;

impl Operator for RangeBreak {
    fn name(&self) -> &'static str {
        "loop/range_break"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Expr {
            id,
            expr: Expr::ForLoop(_),
        } = site
        else {
            return Vec::new();
        };

        vec![MutationSpec::PrependLoopBreak { target: *id }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::testutil::expr_mutations;

    #[test]
    fn test_break_swaps_both_ways() {
        assert_eq!(expr_mutations(&Break, "break").len(), 1);
        assert_eq!(expr_mutations(&Break, "continue").len(), 1);
    }

    #[test]
    fn test_break_declines_labeled_and_valued() {
        assert!(expr_mutations(&Break, "break 'outer").is_empty());
        assert!(expr_mutations(&Break, "break 42").is_empty());
        assert!(expr_mutations(&Break, "continue 'outer").is_empty());
    }

    #[test]
    fn test_condition_requires_binary_cond() {
        assert_eq!(
            expr_mutations(&Condition, "while a < b { work(); }").len(),
            1
        );
        assert!(expr_mutations(&Condition, "while running { work(); }").is_empty());
    }

    #[test]
    fn test_range_break() {
        assert_eq!(
            expr_mutations(&RangeBreak, "for x in items { use_it(x); }").len(),
            1
        );
        assert!(expr_mutations(&RangeBreak, "while a < b { work(); }").is_empty());
    }
}
