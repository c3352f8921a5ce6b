//! Number operators: literal increment and decrement

use syn::{Expr, Lit};

use super::{Operator, Site};
use crate::mutation::MutationSpec;
use crate::unit::{NodeId, UnitInfo};

/// `numbers/incrementer`: bump integer and float literals by one.
pub struct Incrementer;

impl Operator for Incrementer {
    fn name(&self) -> &'static str {
        "numbers/incrementer"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Expr { id, expr } = site else {
            return Vec::new();
        };
        shift_literal(*id, expr, 1)
    }
}

/// `numbers/decrementer`: lower integer and float literals by one.
pub struct Decrementer;

impl Operator for Decrementer {
    fn name(&self) -> &'static str {
        "numbers/decrementer"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Expr { id, expr } = site else {
            return Vec::new();
        };
        shift_literal(*id, expr, -1)
    }
}

fn shift_literal(target: NodeId, expr: &Expr, delta: i64) -> Vec<MutationSpec> {
    let Expr::Lit(lit) = expr else {
        return Vec::new();
    };

    let replacement = match &lit.lit {
        Lit::Int(int) => {
            let Ok(value) = int.base10_digits().parse::<i128>() else {
                return Vec::new();
            };
            let shifted = value + i128::from(delta);
            format!("{}{}", shifted, int.suffix())
        }
        Lit::Float(float) => {
            let Ok(value) = float.base10_digits().parse::<f64>() else {
                return Vec::new();
            };
            let shifted = value + delta as f64;
            // {:?} keeps the decimal point so the literal stays a float
            format!("{:?}{}", shifted, float.suffix())
        }
        _ => return Vec::new(),
    };

    // `0 - 1` renders as the unary expression `-1`; parse rather than build
    // the literal directly so that case stays valid.
    let Ok(with) = syn::parse_str::<Expr>(&replacement) else {
        return Vec::new();
    };

    vec![MutationSpec::ReplaceExpr { target, with }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::testutil::expr_mutations;
    use quote::ToTokens;

    fn replacement_text(specs: &[MutationSpec]) -> String {
        match &specs[0] {
            MutationSpec::ReplaceExpr { with, .. } => with.to_token_stream().to_string(),
            other => panic!("unexpected spec {other:?}"),
        }
    }

    #[test]
    fn test_increment_int() {
        let specs = expr_mutations(&Incrementer, "41");
        assert_eq!(specs.len(), 1);
        assert_eq!(replacement_text(&specs), "42");
    }

    #[test]
    fn test_decrement_int_through_zero() {
        let specs = expr_mutations(&Decrementer, "0");
        assert_eq!(specs.len(), 1);
        assert_eq!(replacement_text(&specs), "- 1");
    }

    #[test]
    fn test_suffix_preserved() {
        let specs = expr_mutations(&Incrementer, "10u64");
        assert_eq!(replacement_text(&specs), "11u64");
    }

    #[test]
    fn test_float_stays_float() {
        let specs = expr_mutations(&Decrementer, "4.0");
        assert_eq!(replacement_text(&specs), "3.0");
    }

    #[test]
    fn test_declines_other_literals() {
        assert!(expr_mutations(&Incrementer, "\"text\"").is_empty());
        assert!(expr_mutations(&Incrementer, "true").is_empty());
        assert!(expr_mutations(&Decrementer, "'c'").is_empty());
    }
}
