//! Statement operators: statement removal

use syn::Stmt;

use super::{Operator, Site};
use crate::mutation::MutationSpec;
use crate::unit::UnitInfo;

/// `statement/remove`: delete one expression statement from a block. Only
/// semicolon-terminated expression and macro statements are candidates;
/// removing `let` bindings or a trailing value expression almost never
/// compiles and would only inflate the skipped count.
pub struct Remove;

impl Operator for Remove {
    fn name(&self) -> &'static str {
        "statement/remove"
    }

    fn mutations(&self, _info: &UnitInfo, site: &Site) -> Vec<MutationSpec> {
        let Site::Block {
            id,
            block,
            stmt_ids,
        } = site
        else {
            return Vec::new();
        };

        block
            .stmts
            .iter()
            .enumerate()
            .filter(|(_, stmt)| removable(stmt))
            .map(|(index, _)| MutationSpec::RemoveStmt {
                block: *id,
                index,
                stmt: stmt_ids[index],
            })
            .collect()
    }
}

fn removable(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Expr(_, semi) => semi.is_some(),
        Stmt::Macro(m) => m.semi_token.is_some(),
        _ => false,
    }
}
