//! Parsed source units and the pre-order node index
//!
//! A source unit owns one parsed file: the syntax tree (mutated in place by
//! the engine and always restored before the next mutation), the raw on-disk
//! text, and a `NodeIndex` assigning every interesting node a stable id.

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use syn::spanned::Spanned;
use syn::visit::{self, Visit};

use crate::error::{MutationError, Result};

/// Stable identity of an indexed node: its position in a fixed pre-order
/// traversal of the tree. File-relative and monotonically assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Line range occupied by one indexed node (1-indexed, inclusive).
#[derive(Debug, Clone, Copy)]
pub struct NodeInfo {
    pub start_line: usize,
    pub end_line: usize,
}

/// A function item plus the contiguous pre-order id interval of its subtree.
#[derive(Debug, Clone)]
pub struct FnSpan {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub ids: Range<u32>,
}

impl FnSpan {
    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id.0)
    }
}

/// Pre-order index over the nodes the engine cares about: function items,
/// blocks, statements, expressions, and match arms.
#[derive(Debug, Default)]
pub struct NodeIndex {
    nodes: Vec<NodeInfo>,
    pub functions: Vec<FnSpan>,
    /// For each indexed block, the ids of its statements in order.
    block_stmts: HashMap<NodeId, Vec<NodeId>>,
}

impl NodeIndex {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn line_range(&self, id: NodeId) -> Option<(usize, usize)> {
        self.nodes
            .get(id.0 as usize)
            .map(|n| (n.start_line, n.end_line))
    }

    /// All node ids whose start or end line equals one of the given lines.
    pub fn nodes_touching_lines(&self, lines: &[usize]) -> Vec<NodeId> {
        let mut out = Vec::new();
        for (i, info) in self.nodes.iter().enumerate() {
            if lines
                .iter()
                .any(|&l| info.start_line == l || info.end_line == l)
            {
                out.push(NodeId(i as u32));
            }
        }
        out
    }

    pub fn stmt_ids(&self, block: NodeId) -> Option<&[NodeId]> {
        self.block_stmts.get(&block).map(Vec::as_slice)
    }
}

/// Identity and metadata handed to operators in place of type information;
/// `syn` performs no type checking, so this is the whole "semantic" context.
#[derive(Debug, Clone)]
pub struct UnitInfo {
    pub path: PathBuf,
    /// Owning compilation-unit identifier (module name derived from the path)
    pub package: String,
    pub functions: Vec<String>,
}

/// One parsed file under mutation. Owned exclusively by the walker for the
/// duration of its walk; never mutated from two operators at once.
pub struct SourceUnit {
    pub path: PathBuf,
    /// Raw on-disk text, scanned for annotations
    pub source: String,
    pub ast: syn::File,
    pub index: NodeIndex,
    pub info: UnitInfo,
}

impl SourceUnit {
    pub fn parse_file(path: &Path) -> Result<Self> {
        let source =
            std::fs::read_to_string(path).map_err(|e| MutationError::FileReadError {
                file: path.to_path_buf(),
                error: e.to_string(),
            })?;

        Self::parse_source(path, source)
    }

    pub fn parse_source(path: &Path, source: String) -> Result<Self> {
        let ast = syn::parse_file(&source).map_err(|e| MutationError::ParseError {
            file: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let index = build_index(&ast);
        let package = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let info = UnitInfo {
            path: path.to_path_buf(),
            package,
            functions: index.functions.iter().map(|f| f.name.clone()).collect(),
        };

        Ok(SourceUnit {
            path: path.to_path_buf(),
            source,
            ast,
            index,
            info,
        })
    }

    /// Canonical rendering of the current tree state.
    pub fn render(&self) -> String {
        render_file(&self.ast)
    }
}

/// Render a syntax tree to canonical source text.
pub fn render_file(ast: &syn::File) -> String {
    prettyplease::unparse(ast)
}

fn build_index(ast: &syn::File) -> NodeIndex {
    let mut builder = IndexBuilder {
        index: NodeIndex::default(),
        next: 0,
    };
    builder.visit_file(ast);
    builder.index
}

/// Assigns pre-order ids. The counting discipline here (which node types get
/// ids, in which order) is the contract shared with `mutation::Editor` and
/// `engine::PlanBuilder`; all three traversals must stay in lockstep.
struct IndexBuilder {
    index: NodeIndex,
    next: u32,
}

impl IndexBuilder {
    fn enter(&mut self, span: proc_macro2::Span) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        self.index.nodes.push(NodeInfo {
            start_line: span.start().line,
            end_line: span.end().line,
        });
        id
    }
}

impl<'ast> Visit<'ast> for IndexBuilder {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        let id = self.enter(node.span());
        let start_line = node.span().start().line;
        let end_line = node.span().end().line;
        visit::visit_item_fn(self, node);
        self.index.functions.push(FnSpan {
            name: node.sig.ident.to_string(),
            start_line,
            end_line,
            ids: id.0..self.next,
        });
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        let id = self.enter(node.span());
        let start_line = node.span().start().line;
        let end_line = node.span().end().line;
        visit::visit_impl_item_fn(self, node);
        self.index.functions.push(FnSpan {
            name: node.sig.ident.to_string(),
            start_line,
            end_line,
            ids: id.0..self.next,
        });
    }

    fn visit_block(&mut self, node: &'ast syn::Block) {
        let block_id = self.enter(node.span());
        let mut stmt_ids = Vec::with_capacity(node.stmts.len());
        for stmt in &node.stmts {
            stmt_ids.push(NodeId(self.next));
            self.visit_stmt(stmt);
        }
        self.index.block_stmts.insert(block_id, stmt_ids);
    }

    fn visit_stmt(&mut self, node: &'ast syn::Stmt) {
        self.enter(node.span());
        visit::visit_stmt(self, node);
    }

    fn visit_expr(&mut self, node: &'ast syn::Expr) {
        self.enter(node.span());
        visit::visit_expr(self, node);
    }

    fn visit_arm(&mut self, node: &'ast syn::Arm) {
        self.enter(node.span());
        visit::visit_arm(self, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn unit(source: &str) -> SourceUnit {
        SourceUnit::parse_source(&PathBuf::from("test.rs"), source.to_string()).unwrap()
    }

    #[test]
    fn test_index_assigns_ids() {
        let u = unit("fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n");
        assert!(!u.index.is_empty());
        assert_eq!(u.index.functions.len(), 1);
        assert_eq!(u.index.functions[0].name, "add");
    }

    #[test]
    fn test_function_interval_is_contiguous() {
        let u = unit(
            "fn one() -> i32 {\n    1 + 1\n}\n\nfn two() -> i32 {\n    2 * 2\n}\n",
        );
        let fns = &u.index.functions;
        assert_eq!(fns.len(), 2);
        // fn subtrees are disjoint pre-order intervals
        assert!(fns[0].ids.end <= fns[1].ids.start);
        assert!(fns[0].contains(NodeId(fns[0].ids.start)));
        assert!(!fns[0].contains(NodeId(fns[1].ids.start)));
    }

    #[test]
    fn test_line_ranges() {
        let u = unit("fn f() {\n    let x = 1;\n    let y = 2;\n}\n");
        let on_line_2 = u.index.nodes_touching_lines(&[2]);
        assert!(!on_line_2.is_empty());
        for id in on_line_2 {
            let (start, end) = u.index.line_range(id).unwrap();
            assert!(start == 2 || end == 2);
        }
    }

    #[test]
    fn test_block_statement_ids_recorded() {
        let u = unit("fn f() {\n    foo();\n    bar();\n}\n");
        let block = u
            .index
            .block_stmts
            .iter()
            .find(|(_, stmts)| stmts.len() == 2)
            .map(|(id, _)| *id)
            .expect("function body block with two statements");
        let stmts = u.index.stmt_ids(block).unwrap();
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0] < stmts[1]);
    }

    #[test]
    fn test_render_round_trips_parse() {
        let u = unit("fn f() -> i32 {\n    40 + 2\n}\n");
        let rendered = u.render();
        assert!(rendered.contains("40 + 2"));
        // rendering is canonical: parse(render(x)) renders identically
        let reparsed = unit(&rendered);
        assert_eq!(rendered, reparsed.render());
    }
}
