//! Text layout of the construct tree
//!
//! `rebuild` assigns `line`/`left`/`right` to a node and its descendants.
//! A statement renders its header on one line and its body on the lines
//! below, indented by one level. Columns are 1-based and `right` is
//! exclusive, so a token occupies `[left, right)`.

use super::{Ast, NodeId, NodeKind};
use crate::editor::position::Position;

impl Ast {
    /// Recompute bounds of `id` and its subtree starting at `origin`.
    ///
    /// Returns the position after the last character laid out: for a
    /// statement that is the end of its last body line.
    pub fn rebuild(&mut self, id: NodeId, origin: Position) -> Position {
        let Some(node) = self.get(id) else {
            return origin;
        };
        match node.kind {
            NodeKind::Program => {
                let body = node.body.clone();
                let mut line = origin.line;
                let mut end = origin;
                for stmt in body {
                    end = self.rebuild(stmt, Position::new(line, origin.column));
                    line = end.line + 1;
                }
                if let Some(root) = self.nodes.get_mut(id.0) {
                    root.line = origin.line;
                    root.left = origin.column;
                    root.right = end.column;
                }
                end
            }
            NodeKind::Statement(_) => {
                let tokens = node.tokens.clone();
                let body = node.body.clone();
                let mut column = origin.column;
                for token in tokens {
                    column = self.layout_inline(token, origin.line, column);
                }
                if let Some(stmt) = self.nodes.get_mut(id.0) {
                    stmt.line = origin.line;
                    stmt.left = origin.column;
                    stmt.right = column;
                }
                let mut end = Position::new(origin.line, column);
                let mut line = origin.line + 1;
                let indent = origin.column + self.indent_width;
                for child in body {
                    end = self.rebuild(child, Position::new(line, indent));
                    line = end.line + 1;
                }
                end
            }
            _ => {
                let right = self.layout_inline(id, origin.line, origin.column);
                Position::new(origin.line, right)
            }
        }
    }

    fn layout_inline(&mut self, id: NodeId, line: usize, left: usize) -> usize {
        let Some(node) = self.get(id) else {
            return left;
        };
        let right = if node.tokens.is_empty() {
            left + self.leaf_text(id).chars().count()
        } else {
            let tokens = node.tokens.clone();
            let mut column = left;
            for token in tokens {
                column = self.layout_inline(token, line, column);
            }
            column
        };
        if let Some(entry) = self.nodes.get_mut(id.0) {
            entry.line = line;
            entry.left = left;
            entry.right = right;
        }
        right
    }

    /// Lay out the whole document again
    pub fn relayout(&mut self) {
        self.rebuild(self.root, Position::new(1, 1));
    }

    /// Lay out one statement in place; valid while the line count is unchanged
    pub fn rebuild_line(&mut self, stmt: NodeId) {
        let Some(node) = self.get(stmt) else {
            return;
        };
        let origin = Position::new(node.line, node.left);
        self.rebuild(stmt, origin);
    }

    fn leaf_text(&self, id: NodeId) -> String {
        match self.kind(id) {
            Some(NodeKind::Token(token)) => token.render(),
            Some(NodeKind::Expression(super::ExpressionKind::VariableReference { name })) => {
                name.clone()
            }
            Some(NodeKind::Expression(super::ExpressionKind::Literal(
                super::LiteralKind::Boolean(value),
            ))) => if *value { "True" } else { "False" }.to_string(),
            _ => String::new(),
        }
    }

    /// Render text of a construct's header (no body lines)
    pub fn text(&self, id: NodeId) -> String {
        let Some(node) = self.get(id) else {
            return String::new();
        };
        if node.tokens.is_empty() {
            return self.leaf_text(id);
        }
        node.tokens.iter().map(|token| self.text(*token)).collect()
    }

    /// One string per statement line, indentation included
    pub fn render_lines(&self) -> Vec<String> {
        self.statements_in_order()
            .into_iter()
            .filter_map(|stmt| {
                let node = self.get(stmt)?;
                let indent = " ".repeat(node.left.saturating_sub(1));
                Some(format!("{}{}", indent, self.text(stmt)))
            })
            .collect()
    }

    /// The whole document; what the host buffer must contain
    pub fn render_text(&self) -> String {
        self.render_lines().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Ast, StatementKind};
    use crate::editor::position::Position;

    #[test]
    fn test_body_is_indented_one_level() {
        let mut ast = Ast::new(4);
        let stmt = ast.compound(StatementKind::While);
        let line = ast.node(ast.root()).unwrap().body[0];
        ast.swap_in(line, stmt).unwrap();
        ast.relayout();

        assert_eq!(ast.render_lines(), vec!["while ___:".to_string(), "    ".to_string()]);
        let body_line = ast.node(stmt).unwrap().body[0];
        let node = ast.node(body_line).unwrap();
        assert_eq!((node.line, node.left), (2, 5));
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut ast = Ast::new(2);
        let stmt = ast.for_loop("i");
        let line = ast.node(ast.root()).unwrap().body[0];
        ast.swap_in(line, stmt).unwrap();

        let first = ast.rebuild(ast.root(), Position::new(1, 1));
        let bounds: Vec<_> = (0..ast.len())
            .filter_map(|i| ast.get(super::super::NodeId(i)).map(|n| (n.line, n.left, n.right)))
            .collect();
        let second = ast.rebuild(ast.root(), Position::new(1, 1));
        let again: Vec<_> = (0..ast.len())
            .filter_map(|i| ast.get(super::super::NodeId(i)).map(|n| (n.line, n.left, n.right)))
            .collect();

        assert_eq!(first, second);
        assert_eq!(bounds, again);
        assert_eq!(ast.render_text(), "for i in ___:\n  ");
    }
}
