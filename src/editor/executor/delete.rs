use super::{reject, ActionExecutor, Step};
use crate::editor::ast::{ExpressionKind, NodeId, NodeKind, TokenKind};
use crate::error::{EditorError, Result};
use tracing::debug;

impl<'a> ActionExecutor<'a> {
    /// Turn a filled expression back into the hole it came from
    pub(super) fn delete_expression(&mut self, target: NodeId) -> Result<Step> {
        let ast = &mut self.session.ast;
        if !ast.is_filled(target) {
            return reject("not an expression");
        }
        let Some(slot) = ast.node(target)?.slot.clone() else {
            return reject("this expression has no hole to fall back to");
        };
        let hole = ast.hole(slot);
        ast.swap_in(target, hole)?;
        ast.kill(target);
        debug!("Deleted expression {} into hole {}", target, hole);
        self.select(hole)?;
        Ok(Step::Applied)
    }

    /// Drop one modifier; a chain left with only its base collapses into it
    pub(super) fn delete_modifier(&mut self, target: NodeId) -> Result<Step> {
        let ast = &mut self.session.ast;
        if !ast.kind(target).map(|k| k.is_modifier()).unwrap_or(false) {
            return reject("not a modifier");
        }
        let chain = ast.parent(target).ok_or(EditorError::Detached(target))?;
        if !matches!(
            ast.kind(chain),
            Some(NodeKind::Expression(ExpressionKind::ValueOperation))
        ) {
            return Err(EditorError::UnexpectedConstruct {
                node: chain,
                found: "modifier outside a value operation".to_string(),
            });
        }
        let index = ast.node(target)?.index_in_parent;
        ast.discard(target)?;

        let remaining = ast.node(chain)?.tokens.clone();
        if let [base] = remaining.as_slice() {
            let base = *base;
            ast.unwrap_into(chain, base)?;
            self.caret_after(base)?;
        } else {
            let before = remaining.get(index.saturating_sub(1)).copied().unwrap_or(chain);
            self.caret_after(before)?;
        }
        Ok(Step::Applied)
    }

    /// Remove a binary operator.
    ///
    /// With an empty operand the expression collapses into the other one;
    /// with both operands filled only the operator turns back into a hole.
    pub(super) fn delete_binary_operator(&mut self, target: NodeId) -> Result<Step> {
        let ast = &mut self.session.ast;
        if !matches!(
            ast.kind(target),
            Some(NodeKind::Expression(ExpressionKind::BinaryOperator))
        ) {
            return reject("not a binary expression");
        }
        let tokens = ast.node(target)?.tokens.clone();
        let [left, operator, right] = tokens.as_slice() else {
            return Err(EditorError::UnexpectedConstruct {
                node: target,
                found: format!("binary expression with {} children", tokens.len()),
            });
        };
        let (left, operator, right) = (*left, *operator, *right);
        let is_hole = |id: NodeId| ast.kind(id).map(|k| k.is_expression_hole()).unwrap_or(false);

        if is_hole(right) {
            ast.unwrap_into(target, left)?;
            self.caret_after(left)?;
        } else if is_hole(left) {
            ast.unwrap_into(target, right)?;
            self.caret_after(right)?;
        } else {
            ast.node_mut(operator)?.kind = NodeKind::Token(TokenKind::EmptyOperator);
            ast.mark_changed(target);
            self.select(operator)?;
        }
        Ok(Step::Applied)
    }

    /// Remove an empty list item together with its separator
    pub(super) fn remove_list_item(&mut self) -> Result<Step> {
        let context = self.session.context();
        let Some((list, hole)) = self.session.validator().removable_list_item(Some(&context)) else {
            return reject("no removable list item");
        };
        let ast = &mut self.session.ast;
        let tokens = ast.node(list)?.tokens.clone();
        let index = ast.node(hole)?.index_in_parent;
        let is_separator = |id: Option<&NodeId>| {
            id.and_then(|id| ast.kind(*id))
                .map(|kind| matches!(kind, NodeKind::Token(TokenKind::NonEditable(text)) if text == ", "))
                .unwrap_or(false)
        };
        let (separator, previous) = if index > 0 && is_separator(tokens.get(index - 1)) {
            (tokens[index - 1], index.checked_sub(2).and_then(|i| tokens.get(i)).copied())
        } else if is_separator(tokens.get(index + 1)) {
            (tokens[index + 1], None)
        } else {
            return Err(EditorError::UnexpectedConstruct {
                node: list,
                found: "list item without a separator".to_string(),
            });
        };
        ast.discard(separator)?;
        ast.discard(hole)?;
        match previous {
            Some(item) => self.caret_after(item)?,
            None => self.focus_on(list),
        }
        Ok(Step::Applied)
    }
}
