//! Character edits inside editable text and autocomplete tokens

use super::{reject, ActionExecutor, Step};
use crate::editor::ast::capability::TextEditable;
use crate::editor::ast::{AutocompleteContext, NodeId, NodeKind, TokenKind, TypeSet};
use crate::editor::autocomplete::{AutocompleteMatcher, MatchOutcome};
use crate::editor::focus::{is_blank_line, Focus};
use crate::editor::position::Position;
use crate::error::{EditorError, Result};
use tracing::debug;

/// Where an autocomplete token sits and how to undo it
pub(crate) enum TokenSite {
    /// Sole token of an empty line
    Line(NodeId),
    /// In place of an expression hole, carrying its slot
    Hole(TypeSet),
    /// Right after an expression in its parent's tokens
    After(NodeId),
}

impl<'a> ActionExecutor<'a> {
    pub(super) fn insert_char(&mut self, ch: char) -> Result<Step> {
        let context = self.session.context();
        if context.autocomplete.is_some() {
            return self.insert_autocomplete_char(ch);
        }
        if !self.session.validator().can_insert_char_in_text(ch, Some(&context)) {
            return reject(format!("'{}' is not allowed here", ch));
        }
        let Some(token) = context.text_editable else {
            return reject("not inside editable text");
        };
        let offset = self.offset_in(token, context.column())?;
        self.edit_text(token, |chars| chars.insert(offset, ch))?;
        self.session.focus = Focus::caret(Position::new(context.line(), context.column() + 1));
        Ok(Step::Applied)
    }

    pub(super) fn delete_char(&mut self) -> Result<Step> {
        let context = self.session.context();
        if let Some(token) = context.autocomplete {
            let offset = self.offset_in(token, context.column())?;
            if offset == 0 {
                return reject("start of the token");
            }
            return self.remove_autocomplete_char(token, offset - 1, context.column() - 1);
        }
        if !self.session.validator().can_delete_char_in_text(Some(&context)) {
            return reject("nothing to delete");
        }
        let Some(token) = context.text_editable else {
            return reject("not inside editable text");
        };
        let offset = self.offset_in(token, context.column())?;
        self.edit_text(token, |chars| {
            chars.remove(offset - 1);
        })?;
        self.session.focus = Focus::caret(Position::new(context.line(), context.column() - 1));
        Ok(Step::Applied)
    }

    pub(super) fn delete_next_char(&mut self) -> Result<Step> {
        let context = self.session.context();
        if let Some(token) = context.autocomplete {
            let offset = self.offset_in(token, context.column())?;
            if offset >= self.autocomplete_text(token)?.chars().count() {
                return reject("end of the token");
            }
            return self.remove_autocomplete_char(token, offset, context.column());
        }
        if !self.session.validator().can_delete_next_char_in_text(Some(&context)) {
            return reject("nothing to delete");
        }
        let Some(token) = context.text_editable else {
            return reject("not inside editable text");
        };
        let offset = self.offset_in(token, context.column())?;
        self.edit_text(token, |chars| {
            chars.remove(offset);
        })?;
        self.session.focus = Focus::caret(context.position);
        Ok(Step::Applied)
    }

    fn offset_in(&self, token: NodeId, column: usize) -> Result<usize> {
        let node = self.session.ast.node(token)?;
        Ok(column.saturating_sub(node.left))
    }

    fn edit_text(&mut self, token: NodeId, edit: impl FnOnce(&mut Vec<char>)) -> Result<()> {
        let node = self.session.ast.node_mut(token)?;
        let mut chars: Vec<char> = node.editable_text().unwrap_or_default().chars().collect();
        edit(&mut chars);
        node.set_editable_text(chars.into_iter().collect());
        self.session.ast.mark_changed(token);
        Ok(())
    }

    // ---- autocomplete tokens ----

    pub(super) fn open_autocomplete(&mut self, context: AutocompleteContext, text: &str) -> Result<Step> {
        let current = self.session.context();
        let token = self.session.ast.autocomplete(text, context);
        match context {
            AutocompleteContext::StartOfLine => {
                let line = current.line_statement;
                if !is_blank_line(&self.session.ast, line) {
                    return reject("the line is not empty");
                }
                self.session.ast.set_tokens(line, vec![token])?;
                self.session.ast.mark_changed(line);
            }
            AutocompleteContext::Expression => {
                let Some(hole) = self.session.validator().empty_hole_at(Some(&current)) else {
                    return reject("no empty hole at the cursor");
                };
                self.session.ast.swap_in(hole, token)?;
                self.session.ast.kill(hole);
            }
            AutocompleteContext::RightOfExpression => {
                if !self.session.validator().at_right_of_expression(Some(&current)) {
                    return reject("no expression left of the cursor");
                }
                let Some(expr) = current.expression_to_left else {
                    return reject("no expression left of the cursor");
                };
                let node = self.session.ast.node(expr)?;
                let parent = node.parent.ok_or(EditorError::Detached(expr))?;
                let index = node.index_in_parent + 1;
                self.session.ast.insert_token(parent, index, token)?;
            }
        }
        debug!("Opened {:?} autocomplete token {}", context, token);
        self.caret_after(token)?;
        self.settle_autocomplete(token)
    }

    pub(super) fn insert_autocomplete_char(&mut self, ch: char) -> Result<Step> {
        let context = self.session.context();
        let Some(token) = context.autocomplete else {
            return reject("no autocomplete token at the cursor");
        };
        let offset = self.offset_in(token, context.column())?;
        self.edit_autocomplete(token, |chars| {
            let offset = offset.min(chars.len());
            chars.insert(offset, ch);
        })?;
        self.session.ast.relayout();
        self.session.focus = Focus::caret(Position::new(context.line(), context.column() + 1));
        self.settle_autocomplete(token)
    }

    /// Commit, keep buffering, or refuse the token's current text
    fn settle_autocomplete(&mut self, token: NodeId) -> Result<Step> {
        let text = self.autocomplete_text(token)?;
        let context = self.autocomplete_context(token)?;
        let variables = self.session.validator().visible_variables_at(token);
        let outcome = AutocompleteMatcher::new(&self.session.catalog, &variables).evaluate(&text, context);
        match outcome {
            MatchOutcome::Commit(insertion) => self.commit_insertion(token, insertion),
            MatchOutcome::Partial => Ok(Step::Applied),
            MatchOutcome::NoMatch => reject(format!("nothing starts with '{}'", text)),
        }
    }

    fn remove_autocomplete_char(&mut self, token: NodeId, offset: usize, column: usize) -> Result<Step> {
        self.edit_autocomplete(token, |chars| {
            if offset < chars.len() {
                chars.remove(offset);
            }
        })?;
        if self.autocomplete_text(token)?.is_empty() {
            self.abandon_autocomplete(token)?;
            return Ok(Step::Applied);
        }
        let line = self.session.ast.node(token)?.line;
        self.session.ast.relayout();
        self.session.focus = Focus::caret(Position::new(line, column));
        Ok(Step::Applied)
    }

    pub(super) fn commit_autocomplete(&mut self) -> Result<Step> {
        let context = self.session.context();
        let Some(token) = context.autocomplete else {
            return reject("no autocomplete token at the cursor");
        };
        let from_menu = (self.session.menu.token() == Some(token))
            .then(|| self.session.menu.selected_option().map(|s| s.insertion.clone()))
            .flatten();
        let insertion = match from_menu {
            Some(insertion) => Some(insertion),
            None => {
                let text = self.autocomplete_text(token)?;
                let ac_context = self.autocomplete_context(token)?;
                let variables = self.session.validator().visible_variables_at(token);
                AutocompleteMatcher::new(&self.session.catalog, &variables).commit_target(&text, ac_context)
            }
        };
        match insertion {
            Some(insertion) => self.commit_insertion(token, insertion),
            None => reject("nothing to commit"),
        }
    }

    /// Remove the token and put back what it replaced
    pub(super) fn abandon_autocomplete(&mut self, token: NodeId) -> Result<()> {
        match self.take_token(token)? {
            TokenSite::Line(line) => {
                self.session.ast.relayout();
                let node = self.session.ast.node(line)?;
                self.session.focus = Focus::caret(Position::new(node.line, node.left));
            }
            TokenSite::Hole(slot) => {
                let fresh = self.session.ast.hole(slot);
                self.session.ast.swap_in(token, fresh)?;
                self.session.ast.kill(token);
                self.select(fresh)?;
            }
            TokenSite::After(expr) => self.caret_after(expr)?,
        }
        Ok(())
    }

    /// Detach the token where that leaves a consistent tree.
    ///
    /// A token standing in for a hole stays in place so the caller can swap
    /// something in for it.
    pub(super) fn take_token(&mut self, token: NodeId) -> Result<TokenSite> {
        let context = self.autocomplete_context(token)?;
        match context {
            AutocompleteContext::StartOfLine => {
                let line = self
                    .session
                    .ast
                    .enclosing_statement(token)
                    .ok_or(EditorError::Detached(token))?;
                self.session.ast.set_tokens(line, Vec::new())?;
                self.session.ast.kill(token);
                self.session.ast.mark_changed(line);
                Ok(TokenSite::Line(line))
            }
            AutocompleteContext::Expression => {
                let slot = self
                    .session
                    .ast
                    .node(token)?
                    .slot
                    .clone()
                    .ok_or(EditorError::MissingHole(token))?;
                Ok(TokenSite::Hole(slot))
            }
            AutocompleteContext::RightOfExpression => {
                let node = self.session.ast.node(token)?;
                let parent = node.parent.ok_or(EditorError::Detached(token))?;
                let index = node.index_in_parent;
                let expr = index
                    .checked_sub(1)
                    .and_then(|i| self.session.ast.get(parent).and_then(|p| p.tokens.get(i).copied()))
                    .ok_or(EditorError::Detached(token))?;
                self.session.ast.discard(token)?;
                Ok(TokenSite::After(expr))
            }
        }
    }

    pub(super) fn autocomplete_text(&self, token: NodeId) -> Result<String> {
        match self.session.ast.kind(token) {
            Some(NodeKind::Token(TokenKind::Autocomplete { text, .. })) => Ok(text.clone()),
            _ => Err(EditorError::UnexpectedConstruct {
                node: token,
                found: "not an autocomplete token".to_string(),
            }),
        }
    }

    pub(super) fn autocomplete_context(&self, token: NodeId) -> Result<AutocompleteContext> {
        match self.session.ast.kind(token) {
            Some(NodeKind::Token(TokenKind::Autocomplete { context, .. })) => Ok(*context),
            _ => Err(EditorError::UnexpectedConstruct {
                node: token,
                found: "not an autocomplete token".to_string(),
            }),
        }
    }

    fn edit_autocomplete(&mut self, token: NodeId, edit: impl FnOnce(&mut Vec<char>)) -> Result<()> {
        let node = self.session.ast.node_mut(token)?;
        let NodeKind::Token(TokenKind::Autocomplete { text, .. }) = &mut node.kind else {
            return Err(EditorError::UnexpectedConstruct {
                node: token,
                found: "not an autocomplete token".to_string(),
            });
        };
        let mut chars: Vec<char> = text.chars().collect();
        edit(&mut chars);
        *text = chars.into_iter().collect();
        self.session.ast.mark_changed(token);
        Ok(())
    }
}
