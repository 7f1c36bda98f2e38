//! Line structure: blank lines, statement removal and indentation

use super::{reject, ActionExecutor, Step};
use crate::editor::ast::NodeId;
use crate::editor::focus::{is_blank_line, line_end, line_start, Focus};
use crate::editor::position::Position;
use crate::error::{EditorError, Result};
use tracing::debug;

impl<'a> ActionExecutor<'a> {
    fn caret_at_line_start(&mut self, stmt: NodeId) -> Result<()> {
        self.session.ast.relayout();
        let node = self.session.ast.node(stmt)?;
        self.session.focus = Focus::caret(Position::new(node.line, node.left));
        Ok(())
    }

    pub(super) fn insert_empty_line_above(&mut self) -> Result<Step> {
        let context = self.session.context();
        if !self.session.validator().can_insert_empty_line_above(Some(&context)) {
            return reject("cannot open a line above");
        }
        let stmt = context.line_statement;
        let ast = &mut self.session.ast;
        let node = ast.node(stmt)?;
        let parent = node.parent.ok_or(EditorError::Detached(stmt))?;
        let index = node.index_in_parent;
        let blank = ast.empty_line();
        ast.insert_statement(parent, index, blank)?;
        self.caret_at_line_start(stmt)?;
        Ok(Step::Applied)
    }

    /// New blank line after the cursor's line, inside its body if it has one
    pub(super) fn insert_empty_line_below(&mut self) -> Result<Step> {
        let context = self.session.context();
        if !self.session.validator().can_insert_empty_line_below(Some(&context)) {
            return reject("cannot open a line below");
        }
        let stmt = context.line_statement;
        let ast = &mut self.session.ast;
        let has_body = ast
            .statement_kind(stmt)
            .map(|kind| kind.has_body())
            .unwrap_or(false);
        let blank = ast.empty_line();
        if has_body {
            ast.insert_statement(stmt, 0, blank)?;
        } else {
            let node = ast.node(stmt)?;
            let parent = node.parent.ok_or(EditorError::Detached(stmt))?;
            let index = node.index_in_parent + 1;
            ast.insert_statement(parent, index, blank)?;
        }
        self.caret_at_line_start(blank)?;
        Ok(Step::Applied)
    }

    pub(super) fn delete_empty_line(&mut self) -> Result<Step> {
        let context = self.session.context();
        if !self.session.validator().can_delete_empty_line(Some(&context)) {
            return reject("cannot remove this line");
        }
        let stmt = context.line_statement;
        let line = context.line();
        self.session.ast.remove_statement(stmt)?;
        self.session.ast.kill(stmt);
        self.session.ast.relayout();

        let ast = &self.session.ast;
        self.session.focus = match line.checked_sub(1).filter(|l| *l >= 1) {
            Some(previous) => line_end(ast, &Focus::caret(Position::new(previous, 1))),
            None => line_start(ast, &Focus::caret(Position::new(1, 1))),
        };
        Ok(Step::Applied)
    }

    pub(super) fn delete_next_empty_line(&mut self) -> Result<Step> {
        let context = self.session.context();
        let Some(next) = self.session.validator().next_empty_line(Some(&context)) else {
            return reject("no blank line below");
        };
        self.session.ast.remove_statement(next)?;
        self.session.ast.kill(next);
        self.session.focus = Focus::caret(context.position);
        Ok(Step::Applied)
    }

    /// Remove a statement.
    ///
    /// Simple statements leave a blank line behind. A compound statement's
    /// body moves up into its place unless every line of it is blank, in
    /// which case a single blank line remains. An `elif` whose chain goes on
    /// below it disappears without a trace.
    pub(super) fn delete_statement(&mut self, stmt: NodeId) -> Result<Step> {
        let validator = self.session.validator();
        let kind = match self.session.ast.statement_kind(stmt) {
            Some(kind) => kind.clone(),
            None => return reject("not a statement"),
        };
        if is_blank_line(&self.session.ast, stmt) {
            return reject("the line is already empty");
        }
        if validator.would_orphan_else_chain(stmt) {
            return reject("the rest of the if/elif/else chain depends on this line");
        }
        let blank_body = validator.body_is_blank(stmt);
        let chain_follows = self
            .session
            .ast
            .next_sibling(stmt)
            .and_then(|next| self.session.ast.statement_kind(next))
            .map(|next| next.continues_chain())
            .unwrap_or(false);

        let node = self.session.ast.node(stmt)?;
        let parent = node.parent.ok_or(EditorError::Detached(stmt))?;
        let index = node.index_in_parent;
        let line = node.line;
        debug!("Deleting {:?} statement {} on line {}", kind, stmt, line);

        self.unregister_statement(stmt)?;
        if kind.has_body() && !blank_body {
            let body = self.session.ast.node(stmt)?.body.clone();
            let ast = &mut self.session.ast;
            ast.set_body(stmt, Vec::new())?;
            ast.remove_statement(stmt)?;
            ast.kill(stmt);
            for (offset, child) in body.iter().enumerate() {
                ast.insert_statement(parent, index + offset, *child)?;
            }
            for child in body {
                self.resync_scopes(child)?;
            }
        } else if chain_follows {
            self.session.ast.remove_statement(stmt)?;
            self.session.ast.kill(stmt);
        } else {
            let ast = &mut self.session.ast;
            let blank = ast.empty_line();
            ast.swap_in(stmt, blank)?;
            ast.kill(stmt);
        }
        self.session.ast.ensure_body(parent)?;
        self.session.ast.relayout();
        self.session.focus = line_start(
            &self.session.ast,
            &Focus::caret(Position::new(line, 1)),
        );
        Ok(Step::Applied)
    }

    /// Move the cursor's statement into the body of the statement above
    pub(super) fn indent_forward(&mut self) -> Result<Step> {
        let context = self.session.context();
        if !self.session.validator().can_indent_forward(Some(&context)) {
            return reject("nothing to indent under");
        }
        let stmt = context.line_statement;
        let ast = &mut self.session.ast;
        let target = ast.prev_sibling(stmt).ok_or(EditorError::Detached(stmt))?;
        ast.remove_statement(stmt)?;
        let body = ast.node(target)?.body.clone();
        match body.as_slice() {
            [sentinel] if is_blank_line(ast, *sentinel) => {
                let sentinel = *sentinel;
                ast.swap_in(sentinel, stmt)?;
                ast.kill(sentinel);
            }
            _ => ast.insert_statement(target, body.len(), stmt)?,
        }
        self.resync_scopes(stmt)?;
        self.caret_at_line_start(stmt)?;
        Ok(Step::Applied)
    }

    /// Move the cursor's statement out of its parent's body, right after it
    pub(super) fn indent_backward(&mut self) -> Result<Step> {
        let context = self.session.context();
        if !self.session.validator().can_indent_backward(Some(&context)) {
            return reject("cannot outdent this line");
        }
        let stmt = context.line_statement;
        let ast = &mut self.session.ast;
        let parent = ast.parent(stmt).ok_or(EditorError::Detached(stmt))?;
        let grandparent = ast.parent(parent).ok_or(EditorError::Detached(parent))?;
        let index = ast.node(parent)?.index_in_parent + 1;
        ast.remove_statement(stmt)?;
        ast.insert_statement(grandparent, index, stmt)?;
        ast.ensure_body(parent)?;
        self.resync_scopes(stmt)?;
        self.caret_at_line_start(stmt)?;
        Ok(Step::Applied)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EditorConfig;
    use crate::editor::action::EditAction;
    use crate::editor::ast::{AutocompleteContext, StatementKind};
    use crate::editor::executor::ActionExecutor;
    use crate::editor::focus::Focus;
    use crate::editor::position::Position;
    use crate::editor::session::EditorSession;

    fn run(session: &mut EditorSession, action: EditAction) -> bool {
        ActionExecutor::new(session).execute(&action).applied
    }

    fn type_line(session: &mut EditorSession, text: &str) {
        let mut chars = text.chars();
        let first = chars.next().unwrap();
        run(
            session,
            EditAction::OpenAutocomplete {
                context: AutocompleteContext::StartOfLine,
                text: first.to_string(),
            },
        );
        for ch in chars {
            run(session, EditAction::InsertAutocompleteChar(ch));
        }
    }

    fn end_of(session: &mut EditorSession, line: usize) {
        session.focus = Focus::caret(Position::new(line, 200));
        let context = session.context();
        session.focus = Focus::caret(context.position);
    }

    #[test]
    fn test_enter_below_compound_opens_body_line() {
        let mut session = EditorSession::new(EditorConfig::default());
        type_line(&mut session, "while ");
        end_of(&mut session, 1);
        assert!(run(&mut session, EditAction::InsertEmptyLineBelow));
        assert_eq!(session.text(), "while ___:\n    \n    ");
        assert_eq!(session.context().line(), 2);
    }

    #[test]
    fn test_deleting_compound_splices_body() {
        let mut session = EditorSession::new(EditorConfig::default());
        type_line(&mut session, "while ");
        session.focus = Focus::caret(Position::new(2, 5));
        type_line(&mut session, "break");
        run(&mut session, EditAction::CommitAutocomplete);
        assert_eq!(session.text(), "while ___:\n    break");

        let head = session.ast.statement_at_line(1).unwrap();
        assert!(run(&mut session, EditAction::DeleteStatement { statement: head }));
        assert_eq!(session.text(), "break");
    }

    #[test]
    fn test_deleting_simple_statement_leaves_blank_line() {
        let mut session = EditorSession::new(EditorConfig::default());
        type_line(&mut session, "x =");
        let stmt = session.ast.statement_at_line(1).unwrap();
        assert!(run(&mut session, EditAction::DeleteStatement { statement: stmt }));
        assert_eq!(session.text(), "");
        let line = session.ast.statement_at_line(1).unwrap();
        assert_eq!(session.ast.statement_kind(line), Some(&StatementKind::EmptyLine));
        assert!(session.scopes.resolve(&session.ast, session.scopes.root(), "x", 5).is_none());
    }

    #[test]
    fn test_indent_round_trip() {
        let mut session = EditorSession::new(EditorConfig::default());
        type_line(&mut session, "while ");
        session.focus = Focus::caret(Position::new(2, 5));
        type_line(&mut session, "x =");
        session.focus = Focus::caret(Position::new(2, 5));
        assert!(run(&mut session, EditAction::IndentBackward));
        assert_eq!(session.text(), "while ___:\n    \nx = ___");

        session.focus = Focus::caret(Position::new(3, 1));
        assert!(run(&mut session, EditAction::IndentForward));
        assert_eq!(session.text(), "while ___:\n    x = ___");
    }
}
