//! Fixes offered by draft records

use super::{reject, ActionExecutor, Step};
use crate::editor::ast::{ExpressionKind, NodeId, NodeKind, StatementKind};
use crate::editor::events::CallbackType;
use crate::editor::focus::Focus;
use crate::editor::messages::MessageEffect;
use crate::editor::position::{Position, Range};
use crate::error::{EditorError, Result};
use tracing::{debug, info};

impl<'a> ActionExecutor<'a> {
    /// Run the `fix`-th fix of the record on `construct`
    pub(super) fn apply_draft_fix(&mut self, construct: NodeId, fix: usize) -> Result<Step> {
        let Some(record) = self.session.drafts.get(construct) else {
            return reject("no draft record on this construct");
        };
        let Some(chosen) = record.fixes.get(fix) else {
            return reject(format!("no fix #{}", fix));
        };
        let (label, action) = (chosen.label.clone(), chosen.action.clone());
        info!("Applying draft fix '{}' on {}", label, construct);
        self.dispatch(&action)
    }

    /// Silence a record until its cause changes
    pub(super) fn dismiss_draft(&mut self, construct: NodeId) -> Result<Step> {
        if self.session.drafts.dismiss(construct).is_none() {
            return reject("no draft record on this construct");
        }
        debug!("Dismissed draft record on {}", construct);
        self.session
            .events
            .publish(construct, CallbackType::DraftChanged, None);
        self.pending.push(MessageEffect::Remove { construct });
        Ok(Step::Applied)
    }

    /// `name` alone on a line becomes `name = ___`
    pub(super) fn convert_to_assignment(&mut self, statement: NodeId) -> Result<Step> {
        let ast = &self.session.ast;
        let node = ast.node(statement)?;
        if !matches!(node.kind, NodeKind::Statement(StatementKind::Expression)) {
            return reject("not an expression statement");
        }
        let name = match node.tokens.as_slice() {
            [only] => match ast.kind(*only) {
                Some(NodeKind::Expression(ExpressionKind::VariableReference { name })) => name.clone(),
                _ => return reject("the line is not a lone variable"),
            },
            _ => return reject("the line is not a lone variable"),
        };
        let ast = &mut self.session.ast;
        let assignment = ast.var_assignment(&name);
        ast.swap_in(statement, assignment)?;
        ast.kill(statement);
        self.register_statement(assignment)?;
        self.focus_on(assignment);
        Ok(Step::Applied)
    }

    /// `name = ___` right above `before`
    pub(super) fn declare_variable(&mut self, name: &str, before: NodeId) -> Result<Step> {
        let ast = &mut self.session.ast;
        let node = ast.node(before)?;
        let parent = node.parent.ok_or(EditorError::Detached(before))?;
        let index = node.index_in_parent;
        let assignment = ast.var_assignment(name);
        ast.insert_statement(parent, index, assignment)?;
        ast.relayout();
        self.register_statement(assignment)?;
        self.focus_on(assignment);
        Ok(Step::Applied)
    }

    /// `from module import item` at the top of the program
    pub(super) fn insert_import(&mut self, module: &str, item: &str) -> Result<Step> {
        let ast = &mut self.session.ast;
        let root = ast.root();
        let first = ast.node(root)?.body.first().copied();
        let already_first = first
            .and_then(|stmt| ast.statement_kind(stmt))
            .map(|kind| matches!(kind, StatementKind::Import { module: m, item: i } if m == module && i == item))
            .unwrap_or(false);
        if already_first {
            return reject(format!("'{}' is already imported first", item));
        }
        let import = ast.import_statement(module, item);
        ast.insert_statement(root, 0, import)?;
        ast.relayout();

        let shift = |p: Position| Position::new(p.line + 1, p.column);
        let focus = self.session.focus;
        self.session.focus = Focus {
            cursor: shift(focus.cursor),
            selection: focus
                .selection
                .map(|range| Range::new(shift(range.start), shift(range.end))),
        };
        Ok(Step::Applied)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EditorConfig;
    use crate::editor::action::EditAction;
    use crate::editor::ast::{AutocompleteContext, StatementKind};
    use crate::editor::draft::DraftCause;
    use crate::editor::executor::ActionExecutor;
    use crate::editor::messages::MessageEffect;
    use crate::editor::position::Position;
    use crate::editor::session::EditorSession;

    fn run(session: &mut EditorSession, action: EditAction) -> bool {
        ActionExecutor::new(session).execute(&action).applied
    }

    fn type_text(session: &mut EditorSession, context: AutocompleteContext, text: &str) {
        let mut chars = text.chars();
        run(
            session,
            EditAction::OpenAutocomplete {
                context,
                text: chars.next().unwrap().to_string(),
            },
        );
        for ch in chars {
            run(session, EditAction::InsertAutocompleteChar(ch));
        }
    }

    fn undefined_total() -> (EditorSession, crate::editor::ast::NodeId) {
        let mut session = EditorSession::new(EditorConfig::default());
        type_text(&mut session, AutocompleteContext::StartOfLine, "total");
        run(&mut session, EditAction::CommitAutocomplete);
        let record = session.drafts.records().next().cloned().unwrap();
        assert!(matches!(record.cause, DraftCause::UndefinedVariable { .. }));
        (session, record.construct)
    }

    #[test]
    fn test_convert_to_assignment_closes_record() {
        let (mut session, construct) = undefined_total();
        assert!(run(&mut session, EditAction::ApplyDraftFix { construct, fix: 0 }));
        assert_eq!(session.text(), "total = ___");
        assert!(session.drafts.is_empty());
    }

    #[test]
    fn test_declare_variable_goes_above() {
        let (mut session, construct) = undefined_total();
        assert!(run(&mut session, EditAction::ApplyDraftFix { construct, fix: 1 }));
        assert_eq!(session.text(), "total = ___\ntotal");
        assert!(session.drafts.is_empty());
        let first = session.ast.statement_at_line(1).unwrap();
        assert_eq!(session.ast.statement_kind(first), Some(&StatementKind::VarAssignment));
    }

    #[test]
    fn test_dismissed_record_emits_remove() {
        let (mut session, construct) = undefined_total();
        let outcome = ActionExecutor::new(&mut session).execute(&EditAction::DismissDraft { construct });
        assert!(outcome.applied);
        assert_eq!(outcome.messages, vec![MessageEffect::Remove { construct }]);
        assert!(session.drafts.get(construct).is_none());
    }

    #[test]
    fn test_import_shifts_focus_down() {
        let mut session = EditorSession::new(EditorConfig::default());
        type_text(&mut session, AutocompleteContext::StartOfLine, "x =");
        type_text(&mut session, AutocompleteContext::Expression, "randint(");
        assert_eq!(session.text(), "x = randint(___, ___)");
        let call = session.drafts.records().next().map(|r| r.construct).unwrap();
        let column = session.focus.cursor.column;

        assert!(run(&mut session, EditAction::ApplyDraftFix { construct: call, fix: 0 }));
        assert_eq!(session.text(), "from random import randint\nx = randint(___, ___)");
        assert_eq!(session.focus.cursor, Position::new(2, column));
        assert!(session.drafts.is_empty());
    }
}
