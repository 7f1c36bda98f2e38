//! Action interpreter
//!
//! [`ActionExecutor::execute`] runs one [`EditAction`] against a session
//! atomically. Handlers mutate the tree and focus and report a [`Step`].
//! Then either:
//! - the action applied, so layout, draft records, the buffer edit, history,
//!   the suggestion menu, events and messages are brought up to date, or
//! - it was rejected or hit an internal error, so the session is put back
//!   to the checkpoint taken before the action and nothing is emitted
//!
//! Handlers are split by concern: text editing and autocomplete tokens,
//! construct insertion, construct deletion, line structure, navigation and
//! draft fixes.

mod delete;
mod drafts;
mod insert;
mod lines;
mod navigate;
mod text;

use crate::editor::action::EditAction;
use crate::editor::ast::{
    Ast, ExpressionKind, InsertionType, NodeId, NodeKind, StatementKind, TokenKind, TreeChange,
};
use crate::editor::autocomplete::AutocompleteMatcher;
use crate::editor::buffer::{diff_texts, BufferEdit};
use crate::editor::draft::DraftChangeKind;
use crate::editor::events::CallbackType;
use crate::editor::focus::Focus;
use crate::editor::messages::MessageEffect;
use crate::editor::session::{EditorSession, Snapshot};
use crate::error::{EditorError, Result};
use std::collections::BTreeSet;
use tracing::{debug, error};

/// What happened to an action
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionOutcome {
    /// Whether the action changed the session
    pub applied: bool,

    /// Range-replace edit for the host buffer
    pub edit: Option<BufferEdit>,

    /// Verdict of the insertion the action performed, if any
    pub verdict: Option<InsertionType>,

    /// Why the action was refused
    pub reason: Option<String>,

    /// Diagnostics for the message sink
    pub messages: Vec<MessageEffect>,
}

impl ActionOutcome {
    fn rejected(reason: String, messages: Vec<MessageEffect>, verdict: Option<InsertionType>) -> Self {
        Self {
            applied: false,
            edit: None,
            verdict,
            reason: Some(reason),
            messages,
        }
    }
}

/// Result of a handler before the bookkeeping runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Applied,
    Rejected(String),
}

pub(crate) fn reject(reason: impl Into<String>) -> Result<Step> {
    Ok(Step::Rejected(reason.into()))
}

/// Runs actions against one session
pub struct ActionExecutor<'a> {
    session: &'a mut EditorSession,
    verdict: Option<InsertionType>,
    pending: Vec<MessageEffect>,
}

impl<'a> ActionExecutor<'a> {
    pub fn new(session: &'a mut EditorSession) -> Self {
        Self {
            session,
            verdict: None,
            pending: Vec::new(),
        }
    }

    /// Apply `action` completely or not at all
    pub fn execute(&mut self, action: &EditAction) -> ActionOutcome {
        let before = self.session.checkpoint();
        let mismatched = self.mismatched_expressions();
        self.verdict = None;
        self.pending.clear();

        let step = match self.dispatch(action) {
            Ok(Step::Applied) => self.check_slots(action, &mismatched),
            other => other,
        };
        match step {
            Ok(Step::Applied) => self.finish(action, before),
            Ok(Step::Rejected(reason)) => {
                debug!("Rejected {}: {}", action.kind(), reason);
                self.session.restore(before);
                let messages = match self.verdict {
                    Some(InsertionType::Invalid) => vec![MessageEffect::Popup {
                        text: reason.clone(),
                    }],
                    _ => Vec::new(),
                };
                ActionOutcome::rejected(reason, messages, self.verdict)
            }
            Err(e) => {
                error!("Failed to apply {}: {}", action.kind(), e);
                self.session.restore(before);
                ActionOutcome::rejected(e.to_string(), Vec::new(), None)
            }
        }
    }

    fn dispatch(&mut self, action: &EditAction) -> Result<Step> {
        debug!("Executing {}", action.kind());
        match action {
            EditAction::None => reject("nothing to do"),

            EditAction::InsertChar(ch) => self.insert_char(*ch),
            EditAction::DeleteChar => self.delete_char(),
            EditAction::DeleteNextChar => self.delete_next_char(),

            EditAction::OpenAutocomplete { context, text } => self.open_autocomplete(*context, text),
            EditAction::InsertAutocompleteChar(ch) => self.insert_autocomplete_char(*ch),
            EditAction::CommitAutocomplete | EditAction::SelectMenuOption => {
                self.commit_autocomplete()
            }
            EditAction::CommitAndNavigate(navigation) => self.commit_and_navigate(navigation),

            EditAction::InsertConstruct { definition } => self.insert_construct(definition),
            EditAction::InsertLiteral(value) => self.insert_literal(value),
            EditAction::InsertVariableReference { name } => self.insert_variable_reference(name),
            EditAction::InsertBinaryOperator(op) => self.insert_binary_operator(*op),
            EditAction::ReplaceOperator(op) => self.replace_operator(*op),
            EditAction::InsertModifier { definition } => self.insert_modifier(definition),
            EditAction::WrapExpression { target, function } => self.wrap_expression(*target, function),
            EditAction::UnwrapExpression { target } => self.unwrap_expression(*target),
            EditAction::InsertListItem => self.insert_list_item(),
            EditAction::RemoveListItem => self.remove_list_item(),

            EditAction::InsertEmptyLineAbove => self.insert_empty_line_above(),
            EditAction::InsertEmptyLineBelow => self.insert_empty_line_below(),
            EditAction::DeleteEmptyLine => self.delete_empty_line(),
            EditAction::DeleteNextEmptyLine => self.delete_next_empty_line(),
            EditAction::DeleteStatement { statement } => self.delete_statement(*statement),
            EditAction::IndentForward => self.indent_forward(),
            EditAction::IndentBackward => self.indent_backward(),

            EditAction::DeleteExpression { target } => self.delete_expression(*target),
            EditAction::DeleteModifier { target } => self.delete_modifier(*target),
            EditAction::DeleteBinaryOperator { target } => self.delete_binary_operator(*target),

            EditAction::MoveCursorLeft
            | EditAction::MoveCursorRight
            | EditAction::MoveCursorUp
            | EditAction::MoveCursorDown
            | EditAction::MoveCursorLineStart
            | EditAction::MoveCursorLineEnd
            | EditAction::SetCursor(_) => self.navigate(action),

            EditAction::CloseMenu => self.close_menu(),
            EditAction::MenuNext => self.move_menu(true),
            EditAction::MenuPrev => self.move_menu(false),

            EditAction::ApplyDraftFix { construct, fix } => self.apply_draft_fix(*construct, *fix),
            EditAction::DismissDraft { construct } => self.dismiss_draft(*construct),
            EditAction::ConvertToAssignment { statement } => self.convert_to_assignment(*statement),
            EditAction::DeclareVariable { name, before } => self.declare_variable(name, *before),
            EditAction::InsertImport { module, item } => self.insert_import(module, item),

            EditAction::Undo => self.undo(),
            EditAction::Redo => self.redo(),
        }
    }

    /// Refuse an applied action that left an expression its slot rejects
    fn check_slots(&mut self, action: &EditAction, before: &BTreeSet<NodeId>) -> Result<Step> {
        if matches!(action, EditAction::Undo | EditAction::Redo) {
            return Ok(Step::Applied);
        }
        let after = self.mismatched_expressions();
        let Some(id) = after.difference(before).next().copied() else {
            return Ok(Step::Applied);
        };
        self.verdict = Some(InsertionType::Invalid);
        let returns = self.session.ast.returns(id);
        reject(self.mismatch_reason(returns.name(), id))
    }

    /// Attached expressions that their slot rejects outright
    ///
    /// Expressions typed through a variable are left out: retyping an
    /// assignment puts its uses in draft mode instead of being refused.
    fn mismatched_expressions(&self) -> BTreeSet<NodeId> {
        let ast = &self.session.ast;
        ast.descendants(ast.root())
            .into_iter()
            .filter(|id| ast.is_filled(*id) && ast.get(*id).map_or(false, |n| n.slot.is_some()))
            .filter(|id| {
                ast.insertion_type(*id, ast.returns(*id), &self.session.conversions)
                    == InsertionType::Invalid
            })
            .filter(|id| !typed_through_variable(ast, *id))
            .collect()
    }

    /// Bookkeeping after a handler applied
    fn finish(&mut self, action: &EditAction, before: Snapshot) -> ActionOutcome {
        let session = &mut *self.session;
        session.ast.relayout();
        let changes = session.ast.take_changes();

        let draft_changes =
            session
                .drafts
                .reconcile(&mut session.ast, &session.scopes, &session.conversions);

        let text = session.text();
        let edit = diff_texts(session.rendered(), &text);
        session.set_rendered(text);

        let replays_history = matches!(action, EditAction::Undo | EditAction::Redo);
        if !changes.is_empty() && !replays_history {
            session.history.record(before);
        }

        self.refresh_menu();

        let session = &mut *self.session;
        for change in &changes {
            match *change {
                TreeChange::Changed(id) => session.events.publish(id, CallbackType::Change, None),
                TreeChange::Replaced { old, new } => {
                    session.events.publish(old, CallbackType::Replace, Some(new))
                }
                TreeChange::Deleted(id) => session.events.publish(id, CallbackType::Delete, None),
            }
        }

        let released = session.ast.collect_garbage();
        if !released.is_empty() {
            session.scopes.forget(&released);
            session.events.forget(&released);
            session.menu.forget(&released);
            debug!("Released {} unreachable nodes", released.len());
        }

        let mut messages = std::mem::take(&mut self.pending);
        for change in &draft_changes {
            session
                .events
                .publish(change.construct, CallbackType::DraftChanged, None);
            match change.kind {
                DraftChangeKind::Opened | DraftChangeKind::Replaced => {
                    if let Some(record) = session.drafts.get(change.construct) {
                        messages.push(MessageEffect::Hover {
                            construct: change.construct,
                            text: record.message.clone(),
                        });
                    }
                }
                DraftChangeKind::Closed => messages.push(MessageEffect::Remove {
                    construct: change.construct,
                }),
            }
        }

        debug!(
            "Applied {} ({} tree changes, {} draft changes)",
            action.kind(),
            changes.len(),
            draft_changes.len()
        );
        ActionOutcome {
            applied: true,
            edit,
            verdict: self.verdict,
            reason: None,
            messages,
        }
    }

    /// Recompute the suggestion menu for the token under the cursor
    fn refresh_menu(&mut self) {
        let session = &mut *self.session;
        if !session.config.show_suggestion_menu {
            session.menu.hide();
            return;
        }
        let validator = session.validator();
        let Some((token, text, context)) = validator.autocomplete_state(None) else {
            session.menu.hide();
            return;
        };
        let variables = validator.visible_variables_at(token);
        let options = AutocompleteMatcher::new(&session.catalog, &variables).suggestions(&text, context);
        session.menu.show(token, &text, options);
    }

    // ---- shared helpers ----

    /// Lay out the document and put the cursor where `id` wants it
    fn focus_on(&mut self, id: NodeId) {
        let ast = &mut self.session.ast;
        ast.relayout();
        self.session.focus = Focus::from_placement(ast.initial_focus(id));
    }

    /// Lay out the document and select a single leaf
    fn select(&mut self, id: NodeId) -> Result<()> {
        self.session.ast.relayout();
        let range = self.session.ast.node(id)?.range();
        self.session.focus = Focus::select(range);
        Ok(())
    }

    /// Lay out the document and put a caret right after `id`
    fn caret_after(&mut self, id: NodeId) -> Result<()> {
        self.session.ast.relayout();
        let node = self.session.ast.node(id)?;
        self.session.focus = Focus::caret(crate::editor::position::Position::new(node.line, node.right));
        Ok(())
    }

    fn identifier_of(&self, stmt: NodeId) -> Option<NodeId> {
        let ast = &self.session.ast;
        let node = ast.get(stmt)?;
        node.tokens
            .iter()
            .copied()
            .find(|t| matches!(ast.kind(*t), Some(NodeKind::Token(TokenKind::Identifier(_)))))
    }

    /// Register the scope and assignment a freshly attached statement introduces
    fn register_statement(&mut self, stmt: NodeId) -> Result<()> {
        let kind = self
            .session
            .ast
            .statement_kind(stmt)
            .cloned()
            .ok_or(EditorError::UnexpectedConstruct {
                node: stmt,
                found: "non-statement".to_string(),
            })?;
        let enclosing = self.session.scopes.scope_for(&self.session.ast, stmt);
        match kind {
            StatementKind::VarAssignment => {
                if let Some(ident) = self.identifier_of(stmt) {
                    self.session.scopes.add_assignment(enclosing, ident)?;
                }
            }
            kind if kind.has_body() => {
                let own = self.session.scopes.create(stmt, enclosing);
                self.session.ast.node_mut(stmt)?.scope = Some(own);
                if let Some(ident) = self.identifier_of(stmt) {
                    self.session.scopes.add_assignment(own, ident)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Forget what a statement's header registered; its body scope flows to the parent
    fn unregister_statement(&mut self, stmt: NodeId) -> Result<()> {
        if let Some(ident) = self.identifier_of(stmt) {
            self.session.scopes.remove_assignment(ident);
        }
        if let Some(scope) = self.session.ast.get(stmt).and_then(|node| node.scope) {
            if self.session.scopes.get(scope).is_some() {
                self.session.scopes.push_to_parent_scope(scope)?;
                self.session.scopes.remove_scope(scope)?;
            }
            self.session.ast.node_mut(stmt)?.scope = None;
        }
        Ok(())
    }

    /// Re-home assignments and nested scopes under `stmt` after it moved
    fn resync_scopes(&mut self, stmt: NodeId) -> Result<()> {
        let mut statements = vec![stmt];
        let mut index = 0;
        while let Some(current) = statements.get(index).copied() {
            index += 1;
            let Some(node) = self.session.ast.get(current) else {
                continue;
            };
            statements.extend(node.body.iter().copied());
            let own = node.scope;
            let enclosing = self.session.scopes.scope_for(&self.session.ast, current);
            if let Some(own) = own {
                self.session.scopes.set_parent(own, enclosing)?;
            }
            if matches!(
                self.session.ast.statement_kind(current),
                Some(StatementKind::VarAssignment)
            ) {
                if let Some(ident) = self.identifier_of(current) {
                    self.session.scopes.rehome(ident, enclosing)?;
                }
            }
        }
        Ok(())
    }

    /// Subscriptions only survive history replay on constructs still in the tree
    fn drop_detached_subscriptions(&mut self) {
        let ast = &self.session.ast;
        self.session
            .events
            .retain_constructs(|id| ast.is_alive(id) && ast.is_attached(id));
    }

    fn undo(&mut self) -> Result<Step> {
        let current = self.session.checkpoint();
        match self.session.history.undo(current) {
            Some(previous) => {
                self.session.restore(previous);
                self.drop_detached_subscriptions();
                self.session.ast.mark_changed(self.session.ast.root());
                Ok(Step::Applied)
            }
            None => reject("nothing to undo"),
        }
    }

    fn redo(&mut self) -> Result<Step> {
        let current = self.session.checkpoint();
        match self.session.history.redo(current) {
            Some(next) => {
                self.session.restore(next);
                self.drop_detached_subscriptions();
                self.session.ast.mark_changed(self.session.ast.root());
                Ok(Step::Applied)
            }
            None => reject("nothing to redo"),
        }
    }
}

/// Whether a variable reference decides `id`'s type or the operand type it is held to
fn typed_through_variable(ast: &Ast, id: NodeId) -> bool {
    let reach = match ast.parent(id) {
        Some(parent)
            if matches!(
                ast.kind(parent),
                Some(NodeKind::Expression(ExpressionKind::BinaryOperator))
            ) =>
        {
            parent
        }
        _ => id,
    };
    ast.descendants(reach).into_iter().any(|node| {
        matches!(
            ast.kind(node),
            Some(NodeKind::Expression(ExpressionKind::VariableReference { .. }))
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::action::LiteralValue;
    use crate::editor::ast::{AutocompleteContext, DataType};
    use crate::editor::position::Position;

    fn run(session: &mut EditorSession, action: EditAction) -> ActionOutcome {
        ActionExecutor::new(session).execute(&action)
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

    #[test]
    fn test_typing_print_commits_call_and_selects_hole() {
        let mut session = EditorSession::new(EditorConfig::default());
        type_line(&mut session, "print(");
        assert_eq!(session.text(), "print(___)");
        let context = session.context();
        assert!(context.selected.is_some());
        assert_eq!(context.selection.map(|r| r.start.column), Some(7));
    }

    #[test]
    fn test_rejected_action_leaves_session_untouched() {
        let mut session = EditorSession::new(EditorConfig::default());
        let before = session.text();
        let outcome = run(&mut session, EditAction::DeleteStatement { statement: NodeId(999) });
        assert!(!outcome.applied);
        assert!(outcome.edit.is_none());
        assert_eq!(session.text(), before);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_invalid_literal_is_refused_with_popup() {
        let mut session = EditorSession::new(EditorConfig::default());
        type_line(&mut session, "x =");
        type_line_into_hole(&mut session, "range(");
        let outcome = run(&mut session, EditAction::InsertLiteral(LiteralValue::List));
        assert_eq!(outcome.verdict, Some(InsertionType::Invalid));
        assert!(!outcome.applied);
        assert!(matches!(outcome.messages.first(), Some(MessageEffect::Popup { .. })));
        assert_eq!(session.text(), "x = range(___)");
    }

    fn type_line_into_hole(session: &mut EditorSession, text: &str) {
        let mut chars = text.chars();
        let first = chars.next().unwrap();
        run(
            session,
            EditAction::OpenAutocomplete {
                context: AutocompleteContext::Expression,
                text: first.to_string(),
            },
        );
        for ch in chars {
            run(session, EditAction::InsertAutocompleteChar(ch));
        }
    }

    #[test]
    fn test_undo_and_redo_restore_text() {
        let mut session = EditorSession::new(EditorConfig::default());
        type_line(&mut session, "x =");
        let outcome = run(&mut session, EditAction::InsertLiteral(LiteralValue::Number("4".into())));
        assert!(outcome.applied);
        assert_eq!(session.text(), "x = 4");

        let undone = run(&mut session, EditAction::Undo);
        assert!(undone.applied);
        assert_eq!(session.text(), "x = ___");
        assert_eq!(session.rendered(), "x = ___");

        run(&mut session, EditAction::Redo);
        assert_eq!(session.text(), "x = 4");
        let x = session.scopes.resolve(&session.ast, session.scopes.root(), "x", 2);
        assert!(x.is_some());
        assert_eq!(
            session.scopes.variable_type(&session.ast, &x.unwrap()),
            DataType::Number
        );
    }

    #[test]
    fn test_buffer_edit_describes_the_change() {
        let mut session = EditorSession::new(EditorConfig::default());
        type_line(&mut session, "x =");
        let outcome = run(&mut session, EditAction::InsertLiteral(LiteralValue::Number("4".into())));
        let edit = outcome.edit.unwrap();
        assert_eq!(edit.range.start, Position::new(1, 5));
        assert_eq!(edit.range.end, Position::new(1, 8));
        assert_eq!(edit.text, "4");
    }
}
