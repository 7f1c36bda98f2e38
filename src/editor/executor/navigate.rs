use super::{reject, ActionExecutor, Step};
use crate::editor::action::EditAction;
use crate::editor::autocomplete::AutocompleteMatcher;
use crate::editor::focus::{line_end, line_start, snap, step_down, step_left, step_right, step_up};
use crate::error::Result;
use tracing::debug;

impl<'a> ActionExecutor<'a> {
    pub(super) fn navigate(&mut self, action: &EditAction) -> Result<Step> {
        let ast = &self.session.ast;
        let focus = &self.session.focus;
        let next = match action {
            EditAction::MoveCursorLeft => step_left(ast, focus),
            EditAction::MoveCursorRight => step_right(ast, focus),
            EditAction::MoveCursorUp => step_up(ast, focus),
            EditAction::MoveCursorDown => step_down(ast, focus),
            EditAction::MoveCursorLineStart => line_start(ast, focus),
            EditAction::MoveCursorLineEnd => line_end(ast, focus),
            EditAction::SetCursor(position) => snap(ast, *position),
            _ => return reject("not a cursor movement"),
        };
        self.session.focus = next;
        Ok(Step::Applied)
    }

    /// Settle the token under the cursor, then move.
    ///
    /// A token that commits to something is committed; one that does not is
    /// dropped and whatever it replaced comes back.
    pub(super) fn commit_and_navigate(&mut self, navigation: &EditAction) -> Result<Step> {
        if !navigation.is_navigation() {
            return reject("not a cursor movement");
        }
        let context = self.session.context();
        if let Some(token) = context.autocomplete {
            let text = self.autocomplete_text(token)?;
            let ac_context = self.autocomplete_context(token)?;
            let variables = self.session.validator().visible_variables_at(token);
            let target = AutocompleteMatcher::new(&self.session.catalog, &variables)
                .commit_target(&text, ac_context);

            let committed = match target {
                Some(insertion) => {
                    let attempt = self.session.checkpoint();
                    match self.commit_insertion(token, insertion)? {
                        Step::Applied => true,
                        Step::Rejected(reason) => {
                            debug!("Dropping '{}' instead of committing: {}", text, reason);
                            self.session.restore(attempt);
                            self.verdict = None;
                            false
                        }
                    }
                }
                None => false,
            };
            if !committed {
                self.abandon_autocomplete(token)?;
            }
        }
        self.navigate(navigation)
    }

    pub(super) fn close_menu(&mut self) -> Result<Step> {
        if !self.session.menu.is_visible() {
            return reject("no menu open");
        }
        let text = self
            .session
            .validator()
            .autocomplete_state(None)
            .map(|(_, text, _)| text)
            .unwrap_or_default();
        self.session.menu.dismiss(&text);
        Ok(Step::Applied)
    }

    pub(super) fn move_menu(&mut self, forward: bool) -> Result<Step> {
        if !self.session.menu.is_visible() {
            return reject("no menu open");
        }
        if forward {
            self.session.menu.select_next();
        } else {
            self.session.menu.select_previous();
        }
        Ok(Step::Applied)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EditorConfig;
    use crate::editor::action::EditAction;
    use crate::editor::ast::AutocompleteContext;
    use crate::editor::executor::ActionExecutor;
    use crate::editor::session::EditorSession;

    fn run(session: &mut EditorSession, action: EditAction) -> bool {
        ActionExecutor::new(session).execute(&action).applied
    }

    fn open(session: &mut EditorSession, text: &str) {
        let mut chars = text.chars();
        run(
            session,
            EditAction::OpenAutocomplete {
                context: AutocompleteContext::StartOfLine,
                text: chars.next().unwrap().to_string(),
            },
        );
        for ch in chars {
            run(session, EditAction::InsertAutocompleteChar(ch));
        }
    }

    #[test]
    fn test_navigation_commits_complete_word() {
        let mut session = EditorSession::new(EditorConfig::default());
        open(&mut session, "count");
        assert_eq!(session.text(), "count");
        let moved = run(
            &mut session,
            EditAction::CommitAndNavigate(Box::new(EditAction::MoveCursorRight)),
        );
        assert!(moved);
        assert!(session.context().autocomplete.is_none());
        assert_eq!(session.text(), "count");
        assert!(session.drafts.len() == 1);
    }

    #[test]
    fn test_navigation_drops_unfinished_token() {
        let mut session = EditorSession::new(EditorConfig::default());
        open(&mut session, "from r");
        assert!(run(
            &mut session,
            EditAction::CommitAndNavigate(Box::new(EditAction::MoveCursorLeft)),
        ));
        assert_eq!(session.text(), "");
    }

    #[test]
    fn test_menu_moves_only_while_open() {
        let mut session = EditorSession::new(EditorConfig::default());
        assert!(!run(&mut session, EditAction::MenuNext));
        open(&mut session, "p");
        assert!(session.menu.is_visible());
        assert!(run(&mut session, EditAction::MenuNext));
        assert!(run(&mut session, EditAction::CloseMenu));
        assert!(!session.menu.is_visible());
    }
}
