//! Raw input to edit actions
//!
//! Each physical key owns a table of named rules. A rule looks at the
//! current [`Context`] through the [`Validator`] and either produces an
//! [`EditAction`] or passes. The first rule that produces something wins,
//! so the order of a table is its precedence: text editing, then structure,
//! then deletion and indentation. When nothing matches the router answers
//! [`EditAction::None`] and the host may handle the key natively.

use crate::config::EditorConfig;
use crate::editor::action::{EditAction, LiteralValue};
use crate::editor::ast::{AutocompleteContext, BinaryOp, NodeId};
use crate::editor::autocomplete::MatchOutcome;
use crate::editor::focus::Context;
use crate::editor::position::Position;
use crate::editor::session::EditorSession;
use crate::editor::validator::Validator;
use crate::error::EditorError;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Physical key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Key press with modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    pub fn ctrl(key: Key) -> Self {
        Self {
            ctrl: true,
            ..Self::plain(key)
        }
    }

    pub fn shift(key: Key) -> Self {
        Self {
            shift: true,
            ..Self::plain(key)
        }
    }

    fn char(&self) -> Option<char> {
        match self.key {
            Key::Char(ch) => Some(ch),
            _ => None,
        }
    }
}

impl From<Key> for KeyEvent {
    fn from(key: Key) -> Self {
        Self::plain(key)
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            write!(f, "Ctrl+")?;
        }
        if self.alt {
            write!(f, "Alt+")?;
        }
        if self.shift {
            write!(f, "Shift+")?;
        }
        match self.key {
            Key::Char(' ') => write!(f, "Space"),
            Key::Char(ch) => write!(f, "{}", ch),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Parses names such as `Enter`, `Shift+Tab`, `Ctrl+Z` or `Space`
impl FromStr for KeyEvent {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split('+').collect();
        // a literal `+` key
        if s.ends_with("++") || s == "+" {
            parts.retain(|p| !p.is_empty());
            parts.push("+");
        }
        let name = parts.pop().ok_or_else(|| EditorError::UnknownKey(s.to_string()))?;
        let mut event = KeyEvent::plain(Key::Escape);
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => event.ctrl = true,
                "shift" => event.shift = true,
                "alt" => event.alt = true,
                _ => return Err(EditorError::UnknownKey(s.to_string())),
            }
        }
        event.key = match name.to_ascii_lowercase().as_str() {
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "escape" | "esc" => Key::Escape,
            "left" => Key::Left,
            "right" => Key::Right,
            "up" => Key::Up,
            "down" => Key::Down,
            "home" => Key::Home,
            "end" => Key::End,
            "space" => Key::Char(' '),
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) if event.ctrl => Key::Char(ch.to_ascii_lowercase()),
                    (Some(ch), None) => Key::Char(ch),
                    _ => return Err(EditorError::UnknownKey(s.to_string())),
                }
            }
        };
        Ok(event)
    }
}

/// Input from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEvent {
    Key(KeyEvent),
    /// Mouse click at a document position
    Click(Position),
    /// Host reports the caret moved
    CursorMoved(Position),
}

/// Everything a rule may look at
pub struct RuleInput<'s> {
    pub event: KeyEvent,
    pub context: &'s Context,
    pub validator: Validator<'s>,
    pub config: &'s EditorConfig,
}

impl<'s> RuleInput<'s> {
    fn ctx(&self) -> Option<&Context> {
        Some(self.context)
    }
}

/// A named entry of a rule table
pub struct RouteRule {
    pub name: &'static str,
    pub apply: fn(&RuleInput<'_>) -> Option<EditAction>,
}

const fn rule(name: &'static str, apply: fn(&RuleInput<'_>) -> Option<EditAction>) -> RouteRule {
    RouteRule { name, apply }
}

// ---- Backspace ----

const BACKSPACE_RULES: &[RouteRule] = &[
    rule("autocomplete-delete-char", |i| {
        let token = i.context.autocomplete?;
        let left = i.validator_left(token)?;
        (i.context.column() > left).then_some(EditAction::DeleteChar)
    }),
    rule("text-delete-char", |i| {
        i.validator
            .can_delete_char_in_text(i.ctx())
            .then_some(EditAction::DeleteChar)
    }),
    rule("delete-empty-string", |i| {
        let target = i.validator.empty_string_literal_at(i.ctx())?;
        Some(EditAction::DeleteExpression { target })
    }),
    rule("delete-empty-line", |i| {
        i.validator
            .can_delete_empty_line(i.ctx())
            .then_some(EditAction::DeleteEmptyLine)
    }),
    rule("delete-statement-at-line-start", |i| {
        (i.validator.at_line_start(i.ctx()) && i.validator.can_delete_statement(i.ctx())).then(|| {
            EditAction::DeleteStatement {
                statement: i.context.line_statement,
            }
        })
    }),
    rule("remove-list-item", |i| {
        i.validator
            .can_remove_list_item(i.ctx())
            .then_some(EditAction::RemoveListItem)
    }),
    rule("delete-operator-with-empty-right", |i| {
        let target = i.validator.binary_with_empty_right(i.ctx())?;
        Some(EditAction::DeleteBinaryOperator { target })
    }),
    rule("delete-untouched-parent-of-hole", |i| {
        let target = i.validator.empty_parent_of_hole(i.ctx())?;
        let kind = i.validator.kind_of(target)?;
        if kind.is_modifier() {
            return Some(EditAction::DeleteModifier { target });
        }
        if i.validator.has_slot(target) {
            return Some(EditAction::DeleteExpression { target });
        }
        let statement = i.validator.statement_owning(target)?;
        Some(EditAction::DeleteStatement { statement })
    }),
    rule("delete-operator-left", |i| {
        let target = i.validator.binary_operator_left(i.ctx())?;
        Some(EditAction::DeleteBinaryOperator { target })
    }),
    rule("delete-modifier-left", |i| {
        let target = i.validator.deletable_modifier_left(i.ctx())?;
        Some(EditAction::DeleteModifier { target })
    }),
    rule("delete-expression-left", |i| {
        let target = i.validator.deletable_expression_left(i.ctx())?;
        Some(EditAction::DeleteExpression { target })
    }),
    rule("delete-statement-of-expression-left", |i| {
        let statement = i.validator.sole_expression_left(i.ctx())?;
        Some(EditAction::DeleteStatement { statement })
    }),
];

// ---- Delete ----

const DELETE_RULES: &[RouteRule] = &[
    rule("autocomplete-delete-next-char", |i| {
        let token = i.context.autocomplete?;
        let right = i.validator_right(token)?;
        (i.context.column() < right).then_some(EditAction::DeleteNextChar)
    }),
    rule("text-delete-next-char", |i| {
        i.validator
            .can_delete_next_char_in_text(i.ctx())
            .then_some(EditAction::DeleteNextChar)
    }),
    rule("delete-empty-string", |i| {
        let target = i.validator.empty_string_literal_at(i.ctx())?;
        Some(EditAction::DeleteExpression { target })
    }),
    rule("delete-next-empty-line", |i| {
        i.validator
            .can_delete_next_empty_line(i.ctx())
            .then_some(EditAction::DeleteNextEmptyLine)
    }),
    rule("delete-expression-right", |i| {
        let target = i.validator.deletable_expression_right(i.ctx())?;
        Some(EditAction::DeleteExpression { target })
    }),
    rule("remove-list-item", |i| {
        i.validator
            .can_remove_list_item(i.ctx())
            .then_some(EditAction::RemoveListItem)
    }),
];

// ---- Enter ----

const ENTER_RULES: &[RouteRule] = &[
    rule("select-menu-option", |i| {
        let token = i.context.autocomplete?;
        i.validator
            .menu_choice_for(token)
            .then_some(EditAction::SelectMenuOption)
    }),
    rule("commit-autocomplete", |i| {
        i.validator
            .can_commit_autocomplete(i.ctx())
            .then_some(EditAction::CommitAutocomplete)
    }),
    rule("empty-line-below", |i| {
        i.validator
            .can_insert_empty_line_below(i.ctx())
            .then_some(EditAction::InsertEmptyLineBelow)
    }),
    rule("empty-line-above", |i| {
        (i.context.autocomplete.is_none() && i.validator.can_insert_empty_line_above(i.ctx()))
            .then_some(EditAction::InsertEmptyLineAbove)
    }),
];

// ---- Tab ----

const TAB_RULES: &[RouteRule] = &[
    rule("indent-backward", |i| {
        (i.event.shift && i.validator.can_indent_backward(i.ctx())).then_some(EditAction::IndentBackward)
    }),
    rule("indent-forward", |i| {
        (!i.event.shift && i.validator.can_indent_forward(i.ctx())).then_some(EditAction::IndentForward)
    }),
];

// ---- Escape ----

const ESCAPE_RULES: &[RouteRule] = &[
    rule("close-menu", |i| {
        i.validator.is_menu_open().then_some(EditAction::CloseMenu)
    }),
    rule("dismiss-draft", |i| {
        let construct = i.validator.draft_at(i.ctx())?;
        Some(EditAction::DismissDraft { construct })
    }),
];

// ---- arrows, Home and End ----

fn movement(key: Key) -> Option<EditAction> {
    match key {
        Key::Left => Some(EditAction::MoveCursorLeft),
        Key::Right => Some(EditAction::MoveCursorRight),
        Key::Up => Some(EditAction::MoveCursorUp),
        Key::Down => Some(EditAction::MoveCursorDown),
        Key::Home => Some(EditAction::MoveCursorLineStart),
        Key::End => Some(EditAction::MoveCursorLineEnd),
        _ => None,
    }
}

/// Whether moving with `key` takes the caret out of the autocomplete token
fn leaves_token(i: &RuleInput<'_>, key: Key) -> bool {
    let Some(token) = i.context.autocomplete else {
        return false;
    };
    match key {
        Key::Left => i.validator_left(token) == Some(i.context.column()),
        Key::Right => i.validator_right(token) == Some(i.context.column()),
        _ => true,
    }
}

const NAVIGATION_RULES: &[RouteRule] = &[
    rule("menu-previous", |i| {
        (i.event.key == Key::Up && i.validator.is_menu_open()).then_some(EditAction::MenuPrev)
    }),
    rule("menu-next", |i| {
        (i.event.key == Key::Down && i.validator.is_menu_open()).then_some(EditAction::MenuNext)
    }),
    rule("commit-and-navigate", |i| {
        if !i.config.commit_autocomplete_on_navigation || !leaves_token(i, i.event.key) {
            return None;
        }
        Some(EditAction::CommitAndNavigate(Box::new(movement(i.event.key)?)))
    }),
    rule("move-cursor", |i| movement(i.event.key)),
];

// ---- characters ----

fn char_of(i: &RuleInput<'_>) -> Option<char> {
    i.event.char()
}

const CHAR_RULES: &[RouteRule] = &[
    rule("autocomplete-char", |i| {
        let ch = char_of(i)?;
        i.context.autocomplete?;
        let extension = i.validator.autocomplete_extension(ch, i.ctx());
        if matches!(extension, MatchOutcome::Commit(_)) {
            return Some(EditAction::InsertAutocompleteChar(ch));
        }
        if ch == ' ' && i.validator.autocomplete_word_is_construct(i.ctx()) {
            return Some(EditAction::CommitAutocomplete);
        }
        if extension == MatchOutcome::Partial {
            return Some(EditAction::InsertAutocompleteChar(ch));
        }
        if ch == ' ' && i.validator.autocomplete_word(i.ctx()).is_some() {
            return Some(EditAction::CommitAutocomplete);
        }
        // nothing else may touch a token being typed
        Some(EditAction::None)
    }),
    rule("text-insert-char", |i| {
        let ch = char_of(i)?;
        i.validator
            .can_insert_char_in_text(ch, i.ctx())
            .then_some(EditAction::InsertChar(ch))
    }),
    rule("fill-operator-hole", |i| {
        let op = BinaryOp::from_char(char_of(i)?)?;
        i.validator
            .at_empty_operator_hole(i.ctx())
            .then_some(EditAction::ReplaceOperator(op))
    }),
    rule("extend-operator", |i| {
        let (_, op) = i.validator.extendable_operator(char_of(i)?, i.ctx())?;
        Some(EditAction::ReplaceOperator(op))
    }),
    rule("literal-in-hole", |i| {
        let ch = char_of(i)?;
        if !i.validator.at_empty_expression_hole(i.ctx()) {
            return None;
        }
        match ch {
            '0'..='9' => Some(EditAction::InsertLiteral(LiteralValue::Number(ch.to_string()))),
            '"' => Some(EditAction::InsertLiteral(LiteralValue::String(String::new()))),
            '[' => Some(EditAction::InsertLiteral(LiteralValue::List)),
            _ => None,
        }
    }),
    rule("autocomplete-in-hole", |i| {
        let ch = char_of(i)?;
        (i.validator.at_empty_expression_hole(i.ctx())
            && i.validator.opens_autocomplete(ch, AutocompleteContext::Expression, i.ctx()))
        .then(|| EditAction::OpenAutocomplete {
            context: AutocompleteContext::Expression,
            text: ch.to_string(),
        })
    }),
    rule("autocomplete-on-empty-line", |i| {
        let ch = char_of(i)?;
        (i.validator.on_empty_line(i.ctx())
            && i.validator.opens_autocomplete(ch, AutocompleteContext::StartOfLine, i.ctx()))
        .then(|| EditAction::OpenAutocomplete {
            context: AutocompleteContext::StartOfLine,
            text: ch.to_string(),
        })
    }),
    rule("binary-operator", |i| {
        let op = BinaryOp::from_char(char_of(i)?)?;
        i.validator
            .can_insert_binary_operator(i.ctx())
            .then_some(EditAction::InsertBinaryOperator(op))
    }),
    rule("list-item", |i| {
        (char_of(i)? == ',' && i.validator.can_insert_list_item(i.ctx()))
            .then_some(EditAction::InsertListItem)
    }),
    rule("list-access", |i| {
        (char_of(i)? == '[' && i.validator.can_insert_modifier(i.ctx())).then(|| {
            EditAction::InsertModifier {
                definition: "index".to_string(),
            }
        })
    }),
    rule("autocomplete-right-of-expression", |i| {
        let ch = char_of(i)?;
        (i.validator.at_right_of_expression(i.ctx())
            && i.validator.opens_autocomplete(ch, AutocompleteContext::RightOfExpression, i.ctx()))
        .then(|| EditAction::OpenAutocomplete {
            context: AutocompleteContext::RightOfExpression,
            text: ch.to_string(),
        })
    }),
];

// ---- helpers over the validator ----

impl<'s> RuleInput<'s> {
    fn validator_left(&self, token: NodeId) -> Option<usize> {
        self.validator.bounds_of(token).map(|(left, _)| left)
    }

    fn validator_right(&self, token: NodeId) -> Option<usize> {
        self.validator.bounds_of(token).map(|(_, right)| right)
    }
}

/// Rule table consulted for a key press
pub fn rules_for(event: &KeyEvent) -> &'static [RouteRule] {
    match event.key {
        Key::Char(_) => CHAR_RULES,
        Key::Backspace => BACKSPACE_RULES,
        Key::Delete => DELETE_RULES,
        Key::Enter => ENTER_RULES,
        Key::Tab => TAB_RULES,
        Key::Escape => ESCAPE_RULES,
        Key::Left | Key::Right | Key::Up | Key::Down | Key::Home | Key::End => NAVIGATION_RULES,
    }
}

/// Names of a key's rules in precedence order
pub fn rule_names(event: &KeyEvent) -> Vec<&'static str> {
    rules_for(event).iter().map(|r| r.name).collect()
}

/// Turns host events into edit actions
#[derive(Debug, Clone, Default)]
pub struct EventRouter {
    last_cursor: Option<Position>,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember where the engine left the cursor
    pub fn note_cursor(&mut self, position: Position) {
        self.last_cursor = Some(position);
    }

    pub fn last_cursor(&self) -> Option<Position> {
        self.last_cursor
    }

    pub fn route(&mut self, event: &RawEvent, session: &EditorSession) -> EditAction {
        match event {
            RawEvent::Click(position) => EditAction::SetCursor(*position),
            RawEvent::CursorMoved(position) => {
                if self.last_cursor == Some(*position) {
                    debug!("Ignoring cursor echo at {}", position);
                    EditAction::None
                } else {
                    EditAction::SetCursor(*position)
                }
            }
            RawEvent::Key(key) => self.route_key(key, session),
        }
    }

    fn route_key(&self, event: &KeyEvent, session: &EditorSession) -> EditAction {
        if event.ctrl {
            return match (event.key, event.shift) {
                (Key::Char('z'), false) => EditAction::Undo,
                (Key::Char('y'), _) | (Key::Char('z'), true) => EditAction::Redo,
                _ => EditAction::None,
            };
        }
        if event.alt {
            return EditAction::None;
        }
        let context = session.context();
        let input = RuleInput {
            event: *event,
            context: &context,
            validator: session.validator(),
            config: &session.config,
        };
        for rule in rules_for(event) {
            if let Some(action) = (rule.apply)(&input) {
                debug!("{} matched rule '{}' -> {}", event, rule.name, action.kind());
                return action;
            }
        }
        debug!("{} matched no rule", event);
        EditAction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::executor::ActionExecutor;

    fn press(router: &mut EventRouter, session: &mut EditorSession, event: KeyEvent) -> EditAction {
        let action = router.route(&RawEvent::Key(event), session);
        if !action.is_none() {
            ActionExecutor::new(session).execute(&action);
        }
        action
    }

    fn type_text(router: &mut EventRouter, session: &mut EditorSession, text: &str) {
        for ch in text.chars() {
            press(router, session, KeyEvent::plain(Key::Char(ch)));
        }
    }

    #[test]
    fn test_parse_key_names() {
        assert_eq!("Enter".parse::<KeyEvent>().unwrap(), KeyEvent::plain(Key::Enter));
        assert_eq!("Shift+Tab".parse::<KeyEvent>().unwrap(), KeyEvent::shift(Key::Tab));
        assert_eq!("Ctrl+Z".parse::<KeyEvent>().unwrap(), KeyEvent::ctrl(Key::Char('z')));
        assert_eq!("Space".parse::<KeyEvent>().unwrap(), KeyEvent::plain(Key::Char(' ')));
        assert_eq!("+".parse::<KeyEvent>().unwrap(), KeyEvent::plain(Key::Char('+')));
        assert!("Hyper+Q".parse::<KeyEvent>().is_err());
        assert!("Nope".parse::<KeyEvent>().is_err());
    }

    #[test]
    fn test_rule_tables_are_ordered() {
        let names = rule_names(&KeyEvent::plain(Key::Escape));
        assert_eq!(names, vec!["close-menu", "dismiss-draft"]);
        let backspace = rule_names(&KeyEvent::plain(Key::Backspace));
        assert_eq!(backspace.first(), Some(&"autocomplete-delete-char"));
        let text = backspace.iter().position(|n| *n == "text-delete-char").unwrap();
        let statement = backspace
            .iter()
            .position(|n| *n == "delete-statement-at-line-start")
            .unwrap();
        assert!(text < statement);
        let empty_string = backspace.iter().position(|n| *n == "delete-empty-string").unwrap();
        assert!(text < empty_string && empty_string < statement);
    }

    #[test]
    fn test_cursor_echo_is_ignored() {
        let session = EditorSession::new(EditorConfig::default());
        let mut router = EventRouter::new();
        router.note_cursor(Position::new(1, 1));
        assert_eq!(
            router.route(&RawEvent::CursorMoved(Position::new(1, 1)), &session),
            EditAction::None
        );
        assert_eq!(
            router.route(&RawEvent::CursorMoved(Position::new(1, 3)), &session),
            EditAction::SetCursor(Position::new(1, 3))
        );
    }

    #[test]
    fn test_undo_shortcuts() {
        let session = EditorSession::new(EditorConfig::default());
        let mut router = EventRouter::new();
        let route = |router: &mut EventRouter, text: &str| {
            router.route(&RawEvent::Key(text.parse().unwrap()), &session)
        };
        assert_eq!(route(&mut router, "Ctrl+Z"), EditAction::Undo);
        assert_eq!(route(&mut router, "Ctrl+Y"), EditAction::Redo);
        assert_eq!(route(&mut router, "Ctrl+Shift+Z"), EditAction::Redo);
    }

    #[test]
    fn test_typing_print_call() {
        let mut session = EditorSession::new(EditorConfig::default());
        let mut router = EventRouter::new();
        type_text(&mut router, &mut session, "print(");
        assert_eq!(session.text(), "print(___)");
        type_text(&mut router, &mut session, "42");
        assert_eq!(session.text(), "print(42)");
    }

    #[test]
    fn test_escape_closes_menu_before_draft() {
        let mut session = EditorSession::new(EditorConfig::default());
        let mut router = EventRouter::new();
        type_text(&mut router, &mut session, "total");
        let action = press(&mut router, &mut session, KeyEvent::plain(Key::Right));
        assert!(matches!(action, EditAction::CommitAndNavigate(_)));
        assert_eq!(session.drafts.len(), 1);

        let escape = KeyEvent::plain(Key::Escape);
        assert!(matches!(
            router.route(&RawEvent::Key(escape), &session),
            EditAction::DismissDraft { .. }
        ));

        let mut fresh = EditorSession::new(EditorConfig::default());
        type_text(&mut router, &mut fresh, "p");
        assert!(fresh.menu.is_visible());
        assert_eq!(router.route(&RawEvent::Key(escape), &fresh), EditAction::CloseMenu);
    }

    #[test]
    fn test_space_commits_keyword() {
        let mut session = EditorSession::new(EditorConfig::default());
        let mut router = EventRouter::new();
        type_text(&mut router, &mut session, "while ");
        assert_eq!(session.text(), "while ___:\n    ");
    }

    #[test]
    fn test_operator_typed_after_number() {
        let mut session = EditorSession::new(EditorConfig::default());
        let mut router = EventRouter::new();
        type_text(&mut router, &mut session, "x = 7");
        assert_eq!(session.text(), "x = 7");
        let action = press(&mut router, &mut session, KeyEvent::plain(Key::Char('*')));
        assert_eq!(action, EditAction::InsertBinaryOperator(BinaryOp::Mul));
        assert_eq!(session.text(), "x = 7 * ___");
    }

    #[test]
    fn test_backspace_on_hole_of_binary_collapses_it() {
        let mut session = EditorSession::new(EditorConfig::default());
        let mut router = EventRouter::new();
        type_text(&mut router, &mut session, "x = 7*");
        assert_eq!(session.text(), "x = 7 * ___");
        let action = press(&mut router, &mut session, KeyEvent::plain(Key::Backspace));
        assert!(matches!(action, EditAction::DeleteBinaryOperator { .. }));
        assert_eq!(session.text(), "x = 7");
    }

    #[test]
    fn test_backspace_inside_empty_string_deletes_literal() {
        let mut session = EditorSession::new(EditorConfig::default());
        let mut router = EventRouter::new();
        type_text(&mut router, &mut session, "x = \"");
        assert_eq!(session.text(), "x = \"\"");
        let action = press(&mut router, &mut session, KeyEvent::plain(Key::Backspace));
        assert!(matches!(action, EditAction::DeleteExpression { .. }));
        assert_eq!(session.text(), "x = ___");
    }

    #[test]
    fn test_operator_that_breaks_slot_type_is_rejected() {
        let mut session = EditorSession::new(EditorConfig::default());
        let mut router = EventRouter::new();
        type_text(&mut router, &mut session, "x = abs(5");
        assert_eq!(session.text(), "x = abs(5)");
        let action = press(&mut router, &mut session, KeyEvent::plain(Key::Char('<')));
        assert_eq!(action, EditAction::InsertBinaryOperator(BinaryOp::Lt));
        assert_eq!(session.text(), "x = abs(5)");
    }

    #[test]
    fn test_unmatched_key_is_left_to_host() {
        let session = EditorSession::new(EditorConfig::default());
        let mut router = EventRouter::new();
        let action = router.route(&RawEvent::Key(KeyEvent::plain(Key::Delete)), &session);
        assert_eq!(action, EditAction::None);
    }
}
