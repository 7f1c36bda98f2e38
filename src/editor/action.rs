//! The action surface of the editor
//!
//! Every driver (keyboard, mouse, toolbox button, scripted replay) funnels
//! through [`EditAction`]; the executor accepts nothing else.

use crate::editor::ast::{AutocompleteContext, BinaryOp, NodeId};
use crate::editor::position::Position;
use std::fmt;

/// Literal inserted directly into a hole
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiteralValue {
    /// Digits typed so far
    Number(String),
    String(String),
    Boolean(bool),
    /// Empty list literal `[___]`
    List,
}

/// One unit of work for the executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    /// Nothing to do; the host may handle the event natively
    None,

    // text editing
    InsertChar(char),
    DeleteChar,
    DeleteNextChar,

    // autocomplete
    OpenAutocomplete { context: AutocompleteContext, text: String },
    InsertAutocompleteChar(char),
    /// Commit the token under the cursor (menu choice first, then exact match)
    CommitAutocomplete,
    /// Commit the token, then run the navigation
    CommitAndNavigate(Box<EditAction>),

    // construct insertion
    InsertConstruct { definition: String },
    InsertLiteral(LiteralValue),
    InsertVariableReference { name: String },
    InsertBinaryOperator(BinaryOp),
    ReplaceOperator(BinaryOp),
    InsertModifier { definition: String },
    WrapExpression { target: NodeId, function: String },
    UnwrapExpression { target: NodeId },
    InsertListItem,
    RemoveListItem,

    // lines
    InsertEmptyLineAbove,
    InsertEmptyLineBelow,
    DeleteEmptyLine,
    DeleteNextEmptyLine,
    DeleteStatement { statement: NodeId },
    IndentForward,
    IndentBackward,

    // construct deletion
    DeleteExpression { target: NodeId },
    DeleteModifier { target: NodeId },
    DeleteBinaryOperator { target: NodeId },

    // navigation
    MoveCursorLeft,
    MoveCursorRight,
    MoveCursorUp,
    MoveCursorDown,
    MoveCursorLineStart,
    MoveCursorLineEnd,
    SetCursor(Position),

    // suggestion menu
    CloseMenu,
    MenuNext,
    MenuPrev,
    SelectMenuOption,

    // draft mode
    ApplyDraftFix { construct: NodeId, fix: usize },
    DismissDraft { construct: NodeId },
    ConvertToAssignment { statement: NodeId },
    DeclareVariable { name: String, before: NodeId },
    InsertImport { module: String, item: String },

    Undo,
    Redo,
}

/// Payload-free tag of an [`EditAction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditActionType {
    None,
    InsertChar,
    DeleteChar,
    DeleteNextChar,
    OpenAutocomplete,
    InsertAutocompleteChar,
    CommitAutocomplete,
    CommitAndNavigate,
    InsertConstruct,
    InsertLiteral,
    InsertVariableReference,
    InsertBinaryOperator,
    ReplaceOperator,
    InsertModifier,
    WrapExpression,
    UnwrapExpression,
    InsertListItem,
    RemoveListItem,
    InsertEmptyLineAbove,
    InsertEmptyLineBelow,
    DeleteEmptyLine,
    DeleteNextEmptyLine,
    DeleteStatement,
    IndentForward,
    IndentBackward,
    DeleteExpression,
    DeleteModifier,
    DeleteBinaryOperator,
    MoveCursorLeft,
    MoveCursorRight,
    MoveCursorUp,
    MoveCursorDown,
    MoveCursorLineStart,
    MoveCursorLineEnd,
    SetCursor,
    CloseMenu,
    MenuNext,
    MenuPrev,
    SelectMenuOption,
    ApplyDraftFix,
    DismissDraft,
    ConvertToAssignment,
    DeclareVariable,
    InsertImport,
    Undo,
    Redo,
}

impl EditAction {
    pub fn kind(&self) -> EditActionType {
        use EditActionType as T;
        match self {
            EditAction::None => T::None,
            EditAction::InsertChar(_) => T::InsertChar,
            EditAction::DeleteChar => T::DeleteChar,
            EditAction::DeleteNextChar => T::DeleteNextChar,
            EditAction::OpenAutocomplete { .. } => T::OpenAutocomplete,
            EditAction::InsertAutocompleteChar(_) => T::InsertAutocompleteChar,
            EditAction::CommitAutocomplete => T::CommitAutocomplete,
            EditAction::CommitAndNavigate(_) => T::CommitAndNavigate,
            EditAction::InsertConstruct { .. } => T::InsertConstruct,
            EditAction::InsertLiteral(_) => T::InsertLiteral,
            EditAction::InsertVariableReference { .. } => T::InsertVariableReference,
            EditAction::InsertBinaryOperator(_) => T::InsertBinaryOperator,
            EditAction::ReplaceOperator(_) => T::ReplaceOperator,
            EditAction::InsertModifier { .. } => T::InsertModifier,
            EditAction::WrapExpression { .. } => T::WrapExpression,
            EditAction::UnwrapExpression { .. } => T::UnwrapExpression,
            EditAction::InsertListItem => T::InsertListItem,
            EditAction::RemoveListItem => T::RemoveListItem,
            EditAction::InsertEmptyLineAbove => T::InsertEmptyLineAbove,
            EditAction::InsertEmptyLineBelow => T::InsertEmptyLineBelow,
            EditAction::DeleteEmptyLine => T::DeleteEmptyLine,
            EditAction::DeleteNextEmptyLine => T::DeleteNextEmptyLine,
            EditAction::DeleteStatement { .. } => T::DeleteStatement,
            EditAction::IndentForward => T::IndentForward,
            EditAction::IndentBackward => T::IndentBackward,
            EditAction::DeleteExpression { .. } => T::DeleteExpression,
            EditAction::DeleteModifier { .. } => T::DeleteModifier,
            EditAction::DeleteBinaryOperator { .. } => T::DeleteBinaryOperator,
            EditAction::MoveCursorLeft => T::MoveCursorLeft,
            EditAction::MoveCursorRight => T::MoveCursorRight,
            EditAction::MoveCursorUp => T::MoveCursorUp,
            EditAction::MoveCursorDown => T::MoveCursorDown,
            EditAction::MoveCursorLineStart => T::MoveCursorLineStart,
            EditAction::MoveCursorLineEnd => T::MoveCursorLineEnd,
            EditAction::SetCursor(_) => T::SetCursor,
            EditAction::CloseMenu => T::CloseMenu,
            EditAction::MenuNext => T::MenuNext,
            EditAction::MenuPrev => T::MenuPrev,
            EditAction::SelectMenuOption => T::SelectMenuOption,
            EditAction::ApplyDraftFix { .. } => T::ApplyDraftFix,
            EditAction::DismissDraft { .. } => T::DismissDraft,
            EditAction::ConvertToAssignment { .. } => T::ConvertToAssignment,
            EditAction::DeclareVariable { .. } => T::DeclareVariable,
            EditAction::InsertImport { .. } => T::InsertImport,
            EditAction::Undo => T::Undo,
            EditAction::Redo => T::Redo,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, EditAction::None)
    }

    /// Pure cursor movement, which never touches the tree
    pub fn is_navigation(&self) -> bool {
        matches!(
            self.kind(),
            EditActionType::MoveCursorLeft
                | EditActionType::MoveCursorRight
                | EditActionType::MoveCursorUp
                | EditActionType::MoveCursorDown
                | EditActionType::MoveCursorLineStart
                | EditActionType::MoveCursorLineEnd
                | EditActionType::SetCursor
        )
    }
}

impl fmt::Display for EditActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
