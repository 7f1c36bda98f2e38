//! Capabilities a construct variant may have
//!
//! Instead of sharing behaviour through inheritance, each variant opts into
//! orthogonal capabilities that are dispatched by matching on [`NodeKind`].

use super::{
    DataType, ExpressionKind, ImportRequirement, LiteralKind, Node, NodeId, NodeKind, TokenKind,
    TypeSet,
};
use crate::editor::patterns::{is_keyword, EditorPatterns};

/// Constructs owning an indented body
pub trait HasBody {
    fn has_body(&self) -> bool;
    fn body_statements(&self) -> &[NodeId];
}

/// Constructs that are, or occupy, a typed hole
pub trait HasHole {
    fn is_hole(&self) -> bool;
    /// Types the position accepts, `None` when unconstrained
    fn accepted_types(&self) -> Option<&TypeSet>;
}

/// Tokens whose text the user edits character by character
pub trait TextEditable {
    fn is_text_editable(&self) -> bool;
    fn editable_text(&self) -> Option<&str>;
    /// Whether `candidate` is an acceptable full text for this token
    fn accepts_text(&self, candidate: &str) -> bool;
    fn set_editable_text(&mut self, text: String) -> bool;
}

/// Constructs that need an import statement
pub trait Importable {
    fn import_requirement(&self) -> Option<&ImportRequirement>;
}

/// Which literal an editable text belongs to decides its character rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRule {
    Identifier,
    Number,
    String,
}

impl TextRule {
    /// Rule for an editable token given the kind of its parent
    pub fn for_token(token: &NodeKind, parent: Option<&NodeKind>) -> Option<Self> {
        match token {
            NodeKind::Token(TokenKind::Identifier(_)) => Some(TextRule::Identifier),
            NodeKind::Token(TokenKind::EditableText(_)) => match parent {
                Some(NodeKind::Expression(ExpressionKind::Literal(LiteralKind::Number))) => {
                    Some(TextRule::Number)
                }
                _ => Some(TextRule::String),
            },
            _ => None,
        }
    }

    pub fn accepts(self, candidate: &str) -> bool {
        match self {
            TextRule::Identifier => {
                EditorPatterns::identifier().is_match(candidate) && !is_keyword(candidate)
            }
            TextRule::Number => EditorPatterns::number_text().is_match(candidate),
            TextRule::String => candidate.chars().all(|ch| {
                ch != '"' && !ch.is_control() && ch != '\u{2028}' && ch != '\u{2029}'
            }),
        }
    }

    /// Result type of the literal the text belongs to
    pub fn data_type(self) -> DataType {
        match self {
            TextRule::Number => DataType::Number,
            _ => DataType::String,
        }
    }
}

impl HasBody for Node {
    fn has_body(&self) -> bool {
        match &self.kind {
            NodeKind::Program => true,
            NodeKind::Statement(kind) => kind.has_body(),
            _ => false,
        }
    }

    fn body_statements(&self) -> &[NodeId] {
        &self.body
    }
}

impl HasHole for Node {
    fn is_hole(&self) -> bool {
        self.kind.is_hole()
    }

    fn accepted_types(&self) -> Option<&TypeSet> {
        self.slot.as_ref()
    }
}

impl TextEditable for Node {
    fn is_text_editable(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Token(TokenKind::EditableText(_)) | NodeKind::Token(TokenKind::Identifier(_))
        )
    }

    fn editable_text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Token(TokenKind::EditableText(text))
            | NodeKind::Token(TokenKind::Identifier(text)) => Some(text),
            _ => None,
        }
    }

    /// Without the parent only the token's own kind is known, so
    /// editable text falls back to the string rule here.
    fn accepts_text(&self, candidate: &str) -> bool {
        TextRule::for_token(&self.kind, None)
            .map(|rule| rule.accepts(candidate))
            .unwrap_or(false)
    }

    fn set_editable_text(&mut self, text: String) -> bool {
        match &mut self.kind {
            NodeKind::Token(TokenKind::EditableText(current))
            | NodeKind::Token(TokenKind::Identifier(current)) => {
                *current = text;
                true
            }
            _ => false,
        }
    }
}

impl Importable for Node {
    fn import_requirement(&self) -> Option<&ImportRequirement> {
        self.import.as_ref()
    }
}
