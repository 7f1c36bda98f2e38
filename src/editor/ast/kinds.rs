//! Closed set of construct variants
//!
//! Every node in the arena is tagged with a [`NodeKind`]. Behaviour that is
//! shared between variants lives in the capability traits instead of in the
//! variants themselves.

use super::types::{DataType, TypeSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level tag of an arena node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of the tree, owns the top-level statement body
    Program,
    Statement(StatementKind),
    Expression(ExpressionKind),
    Modifier(ModifierKind),
    Token(TokenKind),
}

impl NodeKind {
    pub fn is_statement(&self) -> bool {
        matches!(self, NodeKind::Statement(_))
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, NodeKind::Expression(_))
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self, NodeKind::Modifier(_))
    }

    pub fn is_token(&self) -> bool {
        matches!(self, NodeKind::Token(_))
    }

    /// Empty expression or operator placeholder
    pub fn is_hole(&self) -> bool {
        matches!(
            self,
            NodeKind::Token(TokenKind::EmptyExpression) | NodeKind::Token(TokenKind::EmptyOperator)
        )
    }

    pub fn is_expression_hole(&self) -> bool {
        matches!(self, NodeKind::Token(TokenKind::EmptyExpression))
    }

    pub fn is_autocomplete(&self) -> bool {
        matches!(self, NodeKind::Token(TokenKind::Autocomplete { .. }))
    }

    pub fn statement(&self) -> Option<&StatementKind> {
        match self {
            NodeKind::Statement(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn expression(&self) -> Option<&ExpressionKind> {
        match self {
            NodeKind::Expression(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&TokenKind> {
        match self {
            NodeKind::Token(kind) => Some(kind),
            _ => None,
        }
    }
}

/// Line-level constructs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// Sentinel line with nothing on it
    EmptyLine,
    VarAssignment,
    /// Expression evaluated for its effect (`print(x)`, `lst.append(1)`)
    Expression,
    If,
    Elif,
    Else,
    While,
    For,
    Break,
    Continue,
    Import { module: String, item: String },
}

impl StatementKind {
    /// Whether the statement owns an indented body
    pub fn has_body(&self) -> bool {
        matches!(
            self,
            StatementKind::If
                | StatementKind::Elif
                | StatementKind::Else
                | StatementKind::While
                | StatementKind::For
        )
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, StatementKind::While | StatementKind::For)
    }

    /// `elif` / `else`, which must directly follow a chain opener
    pub fn continues_chain(&self) -> bool {
        matches!(self, StatementKind::Elif | StatementKind::Else)
    }

    /// `if` / `elif`, which an `elif` or `else` may follow
    pub fn opens_chain(&self) -> bool {
        matches!(self, StatementKind::If | StatementKind::Elif)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            StatementKind::EmptyLine => "",
            StatementKind::VarAssignment => "=",
            StatementKind::Expression => "expression",
            StatementKind::If => "if",
            StatementKind::Elif => "elif",
            StatementKind::Else => "else",
            StatementKind::While => "while",
            StatementKind::For => "for",
            StatementKind::Break => "break",
            StatementKind::Continue => "continue",
            StatementKind::Import { .. } => "import",
        }
    }
}

/// Literal flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    String,
    Boolean(bool),
}

/// Value-producing constructs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionKind {
    Literal(LiteralKind),
    ListLiteral,
    /// Operator lives in the middle token so it can be a hole
    BinaryOperator,
    UnaryOperator(UnaryOp),
    FunctionCall { name: String },
    VariableReference { name: String },
    /// Base expression followed by one or more modifiers
    ValueOperation,
}

/// Post-fix operations chained onto a base expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifierKind {
    MethodCall { name: String },
    ListAccess,
    AugmentedAssignment(AugmentedOp),
}

/// Where an in-progress autocomplete token was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutocompleteContext {
    /// On an empty line, building a statement
    StartOfLine,
    /// Inside an expression hole
    Expression,
    /// Directly after a complete expression, building a modifier or operator
    RightOfExpression,
}

/// Leaf variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Fixed syntax such as `if `, `(` or `:`
    NonEditable(String),
    /// Free text inside a literal
    EditableText(String),
    /// Name being assigned
    Identifier(String),
    Operator(BinaryOp),
    /// Typed expression hole; accepted types live on the occupying node
    EmptyExpression,
    EmptyOperator,
    Autocomplete { text: String, context: AutocompleteContext },
}

impl TokenKind {
    pub fn render(&self) -> String {
        match self {
            TokenKind::NonEditable(text)
            | TokenKind::EditableText(text)
            | TokenKind::Identifier(text) => text.clone(),
            TokenKind::Operator(op) => format!(" {} ", op.symbol()),
            TokenKind::EmptyExpression => "___".to_string(),
            TokenKind::EmptyOperator => " ? ".to_string(),
            TokenKind::Autocomplete { text, .. } => text.clone(),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    /// Operator started by typing a single character
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(BinaryOp::Add),
            '-' => Some(BinaryOp::Sub),
            '*' => Some(BinaryOp::Mul),
            '/' => Some(BinaryOp::Div),
            '%' => Some(BinaryOp::Mod),
            '<' => Some(BinaryOp::Lt),
            '>' => Some(BinaryOp::Gt),
            '=' => Some(BinaryOp::Eq),
            '!' => Some(BinaryOp::NotEq),
            _ => None,
        }
    }

    /// `<` and `>` grow into `<=` and `>=` when `=` follows
    pub fn extended_with_equals(self) -> Option<Self> {
        match self {
            BinaryOp::Lt => Some(BinaryOp::Le),
            BinaryOp::Gt => Some(BinaryOp::Ge),
            _ => None,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Whether the right operand must match the concrete type of the left one
    pub fn narrows_operands(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge)
    }

    pub fn operand_types(self) -> TypeSet {
        match self {
            BinaryOp::Add => TypeSet::new([DataType::Number, DataType::String, DataType::AnyList]),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                TypeSet::single(DataType::Number)
            }
            BinaryOp::Eq | BinaryOp::NotEq => TypeSet::any(),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                TypeSet::new([DataType::Number, DataType::String])
            }
            BinaryOp::And | BinaryOp::Or => TypeSet::single(DataType::Boolean),
        }
    }

    /// Binding strength, higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 6,
        }
    }

    /// Result type given the operand types (`Any` for unfilled operands)
    pub fn returns(self, left: DataType, right: DataType) -> DataType {
        match self {
            BinaryOp::Add => {
                let concrete: Vec<DataType> = [left, right]
                    .into_iter()
                    .filter(|t| *t != DataType::Any)
                    .collect();
                if concrete.contains(&DataType::String) {
                    DataType::String
                } else if let Some(list) = concrete.iter().find(|t| t.is_list()) {
                    if concrete.iter().all(|t| t == list) {
                        *list
                    } else {
                        DataType::AnyList
                    }
                } else if concrete.is_empty() {
                    DataType::Any
                } else {
                    DataType::Number
                }
            }
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => DataType::Number,
            _ => DataType::Boolean,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
}

impl UnaryOp {
    /// Binding strength on the same scale as [`BinaryOp::precedence`]
    pub fn precedence(self) -> u8 {
        match self {
            UnaryOp::Not => 3,
        }
    }
}

/// Augmented assignment operators (`x += 1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AugmentedOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl AugmentedOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AugmentedOp::Add => "+=",
            AugmentedOp::Sub => "-=",
            AugmentedOp::Mul => "*=",
            AugmentedOp::Div => "/=",
        }
    }

    pub fn value_types(self) -> TypeSet {
        match self {
            AugmentedOp::Add => TypeSet::new([DataType::Number, DataType::String, DataType::AnyList]),
            _ => TypeSet::single(DataType::Number),
        }
    }
}

/// Module item a construct needs imported before use
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportRequirement {
    pub module: String,
    pub item: String,
}

impl fmt::Display for ImportRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "from {} import {}", self.module, self.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_returns_string_when_either_side_is_string() {
        assert_eq!(BinaryOp::Add.returns(DataType::Number, DataType::String), DataType::String);
        assert_eq!(BinaryOp::Add.returns(DataType::Number, DataType::Any), DataType::Number);
        assert_eq!(BinaryOp::Add.returns(DataType::Any, DataType::Any), DataType::Any);
    }

    #[test]
    fn test_add_of_mixed_lists_is_any_list() {
        assert_eq!(
            BinaryOp::Add.returns(DataType::NumberList, DataType::NumberList),
            DataType::NumberList
        );
        assert_eq!(
            BinaryOp::Add.returns(DataType::NumberList, DataType::StringList),
            DataType::AnyList
        );
    }

    #[test]
    fn test_comparison_extension() {
        assert_eq!(BinaryOp::Lt.extended_with_equals(), Some(BinaryOp::Le));
        assert_eq!(BinaryOp::Gt.extended_with_equals(), Some(BinaryOp::Ge));
        assert_eq!(BinaryOp::Add.extended_with_equals(), None);
        assert!(BinaryOp::Le.returns(DataType::Number, DataType::Number) == DataType::Boolean);
    }

    #[test]
    fn test_token_render() {
        assert_eq!(TokenKind::EmptyExpression.render(), "___");
        assert_eq!(TokenKind::EmptyOperator.render(), " ? ");
        assert_eq!(TokenKind::Operator(BinaryOp::And).render(), " and ");
    }

    #[test]
    fn test_chain_helpers() {
        assert!(StatementKind::If.opens_chain());
        assert!(StatementKind::Else.continues_chain());
        assert!(!StatementKind::Else.opens_chain());
        assert!(StatementKind::For.is_loop() && StatementKind::For.has_body());
    }
}
