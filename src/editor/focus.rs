//! Cursor to structure mapping
//!
//! [`derive_context`] turns the current [`Focus`] into a [`Context`]: the
//! statement on the cursor's line, the tokens and expressions touching the
//! cursor, the selected token and any in-progress autocomplete token. It is
//! total: positions outside the document are clamped first.
//!
//! The navigation helpers move the focus the way a structural editor does:
//! fixed syntax is skipped, editable text is walked one column at a time and
//! holes are selected as a whole.

use crate::editor::ast::{
    Ast, ExpressionKind, NodeId, NodeKind, Placement, StatementKind, TokenKind,
};
use crate::editor::position::{Position, Range};

/// Cursor position plus an optional selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Focus {
    pub cursor: Position,
    pub selection: Option<Range>,
}

impl Focus {
    pub fn caret(position: Position) -> Self {
        Self {
            cursor: position,
            selection: None,
        }
    }

    pub fn select(range: Range) -> Self {
        Self {
            cursor: range.start,
            selection: Some(range),
        }
    }

    pub fn from_placement(placement: Placement) -> Self {
        match placement {
            Placement::Select(range) => Self::select(range),
            Placement::Caret(position) => Self::caret(position),
        }
    }
}

/// Structural view of the cursor, recomputed on demand
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    /// Clamped cursor position
    pub position: Position,
    pub selection: Option<Range>,

    /// Statement rendered on the cursor's line
    pub line_statement: NodeId,

    /// Leaf ending at the cursor
    pub token_to_left: Option<NodeId>,
    /// Leaf starting at the cursor
    pub token_to_right: Option<NodeId>,

    /// Largest complete expression ending at the cursor
    pub expression_to_left: Option<NodeId>,
    /// Largest complete expression starting at the cursor
    pub expression_to_right: Option<NodeId>,

    /// Leaf whose bounds match the selection exactly
    pub selected: Option<NodeId>,

    /// Editable text or identifier containing the cursor
    pub text_editable: Option<NodeId>,

    /// In-progress autocomplete token containing the cursor
    pub autocomplete: Option<NodeId>,
}

impl Context {
    pub fn column(&self) -> usize {
        self.position.column
    }

    pub fn line(&self) -> usize {
        self.position.line
    }
}

fn token_kind(ast: &Ast, id: NodeId) -> Option<&TokenKind> {
    ast.kind(id).and_then(|kind| kind.token())
}

fn is_fixed(ast: &Ast, id: NodeId) -> bool {
    matches!(
        token_kind(ast, id),
        Some(TokenKind::NonEditable(_)) | Some(TokenKind::Operator(_))
    )
}

fn is_incomplete(ast: &Ast, id: NodeId) -> bool {
    matches!(
        token_kind(ast, id),
        Some(TokenKind::EmptyExpression)
            | Some(TokenKind::EmptyOperator)
            | Some(TokenKind::Autocomplete { .. })
            | Some(TokenKind::Operator(_))
    )
}

fn is_editable(ast: &Ast, id: NodeId) -> bool {
    matches!(
        token_kind(ast, id),
        Some(TokenKind::EditableText(_)) | Some(TokenKind::Identifier(_))
    )
}

/// Statement at `line`, clamped to the document
pub fn statement_for_line(ast: &Ast, line: usize) -> (usize, NodeId) {
    let statements = ast.statements_in_order();
    let clamped = line.clamp(1, statements.len().max(1));
    let stmt = statements
        .iter()
        .copied()
        .find(|s| ast.get(*s).map(|n| n.line) == Some(clamped))
        .or_else(|| statements.first().copied())
        .unwrap_or_else(|| ast.root());
    (clamped, stmt)
}

/// Climb from a leaf while it is the last (or first) child of an expression
fn climb(ast: &Ast, start: NodeId, rightmost: bool) -> Option<NodeId> {
    if is_incomplete(ast, start) {
        return None;
    }
    let mut current = start;
    loop {
        let Some(parent) = ast.parent(current) else {
            break;
        };
        let Some(parent_node) = ast.get(parent) else {
            break;
        };
        if !(parent_node.kind.is_expression() || parent_node.kind.is_modifier()) {
            break;
        }
        let edge = if rightmost {
            parent_node.tokens.last()
        } else {
            parent_node.tokens.first()
        };
        if edge != Some(&current) {
            break;
        }
        current = parent;
    }
    match ast.kind(current) {
        Some(NodeKind::Expression(_)) => Some(current),
        _ => None,
    }
}

/// Innermost expression or modifier ending at the cursor, for deletion
pub fn innermost_to_left(ast: &Ast, context: &Context) -> Option<NodeId> {
    let mut current = context.token_to_left?;
    if is_incomplete(ast, current) {
        return None;
    }
    loop {
        match ast.kind(current) {
            Some(NodeKind::Expression(_)) | Some(NodeKind::Modifier(_)) => return Some(current),
            _ => {}
        }
        let parent = ast.parent(current)?;
        let parent_node = ast.get(parent)?;
        if parent_node.tokens.last() != Some(&current) {
            return None;
        }
        current = parent;
    }
}

/// Derive the structural context of `focus`
pub fn derive_context(ast: &Ast, focus: &Focus) -> Context {
    let (line, stmt) = statement_for_line(ast, focus.cursor.line);
    let (left, right) = ast
        .get(stmt)
        .map(|node| (node.left, node.right))
        .unwrap_or((1, 1));
    let column = focus.cursor.column.clamp(left, right.max(left));
    let position = Position::new(line, column);
    let leaves = ast.leaves(stmt);
    let bounds = |id: &NodeId| ast.get(*id).map(|n| (n.left, n.right)).unwrap_or((0, 0));

    let token_to_left = leaves
        .iter()
        .rev()
        .find(|id| {
            let (l, r) = bounds(id);
            r == column && l < column
        })
        .copied();
    let token_to_right = leaves
        .iter()
        .find(|id| {
            let (l, r) = bounds(id);
            l == column && r > column
        })
        .copied();
    let text_editable = leaves
        .iter()
        .find(|id| {
            let (l, r) = bounds(id);
            is_editable(ast, **id) && l <= column && column <= r
        })
        .copied();
    let autocomplete = leaves
        .iter()
        .find(|id| {
            let (l, r) = bounds(id);
            ast.kind(**id).map(|k| k.is_autocomplete()).unwrap_or(false) && l <= column && column <= r
        })
        .copied();

    let selection = focus.selection.filter(|range| range.start.line == line && !range.is_empty());
    let selected = selection.and_then(|range| {
        leaves
            .iter()
            .find(|id| {
                let (l, r) = bounds(id);
                l == range.start.column && r == range.end.column
            })
            .copied()
    });

    Context {
        position,
        selection,
        line_statement: stmt,
        token_to_left,
        token_to_right,
        expression_to_left: token_to_left.and_then(|t| climb(ast, t, true)),
        expression_to_right: token_to_right.and_then(|t| climb(ast, t, false)),
        selected,
        text_editable,
        autocomplete,
    }
}

/// Columns the caret can rest on outside editable text
fn stops(ast: &Ast, stmt: NodeId) -> Vec<usize> {
    let mut out = Vec::new();
    if let Some(node) = ast.get(stmt) {
        out.push(node.left);
        out.push(node.right);
    }
    for leaf in ast.leaves(stmt) {
        if is_fixed(ast, leaf) {
            continue;
        }
        if let Some(node) = ast.get(leaf) {
            out.push(node.left);
            out.push(node.right);
        }
    }
    out.sort_unstable();
    out.dedup();
    out
}

fn hole_at(ast: &Ast, stmt: NodeId, column: usize, starting: bool) -> Option<NodeId> {
    ast.leaves(stmt).into_iter().find(|leaf| {
        let Some(node) = ast.get(*leaf) else {
            return false;
        };
        node.kind.is_hole()
            && if starting {
                node.left == column
            } else {
                node.right == column
            }
    })
}

fn settle(ast: &Ast, stmt: NodeId, line: usize, column: usize, from_left: bool) -> Focus {
    if let Some(hole) = hole_at(ast, stmt, column, from_left).and_then(|h| ast.get(h)) {
        return Focus::select(hole.range());
    }
    Focus::caret(Position::new(line, column))
}

fn line_bounds(ast: &Ast, stmt: NodeId) -> (usize, usize) {
    ast.get(stmt).map(|n| (n.left, n.right)).unwrap_or((1, 1))
}

/// One step to the right
pub fn step_right(ast: &Ast, focus: &Focus) -> Focus {
    if let Some(selection) = focus.selection {
        return Focus::caret(selection.end);
    }
    let context = derive_context(ast, focus);
    let column = context.column();
    let stmt = context.line_statement;
    for inside in [context.text_editable, context.autocomplete].into_iter().flatten() {
        if let Some(node) = ast.get(inside) {
            if column < node.right {
                return Focus::caret(Position::new(context.line(), column + 1));
            }
        }
    }
    if let Some(hole) = hole_at(ast, stmt, column, true).and_then(|h| ast.get(h)) {
        if column < hole.right {
            return Focus::select(hole.range());
        }
    }
    if let Some(next) = stops(ast, stmt).into_iter().find(|s| *s > column) {
        return settle(ast, stmt, context.line(), next, true);
    }
    let (_, next_stmt) = statement_for_line(ast, context.line() + 1);
    if context.line() < ast.line_count() {
        let (left, _) = line_bounds(ast, next_stmt);
        return settle(ast, next_stmt, context.line() + 1, left, true);
    }
    Focus::caret(context.position)
}

/// One step to the left
pub fn step_left(ast: &Ast, focus: &Focus) -> Focus {
    if let Some(selection) = focus.selection {
        return Focus::caret(selection.start);
    }
    let context = derive_context(ast, focus);
    let column = context.column();
    let stmt = context.line_statement;
    for inside in [context.text_editable, context.autocomplete].into_iter().flatten() {
        if let Some(node) = ast.get(inside) {
            if column > node.left {
                return Focus::caret(Position::new(context.line(), column - 1));
            }
        }
    }
    if let Some(hole) = hole_at(ast, stmt, column, false).and_then(|h| ast.get(h)) {
        return Focus::select(hole.range());
    }
    if let Some(previous) = stops(ast, stmt).into_iter().rev().find(|s| *s < column) {
        return settle(ast, stmt, context.line(), previous, false);
    }
    if context.line() > 1 {
        let (line, prev_stmt) = statement_for_line(ast, context.line() - 1);
        let (_, right) = line_bounds(ast, prev_stmt);
        return settle(ast, prev_stmt, line, right, false);
    }
    Focus::caret(context.position)
}

/// Move to `position`, snapped to the nearest legal caret spot
pub fn snap(ast: &Ast, position: Position) -> Focus {
    let (line, stmt) = statement_for_line(ast, position.line);
    let (left, right) = line_bounds(ast, stmt);
    let column = position.column.clamp(left, right.max(left));
    for leaf in ast.leaves(stmt) {
        let Some(node) = ast.get(leaf) else {
            continue;
        };
        if !(node.left < column && column < node.right) {
            continue;
        }
        if node.kind.is_hole() {
            return Focus::select(node.range());
        }
        if is_editable(ast, leaf) || node.kind.is_autocomplete() {
            break;
        }
        let nearest = if column - node.left <= node.right - column {
            node.left
        } else {
            node.right
        };
        return Focus::caret(Position::new(line, nearest));
    }
    Focus::caret(Position::new(line, column))
}

pub fn step_up(ast: &Ast, focus: &Focus) -> Focus {
    let line = focus.cursor.line.saturating_sub(1).max(1);
    snap(ast, Position::new(line, focus.cursor.column))
}

pub fn step_down(ast: &Ast, focus: &Focus) -> Focus {
    snap(ast, Position::new(focus.cursor.line + 1, focus.cursor.column))
}

pub fn line_start(ast: &Ast, focus: &Focus) -> Focus {
    let (line, stmt) = statement_for_line(ast, focus.cursor.line);
    let (left, _) = line_bounds(ast, stmt);
    Focus::caret(Position::new(line, left))
}

pub fn line_end(ast: &Ast, focus: &Focus) -> Focus {
    let (line, stmt) = statement_for_line(ast, focus.cursor.line);
    let (_, right) = line_bounds(ast, stmt);
    Focus::caret(Position::new(line, right))
}

/// Whether the statement is an empty line with nothing typed on it
pub fn is_blank_line(ast: &Ast, stmt: NodeId) -> bool {
    ast.get(stmt)
        .map(|node| {
            matches!(node.kind, NodeKind::Statement(StatementKind::EmptyLine)) && node.tokens.is_empty()
        })
        .unwrap_or(false)
}

/// Whether an expression can carry a modifier chain
pub fn accepts_modifier(ast: &Ast, expr: NodeId) -> bool {
    matches!(
        ast.kind(expr),
        Some(NodeKind::Expression(ExpressionKind::VariableReference { .. }))
            | Some(NodeKind::Expression(ExpressionKind::FunctionCall { .. }))
            | Some(NodeKind::Expression(ExpressionKind::ListLiteral))
            | Some(NodeKind::Expression(ExpressionKind::ValueOperation))
            | Some(NodeKind::Expression(ExpressionKind::Literal(
                crate::editor::ast::LiteralKind::String
            )))
    )
}
