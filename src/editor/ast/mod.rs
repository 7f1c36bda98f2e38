//! Arena-backed construct tree
//!
//! Nodes live in a single `Vec` and refer to each other by [`NodeId`]:
//! - Parents own children through the ordered `tokens` (header) and `body`
//!   (indented statements) lists
//! - `parent` is a non-owning back index used for navigation only
//! - Deleted nodes stay in the arena marked dead until
//!   [`Ast::collect_garbage`] releases them; released ids are handed out again
//!
//! Structural edits go through the methods here so that `index_in_parent`
//! stays consistent and every change is recorded for the session event bus.

pub mod capability;
pub mod factory;
pub mod kinds;
pub mod layout;
pub mod types;

use crate::editor::position::{Position, Range};
use crate::editor::scope::ScopeId;
use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use kinds::{
    AugmentedOp, AutocompleteContext, BinaryOp, ExpressionKind, ImportRequirement, LiteralKind,
    ModifierKind, NodeKind, StatementKind, TokenKind, UnaryOp,
};
pub use types::{check_insertion, Conversion, ConversionTable, DataType, InsertionType, TypeSet};

/// Index of a node in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A construct in the tree
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,

    /// Non-owning back reference
    pub parent: Option<NodeId>,

    /// Position in the parent's `tokens` (or `body` for statements)
    pub index_in_parent: usize,

    /// Header children, rendered left to right on the statement's line
    pub tokens: Vec<NodeId>,

    /// Indented statements owned by compound statements and the program
    pub body: Vec<NodeId>,

    /// Scope introduced by this node, if any
    pub scope: Option<ScopeId>,

    /// Types accepted by the expression position this node occupies
    pub slot: Option<TypeSet>,

    /// Import this construct needs before it can run
    pub import: Option<ImportRequirement>,

    /// Declared result type for calls, modifiers and variable references
    pub returns: DataType,

    pub line: usize,
    pub left: usize,
    pub right: usize,

    pub alive: bool,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            index_in_parent: 0,
            tokens: Vec::new(),
            body: Vec::new(),
            scope: None,
            slot: None,
            import: None,
            returns: DataType::Any,
            line: 1,
            left: 1,
            right: 1,
            alive: true,
        }
    }

    /// Empty, dead placeholder for a released slot
    fn released() -> Self {
        Self {
            alive: false,
            ..Self::new(NodeKind::Token(TokenKind::EmptyExpression))
        }
    }

    /// Rendered bounds on the node's own line
    pub fn range(&self) -> Range {
        Range::on_line(self.line, self.left, self.right)
    }
}

/// Structural change recorded for the event bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeChange {
    Changed(NodeId),
    Replaced { old: NodeId, new: NodeId },
    Deleted(NodeId),
}

/// Canonical cursor placement after a construct is inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Select a whole token, typically a hole
    Select(Range),
    Caret(Position),
}

/// The construct tree of one editor session
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
    indent_width: usize,
    changes: Vec<TreeChange>,

    /// Released slots, reused by `alloc`
    free: Vec<NodeId>,
}

impl Ast {
    /// Program holding a single sentinel empty line
    pub fn new(indent_width: usize) -> Self {
        let mut ast = Self {
            nodes: vec![Node::new(NodeKind::Program)],
            root: NodeId(0),
            indent_width: indent_width.max(1),
            changes: Vec::new(),
            free: Vec::new(),
        };
        let line = ast.empty_line();
        ast.nodes[0].body.push(line);
        ast.nodes[line.0].parent = Some(NodeId(0));
        ast.relayout();
        ast
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn indent_width(&self) -> usize {
        self.indent_width
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes reachable from the root
    pub fn live_count(&self) -> usize {
        self.descendants(self.root).len()
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        if let Some(id) = self.free.pop() {
            if let Some(slot) = self.nodes.get_mut(id.0) {
                *slot = Node::new(kind);
                return id;
            }
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(kind));
        id
    }

    /// Release every node the root no longer reaches, returning their ids
    ///
    /// Only call this once the changes of the current edit have been taken
    /// and published: a released id may name a different construct later.
    pub fn collect_garbage(&mut self) -> Vec<NodeId> {
        let mut keep = vec![false; self.nodes.len()];
        for id in self.descendants(self.root).into_iter().chain(self.free.iter().copied()) {
            if let Some(flag) = keep.get_mut(id.0) {
                *flag = true;
            }
        }
        let mut released = Vec::new();
        for (index, (node, kept)) in self.nodes.iter_mut().zip(keep).enumerate() {
            if kept {
                continue;
            }
            *node = Node::released();
            released.push(NodeId(index));
        }
        self.free.extend(released.iter().copied());
        released
    }

    /// Live node lookup
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).filter(|node| node.alive)
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(EditorError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .filter(|node| node.alive)
            .ok_or(EditorError::NodeNotFound(id))
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|node| &node.kind)
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// Whether the node is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn mark_changed(&mut self, id: NodeId) {
        self.changes.push(TreeChange::Changed(id));
    }

    pub fn take_changes(&mut self) -> Vec<TreeChange> {
        std::mem::take(&mut self.changes)
    }

    // ---- structural edits ----

    /// Replace a node's header children
    pub fn set_tokens(&mut self, parent: NodeId, tokens: Vec<NodeId>) -> Result<()> {
        self.node_mut(parent)?.tokens = tokens;
        self.reindex(parent)
    }

    /// Replace a node's body
    pub fn set_body(&mut self, parent: NodeId, body: Vec<NodeId>) -> Result<()> {
        self.node_mut(parent)?.body = body;
        self.reindex(parent)
    }

    pub fn insert_token(&mut self, parent: NodeId, index: usize, token: NodeId) -> Result<()> {
        let node = self.node_mut(parent)?;
        let index = index.min(node.tokens.len());
        node.tokens.insert(index, token);
        self.reindex(parent)?;
        self.mark_changed(parent);
        Ok(())
    }

    /// Restore parent links and indices of a node's direct children
    pub fn reindex(&mut self, parent: NodeId) -> Result<()> {
        let node = self.node(parent)?;
        let children: Vec<NodeId> = node.tokens.iter().chain(node.body.iter()).copied().collect();
        let token_count = node.tokens.len();
        for (position, child) in children.into_iter().enumerate() {
            let child_node = self.node_mut(child)?;
            child_node.parent = Some(parent);
            child_node.index_in_parent = if position < token_count {
                position
            } else {
                position - token_count
            };
        }
        Ok(())
    }

    /// Put `new` where `old` is; `new` inherits the slot. `old` stays alive but detached.
    pub fn swap_in(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        let old_node = self.node(old)?;
        let parent = old_node.parent.ok_or(EditorError::Detached(old))?;
        let index = old_node.index_in_parent;
        let in_body = old_node.kind.is_statement();
        let slot = old_node.slot.clone();

        let parent_node = self.node_mut(parent)?;
        let list = if in_body {
            &mut parent_node.body
        } else {
            &mut parent_node.tokens
        };
        match list.get_mut(index) {
            Some(entry) if *entry == old => *entry = new,
            _ => return Err(EditorError::Detached(old)),
        }

        let new_node = self.node_mut(new)?;
        new_node.parent = Some(parent);
        new_node.index_in_parent = index;
        new_node.slot = slot;
        self.node_mut(old)?.parent = None;
        self.changes.push(TreeChange::Replaced { old, new });
        Ok(())
    }

    /// Remove a node from its parent's list without deleting it
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        let Some(parent) = node.parent else {
            return Ok(());
        };
        let in_body = node.kind.is_statement();
        let parent_node = self.node_mut(parent)?;
        let list = if in_body {
            &mut parent_node.body
        } else {
            &mut parent_node.tokens
        };
        list.retain(|child| *child != id);
        self.node_mut(id)?.parent = None;
        self.reindex(parent)?;
        self.mark_changed(parent);
        Ok(())
    }

    /// Mark a node and its whole subtree dead
    pub fn kill(&mut self, id: NodeId) {
        let doomed = self.descendants(id);
        for node in doomed.into_iter().rev() {
            if let Some(entry) = self.nodes.get_mut(node.0) {
                entry.alive = false;
                self.changes.push(TreeChange::Deleted(node));
            }
        }
    }

    /// Detach and kill
    pub fn discard(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;
        self.kill(id);
        Ok(())
    }

    pub fn insert_statement(&mut self, parent: NodeId, index: usize, stmt: NodeId) -> Result<()> {
        let node = self.node_mut(parent)?;
        let index = index.min(node.body.len());
        node.body.insert(index, stmt);
        self.reindex(parent)?;
        self.mark_changed(parent);
        Ok(())
    }

    /// Detach a statement, returning where it was
    pub fn remove_statement(&mut self, stmt: NodeId) -> Result<(NodeId, usize)> {
        let node = self.node(stmt)?;
        let parent = node.parent.ok_or(EditorError::Detached(stmt))?;
        let index = node.index_in_parent;
        self.detach(stmt)?;
        Ok((parent, index))
    }

    /// Replace `inner` with a wrapper built around it by `build`.
    ///
    /// The wrapper takes over `inner`'s position and slot; `build` decides
    /// where inside the wrapper `inner` ends up.
    pub fn wrap_with(
        &mut self,
        inner: NodeId,
        build: impl FnOnce(&mut Ast, NodeId) -> Result<NodeId>,
    ) -> Result<NodeId> {
        let node = self.node(inner)?;
        let parent = node.parent.ok_or(EditorError::Detached(inner))?;
        let index = node.index_in_parent;
        let slot = node.slot.clone();

        let wrapper = build(self, inner)?;
        let parent_node = self.node_mut(parent)?;
        match parent_node.tokens.get_mut(index) {
            Some(entry) if *entry == inner => *entry = wrapper,
            _ => return Err(EditorError::Detached(inner)),
        }
        let wrapper_node = self.node_mut(wrapper)?;
        wrapper_node.parent = Some(parent);
        wrapper_node.index_in_parent = index;
        wrapper_node.slot = slot;
        self.mark_changed(parent);
        Ok(wrapper)
    }

    /// Put `inner`, a descendant of `outer`, where `outer` sits and delete the rest
    pub fn unwrap_into(&mut self, outer: NodeId, inner: NodeId) -> Result<()> {
        self.detach(inner)?;
        self.swap_in(outer, inner)?;
        self.kill(outer);
        Ok(())
    }

    /// Put a sentinel empty line into an emptied body
    pub fn ensure_body(&mut self, parent: NodeId) -> Result<Option<NodeId>> {
        let node = self.node(parent)?;
        let holds_body = match &node.kind {
            NodeKind::Program => true,
            NodeKind::Statement(kind) => kind.has_body(),
            _ => false,
        };
        if !holds_body || !node.body.is_empty() {
            return Ok(None);
        }
        let sentinel = self.empty_line();
        self.insert_statement(parent, 0, sentinel)?;
        Ok(Some(sentinel))
    }

    // ---- queries ----

    /// Node and all of its descendants, pre-order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current.0) else {
                continue;
            };
            out.push(current);
            for child in node.body.iter().rev().chain(node.tokens.iter().rev()) {
                stack.push(*child);
            }
        }
        out
    }

    /// Every statement in document order
    pub fn statements_in_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_statements(self.root, &mut out);
        out
    }

    fn collect_statements(&self, parent: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.get(parent) else {
            return;
        };
        for stmt in &node.body {
            out.push(*stmt);
            self.collect_statements(*stmt, out);
        }
    }

    pub fn line_count(&self) -> usize {
        self.statements_in_order().len()
    }

    pub fn statement_at_line(&self, line: usize) -> Option<NodeId> {
        self.statements_in_order()
            .into_iter()
            .find(|stmt| self.get(*stmt).map(|node| node.line) == Some(line))
    }

    /// Nearest statement at or above a node
    pub fn enclosing_statement(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get(node_id)?;
            if node.kind.is_statement() {
                return Some(node_id);
            }
            current = node.parent;
        }
        None
    }

    pub fn statement_kind(&self, id: NodeId) -> Option<&StatementKind> {
        self.kind(id).and_then(|kind| kind.statement())
    }

    pub fn prev_sibling(&self, stmt: NodeId) -> Option<NodeId> {
        let node = self.get(stmt)?;
        let parent = self.get(node.parent?)?;
        let index = node.index_in_parent.checked_sub(1)?;
        parent.body.get(index).copied()
    }

    pub fn next_sibling(&self, stmt: NodeId) -> Option<NodeId> {
        let node = self.get(stmt)?;
        let parent = self.get(node.parent?)?;
        parent.body.get(node.index_in_parent + 1).copied()
    }

    /// Leaves of a node's header, left to right
    pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(node) = self.get(id) {
            for token in &node.tokens {
                self.collect_leaves(*token, &mut out);
            }
        }
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(node) = self.get(id) else {
            return;
        };
        if node.tokens.is_empty() {
            out.push(id);
        } else {
            for token in &node.tokens {
                self.collect_leaves(*token, out);
            }
        }
    }

    /// Operator of a binary expression, `None` while it is a hole
    pub fn operator_of(&self, binary: NodeId) -> Option<BinaryOp> {
        let node = self.get(binary)?;
        match self.kind(*node.tokens.get(1)?)? {
            NodeKind::Token(TokenKind::Operator(op)) => Some(*op),
            _ => None,
        }
    }

    /// Binding strength of an operator expression, `None` for atoms
    pub fn binding(&self, id: NodeId) -> Option<u8> {
        match self.kind(id)? {
            NodeKind::Expression(ExpressionKind::BinaryOperator) => {
                self.operator_of(id).map(BinaryOp::precedence)
            }
            NodeKind::Expression(ExpressionKind::UnaryOperator(op)) => Some(op.precedence()),
            _ => None,
        }
    }

    /// Operand that a new `op` typed right after `expr` takes as its left side
    ///
    /// Descends through trailing operands that bind looser than `op`, so
    /// `1 < 5` followed by `-` wraps `5` rather than the comparison.
    pub fn operand_for(&self, expr: NodeId, op: BinaryOp) -> NodeId {
        let mut target = expr;
        while let Some(strength) = self.binding(target) {
            if strength >= op.precedence() {
                break;
            }
            let last = self.get(target).and_then(|node| node.tokens.last().copied());
            match last.filter(|id| self.is_filled(*id)) {
                Some(operand) => target = operand,
                None => break,
            }
        }
        target
    }

    /// Whether the unparenthesised text of `id` parses back to the same tree
    pub fn reads_as_tree(&self, id: NodeId) -> bool {
        let Some(node) = self.get(id) else {
            return true;
        };
        match &node.kind {
            NodeKind::Expression(ExpressionKind::BinaryOperator) => {
                let Some(strength) = self.operator_of(id).map(BinaryOp::precedence) else {
                    return true;
                };
                let left = node.tokens.first().and_then(|t| self.binding(*t));
                let right = node.tokens.get(2).and_then(|t| self.binding(*t));
                left.map_or(true, |l| l >= strength) && right.map_or(true, |r| r > strength)
            }
            NodeKind::Expression(ExpressionKind::UnaryOperator(op)) => node
                .tokens
                .last()
                .and_then(|t| self.binding(*t))
                .map_or(true, |inner| inner >= op.precedence()),
            _ => true,
        }
    }

    /// Whether the node is a real expression rather than a hole or pending input
    pub fn is_filled(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Expression(_)))
    }

    /// Text of an identifier, editable text or variable reference
    pub fn name_of(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Token(TokenKind::Identifier(name))
            | NodeKind::Token(TokenKind::EditableText(name)) => Some(name),
            NodeKind::Expression(ExpressionKind::VariableReference { name }) => Some(name),
            _ => None,
        }
    }

    /// Result type of an expression
    pub fn returns(&self, id: NodeId) -> DataType {
        let Some(node) = self.get(id) else {
            return DataType::Any;
        };
        match &node.kind {
            NodeKind::Expression(kind) => match kind {
                ExpressionKind::Literal(LiteralKind::Number) => DataType::Number,
                ExpressionKind::Literal(LiteralKind::String) => DataType::String,
                ExpressionKind::Literal(LiteralKind::Boolean(_)) => DataType::Boolean,
                ExpressionKind::ListLiteral => {
                    let items: Vec<DataType> = node
                        .tokens
                        .iter()
                        .filter(|t| self.is_filled(**t))
                        .map(|t| self.returns(*t))
                        .collect();
                    let all_items = node.tokens.iter().filter(|t| !self.is_separator(**t)).count();
                    match items.first() {
                        Some(first)
                            if items.len() == all_items && items.iter().all(|t| t == first) =>
                        {
                            DataType::list_of(*first)
                        }
                        _ => DataType::AnyList,
                    }
                }
                ExpressionKind::BinaryOperator => match self.operator_of(id) {
                    Some(op) => {
                        let left = node.tokens.first().map(|t| self.returns(*t));
                        let right = node.tokens.get(2).map(|t| self.returns(*t));
                        op.returns(left.unwrap_or(DataType::Any), right.unwrap_or(DataType::Any))
                    }
                    None => DataType::Any,
                },
                ExpressionKind::UnaryOperator(UnaryOp::Not) => DataType::Boolean,
                ExpressionKind::FunctionCall { .. } | ExpressionKind::VariableReference { .. } => {
                    node.returns
                }
                ExpressionKind::ValueOperation => {
                    let mut current = match node.tokens.first() {
                        Some(base) => self.returns(*base),
                        None => DataType::Any,
                    };
                    for modifier in node.tokens.iter().skip(1) {
                        current = match self.kind(*modifier) {
                            Some(NodeKind::Modifier(ModifierKind::ListAccess)) => {
                                current.element_type()
                            }
                            Some(NodeKind::Modifier(ModifierKind::AugmentedAssignment(_))) => {
                                DataType::Void
                            }
                            Some(NodeKind::Modifier(ModifierKind::MethodCall { .. })) => {
                                self.get(*modifier).map(|m| m.returns).unwrap_or(DataType::Any)
                            }
                            _ => current,
                        };
                    }
                    current
                }
            },
            NodeKind::Statement(_) => DataType::Void,
            _ => DataType::Any,
        }
    }

    fn is_separator(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Token(TokenKind::NonEditable(_))))
    }

    /// Accepted types of an expression position, narrowed by a filled opposite operand
    pub fn effective_slot(&self, id: NodeId) -> Option<TypeSet> {
        let node = self.get(id)?;
        let slot = node.slot.clone()?;
        let Some(parent) = node.parent else {
            return Some(slot);
        };
        if !matches!(self.kind(parent), Some(NodeKind::Expression(ExpressionKind::BinaryOperator))) {
            return Some(slot);
        }
        let Some(op) = self.operator_of(parent) else {
            return Some(slot);
        };
        if !op.narrows_operands() {
            return Some(slot);
        }
        let parent_node = self.get(parent)?;
        let other = match node.index_in_parent {
            2 => parent_node.tokens.first().copied(),
            0 if node.kind.is_hole() => parent_node.tokens.get(2).copied(),
            _ => None,
        };
        let Some(other) = other.filter(|o| self.is_filled(*o)) else {
            return Some(slot);
        };
        let concrete = self.returns(other);
        if concrete == DataType::Any {
            return Some(slot);
        }
        let narrowed = if concrete.is_list() { DataType::AnyList } else { concrete };
        if slot.accepts(narrowed) {
            Some(TypeSet::single(narrowed))
        } else {
            Some(slot)
        }
    }

    /// Verdict for placing a value of type `returns` where `occupant` sits
    pub fn insertion_type(
        &self,
        occupant: NodeId,
        returns: DataType,
        conversions: &ConversionTable,
    ) -> InsertionType {
        match self.effective_slot(occupant) {
            Some(slot) => check_insertion(&slot, returns, conversions),
            None => InsertionType::Valid,
        }
    }

    /// Where the cursor goes right after `id` was inserted
    pub fn initial_focus(&self, id: NodeId) -> Placement {
        let leaves = self.leaves(id);
        if let Some(hole) = leaves.iter().find(|leaf| {
            self.kind(**leaf).map(|kind| kind.is_hole()).unwrap_or(false)
        }) {
            if let Some(node) = self.get(*hole) {
                return Placement::Select(node.range());
            }
        }
        if let Some(editable) = leaves.iter().find(|leaf| {
            matches!(
                self.kind(**leaf),
                Some(NodeKind::Token(TokenKind::EditableText(_)))
                    | Some(NodeKind::Token(TokenKind::Identifier(_)))
            )
        }) {
            if let Some(node) = self.get(*editable) {
                return Placement::Caret(Position::new(node.line, node.right));
            }
        }
        let Some(node) = self.get(id) else {
            return Placement::Caret(Position::default());
        };
        if let Some(first) = node.body.first().and_then(|stmt| self.get(*stmt)) {
            return Placement::Caret(Position::new(first.line, first.left));
        }
        Placement::Caret(Position::new(node.line, node.right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_program_has_sentinel_line() {
        let ast = Ast::new(4);
        let root = ast.node(ast.root()).unwrap();
        assert_eq!(root.body.len(), 1);
        assert_eq!(
            ast.statement_kind(root.body[0]),
            Some(&StatementKind::EmptyLine)
        );
        assert_eq!(ast.render_text(), "");
    }

    #[test]
    fn test_swap_in_transfers_slot_and_detaches_old() {
        let mut ast = Ast::new(4);
        let call = ast.function_call("len", &[TypeSet::new([DataType::AnyList, DataType::String])], DataType::Number, None);
        let stmt = ast.expression_statement(call).unwrap();
        let line = ast.node(ast.root()).unwrap().body[0];
        ast.swap_in(line, stmt).unwrap();
        ast.relayout();

        let hole = ast.node(call).unwrap().tokens[1];
        let list = ast.list_literal();
        ast.swap_in(hole, list).unwrap();

        assert_eq!(ast.parent(list), Some(call));
        assert_eq!(ast.parent(hole), None);
        assert!(ast.node(list).unwrap().slot.as_ref().unwrap().contains(DataType::AnyList));
        assert_eq!(
            ast.insertion_type(list, ast.returns(list), &ConversionTable::standard()),
            InsertionType::Valid
        );
    }

    #[test]
    fn test_kill_marks_subtree_dead() {
        let mut ast = Ast::new(4);
        let stmt = ast.compound(StatementKind::If);
        let descendants = ast.descendants(stmt);
        assert!(descendants.len() > 3);
        ast.kill(stmt);
        assert!(descendants.iter().all(|id| !ast.is_alive(*id)));
        let changes = ast.take_changes();
        assert!(changes.contains(&TreeChange::Deleted(stmt)));
    }

    #[test]
    fn test_right_operand_narrows_to_left_type() {
        let mut ast = Ast::new(4);
        let left = ast.number_literal("1");
        let binary = ast.binary_operator(Some(BinaryOp::Add), left).unwrap();
        let right = ast.node(binary).unwrap().tokens[2];
        assert_eq!(ast.effective_slot(right), Some(TypeSet::single(DataType::Number)));
        assert_eq!(
            ast.insertion_type(right, DataType::String, &ConversionTable::standard()),
            InsertionType::DraftMode
        );
    }

    #[test]
    fn test_initial_focus_selects_first_hole() {
        let mut ast = Ast::new(4);
        let stmt = ast.var_assignment("x");
        let line = ast.node(ast.root()).unwrap().body[0];
        ast.swap_in(line, stmt).unwrap();
        ast.relayout();
        assert_eq!(ast.render_text(), "x = ___");
        assert_eq!(
            ast.initial_focus(stmt),
            Placement::Select(Range::on_line(1, 5, 8))
        );
    }

    /// `1 < 5`, detached
    fn comparison(ast: &mut Ast) -> (NodeId, NodeId) {
        let one = ast.number_literal("1");
        let binary = ast.binary_operator(Some(BinaryOp::Lt), one).unwrap();
        let hole = ast.node(binary).unwrap().tokens[2];
        let five = ast.number_literal("5");
        ast.swap_in(hole, five).unwrap();
        (binary, five)
    }

    #[test]
    fn test_operand_for_descends_through_looser_operators() {
        let mut ast = Ast::new(4);
        let (binary, five) = comparison(&mut ast);
        assert_eq!(ast.operand_for(binary, BinaryOp::Sub), five);
        assert_eq!(ast.operand_for(binary, BinaryOp::Mul), five);
        assert_eq!(ast.operand_for(binary, BinaryOp::Eq), binary);
        assert_eq!(ast.operand_for(binary, BinaryOp::And), binary);
        assert_eq!(ast.operand_for(five, BinaryOp::Add), five);
    }

    #[test]
    fn test_looser_left_operand_does_not_read_as_tree() {
        let mut ast = Ast::new(4);
        let (comparison, _) = comparison(&mut ast);
        assert!(ast.reads_as_tree(comparison));

        let difference = ast.binary_operator(Some(BinaryOp::Sub), comparison).unwrap();
        assert!(!ast.reads_as_tree(difference));
        let conjunction = ast.binary_operator(Some(BinaryOp::And), comparison).unwrap();
        assert!(ast.reads_as_tree(conjunction));
    }

    #[test]
    fn test_collect_garbage_releases_unreachable_and_reuses_ids() {
        let mut ast = Ast::new(4);
        let stmt = ast.var_assignment("x");
        let line = ast.node(ast.root()).unwrap().body[0];
        ast.swap_in(line, stmt).unwrap();
        ast.kill(line);
        let stray = ast.number_literal("7");
        ast.relayout();
        let live = ast.live_count();
        let len = ast.len();

        let released = ast.collect_garbage();
        assert!(released.contains(&line));
        assert!(released.contains(&stray));
        assert!(!released.contains(&stmt));
        assert!(!ast.is_alive(stray));
        assert_eq!(ast.live_count(), live);
        assert_eq!(ast.render_text(), "x = ___");
        assert!(ast.collect_garbage().is_empty());

        let reused = ast.number_literal("8");
        assert!(released.contains(&reused));
        assert!(ast.is_alive(reused));
        assert_eq!(ast.len(), len);
    }
}
