//! Pure predicates deciding which edits are legal
//!
//! Every predicate takes an optional [`Context`] and recomputes the current
//! one when it is `None`. Predicates only read the session. Several of them
//! recognise overlapping states, so callers consult them in a fixed order
//! (see the rule tables in `router`).

use crate::editor::autocomplete::{AutocompleteMatcher, Insertion, MatchOutcome};
use crate::editor::ast::capability::{TextEditable, TextRule};
use crate::editor::ast::{
    AutocompleteContext, BinaryOp, DataType, ExpressionKind, InsertionType, LiteralKind, NodeId,
    NodeKind, StatementKind, TokenKind,
};
use crate::editor::catalog::{ConstructDefinition, ConstructShape};
use crate::editor::focus::{accepts_modifier, innermost_to_left, is_blank_line, Context};
use crate::editor::scope::VisibleVariable;
use crate::editor::session::EditorSession;
use std::borrow::Cow;

/// Predicate library over one session
pub struct Validator<'a> {
    session: &'a EditorSession,
}

impl<'a> Validator<'a> {
    pub fn new(session: &'a EditorSession) -> Self {
        Self { session }
    }

    fn resolve<'c>(&self, context: Option<&'c Context>) -> Cow<'c, Context> {
        match context {
            Some(context) => Cow::Borrowed(context),
            None => Cow::Owned(self.session.context()),
        }
    }

    fn token_kind(&self, id: Option<NodeId>) -> Option<&'a TokenKind> {
        self.session.ast.kind(id?).and_then(|kind| kind.token())
    }

    fn statement_kind(&self, id: NodeId) -> Option<&'a StatementKind> {
        self.session.ast.statement_kind(id)
    }

    // ---- line position ----

    pub fn on_empty_line(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        is_blank_line(&self.session.ast, c.line_statement)
    }

    pub fn at_line_start(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        self.session
            .ast
            .get(c.line_statement)
            .map(|node| c.column() == node.left)
            .unwrap_or(false)
    }

    pub fn at_line_end(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        self.session
            .ast
            .get(c.line_statement)
            .map(|node| c.column() == node.right)
            .unwrap_or(false)
    }

    // ---- editable text ----

    pub fn inside_editable_text(&self, context: Option<&Context>) -> bool {
        self.resolve(context).text_editable.is_some()
    }

    /// Rule and current text of the editable token under the cursor
    fn editable(&self, c: &Context) -> Option<(NodeId, TextRule, &'a str, usize)> {
        let ast = &self.session.ast;
        let id = c.text_editable?;
        let node = ast.get(id)?;
        let parent_kind = node.parent.and_then(|parent| ast.kind(parent));
        let rule = TextRule::for_token(&node.kind, parent_kind)?;
        let text = node.editable_text()?;
        Some((id, rule, text, c.column().saturating_sub(node.left)))
    }

    pub fn can_insert_char_in_text(&self, ch: char, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        let Some((_, rule, text, offset)) = self.editable(&c) else {
            return false;
        };
        rule.accepts(&splice(text, offset, Some(ch), false))
    }

    pub fn can_delete_char_in_text(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        let Some((_, rule, text, offset)) = self.editable(&c) else {
            return false;
        };
        if offset == 0 {
            return false;
        }
        let candidate = splice(text, offset - 1, None, true);
        survives_deletion(rule, &candidate)
    }

    pub fn can_delete_next_char_in_text(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        let Some((_, rule, text, offset)) = self.editable(&c) else {
            return false;
        };
        if offset >= text.chars().count() {
            return false;
        }
        let candidate = splice(text, offset, None, true);
        survives_deletion(rule, &candidate)
    }

    // ---- autocomplete ----

    pub fn is_autocomplete_active(&self, context: Option<&Context>) -> bool {
        self.resolve(context).autocomplete.is_some()
    }

    /// Text and context of the autocomplete token under the cursor
    pub fn autocomplete_state(&self, context: Option<&Context>) -> Option<(NodeId, String, AutocompleteContext)> {
        let c = self.resolve(context);
        let id = c.autocomplete?;
        match self.token_kind(Some(id))? {
            TokenKind::Autocomplete { text, context } => Some((id, text.clone(), *context)),
            _ => None,
        }
    }

    /// Variables visible where `node` sits
    pub fn visible_variables_at(&self, node: NodeId) -> Vec<VisibleVariable> {
        let session = self.session;
        let (scope, line) = session.scopes.query_site(&session.ast, node);
        session.scopes.visible_variables(&session.ast, scope, line)
    }

    /// How the token text would classify after typing `ch`
    pub fn autocomplete_extension(&self, ch: char, context: Option<&Context>) -> MatchOutcome {
        let c = self.resolve(context);
        let Some((id, text, ac_context)) = self.autocomplete_state(Some(&c)) else {
            return MatchOutcome::NoMatch;
        };
        let offset = self
            .session
            .ast
            .get(id)
            .map(|node| c.column().saturating_sub(node.left))
            .unwrap_or(0);
        let candidate = splice(&text, offset, Some(ch), false);
        let variables = self.visible_variables_at(id);
        AutocompleteMatcher::new(&self.session.catalog, &variables).evaluate(&candidate, ac_context)
    }

    /// Whether typing `ch` here would start a token in `ac_context`
    pub fn opens_autocomplete(&self, ch: char, ac_context: AutocompleteContext, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        let variables = self.visible_variables_at(c.line_statement);
        AutocompleteMatcher::new(&self.session.catalog, &variables).evaluate(&ch.to_string(), ac_context)
            != MatchOutcome::NoMatch
    }

    pub fn can_extend_autocomplete(&self, ch: char, context: Option<&Context>) -> bool {
        self.autocomplete_extension(ch, context) != MatchOutcome::NoMatch
    }

    /// Insertion for the token's text taken as a complete word
    pub fn autocomplete_word(&self, context: Option<&Context>) -> Option<Insertion> {
        let (id, text, ac_context) = self.autocomplete_state(context)?;
        let variables = self.visible_variables_at(id);
        AutocompleteMatcher::new(&self.session.catalog, &variables).exact_word(&text, ac_context)
    }

    /// Whether the word commits to a catalog construct rather than a variable
    pub fn autocomplete_word_is_construct(&self, context: Option<&Context>) -> bool {
        matches!(self.autocomplete_word(context), Some(Insertion::Definition { .. }))
    }

    pub fn can_commit_autocomplete(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        let Some((id, text, ac_context)) = self.autocomplete_state(Some(&c)) else {
            return false;
        };
        if self.session.menu.token() == Some(id) && self.session.menu.selected_option().is_some() {
            return true;
        }
        let variables = self.visible_variables_at(id);
        AutocompleteMatcher::new(&self.session.catalog, &variables)
            .commit_target(&text, ac_context)
            .is_some()
    }

    // ---- holes ----

    /// Empty expression hole that is selected or touches the cursor
    pub fn empty_hole_at(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        [c.selected, c.token_to_right, c.token_to_left]
            .into_iter()
            .flatten()
            .find(|id| matches!(self.token_kind(Some(*id)), Some(TokenKind::EmptyExpression)))
    }

    pub fn at_empty_expression_hole(&self, context: Option<&Context>) -> bool {
        self.empty_hole_at(context).is_some()
    }

    pub fn operator_hole_at(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        [c.selected, c.token_to_right, c.token_to_left]
            .into_iter()
            .flatten()
            .find(|id| matches!(self.token_kind(Some(*id)), Some(TokenKind::EmptyOperator)))
    }

    pub fn at_empty_operator_hole(&self, context: Option<&Context>) -> bool {
        self.operator_hole_at(context).is_some()
    }

    /// Editable text with no characters, unless the cursor sits at an empty hole
    pub fn is_token_empty(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        if self.at_empty_expression_hole(Some(&c)) {
            return false;
        }
        c.text_editable
            .and_then(|id| self.session.ast.get(id))
            .and_then(|node| node.editable_text())
            .map(str::is_empty)
            .unwrap_or(false)
    }

    /// Verdict for a value of type `returns` going where `occupant` sits
    pub fn insertion_verdict(&self, occupant: NodeId, returns: DataType) -> InsertionType {
        self.session
            .ast
            .insertion_type(occupant, returns, &self.session.conversions)
    }

    /// Verdict for instantiating a catalog template at `occupant`
    pub fn definition_verdict(&self, definition: &ConstructDefinition, occupant: NodeId) -> InsertionType {
        match definition_returns(definition) {
            Some(returns) => self.insertion_verdict(occupant, returns),
            None => InsertionType::Invalid,
        }
    }

    /// Verdict for a variable reference to `name` at `occupant`
    pub fn reference_verdict(&self, name: &str, occupant: NodeId) -> InsertionType {
        let session = self.session;
        let (scope, line) = session.scopes.query_site(&session.ast, occupant);
        match session.scopes.resolve(&session.ast, scope, name, line) {
            Some(reference) => {
                let data_type = session.scopes.variable_type(&session.ast, &reference);
                self.insertion_verdict(occupant, data_type)
            }
            None => InsertionType::DraftMode,
        }
    }

    // ---- expressions ----

    pub fn at_right_of_expression(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        c.expression_to_left.is_some() && c.autocomplete.is_none()
    }

    pub fn can_insert_binary_operator(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        if c.autocomplete.is_some() {
            return false;
        }
        let Some(expr) = c.expression_to_left else {
            return false;
        };
        let ast = &self.session.ast;
        ast.parent(expr).is_some() && ast.returns(expr) != DataType::Void
    }

    /// Operator left of the cursor that `ch` turns into a two-character one
    pub fn extendable_operator(&self, ch: char, context: Option<&Context>) -> Option<(NodeId, BinaryOp)> {
        let c = self.resolve(context);
        let token = c.token_to_left?;
        let TokenKind::Operator(op) = self.token_kind(Some(token))? else {
            return None;
        };
        if ch != '=' {
            return None;
        }
        let binary = self.session.ast.parent(token)?;
        Some((binary, op.extended_with_equals()?))
    }

    pub fn can_extend_operator(&self, ch: char, context: Option<&Context>) -> bool {
        self.extendable_operator(ch, context).is_some()
    }

    pub fn can_insert_modifier(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        if c.autocomplete.is_some() {
            return false;
        }
        c.expression_to_left
            .map(|expr| accepts_modifier(&self.session.ast, expr))
            .unwrap_or(false)
    }

    /// Whether `target` can be wrapped in a call to `function`
    pub fn can_wrap_expression(&self, target: NodeId, function: &str) -> bool {
        let ast = &self.session.ast;
        if !ast.is_filled(target) || ast.get(target).and_then(|n| n.slot.as_ref()).is_none() {
            return false;
        }
        let Some(ConstructShape::FunctionCall { args, returns, statement_only, .. }) =
            self.session.catalog.function(function).map(|d| &d.shape)
        else {
            return false;
        };
        if *statement_only {
            return false;
        }
        let Some(first) = args.first() else {
            return false;
        };
        first.accepts(ast.returns(target)) && self.insertion_verdict(target, *returns).is_allowed()
    }

    /// What unwrapping `target` would leave in its place
    pub fn unwrap_replacement(&self, target: NodeId) -> Option<NodeId> {
        let ast = &self.session.ast;
        let node = ast.get(target)?;
        node.slot.as_ref()?;
        let inner = match &node.kind {
            NodeKind::Expression(ExpressionKind::ValueOperation) => *node.tokens.first()?,
            NodeKind::Expression(ExpressionKind::FunctionCall { .. }) => {
                let filled: Vec<NodeId> =
                    node.tokens.iter().copied().filter(|t| ast.is_filled(*t)).collect();
                let holes = node.tokens.iter().filter(|t| {
                    ast.kind(**t).map(|k| k.is_expression_hole()).unwrap_or(false)
                });
                if filled.len() != 1 || holes.count() != 0 {
                    return None;
                }
                filled[0]
            }
            _ => return None,
        };
        self.insertion_verdict(target, ast.returns(inner))
            .is_allowed()
            .then_some(inner)
    }

    pub fn can_unwrap_expression(&self, target: NodeId) -> bool {
        self.unwrap_replacement(target).is_some()
    }

    // ---- list literals ----

    /// List literal and item index next to the cursor
    pub fn list_item_at(&self, context: Option<&Context>) -> Option<(NodeId, NodeId)> {
        let c = self.resolve(context);
        let ast = &self.session.ast;
        [c.selected, c.expression_to_left, c.token_to_left]
            .into_iter()
            .flatten()
            .find_map(|item| {
                let parent = ast.parent(item)?;
                matches!(ast.kind(parent), Some(NodeKind::Expression(ExpressionKind::ListLiteral)))
                    .then_some((parent, item))
                    .filter(|_| !matches!(ast.kind(item), Some(NodeKind::Token(TokenKind::NonEditable(_)))))
            })
    }

    pub fn can_insert_list_item(&self, context: Option<&Context>) -> bool {
        self.list_item_at(context).is_some()
    }

    /// Selected empty item of a list that has other items
    pub fn removable_list_item(&self, context: Option<&Context>) -> Option<(NodeId, NodeId)> {
        let c = self.resolve(context);
        let ast = &self.session.ast;
        let hole = c.selected.filter(|id| {
            matches!(self.token_kind(Some(*id)), Some(TokenKind::EmptyExpression))
        })?;
        let list = ast.parent(hole)?;
        if !matches!(ast.kind(list), Some(NodeKind::Expression(ExpressionKind::ListLiteral))) {
            return None;
        }
        let items = ast
            .get(list)?
            .tokens
            .iter()
            .filter(|t| !matches!(ast.kind(**t), Some(NodeKind::Token(TokenKind::NonEditable(_)))))
            .count();
        (items > 1).then_some((list, hole))
    }

    pub fn can_remove_list_item(&self, context: Option<&Context>) -> bool {
        self.removable_list_item(context).is_some()
    }

    // ---- construct deletion ----

    /// Filled expression ending at the cursor that can turn back into a hole
    pub fn deletable_expression_left(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        let ast = &self.session.ast;
        let target = innermost_to_left(ast, &c)?;
        self.is_deletable_expression(target).then_some(target)
    }

    /// Filled expression starting at the cursor that can turn back into a hole
    pub fn deletable_expression_right(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        let target = c.expression_to_right?;
        self.is_deletable_expression(target).then_some(target)
    }

    fn is_deletable_expression(&self, target: NodeId) -> bool {
        let ast = &self.session.ast;
        ast.is_filled(target) && ast.get(target).map(|n| n.slot.is_some()).unwrap_or(false)
    }

    pub fn can_delete_expression(&self, context: Option<&Context>) -> bool {
        self.deletable_expression_left(context).is_some()
    }

    /// Expression or modifier around a selected hole whose holes are all still empty
    pub fn empty_parent_of_hole(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        let ast = &self.session.ast;
        let hole = c.selected.filter(|id| {
            matches!(self.token_kind(Some(*id)), Some(TokenKind::EmptyExpression))
        })?;
        let parent = ast.parent(hole)?;
        let node = ast.get(parent)?;
        let untouched = matches!(
            node.kind,
            NodeKind::Expression(ExpressionKind::FunctionCall { .. })
                | NodeKind::Expression(ExpressionKind::ListLiteral)
                | NodeKind::Expression(ExpressionKind::UnaryOperator(_))
                | NodeKind::Modifier(_)
        ) && node.tokens.iter().all(|t| {
            matches!(
                ast.kind(*t),
                Some(NodeKind::Token(TokenKind::NonEditable(_)))
                    | Some(NodeKind::Token(TokenKind::EmptyExpression))
            )
        });
        untouched.then_some(parent)
    }

    /// Binary expression whose right operand is the selected hole
    /// String literal with no characters, holding the cursor between its quotes
    pub fn empty_string_literal_at(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        if !self.is_token_empty(Some(&c)) {
            return None;
        }
        let ast = &self.session.ast;
        let literal = ast.parent(c.text_editable?)?;
        let node = ast.get(literal)?;
        (matches!(
            node.kind,
            NodeKind::Expression(ExpressionKind::Literal(LiteralKind::String))
        ) && node.slot.is_some())
        .then_some(literal)
    }

    pub fn binary_with_empty_right(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        let ast = &self.session.ast;
        let hole = c.selected.filter(|id| {
            matches!(self.token_kind(Some(*id)), Some(TokenKind::EmptyExpression))
        })?;
        let parent = ast.parent(hole)?;
        let is_right = ast.get(hole).map(|n| n.index_in_parent == 2).unwrap_or(false);
        (is_right
            && matches!(ast.kind(parent), Some(NodeKind::Expression(ExpressionKind::BinaryOperator))))
        .then_some(parent)
    }

    /// Expression statement whose expression ends at the cursor
    pub fn sole_expression_left(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        let ast = &self.session.ast;
        let target = innermost_to_left(ast, &c)?;
        self.statement_owning(target)
    }

    /// The expression statement `expr` is the whole of, if any
    pub fn statement_owning(&self, expr: NodeId) -> Option<NodeId> {
        let ast = &self.session.ast;
        let parent = ast.parent(expr)?;
        matches!(self.statement_kind(parent), Some(StatementKind::Expression)).then_some(parent)
    }

    pub fn deletable_modifier_left(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        let target = innermost_to_left(&self.session.ast, &c)?;
        self.session
            .ast
            .kind(target)
            .filter(|kind| kind.is_modifier())
            .map(|_| target)
    }

    pub fn can_delete_modifier(&self, context: Option<&Context>) -> bool {
        self.deletable_modifier_left(context).is_some()
    }

    /// Binary expression whose operator sits left of the cursor
    pub fn binary_operator_left(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        let token = c.token_to_left?;
        match self.token_kind(Some(token))? {
            TokenKind::Operator(_) | TokenKind::EmptyOperator => self.session.ast.parent(token),
            _ => None,
        }
    }

    pub fn can_delete_binary_operator(&self, context: Option<&Context>) -> bool {
        self.binary_operator_left(context).is_some()
    }

    // ---- statements and lines ----

    pub fn can_delete_statement(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        let stmt = c.line_statement;
        match self.statement_kind(stmt) {
            None | Some(StatementKind::EmptyLine) => false,
            Some(_) => self.at_line_start(Some(&c)) && !self.would_orphan_else_chain(stmt),
        }
    }

    /// Whether removing `stmt` would leave an `elif`/`else` without its head
    pub fn would_orphan_else_chain(&self, stmt: NodeId) -> bool {
        let ast = &self.session.ast;
        let next_continues = ast
            .next_sibling(stmt)
            .and_then(|next| ast.statement_kind(next))
            .map(|kind| kind.continues_chain())
            .unwrap_or(false);
        if !next_continues {
            return false;
        }
        let removable_elif = matches!(self.statement_kind(stmt), Some(StatementKind::Elif))
            && self.body_is_blank(stmt)
            && ast
                .prev_sibling(stmt)
                .and_then(|prev| ast.statement_kind(prev))
                .map(|kind| kind.opens_chain())
                .unwrap_or(false);
        !removable_elif
    }

    /// Whether every statement of a body is a blank line
    pub fn body_is_blank(&self, stmt: NodeId) -> bool {
        let ast = &self.session.ast;
        ast.get(stmt)
            .map(|node| node.body.iter().all(|s| is_blank_line(ast, *s)))
            .unwrap_or(true)
    }

    fn body_len_of_parent(&self, stmt: NodeId) -> usize {
        let ast = &self.session.ast;
        ast.parent(stmt)
            .and_then(|parent| ast.get(parent))
            .map(|parent| parent.body.len())
            .unwrap_or(0)
    }

    pub fn can_delete_empty_line(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        self.on_empty_line(Some(&c))
            && self.at_line_start(Some(&c))
            && self.body_len_of_parent(c.line_statement) > 1
    }

    /// Blank line right below the cursor's line that can go
    pub fn next_empty_line(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        if !self.at_line_end(Some(&c)) {
            return None;
        }
        let ast = &self.session.ast;
        let next = ast.statement_at_line(c.line() + 1)?;
        (is_blank_line(ast, next) && self.body_len_of_parent(next) > 1).then_some(next)
    }

    pub fn can_delete_next_empty_line(&self, context: Option<&Context>) -> bool {
        self.next_empty_line(context).is_some()
    }

    pub fn can_insert_empty_line_above(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        self.at_line_start(Some(&c))
            && !self
                .statement_kind(c.line_statement)
                .map(|kind| kind.continues_chain())
                .unwrap_or(false)
    }

    pub fn can_insert_empty_line_below(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        c.autocomplete.is_none() && self.at_line_end(Some(&c))
    }

    pub fn can_indent_forward(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        let ast = &self.session.ast;
        let stmt = c.line_statement;
        if !self.at_line_start(Some(&c)) {
            return false;
        }
        let Some(kind) = self.statement_kind(stmt) else {
            return false;
        };
        let prev_has_body = ast
            .prev_sibling(stmt)
            .and_then(|prev| ast.statement_kind(prev))
            .map(|kind| kind.has_body())
            .unwrap_or(false);
        let next_continues = ast
            .next_sibling(stmt)
            .and_then(|next| ast.statement_kind(next))
            .map(|kind| kind.continues_chain())
            .unwrap_or(false);
        prev_has_body && !kind.continues_chain() && !(kind.opens_chain() && next_continues)
    }

    pub fn can_indent_backward(&self, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        let ast = &self.session.ast;
        let stmt = c.line_statement;
        if !self.at_line_start(Some(&c)) {
            return false;
        }
        let Some(parent) = ast.parent(stmt) else {
            return false;
        };
        let Some(parent_kind) = self.statement_kind(parent) else {
            return false;
        };
        let is_last = ast.next_sibling(stmt).is_none();
        let continues = self
            .statement_kind(stmt)
            .map(|kind| kind.continues_chain())
            .unwrap_or(true);
        let parent_chain_follows = ast
            .next_sibling(parent)
            .and_then(|next| ast.statement_kind(next))
            .map(|kind| kind.continues_chain())
            .unwrap_or(false);
        is_last && !continues && !(parent_kind.opens_chain() && parent_chain_follows)
    }

    pub fn inside_loop(&self, stmt: NodeId) -> bool {
        let ast = &self.session.ast;
        let mut current = ast.parent(stmt);
        while let Some(id) = current {
            if ast.statement_kind(id).map(|kind| kind.is_loop()).unwrap_or(false) {
                return true;
            }
            current = ast.parent(id);
        }
        false
    }

    /// Whether a statement of `kind` may replace the blank line `stmt`
    pub fn can_insert_statement(&self, kind: &StatementKind, stmt: NodeId) -> bool {
        let ast = &self.session.ast;
        if !matches!(self.statement_kind(stmt), Some(StatementKind::EmptyLine)) {
            return false;
        }
        let prev_opens = ast
            .prev_sibling(stmt)
            .and_then(|prev| ast.statement_kind(prev))
            .map(|kind| kind.opens_chain())
            .unwrap_or(false);
        let next_continues = ast
            .next_sibling(stmt)
            .and_then(|next| ast.statement_kind(next))
            .map(|kind| kind.continues_chain())
            .unwrap_or(false);
        match kind {
            StatementKind::Elif => prev_opens,
            StatementKind::Else => prev_opens && !next_continues,
            StatementKind::Break | StatementKind::Continue => self.inside_loop(stmt),
            _ => true,
        }
    }

    /// Whether the template can be instantiated in the current context
    pub fn can_insert_definition(&self, definition: &ConstructDefinition, context: Option<&Context>) -> bool {
        let c = self.resolve(context);
        match definition.context {
            AutocompleteContext::StartOfLine => {
                let line_ok = self.on_empty_line(Some(&c))
                    || self
                        .autocomplete_state(Some(&c))
                        .map(|(_, _, ac)| ac == AutocompleteContext::StartOfLine)
                        .unwrap_or(false);
                line_ok
                    && statement_kind_of(definition)
                        .map(|kind| self.can_insert_statement(&kind, c.line_statement))
                        .unwrap_or(true)
            }
            AutocompleteContext::Expression => {
                let occupant = c.autocomplete.or_else(|| self.empty_hole_at(Some(&c)));
                occupant
                    .map(|o| self.definition_verdict(definition, o).is_allowed())
                    .unwrap_or(false)
            }
            AutocompleteContext::RightOfExpression => match &definition.shape {
                ConstructShape::BinaryOperator { .. } => self.can_insert_binary_operator(Some(&c)),
                ConstructShape::MethodCall { receiver, .. } => {
                    self.can_insert_modifier(Some(&c))
                        && c.expression_to_left
                            .map(|e| receiver.accepts(self.session.ast.returns(e)))
                            .unwrap_or(false)
                }
                ConstructShape::ListAccess => self.can_insert_modifier(Some(&c)),
                _ => false,
            },
        }
    }

    // ---- menu and drafts ----

    pub fn is_menu_open(&self) -> bool {
        self.session.menu.is_visible()
    }

    /// Draft record on the cursor's line
    pub fn draft_at(&self, context: Option<&Context>) -> Option<NodeId> {
        let c = self.resolve(context);
        self.session
            .drafts
            .record_on_statement(&self.session.ast, c.line_statement)
            .map(|record| record.construct)
    }

    /// Whether the menu is open on `token` with an option highlighted
    pub fn menu_choice_for(&self, token: NodeId) -> bool {
        let menu = &self.session.menu;
        menu.token() == Some(token) && menu.selected_option().is_some()
    }

    // ---- node lookups ----

    pub fn kind_of(&self, id: NodeId) -> Option<&'a NodeKind> {
        self.session.ast.kind(id)
    }

    /// Whether `id` sits in a typed slot it can fall back to
    pub fn has_slot(&self, id: NodeId) -> bool {
        self.session
            .ast
            .get(id)
            .map(|node| node.slot.is_some())
            .unwrap_or(false)
    }

    pub fn bounds_of(&self, id: NodeId) -> Option<(usize, usize)> {
        self.session.ast.get(id).map(|node| (node.left, node.right))
    }

    pub fn can_undo(&self) -> bool {
        self.session.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.can_redo()
    }
}

/// Insert `ch` at char `offset`, or remove the char at `offset`
fn splice(text: &str, offset: usize, ch: Option<char>, remove: bool) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let offset = offset.min(chars.len());
    if remove {
        if offset < chars.len() {
            chars.remove(offset);
        }
    } else if let Some(ch) = ch {
        chars.insert(offset, ch);
    }
    chars.into_iter().collect()
}

/// Numbers and names may not be emptied or broken by a deletion
fn survives_deletion(rule: TextRule, candidate: &str) -> bool {
    match rule {
        TextRule::String => true,
        _ => !candidate.is_empty() && rule.accepts(candidate),
    }
}

/// Result type of a template once instantiated, `None` for statements
pub fn definition_returns(definition: &ConstructDefinition) -> Option<DataType> {
    match &definition.shape {
        ConstructShape::FunctionCall {
            returns,
            statement_only,
            ..
        } => (!statement_only).then_some(*returns),
        ConstructShape::BooleanLiteral { .. } | ConstructShape::UnaryOperator { .. } => {
            Some(DataType::Boolean)
        }
        ConstructShape::ListLiteral => Some(DataType::AnyList),
        _ => None,
    }
}

/// Statement kind a StartOfLine template produces
pub fn statement_kind_of(definition: &ConstructDefinition) -> Option<StatementKind> {
    match &definition.shape {
        ConstructShape::Statement { statement } => Some(statement.statement_kind()),
        ConstructShape::ForLoop => Some(StatementKind::For),
        ConstructShape::Assignment => Some(StatementKind::VarAssignment),
        ConstructShape::Import { module, item } => Some(StatementKind::Import {
            module: module.clone(),
            item: item.clone(),
        }),
        ConstructShape::FunctionCall { .. } | ConstructShape::AugmentedAssignment { .. } => {
            Some(StatementKind::Expression)
        }
        _ => None,
    }
}
