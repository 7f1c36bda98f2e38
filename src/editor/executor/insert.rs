//! Construct insertion: templates, literals, references, operators and modifiers

use super::text::TokenSite;
use super::{reject, ActionExecutor, Step};
use crate::editor::action::LiteralValue;
use crate::editor::ast::{
    AutocompleteContext, BinaryOp, ExpressionKind, InsertionType, NodeId, NodeKind, TokenKind,
    TypeSet,
};
use crate::editor::autocomplete::Insertion;
use crate::editor::catalog::{ConstructDefinition, ConstructShape};
use crate::error::{EditorError, Result};
use tracing::debug;

/// Where a new construct goes
#[derive(Debug, Clone, Copy)]
pub(crate) enum Site {
    /// Replaces a blank line
    Line(NodeId),
    /// Replaces a hole or a token standing in for one
    Occupant(NodeId),
    /// Attaches to the expression
    After(NodeId),
}

impl From<(TokenSite, NodeId)> for Site {
    fn from((site, token): (TokenSite, NodeId)) -> Self {
        match site {
            TokenSite::Line(line) => Site::Line(line),
            TokenSite::Hole(_) => Site::Occupant(token),
            TokenSite::After(expr) => Site::After(expr),
        }
    }
}

impl<'a> ActionExecutor<'a> {
    /// Replace an autocomplete token with what its text committed to
    pub(super) fn commit_insertion(&mut self, token: NodeId, insertion: Insertion) -> Result<Step> {
        debug!("Committing {:?} from token {}", insertion, token);
        let site = Site::from((self.take_token(token)?, token));
        match insertion {
            Insertion::Definition { id, capture } => {
                let definition = self.session.catalog.require(&id)?.clone();
                self.instantiate(&definition, capture, site)
            }
            Insertion::VariableReference { name } => self.insert_reference(&name, site),
            Insertion::MethodOnVariable { variable, method } => {
                let Site::Line(line) = site else {
                    return reject("method calls on a variable start a line");
                };
                let definition = self.session.catalog.require(&method)?.clone();
                let ConstructShape::MethodCall { name, args, returns, .. } = &definition.shape else {
                    return Err(EditorError::MalformedTemplate {
                        id: definition.id.clone(),
                        reason: "not a method call".to_string(),
                    });
                };
                let modifier = self.session.ast.method_call(name, args, *returns);
                self.variable_statement(line, &variable, modifier)
            }
            Insertion::ListAccessOnVariable { variable } => {
                let Site::Line(line) = site else {
                    return reject("list access on a variable starts a line");
                };
                let modifier = self.session.ast.list_access();
                self.variable_statement(line, &variable, modifier)
            }
        }
    }

    /// `variable<modifier>` as a statement on `line`
    fn variable_statement(&mut self, line: NodeId, variable: &str, modifier: NodeId) -> Result<Step> {
        let ast = &mut self.session.ast;
        let base = ast.variable_reference(variable);
        let chain = ast.value_operation(base, vec![modifier])?;
        let stmt = ast.expression_statement(chain)?;
        self.replace_line(line, stmt)?;
        self.verdict = Some(self.session.validator().reference_verdict(variable, base));
        self.focus_on(modifier);
        Ok(Step::Applied)
    }

    /// Insert a catalog template without typing it
    pub(super) fn insert_construct(&mut self, id: &str) -> Result<Step> {
        let definition = self.session.catalog.require(id)?.clone();
        if definition.needs_capture() {
            return reject(format!("'{}' needs a name, type it instead", definition.label));
        }
        let context = self.session.context();
        if context.autocomplete.is_some() {
            return reject("finish the word being typed first");
        }
        let validator = self.session.validator();
        if !validator.can_insert_definition(&definition, Some(&context)) {
            let verdict = validator
                .empty_hole_at(Some(&context))
                .map(|hole| validator.definition_verdict(&definition, hole));
            self.verdict = verdict;
            return reject(format!("'{}' cannot be inserted here", definition.label));
        }
        let site = match definition.context {
            AutocompleteContext::StartOfLine => Site::Line(context.line_statement),
            AutocompleteContext::Expression => {
                match validator.empty_hole_at(Some(&context)) {
                    Some(hole) => Site::Occupant(hole),
                    None => return reject("no empty hole at the cursor"),
                }
            }
            AutocompleteContext::RightOfExpression => {
                match context.expression_to_left {
                    Some(expr) => Site::After(expr),
                    None => return reject("no expression left of the cursor"),
                }
            }
        };
        self.instantiate(&definition, None, site)
    }

    pub(super) fn insert_modifier(&mut self, id: &str) -> Result<Step> {
        let definition = self.session.catalog.require(id)?;
        if !matches!(
            definition.shape,
            ConstructShape::MethodCall { .. } | ConstructShape::ListAccess
        ) {
            return reject(format!("'{}' is not a modifier", definition.label));
        }
        self.insert_construct(id)
    }

    /// Build a template at `site`
    pub(crate) fn instantiate(
        &mut self,
        definition: &ConstructDefinition,
        capture: Option<String>,
        site: Site,
    ) -> Result<Step> {
        match site {
            Site::Line(line) => self.instantiate_statement(definition, capture, line),
            Site::Occupant(occupant) => self.instantiate_expression(definition, occupant),
            Site::After(expr) => self.instantiate_trailing(definition, expr),
        }
    }

    fn instantiate_statement(
        &mut self,
        definition: &ConstructDefinition,
        capture: Option<String>,
        line: NodeId,
    ) -> Result<Step> {
        let name = capture.unwrap_or_default();
        if definition.needs_capture() && name.is_empty() {
            return reject(format!("'{}' needs a name", definition.label));
        }
        let mut reference = None;
        let stmt = match &definition.shape {
            ConstructShape::Statement { statement } => {
                let kind = statement.statement_kind();
                if !self.session.validator().can_insert_statement(&kind, line) {
                    return reject(format!("'{}' is not allowed here", kind.keyword()));
                }
                if kind.has_body() {
                    self.session.ast.compound(kind)
                } else {
                    self.session.ast.keyword_statement(kind)
                }
            }
            ConstructShape::ForLoop => self.session.ast.for_loop(&name),
            ConstructShape::Assignment => self.session.ast.var_assignment(&name),
            ConstructShape::AugmentedAssignment { op } => {
                let ast = &mut self.session.ast;
                let base = ast.variable_reference(&name);
                let tail = ast.augmented_assignment(*op);
                let chain = ast.value_operation(base, vec![tail])?;
                reference = Some(base);
                ast.expression_statement(chain)?
            }
            ConstructShape::Import { module, item } => self.session.ast.import_statement(module, item),
            ConstructShape::FunctionCall {
                name,
                args,
                returns,
                import,
                ..
            } => {
                let ast = &mut self.session.ast;
                let call = ast.function_call(name, args, *returns, import.clone());
                ast.expression_statement(call)?
            }
            _ => return reject(format!("'{}' cannot start a line", definition.label)),
        };
        self.replace_line(line, stmt)?;
        self.verdict = Some(match reference {
            Some(base) => self.session.validator().reference_verdict(&name, base),
            None => InsertionType::Valid,
        });
        self.focus_on(stmt);
        Ok(Step::Applied)
    }

    fn instantiate_expression(&mut self, definition: &ConstructDefinition, occupant: NodeId) -> Result<Step> {
        let verdict = self.session.validator().definition_verdict(definition, occupant);
        self.verdict = Some(verdict);
        if verdict == InsertionType::Invalid {
            return reject(self.mismatch_reason(&definition.label, occupant));
        }
        let ast = &mut self.session.ast;
        let expr = match &definition.shape {
            ConstructShape::FunctionCall {
                name,
                args,
                returns,
                import,
                ..
            } => ast.function_call(name, args, *returns, import.clone()),
            ConstructShape::BooleanLiteral { value } => ast.boolean_literal(*value),
            ConstructShape::ListLiteral => ast.list_literal(),
            ConstructShape::UnaryOperator { op } => ast.unary_operator(*op),
            _ => return reject(format!("'{}' is not an expression", definition.label)),
        };
        ast.swap_in(occupant, expr)?;
        ast.kill(occupant);
        self.focus_on(expr);
        Ok(Step::Applied)
    }

    fn instantiate_trailing(&mut self, definition: &ConstructDefinition, expr: NodeId) -> Result<Step> {
        match &definition.shape {
            ConstructShape::BinaryOperator { op } => self.wrap_binary(expr, Some(*op)),
            ConstructShape::MethodCall {
                name,
                receiver,
                args,
                returns,
            } => {
                let actual = self.session.ast.returns(expr);
                if !receiver.accepts(actual) {
                    self.verdict = Some(InsertionType::Invalid);
                    return reject(format!("{} has no {}", actual, definition.label));
                }
                let modifier = self.session.ast.method_call(name, args, *returns);
                self.attach_modifier(expr, modifier)
            }
            ConstructShape::ListAccess => {
                let modifier = self.session.ast.list_access();
                self.attach_modifier(expr, modifier)
            }
            _ => reject(format!("'{}' cannot follow an expression", definition.label)),
        }
    }

    pub(super) fn mismatch_reason(&self, label: &str, occupant: NodeId) -> String {
        match self.session.ast.effective_slot(occupant) {
            Some(slot) => format!("Cannot insert {} here: expected {}", label, slot),
            None => format!("Cannot insert {} here", label),
        }
    }

    /// Swap a blank line for a new statement and register what it declares
    pub(super) fn replace_line(&mut self, line: NodeId, stmt: NodeId) -> Result<()> {
        self.session.ast.swap_in(line, stmt)?;
        self.session.ast.kill(line);
        self.session.ast.relayout();
        self.register_statement(stmt)
    }

    // ---- literals and references ----

    pub(super) fn insert_literal(&mut self, value: &LiteralValue) -> Result<Step> {
        let context = self.session.context();
        let Some(hole) = self.session.validator().empty_hole_at(Some(&context)) else {
            return reject("no empty hole at the cursor");
        };
        let ast = &mut self.session.ast;
        let literal = match value {
            LiteralValue::Number(digits) => ast.number_literal(digits),
            LiteralValue::String(text) => ast.string_literal(text),
            LiteralValue::Boolean(value) => ast.boolean_literal(*value),
            LiteralValue::List => ast.list_literal(),
        };
        let returns = self.session.ast.returns(literal);
        let verdict = self.session.validator().insertion_verdict(hole, returns);
        self.verdict = Some(verdict);
        if verdict == InsertionType::Invalid {
            return reject(self.mismatch_reason(returns.name(), hole));
        }
        self.session.ast.swap_in(hole, literal)?;
        self.session.ast.kill(hole);
        self.focus_on(literal);
        Ok(Step::Applied)
    }

    pub(super) fn insert_variable_reference(&mut self, name: &str) -> Result<Step> {
        let context = self.session.context();
        if let Some(token) = context.autocomplete {
            let insertion = Insertion::VariableReference {
                name: name.to_string(),
            };
            return self.commit_insertion(token, insertion);
        }
        let validator = self.session.validator();
        if let Some(hole) = validator.empty_hole_at(Some(&context)) {
            return self.insert_reference(name, Site::Occupant(hole));
        }
        if validator.on_empty_line(Some(&context)) {
            return self.insert_reference(name, Site::Line(context.line_statement));
        }
        reject("no place for a variable here")
    }

    fn insert_reference(&mut self, name: &str, site: Site) -> Result<Step> {
        match site {
            Site::Line(line) => {
                let ast = &mut self.session.ast;
                let reference = ast.variable_reference(name);
                let stmt = ast.expression_statement(reference)?;
                self.replace_line(line, stmt)?;
                self.verdict = Some(self.session.validator().reference_verdict(name, reference));
                self.caret_after(reference)?;
            }
            Site::Occupant(occupant) => {
                let verdict = self.session.validator().reference_verdict(name, occupant);
                self.verdict = Some(verdict);
                if verdict == InsertionType::Invalid {
                    return reject(self.mismatch_reason(name, occupant));
                }
                let reference = self.session.ast.variable_reference(name);
                self.session.ast.swap_in(occupant, reference)?;
                self.session.ast.kill(occupant);
                self.caret_after(reference)?;
            }
            Site::After(_) => return reject("a variable cannot follow an expression"),
        }
        Ok(Step::Applied)
    }

    // ---- operators ----

    pub(super) fn insert_binary_operator(&mut self, op: BinaryOp) -> Result<Step> {
        let context = self.session.context();
        if !self.session.validator().can_insert_binary_operator(Some(&context)) {
            return reject("no operand left of the cursor");
        }
        let Some(expr) = context.expression_to_left else {
            return reject("no operand left of the cursor");
        };
        self.wrap_binary(expr, Some(op))
    }

    /// `expr op ___` in place of `expr`, with the right operand selected
    fn wrap_binary(&mut self, expr: NodeId, op: Option<BinaryOp>) -> Result<Step> {
        let expr = match op {
            Some(op) => self.session.ast.operand_for(expr, op),
            None => expr,
        };
        let binary = self
            .session
            .ast
            .wrap_with(expr, |ast, inner| ast.binary_operator(op, inner))?;
        self.session.ast.relayout();
        if let Some(rejection) = self.check_operator(binary)? {
            return Ok(rejection);
        }
        let right = self
            .session
            .ast
            .node(binary)?
            .tokens
            .get(2)
            .copied()
            .ok_or(EditorError::MissingHole(binary))?;
        self.select(right)?;
        Ok(Step::Applied)
    }

    /// Fill an operator hole, or grow `<` into `<=`
    pub(super) fn replace_operator(&mut self, op: BinaryOp) -> Result<Step> {
        let context = self.session.context();
        let validator = self.session.validator();
        let operator = validator.operator_hole_at(Some(&context)).or_else(|| {
            context.token_to_left.filter(|token| {
                matches!(
                    self.session.ast.kind(*token),
                    Some(NodeKind::Token(TokenKind::Operator(_)))
                )
            })
        });
        let Some(operator) = operator else {
            return reject("no operator at the cursor");
        };
        let binary = self
            .session
            .ast
            .parent(operator)
            .ok_or(EditorError::Detached(operator))?;

        let ast = &mut self.session.ast;
        ast.node_mut(operator)?.kind = NodeKind::Token(TokenKind::Operator(op));
        let operands: Vec<NodeId> = ast
            .node(binary)?
            .tokens
            .iter()
            .copied()
            .enumerate()
            .filter(|(index, _)| *index != 1)
            .map(|(_, id)| id)
            .collect();
        for operand in operands {
            ast.node_mut(operand)?.slot = Some(op.operand_types());
        }
        ast.mark_changed(binary);
        ast.relayout();
        if let Some(rejection) = self.check_operator(binary)? {
            return Ok(rejection);
        }

        let right = self.session.ast.node(binary)?.tokens.get(2).copied();
        match right.filter(|r| {
            self.session
                .ast
                .kind(*r)
                .map(|k| k.is_expression_hole())
                .unwrap_or(false)
        }) {
            Some(hole) => self.select(hole)?,
            None => self.caret_after(operator)?,
        }
        Ok(Step::Applied)
    }

    /// Type-check `binary` and its filled operands where they now sit
    ///
    /// Records the combined verdict and returns the rejection when any of
    /// them is invalid or the text would no longer read as the tree.
    fn check_operator(&mut self, binary: NodeId) -> Result<Option<Step>> {
        let ast = &self.session.ast;
        let mut checked = vec![binary];
        checked.extend(
            ast.node(binary)?
                .tokens
                .iter()
                .enumerate()
                .filter(|(index, id)| *index != 1 && ast.is_filled(**id))
                .map(|(_, id)| *id),
        );

        let mut verdict = InsertionType::Valid;
        let mut offender = None;
        for id in checked {
            let own = self.verdict_in_place(id);
            if own == InsertionType::Invalid && offender.is_none() {
                offender = Some(id);
            }
            verdict = verdict.and(own);
        }
        self.verdict = Some(verdict);
        if let Some(id) = offender {
            let returns = self.session.ast.returns(id);
            return reject(self.mismatch_reason(returns.name(), id)).map(Some);
        }

        let ast = &self.session.ast;
        let enclosing = ast.parent(binary).filter(|parent| ast.is_filled(*parent));
        if !ast.reads_as_tree(binary) || !enclosing.map_or(true, |parent| ast.reads_as_tree(parent)) {
            return reject("operator would change how the expression reads").map(Some);
        }
        Ok(None)
    }

    fn verdict_in_place(&self, expr: NodeId) -> InsertionType {
        let returns = self.session.ast.returns(expr);
        self.session.validator().insertion_verdict(expr, returns)
    }

    // ---- modifiers and wrapping ----

    /// Append `modifier` to `expr`'s chain, starting one if needed
    fn attach_modifier(&mut self, expr: NodeId, modifier: NodeId) -> Result<Step> {
        let ast = &mut self.session.ast;
        let parent = ast.parent(expr);
        let is_chain = |kind: Option<&NodeKind>| {
            matches!(kind, Some(NodeKind::Expression(ExpressionKind::ValueOperation)))
        };
        let chain = if is_chain(ast.kind(expr)) {
            let end = ast.node(expr)?.tokens.len();
            ast.insert_token(expr, end, modifier)?;
            expr
        } else if let Some(parent) = parent.filter(|p| is_chain(ast.kind(*p))) {
            let index = ast.node(expr)?.index_in_parent + 1;
            ast.insert_token(parent, index, modifier)?;
            parent
        } else {
            ast.wrap_with(expr, |ast, inner| ast.value_operation(inner, vec![modifier]))?
        };
        ast.relayout();
        self.verdict = Some(self.verdict_in_place(chain));
        self.focus_on(modifier);
        Ok(Step::Applied)
    }

    /// `function(target)` in place of `target`
    pub(super) fn wrap_expression(&mut self, target: NodeId, function: &str) -> Result<Step> {
        if !self.session.validator().can_wrap_expression(target, function) {
            return reject(format!("cannot wrap this in {}()", function));
        }
        let Some(ConstructShape::FunctionCall {
            name,
            args,
            returns,
            import,
            ..
        }) = self.session.catalog.function(function).map(|d| d.shape.clone())
        else {
            return Err(EditorError::UnknownTemplate(function.to_string()));
        };
        let call = self.session.ast.wrap_with(target, |ast, inner| {
            let call = ast.function_call(&name, &args, returns, import);
            let first = ast
                .node(call)?
                .tokens
                .get(1)
                .copied()
                .ok_or(EditorError::MissingHole(call))?;
            ast.swap_in(first, inner)?;
            ast.kill(first);
            Ok(call)
        })?;
        self.session.ast.relayout();
        self.verdict = Some(self.verdict_in_place(call));
        self.caret_after(call)?;
        Ok(Step::Applied)
    }

    /// Replace a wrapper with the value it wraps
    pub(super) fn unwrap_expression(&mut self, target: NodeId) -> Result<Step> {
        let Some(inner) = self.session.validator().unwrap_replacement(target) else {
            return reject("nothing to unwrap");
        };
        self.session.ast.unwrap_into(target, inner)?;
        self.session.ast.relayout();
        self.verdict = Some(self.verdict_in_place(inner));
        self.caret_after(inner)?;
        Ok(Step::Applied)
    }

    // ---- list literals ----

    pub(super) fn insert_list_item(&mut self) -> Result<Step> {
        let context = self.session.context();
        let Some((list, item)) = self.session.validator().list_item_at(Some(&context)) else {
            return reject("not inside a list");
        };
        let ast = &mut self.session.ast;
        let index = ast.node(item)?.index_in_parent;
        let separator = ast.fixed(", ");
        let hole = ast.hole(TypeSet::any());
        ast.insert_token(list, index + 1, separator)?;
        ast.insert_token(list, index + 2, hole)?;
        self.select(hole)?;
        Ok(Step::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::action::EditAction;
    use crate::editor::ast::DataType;
    use crate::editor::executor::ActionExecutor;
    use crate::editor::focus::Focus;
    use crate::editor::position::Position;
    use crate::editor::session::EditorSession;

    fn run(session: &mut EditorSession, action: EditAction) -> bool {
        ActionExecutor::new(session).execute(&action).applied
    }

    fn assignment(value: &str) -> EditorSession {
        let mut session = EditorSession::new(EditorConfig::default());
        let root = session.ast.root();
        let line = session.ast.node(root).unwrap().body[0];
        let stmt = session.ast.var_assignment("x");
        session.ast.swap_in(line, stmt).unwrap();
        session.ast.relayout();
        let hole = session.ast.node(stmt).unwrap().tokens[2];
        session.focus = Focus::select(session.ast.node(hole).unwrap().range());
        if !value.is_empty() {
            assert!(run(
                &mut session,
                EditAction::InsertLiteral(LiteralValue::String(value.to_string()))
            ));
        }
        session
    }

    #[test]
    fn test_modifier_chain_grows_in_place() {
        let mut session = assignment("a b");
        session.focus = Focus::caret(Position::new(1, 10));
        assert!(run(&mut session, EditAction::InsertModifier { definition: "upper".into() }));
        assert_eq!(session.text(), "x = \"a b\".upper()");
        session.focus = Focus::caret(Position::new(1, 18));
        assert!(run(&mut session, EditAction::InsertModifier { definition: "split".into() }));
        assert_eq!(session.text(), "x = \"a b\".upper().split(___)");

        let stmt = session.ast.statement_at_line(1).unwrap();
        let value = session.ast.node(stmt).unwrap().tokens[2];
        assert_eq!(session.ast.node(value).unwrap().tokens.len(), 3);
        assert_eq!(session.ast.returns(value), DataType::StringList);
    }

    #[test]
    fn test_method_needs_matching_receiver() {
        let mut session = assignment("");
        assert!(run(&mut session, EditAction::InsertLiteral(LiteralValue::Number("3".into()))));
        session.focus = Focus::caret(Position::new(1, 6));
        let outcome = ActionExecutor::new(&mut session)
            .execute(&EditAction::InsertModifier { definition: "upper".into() });
        assert!(!outcome.applied);
        assert_eq!(session.text(), "x = 3");
    }

    #[test]
    fn test_binary_operator_selects_right_operand() {
        let mut session = assignment("");
        assert!(run(&mut session, EditAction::InsertLiteral(LiteralValue::Number("3".into()))));
        assert!(run(&mut session, EditAction::InsertBinaryOperator(BinaryOp::Lt)));
        assert_eq!(session.text(), "x = 3 < ___");
        assert_eq!(session.context().selection.map(|r| r.start.column), Some(9));

        session.focus = Focus::caret(Position::new(1, 9));
        assert!(run(&mut session, EditAction::ReplaceOperator(BinaryOp::Le)));
        assert_eq!(session.text(), "x = 3 <= ___");
    }

    #[test]
    fn test_wrap_and_unwrap_round_trip() {
        let mut session = assignment("");
        assert!(run(&mut session, EditAction::InsertLiteral(LiteralValue::Number("3".into()))));
        let stmt = session.ast.statement_at_line(1).unwrap();
        let number = session.ast.node(stmt).unwrap().tokens[2];

        assert!(run(&mut session, EditAction::WrapExpression { target: number, function: "str".into() }));
        assert_eq!(session.text(), "x = str(3)");
        let call = session.ast.node(stmt).unwrap().tokens[2];
        assert_eq!(session.ast.parent(number), Some(call));

        assert!(run(&mut session, EditAction::UnwrapExpression { target: call }));
        assert_eq!(session.text(), "x = 3");
        assert!(!session.ast.is_alive(call));
    }

    #[test]
    fn test_list_items_are_added_after_the_cursor_item() {
        let mut session = assignment("");
        assert!(run(&mut session, EditAction::InsertLiteral(LiteralValue::List)));
        assert_eq!(session.text(), "x = [___]");
        assert!(run(&mut session, EditAction::InsertListItem));
        assert_eq!(session.text(), "x = [___, ___]");
        assert_eq!(session.context().selection.map(|r| r.start.column), Some(11));
    }
}
