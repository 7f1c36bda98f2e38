//! Constructors for every construct shape
//!
//! Factories allocate fresh, detached subtrees. The caller splices them into
//! the tree (usually with [`Ast::swap_in`]) and then re-lays the document out.

use super::{
    Ast, AugmentedOp, AutocompleteContext, BinaryOp, DataType, ExpressionKind, ImportRequirement,
    LiteralKind, ModifierKind, NodeId, NodeKind, StatementKind, TokenKind, TypeSet, UnaryOp,
};
use crate::error::Result;

impl Ast {
    /// Attach fresh children; only used on nodes allocated by this module
    fn adopt(&mut self, parent: NodeId, tokens: Vec<NodeId>, body: Vec<NodeId>) {
        for (index, child) in tokens.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(child.0) {
                node.parent = Some(parent);
                node.index_in_parent = index;
            }
        }
        for (index, child) in body.iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(child.0) {
                node.parent = Some(parent);
                node.index_in_parent = index;
            }
        }
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.tokens = tokens;
            node.body = body;
        }
    }

    fn with_slot(&mut self, id: NodeId, slot: TypeSet) -> NodeId {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.slot = Some(slot);
        }
        id
    }

    pub fn token(&mut self, kind: TokenKind) -> NodeId {
        self.alloc(NodeKind::Token(kind))
    }

    pub fn fixed(&mut self, text: &str) -> NodeId {
        self.token(TokenKind::NonEditable(text.to_string()))
    }

    /// Typed expression hole
    pub fn hole(&mut self, slot: TypeSet) -> NodeId {
        let id = self.token(TokenKind::EmptyExpression);
        self.with_slot(id, slot)
    }

    pub fn autocomplete(&mut self, text: &str, context: AutocompleteContext) -> NodeId {
        self.token(TokenKind::Autocomplete {
            text: text.to_string(),
            context,
        })
    }

    // ---- statements ----

    pub fn empty_line(&mut self) -> NodeId {
        self.alloc(NodeKind::Statement(StatementKind::EmptyLine))
    }

    /// `name = ___`
    pub fn var_assignment(&mut self, name: &str) -> NodeId {
        let stmt = self.alloc(NodeKind::Statement(StatementKind::VarAssignment));
        let ident = self.token(TokenKind::Identifier(name.to_string()));
        let equals = self.fixed(" = ");
        let value = self.hole(TypeSet::any());
        self.adopt(stmt, vec![ident, equals, value], Vec::new());
        stmt
    }

    /// Statement evaluating `expr` for its effect
    pub fn expression_statement(&mut self, expr: NodeId) -> Result<NodeId> {
        self.node(expr)?;
        let stmt = self.alloc(NodeKind::Statement(StatementKind::Expression));
        if let Some(node) = self.nodes.get_mut(expr.0) {
            node.slot = None;
        }
        self.adopt(stmt, vec![expr], Vec::new());
        Ok(stmt)
    }

    /// `if`, `elif`, `else` or `while` with a sentinel body
    pub fn compound(&mut self, kind: StatementKind) -> NodeId {
        let stmt = self.alloc(NodeKind::Statement(kind.clone()));
        let tokens = match kind {
            StatementKind::Else => vec![self.fixed("else:")],
            _ => {
                let keyword = self.fixed(&format!("{} ", kind.keyword()));
                let condition = self.hole(TypeSet::single(DataType::Boolean));
                let colon = self.fixed(":");
                vec![keyword, condition, colon]
            }
        };
        let sentinel = self.empty_line();
        self.adopt(stmt, tokens, vec![sentinel]);
        stmt
    }

    /// `for name in ___:`
    pub fn for_loop(&mut self, variable: &str) -> NodeId {
        let stmt = self.alloc(NodeKind::Statement(StatementKind::For));
        let keyword = self.fixed("for ");
        let ident = self.token(TokenKind::Identifier(variable.to_string()));
        let within = self.fixed(" in ");
        let iterable = self.hole(TypeSet::new([
            DataType::AnyList,
            DataType::String,
            DataType::Iterator,
        ]));
        let colon = self.fixed(":");
        let sentinel = self.empty_line();
        self.adopt(stmt, vec![keyword, ident, within, iterable, colon], vec![sentinel]);
        stmt
    }

    /// `break` / `continue`
    pub fn keyword_statement(&mut self, kind: StatementKind) -> NodeId {
        let stmt = self.alloc(NodeKind::Statement(kind.clone()));
        let word = self.fixed(kind.keyword());
        self.adopt(stmt, vec![word], Vec::new());
        stmt
    }

    pub fn import_statement(&mut self, module: &str, item: &str) -> NodeId {
        let stmt = self.alloc(NodeKind::Statement(StatementKind::Import {
            module: module.to_string(),
            item: item.to_string(),
        }));
        let text = self.fixed(&format!("from {} import {}", module, item));
        self.adopt(stmt, vec![text], Vec::new());
        stmt
    }

    // ---- expressions ----

    pub fn number_literal(&mut self, digits: &str) -> NodeId {
        let expr = self.alloc(NodeKind::Expression(ExpressionKind::Literal(LiteralKind::Number)));
        let text = self.token(TokenKind::EditableText(digits.to_string()));
        self.adopt(expr, vec![text], Vec::new());
        expr
    }

    pub fn string_literal(&mut self, text: &str) -> NodeId {
        let expr = self.alloc(NodeKind::Expression(ExpressionKind::Literal(LiteralKind::String)));
        let open = self.fixed("\"");
        let body = self.token(TokenKind::EditableText(text.to_string()));
        let close = self.fixed("\"");
        self.adopt(expr, vec![open, body, close], Vec::new());
        expr
    }

    pub fn boolean_literal(&mut self, value: bool) -> NodeId {
        self.alloc(NodeKind::Expression(ExpressionKind::Literal(LiteralKind::Boolean(value))))
    }

    /// `[___]`
    pub fn list_literal(&mut self) -> NodeId {
        let expr = self.alloc(NodeKind::Expression(ExpressionKind::ListLiteral));
        let open = self.fixed("[");
        let item = self.hole(TypeSet::any());
        let close = self.fixed("]");
        self.adopt(expr, vec![open, item, close], Vec::new());
        expr
    }

    /// `left op ___`, with `left` taken as the left operand
    pub fn binary_operator(&mut self, op: Option<BinaryOp>, left: NodeId) -> Result<NodeId> {
        self.node(left)?;
        let operands = op.map(|op| op.operand_types()).unwrap_or_default();
        let expr = self.alloc(NodeKind::Expression(ExpressionKind::BinaryOperator));
        let operator = match op {
            Some(op) => self.token(TokenKind::Operator(op)),
            None => self.token(TokenKind::EmptyOperator),
        };
        let right = self.hole(operands.clone());
        self.with_slot(left, operands);
        self.adopt(expr, vec![left, operator, right], Vec::new());
        Ok(expr)
    }

    /// `not ___`
    pub fn unary_operator(&mut self, op: UnaryOp) -> NodeId {
        let expr = self.alloc(NodeKind::Expression(ExpressionKind::UnaryOperator(op)));
        let keyword = self.fixed("not ");
        let operand = self.hole(TypeSet::single(DataType::Boolean));
        self.adopt(expr, vec![keyword, operand], Vec::new());
        expr
    }

    /// `name(___, ___)` with one hole per argument
    pub fn function_call(
        &mut self,
        name: &str,
        args: &[TypeSet],
        returns: DataType,
        import: Option<ImportRequirement>,
    ) -> NodeId {
        let expr = self.alloc(NodeKind::Expression(ExpressionKind::FunctionCall {
            name: name.to_string(),
        }));
        let mut tokens = vec![self.fixed(&format!("{}(", name))];
        tokens.extend(self.argument_list(args));
        tokens.push(self.fixed(")"));
        self.adopt(expr, tokens, Vec::new());
        if let Some(node) = self.nodes.get_mut(expr.0) {
            node.returns = returns;
            node.import = import;
        }
        expr
    }

    fn argument_list(&mut self, args: &[TypeSet]) -> Vec<NodeId> {
        let mut tokens = Vec::new();
        for (index, slot) in args.iter().enumerate() {
            if index > 0 {
                tokens.push(self.fixed(", "));
            }
            tokens.push(self.hole(slot.clone()));
        }
        tokens
    }

    pub fn variable_reference(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Expression(ExpressionKind::VariableReference {
            name: name.to_string(),
        }))
    }

    /// `base` followed by a modifier chain
    pub fn value_operation(&mut self, base: NodeId, modifiers: Vec<NodeId>) -> Result<NodeId> {
        self.node(base)?;
        let expr = self.alloc(NodeKind::Expression(ExpressionKind::ValueOperation));
        if let Some(node) = self.nodes.get_mut(base.0) {
            node.slot = None;
        }
        let mut tokens = vec![base];
        tokens.extend(modifiers);
        self.adopt(expr, tokens, Vec::new());
        Ok(expr)
    }

    // ---- modifiers ----

    /// `.name(___)`
    pub fn method_call(&mut self, name: &str, args: &[TypeSet], returns: DataType) -> NodeId {
        let modifier = self.alloc(NodeKind::Modifier(ModifierKind::MethodCall {
            name: name.to_string(),
        }));
        let mut tokens = vec![self.fixed(&format!(".{}(", name))];
        tokens.extend(self.argument_list(args));
        tokens.push(self.fixed(")"));
        self.adopt(modifier, tokens, Vec::new());
        if let Some(node) = self.nodes.get_mut(modifier.0) {
            node.returns = returns;
        }
        modifier
    }

    /// `[___]` after a list or string
    pub fn list_access(&mut self) -> NodeId {
        let modifier = self.alloc(NodeKind::Modifier(ModifierKind::ListAccess));
        let open = self.fixed("[");
        let index = self.hole(TypeSet::single(DataType::Number));
        let close = self.fixed("]");
        self.adopt(modifier, vec![open, index, close], Vec::new());
        modifier
    }

    /// ` += ___`
    pub fn augmented_assignment(&mut self, op: AugmentedOp) -> NodeId {
        let modifier = self.alloc(NodeKind::Modifier(ModifierKind::AugmentedAssignment(op)));
        let symbol = self.fixed(&format!(" {} ", op.symbol()));
        let value = self.hole(op.value_types());
        self.adopt(modifier, vec![symbol, value], Vec::new());
        if let Some(node) = self.nodes.get_mut(modifier.0) {
            node.returns = DataType::Void;
        }
        modifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(ast: &mut Ast, stmt: NodeId) {
        let line = ast.node(ast.root()).unwrap().body[0];
        ast.swap_in(line, stmt).unwrap();
        ast.relayout();
    }

    #[test]
    fn test_call_renders_arguments_with_separators() {
        let mut ast = Ast::new(4);
        let call = ast.function_call(
            "randint",
            &[TypeSet::single(DataType::Number), TypeSet::single(DataType::Number)],
            DataType::Number,
            None,
        );
        let stmt = ast.expression_statement(call).unwrap();
        place(&mut ast, stmt);
        assert_eq!(ast.render_text(), "randint(___, ___)");
    }

    #[test]
    fn test_value_operation_chain_types() {
        let mut ast = Ast::new(4);
        let base = ast.string_literal("a b");
        let split = ast.method_call("split", &[TypeSet::single(DataType::String)], DataType::StringList);
        let access = ast.list_access();
        let expr = ast.value_operation(base, vec![split, access]).unwrap();
        let stmt = ast.expression_statement(expr).unwrap();
        place(&mut ast, stmt);

        assert_eq!(ast.render_text(), "\"a b\".split(___)[___]");
        assert_eq!(ast.returns(expr), DataType::String);
    }

    #[test]
    fn test_augmented_assignment_is_void() {
        let mut ast = Ast::new(4);
        let base = ast.variable_reference("total");
        let tail = ast.augmented_assignment(AugmentedOp::Add);
        let expr = ast.value_operation(base, vec![tail]).unwrap();
        let stmt = ast.expression_statement(expr).unwrap();
        place(&mut ast, stmt);

        assert_eq!(ast.render_text(), "total += ___");
        assert_eq!(ast.returns(expr), DataType::Void);
    }

    #[test]
    fn test_import_statement_text() {
        let mut ast = Ast::new(4);
        let stmt = ast.import_statement("random", "randint");
        place(&mut ast, stmt);
        assert_eq!(ast.render_text(), "from random import randint");
    }
}
