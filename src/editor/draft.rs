//! Draft mode: structurally valid but not yet correct constructs
//!
//! Each construct is either clean or flagged by exactly one [`DraftRecord`].
//! [`DraftRegistry::reconcile`] runs after every applied action and brings
//! the records in line with the tree:
//! - a variable reference with no preceding assignment in scope is flagged
//! - an expression whose type its slot only accepts through a conversion is
//!   flagged, with one "wrap in f()" fix per registered conversion
//! - a call needing an import with no import above it is flagged
//!
//! Records disappear when the cause goes away, when a fix is applied, or
//! when the construct is deleted. Dismissed records stay hidden until the
//! cause changes.

use crate::editor::action::EditAction;
use crate::editor::ast::{
    Ast, ConversionTable, DataType, ExpressionKind, InsertionType, NodeId, NodeKind,
    StatementKind, TypeSet,
};
use crate::editor::scope::ScopeTree;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Why a construct is in draft mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftCause {
    TypeMismatch { expected: TypeSet, actual: DataType },
    UndefinedVariable { name: String },
    MissingImport { module: String, item: String },
}

impl fmt::Display for DraftCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftCause::TypeMismatch { expected, actual } => {
                write!(f, "Expected {} but got {}", expected, actual)
            }
            DraftCause::UndefinedVariable { name } => {
                write!(f, "Variable '{}' is used before it is assigned", name)
            }
            DraftCause::MissingImport { module, item } => {
                write!(f, "'{}' needs 'from {} import {}'", item, module, item)
            }
        }
    }
}

/// A candidate fix, applied like any other action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftFix {
    pub label: String,
    pub action: EditAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRecord {
    pub construct: NodeId,
    pub cause: DraftCause,
    pub message: String,
    pub fixes: Vec<DraftFix>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftChangeKind {
    Opened,
    /// An existing record was replaced with one for a new cause
    Replaced,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftChange {
    pub construct: NodeId,
    pub kind: DraftChangeKind,
}

/// Active draft records, at most one per construct
#[derive(Debug, Clone, Default)]
pub struct DraftRegistry {
    records: BTreeMap<NodeId, DraftRecord>,
    dismissed: BTreeMap<NodeId, DraftCause>,
}

impl DraftRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a record, replacing any existing one on the same construct
    pub fn open(&mut self, record: DraftRecord) -> DraftChangeKind {
        let construct = record.construct;
        match self.records.insert(construct, record) {
            Some(_) => DraftChangeKind::Replaced,
            None => DraftChangeKind::Opened,
        }
    }

    pub fn close(&mut self, construct: NodeId) -> Option<DraftRecord> {
        self.records.remove(&construct)
    }

    /// Close a record and keep it hidden while its cause stays the same
    pub fn dismiss(&mut self, construct: NodeId) -> Option<DraftRecord> {
        let record = self.records.remove(&construct)?;
        self.dismissed.insert(construct, record.cause.clone());
        Some(record)
    }

    pub fn get(&self, construct: NodeId) -> Option<&DraftRecord> {
        self.records.get(&construct)
    }

    pub fn records(&self) -> impl Iterator<Item = &DraftRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record on a construct inside `stmt`'s header
    pub fn record_on_statement(&self, ast: &Ast, stmt: NodeId) -> Option<&DraftRecord> {
        self.records
            .values()
            .find(|record| ast.enclosing_statement(record.construct) == Some(stmt))
    }

    /// Bring the records in line with the tree
    pub fn reconcile(
        &mut self,
        ast: &mut Ast,
        scopes: &ScopeTree,
        conversions: &ConversionTable,
    ) -> Vec<DraftChange> {
        refresh_reference_types(ast, scopes);

        let mut desired: BTreeMap<NodeId, DraftRecord> = BTreeMap::new();
        for id in ast.descendants(ast.root()) {
            if !ast.is_alive(id) {
                continue;
            }
            if let Some(record) = diagnose(ast, scopes, conversions, id) {
                desired.insert(id, record);
            }
        }

        let mut changes = Vec::new();
        let stale: Vec<NodeId> = self
            .records
            .keys()
            .filter(|id| !desired.contains_key(id))
            .copied()
            .collect();
        for construct in stale {
            self.records.remove(&construct);
            debug!("Closed draft record on {}", construct);
            changes.push(DraftChange {
                construct,
                kind: DraftChangeKind::Closed,
            });
        }
        self.dismissed.retain(|id, cause| {
            desired.get(id).map(|record| &record.cause == cause).unwrap_or(false)
        });

        for (construct, record) in desired {
            if self.dismissed.contains_key(&construct) {
                continue;
            }
            if self.records.get(&construct).map(|r| r == &record).unwrap_or(false) {
                continue;
            }
            debug!("Draft record on {}: {}", construct, record.message);
            let kind = self.open(record);
            changes.push(DraftChange { construct, kind });
        }
        changes
    }
}

/// Give every variable reference the type of the assignment it resolves to
fn refresh_reference_types(ast: &mut Ast, scopes: &ScopeTree) {
    let references: Vec<NodeId> = ast
        .descendants(ast.root())
        .into_iter()
        .filter(|id| {
            matches!(
                ast.kind(*id),
                Some(NodeKind::Expression(ExpressionKind::VariableReference { .. }))
            )
        })
        .collect();

    // Assignments can depend on other references; settle over a few passes.
    for _ in 0..4 {
        let mut changed = false;
        for id in &references {
            let Some(name) = ast.name_of(*id).map(str::to_string) else {
                continue;
            };
            let (scope, line) = scopes.query_site(ast, *id);
            let data_type = scopes
                .resolve(ast, scope, &name, line)
                .map(|reference| scopes.variable_type(ast, &reference))
                .unwrap_or(DataType::Any);
            if let Ok(node) = ast.node_mut(*id) {
                if node.returns != data_type {
                    node.returns = data_type;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }
}

fn diagnose(
    ast: &Ast,
    scopes: &ScopeTree,
    conversions: &ConversionTable,
    id: NodeId,
) -> Option<DraftRecord> {
    let node = ast.get(id)?;
    if !node.kind.is_expression() {
        return None;
    }

    if let NodeKind::Expression(ExpressionKind::VariableReference { name }) = &node.kind {
        let (scope, line) = scopes.query_site(ast, id);
        if !scopes.covers(ast, scope, name, line) {
            let cause = DraftCause::UndefinedVariable { name: name.clone() };
            return Some(record(id, cause, undefined_fixes(ast, id, name)));
        }
    }

    if node.slot.is_some() {
        let actual = ast.returns(id);
        let verdict = ast.insertion_type(id, actual, conversions);
        if verdict != InsertionType::Valid {
            let expected = ast.effective_slot(id).unwrap_or_default();
            let fixes = if verdict == InsertionType::DraftMode {
                conversions
                    .find(actual, &expected)
                    .into_iter()
                    .map(|conversion| DraftFix {
                        label: format!("Wrap in {}()", conversion.function),
                        action: EditAction::WrapExpression {
                            target: id,
                            function: conversion.function.to_string(),
                        },
                    })
                    .collect()
            } else {
                Vec::new()
            };
            return Some(record(id, DraftCause::TypeMismatch { expected, actual }, fixes));
        }
    }

    if let Some(requirement) = &node.import {
        if !has_import_above(ast, &requirement.module, &requirement.item, node.line) {
            let fix = DraftFix {
                label: format!("Add {}", requirement),
                action: EditAction::InsertImport {
                    module: requirement.module.clone(),
                    item: requirement.item.clone(),
                },
            };
            let cause = DraftCause::MissingImport {
                module: requirement.module.clone(),
                item: requirement.item.clone(),
            };
            return Some(record(id, cause, vec![fix]));
        }
    }
    None
}

fn record(construct: NodeId, cause: DraftCause, fixes: Vec<DraftFix>) -> DraftRecord {
    DraftRecord {
        construct,
        message: cause.to_string(),
        cause,
        fixes,
    }
}

fn undefined_fixes(ast: &Ast, id: NodeId, name: &str) -> Vec<DraftFix> {
    let mut fixes = Vec::new();
    let Some(stmt) = ast.enclosing_statement(id) else {
        return fixes;
    };
    let sole_token = ast
        .get(stmt)
        .map(|node| {
            matches!(node.kind, NodeKind::Statement(StatementKind::Expression))
                && node.tokens.as_slice() == [id]
        })
        .unwrap_or(false);
    if sole_token {
        fixes.push(DraftFix {
            label: "Convert to assignment".to_string(),
            action: EditAction::ConvertToAssignment { statement: stmt },
        });
    }
    fixes.push(DraftFix {
        label: format!("Declare '{}' above", name),
        action: EditAction::DeclareVariable {
            name: name.to_string(),
            before: chain_head(ast, stmt),
        },
    });
    fixes
}

/// The `if` an `elif`/`else` belongs to, or the statement itself
pub fn chain_head(ast: &Ast, stmt: NodeId) -> NodeId {
    let mut current = stmt;
    while ast
        .statement_kind(current)
        .map(|kind| kind.continues_chain())
        .unwrap_or(false)
    {
        match ast.prev_sibling(current) {
            Some(previous) => current = previous,
            None => break,
        }
    }
    current
}

fn has_import_above(ast: &Ast, module: &str, item: &str, line: usize) -> bool {
    ast.statements_in_order().into_iter().any(|stmt| {
        let Some(node) = ast.get(stmt) else {
            return false;
        };
        match &node.kind {
            NodeKind::Statement(StatementKind::Import { module: m, item: i }) => {
                m == module && i == item && node.line < line
            }
            _ => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::ast::ImportRequirement;

    fn program_with(ast: &mut Ast, stmt: NodeId) {
        let line = ast.node(ast.root()).unwrap().body[0];
        ast.swap_in(line, stmt).unwrap();
        ast.relayout();
    }

    #[test]
    fn test_undefined_reference_offers_conversion_to_assignment() {
        let mut ast = Ast::new(4);
        let reference = ast.variable_reference("total");
        let stmt = ast.expression_statement(reference).unwrap();
        program_with(&mut ast, stmt);
        let scopes = ScopeTree::new(ast.root());

        let mut drafts = DraftRegistry::new();
        let changes = drafts.reconcile(&mut ast, &scopes, &ConversionTable::standard());
        assert_eq!(changes.len(), 1);
        let record = drafts.get(reference).unwrap();
        assert_eq!(record.fixes[0].label, "Convert to assignment");
        assert_eq!(
            record.fixes[0].action,
            EditAction::ConvertToAssignment { statement: stmt }
        );
    }

    #[test]
    fn test_mismatch_offers_wrap_fix_and_closes_when_fixed() {
        let mut ast = Ast::new(4);
        let call = ast.function_call("input", &[TypeSet::single(DataType::String)], DataType::String, None);
        let stmt = ast.expression_statement(call).unwrap();
        program_with(&mut ast, stmt);
        let hole = ast.node(call).unwrap().tokens[1];
        let number = ast.number_literal("5");
        ast.swap_in(hole, number).unwrap();
        ast.relayout();
        let scopes = ScopeTree::new(ast.root());

        let mut drafts = DraftRegistry::new();
        drafts.reconcile(&mut ast, &scopes, &ConversionTable::standard());
        let record = drafts.get(number).unwrap();
        assert_eq!(record.fixes.len(), 1);
        assert_eq!(record.fixes[0].label, "Wrap in str()");

        let text = ast.string_literal("5");
        ast.swap_in(number, text).unwrap();
        let changes = drafts.reconcile(&mut ast, &scopes, &ConversionTable::standard());
        assert_eq!(
            changes,
            vec![DraftChange { construct: number, kind: DraftChangeKind::Closed }]
        );
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_missing_import_and_dismissal() {
        let mut ast = Ast::new(4);
        let requirement = ImportRequirement {
            module: "random".into(),
            item: "randint".into(),
        };
        let call = ast.function_call("randint", &[], DataType::Number, Some(requirement));
        let stmt = ast.expression_statement(call).unwrap();
        program_with(&mut ast, stmt);
        let scopes = ScopeTree::new(ast.root());
        let conversions = ConversionTable::standard();

        let mut drafts = DraftRegistry::new();
        drafts.reconcile(&mut ast, &scopes, &conversions);
        assert!(matches!(
            drafts.get(call).unwrap().cause,
            DraftCause::MissingImport { .. }
        ));

        drafts.dismiss(call);
        assert!(drafts.reconcile(&mut ast, &scopes, &conversions).is_empty());
        assert!(drafts.get(call).is_none());
    }

    #[test]
    fn test_open_replaces_existing_record() {
        let mut drafts = DraftRegistry::new();
        let first = record(
            NodeId(3),
            DraftCause::UndefinedVariable { name: "a".into() },
            Vec::new(),
        );
        let second = record(
            NodeId(3),
            DraftCause::TypeMismatch {
                expected: TypeSet::single(DataType::Number),
                actual: DataType::String,
            },
            Vec::new(),
        );
        assert_eq!(drafts.open(first), DraftChangeKind::Opened);
        assert_eq!(drafts.open(second), DraftChangeKind::Replaced);
        assert_eq!(drafts.len(), 1);
    }
}
