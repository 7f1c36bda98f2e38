//! Scope and reference tracking
//!
//! Scopes mirror body-bearing statements. Each scope holds the references
//! created by assignments directly inside it, in insertion order:
//! - A reference is visible from a scope if it lives there or in an
//!   ancestor, and its source line precedes the query line
//! - Local references are listed before ancestor references
//! - Resolution picks the closest preceding line in the nearest scope
//!
//! References point at the assigned identifier token, so renaming the
//! token renames the variable without touching the scope.

use crate::editor::ast::{Ast, DataType, NodeId, NodeKind, StatementKind};
use crate::error::{EditorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Index of a scope in the scope tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub usize);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope{}", self.0)
    }
}

/// An assignment token and the scope that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub token: NodeId,
    pub scope: ScopeId,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,

    /// Statement (or program) that introduced the scope
    pub owner: NodeId,

    pub references: Vec<Reference>,
    pub alive: bool,
}

/// A variable visible at some line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleVariable {
    pub name: String,
    pub data_type: DataType,
    pub reference: Reference,
}

/// All scopes of a session
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    root: ScopeId,

    /// Slots of scopes whose owner was released
    free: Vec<ScopeId>,
}

impl ScopeTree {
    /// Tree with a root scope owned by the program node
    pub fn new(program: NodeId) -> Self {
        Self {
            scopes: vec![Scope {
                id: ScopeId(0),
                parent: None,
                owner: program,
                references: Vec::new(),
                alive: true,
            }],
            root: ScopeId(0),
            free: Vec::new(),
        }
    }

    pub fn root(&self) -> ScopeId {
        self.root
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0).filter(|scope| scope.alive)
    }

    fn get_mut(&mut self, id: ScopeId) -> Result<&mut Scope> {
        self.scopes
            .get_mut(id.0)
            .filter(|scope| scope.alive)
            .ok_or(EditorError::ScopeNotFound(id))
    }

    pub fn create(&mut self, owner: NodeId, parent: ScopeId) -> ScopeId {
        let reused = self.free.pop().filter(|id| id.0 < self.scopes.len());
        let id = reused.unwrap_or(ScopeId(self.scopes.len()));
        let scope = Scope {
            id,
            parent: Some(parent),
            owner,
            references: Vec::new(),
            alive: true,
        };
        match self.scopes.get_mut(id.0) {
            Some(slot) => *slot = scope,
            None => self.scopes.push(scope),
        }
        debug!("Created {} for {} under {}", id, owner, parent);
        id
    }

    /// Drop everything tied to nodes the tree released
    pub fn forget(&mut self, released: &[NodeId]) {
        let released: BTreeSet<NodeId> = released.iter().copied().collect();
        for scope in self.scopes.iter_mut() {
            scope.references.retain(|r| !released.contains(&r.token));
            let orphaned = scope.id != self.root && released.contains(&scope.owner);
            if orphaned && !self.free.contains(&scope.id) {
                scope.alive = false;
                scope.references.clear();
                self.free.push(scope.id);
            }
        }
    }

    /// Drop a scope and everything still registered in it
    pub fn remove_scope(&mut self, id: ScopeId) -> Result<()> {
        if id == self.root {
            return Err(EditorError::Other("Cannot remove the root scope".to_string()));
        }
        let scope = self.get_mut(id)?;
        scope.alive = false;
        scope.references.clear();
        Ok(())
    }

    pub fn set_parent(&mut self, id: ScopeId, parent: ScopeId) -> Result<()> {
        if id == parent {
            return Ok(());
        }
        self.get_mut(id)?.parent = Some(parent);
        Ok(())
    }

    pub fn add_assignment(&mut self, scope: ScopeId, token: NodeId) -> Result<()> {
        if let Some(existing) = self.scope_of(token) {
            if existing == scope {
                return Ok(());
            }
            self.remove_assignment(token);
        }
        self.get_mut(scope)?.references.push(Reference { token, scope });
        Ok(())
    }

    /// Forget the reference created by `token`, wherever it lives
    pub fn remove_assignment(&mut self, token: NodeId) -> bool {
        let mut removed = false;
        for scope in self.scopes.iter_mut().filter(|s| s.alive) {
            let before = scope.references.len();
            scope.references.retain(|r| r.token != token);
            removed |= scope.references.len() != before;
        }
        removed
    }

    pub fn scope_of(&self, token: NodeId) -> Option<ScopeId> {
        self.scopes
            .iter()
            .filter(|s| s.alive)
            .find(|s| s.references.iter().any(|r| r.token == token))
            .map(|s| s.id)
    }

    /// Move a reference to another scope
    pub fn rehome(&mut self, token: NodeId, scope: ScopeId) -> Result<()> {
        self.get_mut(scope)?;
        self.remove_assignment(token);
        self.get_mut(scope)?.references.push(Reference { token, scope });
        Ok(())
    }

    /// Re-home every reference of `scope` into its parent, returning how many moved
    pub fn push_to_parent_scope(&mut self, scope: ScopeId) -> Result<usize> {
        let parent = self
            .get(scope)
            .ok_or(EditorError::ScopeNotFound(scope))?
            .parent
            .ok_or(EditorError::ScopeNotFound(scope))?;
        let moved = std::mem::take(&mut self.get_mut(scope)?.references);
        let count = moved.len();
        let target = self.get_mut(parent)?;
        target.references.extend(moved.into_iter().map(|r| Reference {
            token: r.token,
            scope: parent,
        }));
        debug!("Pushed {} references from {} to {}", count, scope, parent);
        Ok(count)
    }

    fn chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut current = Some(scope);
        while let Some(id) = current {
            let Some(entry) = self.get(id) else {
                break;
            };
            if out.contains(&id) {
                break;
            }
            out.push(id);
            current = entry.parent;
        }
        out
    }

    /// References visible at `line`: local ones first, then ancestors'
    pub fn valid_references(&self, ast: &Ast, scope: ScopeId, line: usize) -> Vec<Reference> {
        self.chain(scope)
            .into_iter()
            .filter_map(|id| self.get(id))
            .flat_map(|entry| entry.references.iter().copied())
            .filter(|r| {
                ast.get(r.token).map(|token| token.line < line).unwrap_or(false)
                    && ast.is_attached(r.token)
            })
            .collect()
    }

    pub fn covers(&self, ast: &Ast, scope: ScopeId, name: &str, line: usize) -> bool {
        self.resolve(ast, scope, name, line).is_some()
    }

    /// Closest preceding assignment of `name` in the nearest scope
    pub fn resolve(&self, ast: &Ast, scope: ScopeId, name: &str, line: usize) -> Option<Reference> {
        for id in self.chain(scope) {
            let Some(entry) = self.get(id) else {
                continue;
            };
            let best = entry
                .references
                .iter()
                .filter(|r| ast.name_of(r.token) == Some(name) && ast.is_attached(r.token))
                .filter_map(|r| ast.get(r.token).map(|token| (token.line, *r)))
                .filter(|(token_line, _)| *token_line < line)
                .max_by_key(|(token_line, _)| *token_line);
            if let Some((_, reference)) = best {
                return Some(reference);
            }
        }
        None
    }

    /// Scope a statement's own header lives in
    pub fn scope_for(&self, ast: &Ast, stmt: NodeId) -> ScopeId {
        let mut current = ast.parent(stmt);
        while let Some(id) = current {
            if let Some(scope) = ast.get(id).and_then(|node| node.scope) {
                if self.get(scope).is_some() {
                    return scope;
                }
            }
            current = ast.parent(id);
        }
        self.root
    }

    /// Scope and line a node's references resolve against
    pub fn query_site(&self, ast: &Ast, node: NodeId) -> (ScopeId, usize) {
        let line = ast.get(node).map(|n| n.line).unwrap_or(1);
        match ast.enclosing_statement(node) {
            Some(stmt) => (self.scope_for(ast, stmt), line),
            None => (self.root, line),
        }
    }

    /// Type produced by the assignment a reference points at
    pub fn variable_type(&self, ast: &Ast, reference: &Reference) -> DataType {
        let Some(stmt) = ast.parent(reference.token) else {
            return DataType::Any;
        };
        let Some(node) = ast.get(stmt) else {
            return DataType::Any;
        };
        match &node.kind {
            NodeKind::Statement(StatementKind::VarAssignment) => node
                .tokens
                .get(2)
                .filter(|value| ast.is_filled(**value))
                .map(|value| ast.returns(*value))
                .unwrap_or(DataType::Any),
            NodeKind::Statement(StatementKind::For) => node
                .tokens
                .get(3)
                .filter(|iterable| ast.is_filled(**iterable))
                .map(|iterable| ast.returns(*iterable).element_type())
                .unwrap_or(DataType::Any),
            _ => DataType::Any,
        }
    }

    /// Distinct variables visible at `line`, nearest assignment winning
    pub fn visible_variables(&self, ast: &Ast, scope: ScopeId, line: usize) -> Vec<VisibleVariable> {
        let mut out: Vec<VisibleVariable> = Vec::new();
        for reference in self.valid_references(ast, scope, line) {
            let Some(name) = ast.name_of(reference.token) else {
                continue;
            };
            if out.iter().any(|v| v.name == name) {
                continue;
            }
            if let Some(best) = self.resolve(ast, scope, name, line) {
                out.push(VisibleVariable {
                    name: name.to_string(),
                    data_type: self.variable_type(ast, &best),
                    reference: best,
                });
            }
        }
        out
    }

    /// Number of live scopes, root included
    pub fn live_count(&self) -> usize {
        self.scopes.iter().filter(|s| s.alive).count()
    }
}
