//! Editor session state
//!
//! One [`EditorSession`] owns everything a single editor needs: the tree,
//! its scopes, draft records, focus, suggestion menu and event bus. It is
//! threaded explicitly through the validator, router and executor, so any
//! number of sessions can live side by side.

use crate::config::EditorConfig;
use crate::editor::ast::{Ast, ConversionTable};
use crate::editor::catalog::Catalog;
use crate::editor::draft::DraftRegistry;
use crate::editor::events::EventBus;
use crate::editor::focus::{derive_context, Context, Focus};
use crate::editor::menu::SuggestionMenu;
use crate::editor::position::Position;
use crate::editor::scope::ScopeTree;
use crate::editor::validator::Validator;
use std::collections::VecDeque;
use tracing::info;

/// Restorable copy of the mutable session state
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub ast: Ast,
    pub scopes: ScopeTree,
    pub drafts: DraftRegistry,
    pub focus: Focus,
    pub menu: SuggestionMenu,
}

/// Bounded undo/redo stacks of snapshots
#[derive(Debug, Clone, Default)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Record the state before an applied action
    pub fn record(&mut self, before: Snapshot) {
        if self.limit == 0 {
            return;
        }
        self.undo.push_back(before);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Swap `current` for the previous state
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Swap `current` for the next state
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }
}

/// State of one editor
pub struct EditorSession {
    pub ast: Ast,
    pub scopes: ScopeTree,
    pub drafts: DraftRegistry,
    pub focus: Focus,
    pub menu: SuggestionMenu,
    pub events: EventBus,
    pub catalog: Catalog,
    pub conversions: ConversionTable,
    pub config: EditorConfig,
    pub(crate) history: History,

    /// Text the host buffer was last synced to
    rendered: String,
}

impl EditorSession {
    /// Empty program with the built-in catalog
    pub fn new(config: EditorConfig) -> Self {
        Self::with_catalog(config, Catalog::builtin())
    }

    pub fn with_catalog(config: EditorConfig, catalog: Catalog) -> Self {
        let ast = Ast::new(config.indent_width);
        let scopes = ScopeTree::new(ast.root());
        let rendered = ast.render_text();
        info!(
            "Started editor session with {} construct templates",
            catalog.len()
        );
        Self {
            ast,
            scopes,
            drafts: DraftRegistry::new(),
            focus: Focus::caret(Position::new(1, 1)),
            menu: SuggestionMenu::new(),
            events: EventBus::new(),
            catalog,
            conversions: ConversionTable::standard(),
            history: History::new(config.max_undo_depth),
            config,
            rendered,
        }
    }

    /// Structural context of the current focus
    pub fn context(&self) -> Context {
        derive_context(&self.ast, &self.focus)
    }

    pub fn validator(&self) -> Validator<'_> {
        Validator::new(self)
    }

    /// Current render text of the tree
    pub fn text(&self) -> String {
        self.ast.render_text()
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    pub(crate) fn set_rendered(&mut self, text: String) {
        self.rendered = text;
    }

    pub fn checkpoint(&self) -> Snapshot {
        Snapshot {
            ast: self.ast.clone(),
            scopes: self.scopes.clone(),
            drafts: self.drafts.clone(),
            focus: self.focus,
            menu: self.menu.clone(),
        }
    }

    /// Put a snapshot back; the synced text is left alone
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.ast = snapshot.ast;
        self.scopes = snapshot.scopes;
        self.drafts = snapshot.drafts;
        self.focus = snapshot.focus;
        self.menu = snapshot.menu;
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }
}
